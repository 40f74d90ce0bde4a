use crate::node::Node;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ParseError>;

/// Reasons a score document cannot be turned into a structure.
///
/// Each variant carries the offending fragment of the document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Score must be a list of meters, found {0}")]
    IllFormedScore(Node),

    #[error("Ill-formed score element {0}")]
    IllFormedScoreElement(Node),

    #[error("Ill-formed meter '{0}'")]
    IllFormedMeter(String),

    #[error("Ill-formed tempo {0}")]
    IllFormedTempo(Node),

    #[error("No offset found in {0}")]
    IllFormedOffset(Node),
}

impl ParseError {
    /// The document fragment this error refers to
    pub fn fragment(&self) -> Node {
        match self {
            ParseError::IllFormedScore(node)
            | ParseError::IllFormedScoreElement(node)
            | ParseError::IllFormedTempo(node)
            | ParseError::IllFormedOffset(node) => node.clone(),
            ParseError::IllFormedMeter(text) => Node::from(text.as_str()),
        }
    }
}
