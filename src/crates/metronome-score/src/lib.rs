//! Score documents for the metronome
//!
//! This crate reads a decoded score document (YAML or JSON, normalised into a
//! [`Node`] tree) and turns it into a [`metronome_core::Structure`]: the
//! meters of the score in order, and its tempo stratum.
//!
//! # Examples
//!
//! ```
//! use metronome_score::{parse_score, Node};
//!
//! let yaml = "- 4/4:\n  tempo: 120\n- 3/4 x 2\n";
//! let document: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
//!
//! let structure = parse_score(&Node::from(document)).unwrap();
//! assert_eq!(structure.meters().len(), 3);
//! assert_eq!(structure.tempi().events()[0].tempo.beats_per_minute(), 120.0);
//! ```
//!
//! # Score Syntax
//!
//! - Meters: `4/4`, `7/8`
//! - Repetition: `3/4 x 8`
//! - Step tempo at a downbeat: `tempo: 120`
//! - Ramp ending at a downbeat: `tempo_change: 90`
//! - Tempi inside a bar: a list of `<beats>:` or `<meter>:` entries
//!
//! # Main Functions
//!
//! - [`parse_score`]: Parse a document with default options
//! - [`ScoreParser`]: Reusable parser with [`ParserOptions`]
//! - [`parse_meter`]: Parse a single meter string

pub mod error;
pub mod node;
pub mod parser;

#[cfg(test)]
mod parser_tests;

pub use error::{ParseError, Result};
pub use node::Node;
pub use parser::{parse_meter, parse_score, ParserOptions, ScoreParser};
