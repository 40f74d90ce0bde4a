use std::fmt;

/// A node of a decoded score document.
///
/// Any structured-text decoder's output can be normalised into this shape.
/// Mappings keep their keys in document order; keys that were not strings in
/// the source (`5:` in YAML) are stored as their textual form.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Node>),
    Mapping(Vec<(String, Node)>),
}

impl Node {
    /// Build a mapping from key/value pairs, keeping their order
    pub fn mapping<K, V, I>(entries: I) -> Node
    where
        K: Into<String>,
        V: Into<Node>,
        I: IntoIterator<Item = (K, V)>,
    {
        Node::Mapping(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    /// Try to extract a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to extract a list
    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(list) => Some(list),
            _ => None,
        }
    }

    /// Try to extract mapping entries
    pub fn as_mapping(&self) -> Option<&[(String, Node)]> {
        match self {
            Node::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// First value stored under `key`, if this is a mapping
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    /// Text used when this node appears as a mapping key
    fn into_key(self) -> String {
        match self {
            Node::String(s) => s,
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Null => write!(f, "null"),
            Node::Bool(b) => write!(f, "{}", b),
            Node::Integer(n) => write!(f, "{}", n),
            Node::Float(n) => write!(f, "{}", n),
            Node::String(s) => write!(f, "{:?}", s),
            Node::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Node::Mapping(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Bool(b)
    }
}

impl From<i64> for Node {
    fn from(n: i64) -> Self {
        Node::Integer(n)
    }
}

impl From<f64> for Node {
    fn from(n: f64) -> Self {
        Node::Float(n)
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::String(s)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::String(s.to_string())
    }
}

impl From<Vec<Node>> for Node {
    fn from(list: Vec<Node>) -> Self {
        Node::List(list)
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(value: Option<T>) -> Self {
        value.map_or(Node::Null, Into::into)
    }
}

impl From<serde_yaml::Value> for Node {
    fn from(value: serde_yaml::Value) -> Self {
        use serde_yaml::Value;

        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Node::Integer(i),
                None => Node::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Node::String(s),
            Value::Sequence(items) => Node::List(items.into_iter().map(Node::from).collect()),
            Value::Mapping(entries) => Node::Mapping(
                entries
                    .into_iter()
                    .map(|(key, value)| (Node::from(key).into_key(), Node::from(value)))
                    .collect(),
            ),
            Value::Tagged(tagged) => Node::from(tagged.value),
        }
    }
}

impl From<serde_json::Value> for Node {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Node::Integer(i),
                None => Node::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Node::String(s),
            Value::Array(items) => Node::List(items.into_iter().map(Node::from).collect()),
            Value::Object(entries) => Node::Mapping(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Node::from(value)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_accessors() {
        let node = Node::mapping([("4/4", Node::Null), ("tempo", Node::Integer(120))]);
        assert_eq!(node.get("tempo"), Some(&Node::Integer(120)));
        assert!(node.get("4/4").map_or(false, Node::is_null));
        assert_eq!(node.get("missing"), None);
        assert_eq!(Node::from("3/4").as_str(), Some("3/4"));
        assert_eq!(Node::from(vec![Node::Null]).as_list().map(<[Node]>::len), Some(1));
    }

    #[test]
    fn test_node_display() {
        let node = Node::List(vec![
            Node::from("4/4"),
            Node::mapping([("tempo", 60.5)]),
            Node::Bool(true),
        ]);
        assert_eq!(node.to_string(), r#"["4/4", {"tempo": 60.5}, true]"#);
    }

    #[test]
    fn test_from_yaml_keeps_order_and_stringifies_keys() {
        let yaml = "- 5/4:\n    - 5:\n      tempo: 240\n  tempo_change: 30\n";
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        let node = Node::from(value);

        let element = &node.as_list().unwrap()[0];
        let keys: Vec<&str> = element
            .as_mapping()
            .unwrap()
            .iter()
            .map(|(key, _)| key.as_str())
            .collect();
        assert_eq!(keys, vec!["5/4", "tempo_change"]);

        let nested = &element.get("5/4").unwrap().as_list().unwrap()[0];
        assert_eq!(nested.get("5"), Some(&Node::Null));
        assert_eq!(nested.get("tempo"), Some(&Node::Integer(240)));
    }

    #[test]
    fn test_from_json() {
        let value: serde_json::Value =
            serde_json::from_str(r#"[{"4/4": {"tempo": 92.5}}, "3/8 x 2", true]"#).unwrap();
        let node = Node::from(value);
        let elements = node.as_list().unwrap();
        assert_eq!(
            elements[0].get("4/4").and_then(|attributes| attributes.get("tempo")),
            Some(&Node::Float(92.5))
        );
        assert_eq!(elements[1], Node::from("3/8 x 2"));
        assert_eq!(elements[2], Node::Bool(true));
    }
}
