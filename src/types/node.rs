use serde::{Deserialize, Serialize};

/// Represents a node (ECU) in a CAN network as defined in a DBC file.
///
/// A `Node` identifies a physical or logical unit in the CAN system
/// that can transmit or receive messages. Messages and signals refer to
/// nodes by name.
///
/// # Example
/// ```
/// use dbc_tools::Node;
///
/// let node: Node = "Motor".into();
/// assert_eq!(node.name, "Motor");
/// assert!(node.comment.is_empty());
/// ```
#[derive(Default, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    pub name: String,
    /// Associated comment (DBC `CM_ BU_` section).
    pub comment: String,
}

impl Node {
    /// Name DBC tools write in place of a missing receiver.
    /// It cannot be used for a real node.
    pub const PLACEHOLDER: &'static str = "Vector__XXX";

    pub fn new(name: impl Into<String>) -> Self {
        Node {
            name: name.into(),
            comment: String::new(),
        }
    }
}

impl From<&str> for Node {
    fn from(name: &str) -> Self {
        Node::new(name)
    }
}

impl From<String> for Node {
    fn from(name: String) -> Self {
        Node::new(name)
    }
}
