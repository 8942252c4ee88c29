//! Database model.
//!
//! This module defines the in-memory **CAN database** produced by the decoder and
//! consumed by the encoder. Ownership is a plain tree: the [`Database`] owns its
//! [`Message`]s, which own their [`Signal`]s. Senders and receivers refer to
//! [`Node`]s by name.
//!
//! Every mutating helper (`add_node`, `add_message`, `add_signal`) checks the
//! invariants it can see at insertion time, and [`Database::validate`] re-checks
//! the whole tree.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::types::{
    errors::{ModelError, NameKind},
    is_dbc_identifier,
    message::Message,
    node::Node,
    signal::Signal,
};

/// In-memory representation of a CAN database (DBC).
#[derive(Default, Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Database {
    /// Database version string.
    pub version: String,
    /// Nodes (ECUs), in declaration order.
    pub nodes: Vec<Node>,
    /// Messages, in declaration order.
    pub messages: Vec<Message>,
    /// Database comment (DBC `CM_ "..."` line).
    pub comment: String,
}

impl Database {
    /// Builds a database and checks every invariant.
    ///
    /// # Errors
    /// Returns the first [`ModelError`] found: bad or duplicated names, unknown
    /// sender/receiver nodes, signals that overflow the payload or overlap, zero
    /// scale, `min > max`, invalid size or ID.
    ///
    /// # Example
    /// ```
    /// use dbc_tools::{Database, Message};
    ///
    /// let db = Database::new(
    ///     "1.0",
    ///     vec!["ECU1".into(), "ECU2".into()],
    ///     vec![Message::new(0x123, "EngineData", 8, "ECU1")],
    /// )
    /// .unwrap();
    /// assert_eq!(db.messages.len(), 1);
    ///
    /// let err = Database::new(
    ///     "1.0",
    ///     vec!["ECU1".into()],
    ///     vec![Message::new(0x123, "EngineData", 8, "Gateway")],
    /// );
    /// assert!(err.is_err());
    /// ```
    pub fn new(
        version: impl Into<String>,
        nodes: Vec<Node>,
        messages: Vec<Message>,
    ) -> Result<Self, ModelError> {
        let db = Database {
            version: version.into(),
            nodes,
            messages,
            comment: String::new(),
        };
        db.validate()?;
        Ok(db)
    }

    /// Checks every structural invariant of the database.
    ///
    /// Side-effect free and idempotent: validating a valid database always succeeds.
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut node_names: HashSet<&str> = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            check_node_name(&node.name)?;
            if !node_names.insert(node.name.as_str()) {
                return Err(ModelError::NodeAlreadyExists {
                    name: node.name.clone(),
                });
            }
        }

        let mut msg_names: HashSet<&str> = HashSet::with_capacity(self.messages.len());
        let mut msg_ids: HashMap<u32, &str> = HashMap::with_capacity(self.messages.len());
        for message in &self.messages {
            message.validate_layout()?;
            if !msg_names.insert(message.name.as_str()) {
                return Err(ModelError::MessageAlreadyExists {
                    name: message.name.clone(),
                });
            }
            if let Some(existing) = msg_ids.insert(message.id, message.name.as_str()) {
                return Err(ModelError::MessageIdAlreadyAssigned {
                    id: message.id,
                    existing: existing.to_string(),
                });
            }
            check_references(message, |name| node_names.contains(name))?;
        }
        Ok(())
    }

    // --------- Nodes --------
    /// Appends a node. Fails if the name is not an identifier or already taken.
    pub fn add_node(&mut self, node: impl Into<Node>) -> Result<(), ModelError> {
        let node: Node = node.into();
        check_node_name(&node.name)?;
        if self.has_node(&node.name) {
            return Err(ModelError::NodeAlreadyExists { name: node.name });
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Returns `true` if a node with this exact name exists.
    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.iter().any(|n| n.name == name)
    }

    /// Returns a `&Node` given the name.
    pub fn get_node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Returns a `&mut Node` given the name.
    pub fn get_node_by_name_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.name == name)
    }

    // ------------- Messages ------------
    /// Appends a message (with any signals it already holds) after checking it
    /// against the rest of the database.
    pub fn add_message(&mut self, message: Message) -> Result<(), ModelError> {
        message.validate_layout()?;
        if self.get_message_by_name(&message.name).is_some() {
            return Err(ModelError::MessageAlreadyExists { name: message.name });
        }
        if let Some(existing) = self.get_message_by_id(message.id) {
            return Err(ModelError::MessageIdAlreadyAssigned {
                id: message.id,
                existing: existing.name.clone(),
            });
        }
        check_references(&message, |name| self.has_node(name))?;
        self.messages.push(message);
        Ok(())
    }

    /// Returns a `&Message` given the name.
    pub fn get_message_by_name(&self, name: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.name == name)
    }

    /// Returns a `&mut Message` given the name.
    pub fn get_message_by_name_mut(&mut self, name: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.name == name)
    }

    /// Returns a `&Message` given the ID as written in the DBC.
    pub fn get_message_by_id(&self, id: u32) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Returns a `&mut Message` given the ID as written in the DBC.
    pub fn get_message_by_id_mut(&mut self, id: u32) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    // -------------- Signals ------------
    /// Appends a signal to the named message.
    ///
    /// Checks receivers against the node list, then delegates the layout checks
    /// to [`Message::add_signal`].
    pub fn add_signal(&mut self, message_name: &str, signal: Signal) -> Result<(), ModelError> {
        if let Some(node) = signal.receivers.iter().find(|r| !self.has_node(r.as_str())) {
            return Err(ModelError::UnknownReceiver {
                message: message_name.to_string(),
                signal: signal.name.clone(),
                node: node.clone(),
            });
        }
        let message: &mut Message =
            self.get_message_by_name_mut(message_name)
                .ok_or_else(|| ModelError::MessageMissing {
                    name: message_name.to_string(),
                })?;
        message.add_signal(signal)
    }

    /// Iterate every signal together with the message that owns it, in declaration order.
    pub fn iter_signals(&self) -> impl Iterator<Item = (&Message, &Signal)> + '_ {
        self.messages
            .iter()
            .flat_map(|m| m.signals.iter().map(move |s| (m, s)))
    }

    /// `true` when any node, message or signal carries a comment.
    pub fn has_comments(&self) -> bool {
        !self.comment.is_empty()
            || self.nodes.iter().any(|n| !n.comment.is_empty())
            || self.messages.iter().any(|m| !m.comment.is_empty())
            || self.iter_signals().any(|(_, s)| !s.comment.is_empty())
    }

    /// `true` when any message carries a cycle time or send type.
    pub fn has_message_timing(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.cycle_time.is_some() || m.send_type.is_some())
    }

    /// `true` when any signal carries a value table.
    pub fn has_value_tables(&self) -> bool {
        self.iter_signals().any(|(_, s)| !s.value_table.is_empty())
    }
}

fn check_node_name(name: &str) -> Result<(), ModelError> {
    if !is_dbc_identifier(name) {
        return Err(ModelError::InvalidName {
            kind: NameKind::Node,
            name: name.to_string(),
        });
    }
    if name == Node::PLACEHOLDER {
        return Err(ModelError::ReservedNodeName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Sender and receivers of `message` must all be known nodes.
fn check_references(
    message: &Message,
    is_known: impl Fn(&str) -> bool,
) -> Result<(), ModelError> {
    if !is_known(message.sender.as_str()) {
        return Err(ModelError::UnknownSender {
            message: message.name.clone(),
            node: message.sender.clone(),
        });
    }
    for signal in &message.signals {
        if let Some(node) = signal.receivers.iter().find(|r| !is_known(r.as_str())) {
            return Err(ModelError::UnknownReceiver {
                message: message.name.clone(),
                signal: signal.name.clone(),
                node: node.clone(),
            });
        }
    }
    Ok(())
}
