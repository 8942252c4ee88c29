use std::{fmt, io};
use thiserror::Error;

/// Kind of named entity, used to give context in [`ModelError::InvalidName`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Node,
    Message,
    Signal,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameKind::Node => f.write_str("Node"),
            NameKind::Message => f.write_str("Message"),
            NameKind::Signal => f.write_str("Signal"),
        }
    }
}

/// Errors produced while verifying that a signal fits a CAN frame layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("Signal bit length cannot be zero")]
    ZeroBitLength,
    #[error("Signal bit length {length} exceeds 64 bits")]
    TooLong { length: u16 },
    #[error(
        "Out of bounds (Intel)! Signal end bit = {end}, message total bits = {total_bits} (bytes={size})"
    )]
    IntelOutOfBounds {
        end: usize,
        total_bits: usize,
        size: u8,
    },
    #[error(
        "Out of bounds (Motorola)! Signal start bit = {start}, message total bits = {total_bits} (bytes={size})"
    )]
    MotorolaStartOutOfBounds {
        start: usize,
        total_bits: usize,
        size: u8,
    },
    #[error(
        "Out of bounds (Motorola)! Signal linearized end = {end}, message total bits = {total_bits} (bytes={size})"
    )]
    MotorolaEndOutOfBounds {
        end: usize,
        total_bits: usize,
        size: u8,
    },
}

/// Structural violations of the database model (the `InvalidModel` condition).
///
/// Raised when constructing a [`Database`](crate::Database), when adding nodes,
/// messages or signals to it, and again when encoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("{kind} name '{name}' is not a valid DBC identifier")]
    InvalidName { kind: NameKind, name: String },
    #[error("Node name '{name}' is reserved for signals without receivers")]
    ReservedNodeName { name: String },
    #[error("Node '{name}' already exists")]
    NodeAlreadyExists { name: String },
    #[error("Message '{name}' already exists")]
    MessageAlreadyExists { name: String },
    #[error("Message ID {id} already assigned to message '{existing}'")]
    MessageIdAlreadyAssigned { id: u32, existing: String },
    #[error("Message '{name}' not found")]
    MessageMissing { name: String },
    #[error("Message '{message}' has an invalid payload size of {size} bytes")]
    InvalidSize { message: String, size: u8 },
    #[error("Message '{message}' has ID {id:#X}, outside the 29-bit identifier range")]
    InvalidId { message: String, id: u32 },
    #[error("Message '{message}' is sent by unknown node '{node}'")]
    UnknownSender { message: String, node: String },
    #[error("Signal '{signal}' already exists in message '{message}'")]
    SignalAlreadyExists { message: String, signal: String },
    #[error("Signal '{signal}' in message '{message}' is received by unknown node '{node}'")]
    UnknownReceiver {
        message: String,
        signal: String,
        node: String,
    },
    #[error("Signal '{signal}' does not fit message '{message}': {source}")]
    Layout {
        message: String,
        signal: String,
        #[source]
        source: LayoutError,
    },
    #[error("Signals '{first}' and '{second}' in message '{message}' overlap at bit {bit}")]
    OverlappingSignals {
        message: String,
        first: String,
        second: String,
        bit: u16,
    },
    #[error("Signal '{signal}' in message '{message}' has a zero scale")]
    ZeroScale { message: String, signal: String },
    #[error("Signal '{signal}' in message '{message}' has a non-finite {field}")]
    NonFinite {
        message: String,
        signal: String,
        field: &'static str,
    },
    #[error("Signal '{signal}' in message '{message}' has min {min} greater than max {max}")]
    InvertedRange {
        message: String,
        signal: String,
        min: f64,
        max: f64,
    },
}

impl ModelError {
    /// Name of the message the violation was found in, if any.
    pub fn message_name(&self) -> Option<&str> {
        match self {
            ModelError::InvalidSize { message, .. }
            | ModelError::InvalidId { message, .. }
            | ModelError::UnknownSender { message, .. }
            | ModelError::SignalAlreadyExists { message, .. }
            | ModelError::UnknownReceiver { message, .. }
            | ModelError::Layout { message, .. }
            | ModelError::OverlappingSignals { message, .. }
            | ModelError::ZeroScale { message, .. }
            | ModelError::NonFinite { message, .. }
            | ModelError::InvertedRange { message, .. } => Some(message.as_str()),
            ModelError::MessageAlreadyExists { name } | ModelError::MessageMissing { name } => {
                Some(name.as_str())
            }
            ModelError::MessageIdAlreadyAssigned { existing, .. } => Some(existing.as_str()),
            ModelError::InvalidName {
                kind: NameKind::Message,
                name,
            } => Some(name.as_str()),
            ModelError::InvalidName { .. }
            | ModelError::ReservedNodeName { .. }
            | ModelError::NodeAlreadyExists { .. } => None,
        }
    }
}

/// Errors produced while decoding DBC text, tagged with the 1-based line number.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(line: usize, kind: impl Into<ParseErrorKind>) -> Self {
        ParseError {
            line,
            kind: kind.into(),
        }
    }
}

/// Reason carried by a [`ParseError`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("unknown byte-order tag '{0}' (expected 0 or 1)")]
    UnknownByteOrder(String),
    #[error("unknown sign marker '{0}' (expected + or -)")]
    UnknownSign(String),
    #[error("invalid {field} '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("expected {expected} but found '{found}'")]
    Expected {
        expected: &'static str,
        found: String,
    },
    #[error("unterminated quoted string")]
    UnterminatedString,
    #[error("unexpected trailing content '{0}'")]
    TrailingContent(String),
    #[error("duplicate VERSION line")]
    DuplicateVersion,
    #[error("signal defined outside of a message")]
    SignalOutsideMessage,
    #[error("multiplexed signals are not supported (found '{0}')")]
    Multiplexing(String),
    #[error("node '{0}' is not defined")]
    UnknownNode(String),
    #[error("message ID {0} is not defined")]
    UnknownMessageId(u32),
    #[error("signal '{signal}' is not defined in message {id}")]
    UnknownSignal { id: u32, signal: String },
    #[error("value {0} is described more than once")]
    DuplicateValue(i64),
    #[error("unexpected content '{0}'")]
    UnexpectedLine(String),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Errors produced while encoding a [`Database`](crate::Database) into DBC text.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Cannot encode an invalid database: {0}")]
    InvalidModel(#[from] ModelError),
    #[error("Failed while writing DBC content. \nError: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to format DBC content")]
    Format,
}

/// Errors produced while loading a `.dbc` file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Not a valid .dbc file: {path}")]
    InvalidExtension { path: String },
    #[error("Failed to open '{path}'. \nError: {source}")]
    OpenFile {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed while reading '{path}'. \nError: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },
}

/// Errors produced while saving a [`Database`](crate::Database) into a `.dbc` file.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Output path must end in .dbc: {path}")]
    InvalidExtension { path: String },
    #[error("Failed to create directories for '{path}'. \nError: {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to create '{path}'. \nError: {source}")]
    CreateFile {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed while writing '{path}'. \nError: {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Encode(EncodeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new(7, ParseErrorKind::UnknownByteOrder("2".to_string()));
        assert_eq!(
            err.to_string(),
            "line 7: unknown byte-order tag '2' (expected 0 or 1)"
        );
    }

    #[test]
    fn test_model_error_is_transparent_inside_parse_error() {
        let model = ModelError::NodeAlreadyExists {
            name: "ECU1".to_string(),
        };
        let err = ParseError::new(3, model);
        assert_eq!(err.to_string(), "line 3: Node 'ECU1' already exists");
        assert!(matches!(err.kind, ParseErrorKind::Model(_)));
    }

    #[test]
    fn test_model_error_message_name() {
        let err = ModelError::ZeroScale {
            message: "EngineData".to_string(),
            signal: "RPM".to_string(),
        };
        assert_eq!(err.message_name(), Some("EngineData"));
        let err = ModelError::InvalidName {
            kind: NameKind::Message,
            name: "Engine Data".to_string(),
        };
        assert_eq!(err.message_name(), Some("Engine Data"));
        let err = ModelError::NodeAlreadyExists {
            name: "ECU1".to_string(),
        };
        assert_eq!(err.message_name(), None);
    }

    #[test]
    fn test_layout_error_source_chain() {
        use std::error::Error as _;

        let err = ModelError::Layout {
            message: "EngineData".to_string(),
            signal: "RPM".to_string(),
            source: LayoutError::ZeroBitLength,
        };
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("Signal bit length cannot be zero"));
    }
}
