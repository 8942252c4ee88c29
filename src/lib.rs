//! # dbc_tools
//!
//! Rust utilities for reading, validating and writing **CAN databases** (`.dbc`).
//!
//! ## Highlights
//! - **Model**: a plain ownership tree, [`Database`] → [`Message`] → [`Signal`],
//!   with nodes referenced by name. Every constructor and `add_*` helper checks
//!   names, payload sizes, Intel/Motorola bit layouts and signal overlaps.
//! - **Encoder**: deterministic DBC text in two layouts ([`Dialect::Legacy`],
//!   [`Dialect::Standard`]), plus comments and value tables.
//! - **Decoder**: strict line-oriented parser that reports the offending line
//!   number, accepts both layouts and skips sections the model does not carry.
//! - **Lint**: naming, ID-band and timing checks on top of structural validity.
//! - **Bus load**: worst-case load estimate from message cycle times.
//!
//! ```
//! use dbc_tools::{decode, encode, dbc};
//!
//! let db = dbc::reference_database();
//! let text = encode(&db).unwrap();
//! assert_eq!(decode(&text).unwrap(), db);
//! ```

pub mod busload;
pub mod dbc;
pub mod lint;
pub mod types;

// Top-level re-exports
#[doc(inline)]
pub use crate::types::{
    database::Database,
    errors::{
        EncodeError, LayoutError, LoadError, ModelError, NameKind, ParseError, ParseErrorKind,
        SaveError,
    },
    message::{FrameKind, IdFormat, Message},
    node::Node,
    signal::{Endianness, Signal},
};

pub use crate::dbc::{
    Dialect, EncodeOptions, decode, encode, encode_with, from_file, save_to_file,
};
