//! # dbc
//!
//! `dbc` is the module to read and write .dbc files.
//!
//! - [`decode`] / [`from_file`] turn DBC text into a [`Database`](crate::Database).
//! - [`encode`] / [`encode_with`] / [`save_to_file`] do the reverse, in the
//!   layout selected by [`EncodeOptions`].

pub(crate) mod core;
pub mod create;
pub mod dialect;
pub mod parse;
pub mod save;

pub use create::reference_database;
pub use dialect::{Dialect, EncodeOptions, UnknownDialect};
pub use parse::{decode, from_file};
pub use save::{encode, encode_to_writer, encode_with, save_to_file};
