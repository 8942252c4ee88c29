//! # types
//!
//! `types` is the module containing all the public structs of the crate:
//! the in-memory database model, its bit-layout helpers and the error enums.

pub mod database;
pub mod errors;
pub mod layout;
pub mod message;
pub mod node;
pub mod signal;

/// Returns `true` when `name` can be written as a bare DBC token:
/// `[A-Za-z_][A-Za-z0-9_]*`.
pub(crate) fn is_dbc_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
