//! Per-statement decoders. One module per DBC keyword, each exposing a
//! `decode` that applies a single (joined) line to the database.

pub(crate) mod ba_;
pub(crate) mod bo_;
pub(crate) mod bu_;
pub(crate) mod cm_;
pub(crate) mod sg_;
pub(crate) mod strings;
pub(crate) mod val_;
pub(crate) mod version;
