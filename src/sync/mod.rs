//! Mirroring of the ledger into a user chosen JSON file. The mirror is a convenience copy: the
//! key/value store stays the source of truth.

pub mod interaction;
pub mod mirror;
