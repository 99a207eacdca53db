//! Read-only projections of the ledger: a one line status and a project tree. Both are traits
//! with file backed implementations so that any status bar or prompt can pick them up from the
//! application directory.

pub mod status;
pub mod tree;
