//! Minute based time tracking per project and day. A small daemon counts the minutes of the
//! active workspace, keeps a status line and a project tree up to date and mirrors everything
//! into a JSON file. The cli reads the same data and manages the daemon.
//!

pub mod cli;
pub mod daemon;
pub mod fs;
pub mod sync;
pub mod utils;
pub mod view;
