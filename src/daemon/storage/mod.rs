//!  Storage is organized through [kv_store::KeyValueStore].
//!  The basic idea is:
//!   - There is one key/value store for the whole user profile. It survives restarts.
//!   - The ledger lives under a single key as `project -> day -> minutes`.
//!   - The remembered mirror path lives next to it under its own key.

pub mod kv_store;
pub mod ledger;
pub mod tracker_event;
