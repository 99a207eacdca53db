use chrono::{DateTime, Local};

/// Events produced by the tickers and handled, in order, by the processing module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    /// One minute passed. `at` is the wall-clock time the tick fired at, which decides the day.
    MinuteElapsed { at: DateTime<Local> },
    /// Time to mirror the ledger into the remembered sync file.
    SyncDue,
}
