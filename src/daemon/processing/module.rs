use anyhow::Result;

use crate::daemon::storage::tracker_event::TrackerEvent;

/// Represents an event processor. Everything that reacts to ticks sits behind it, so the
/// processing loop doesn't care what a minute or a sync means.
pub trait EventProcessor {
    fn process_next(&mut self, message: TrackerEvent) -> impl std::future::Future<Output = Result<()>>;

    fn finalize(&mut self) -> impl std::future::Future<Output = Result<()>>;
}
