use std::time::Duration;

use anyhow::Result;
use tokio::{sync::mpsc, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::{daemon::storage::tracker_event::TrackerEvent, utils::clock::Clock};

/// Builds the event for a tick. It gets the clock so that time dependent events are evaluated at
/// the moment of firing.
pub type EventFactory = fn(&dyn Clock) -> TrackerEvent;

pub fn minute_elapsed(clock: &dyn Clock) -> TrackerEvent {
    TrackerEvent::MinuteElapsed { at: clock.time() }
}

pub fn sync_due(_: &dyn Clock) -> TrackerEvent {
    TrackerEvent::SyncDue
}

pub struct Ticker {
    name: &'static str,
    next: mpsc::Sender<TrackerEvent>,
    shutdown: CancellationToken,
    period: Duration,
    event: EventFactory,
    time_provider: Box<dyn Clock>,
}

impl Ticker {
    pub fn new(
        name: &'static str,
        next: mpsc::Sender<TrackerEvent>,
        shutdown: CancellationToken,
        period: Duration,
        event: EventFactory,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        Self {
            name,
            next,
            shutdown,
            period,
            event,
            time_provider,
        }
    }

    /// Executes the ticker loop. The first event fires one period after start.
    pub async fn run(self) -> Result<()> {
        let mut deadline = self.time_provider.instant() + self.period;
        loop {
            tokio::select! {
                // Returning drops the sender, which lets the processing module finish.
                _ = self.shutdown.cancelled() => {
                    debug!("{} ticker stopped", self.name);
                    return Ok(())
                }
                _ = self.time_provider.sleep_until(deadline) => ()
            }

            let event = (self.event)(self.time_provider.as_ref());
            debug!("{} ticker fired {:?}", self.name, event);
            self.next
                .send(event)
                .await
                .inspect_err(|e| error!("Unexpected error during sending {e:?}"))?;

            let now = self.time_provider.instant();
            let next_deadline = next_deadline(deadline, self.period, now);
            if next_deadline != deadline + self.period {
                warn!("{} ticker was late, missed ticks are dropped", self.name);
            }
            deadline = next_deadline;
        }
    }
}

/// Deadline following `previous`. Ticks that were missed while the loop was blocked or the
/// machine slept are not replayed: when the regular deadline has already passed, the schedule
/// restarts from `now`.
pub fn next_deadline(previous: Instant, period: Duration, now: Instant) -> Instant {
    let regular = previous + period;
    if regular <= now {
        now + period
    } else {
        regular
    }
}
