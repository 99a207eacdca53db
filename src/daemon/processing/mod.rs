use anyhow::Result;
use module::EventProcessor;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, error, info_span, trace, Instrument};

use super::storage::tracker_event::TrackerEvent;

pub mod module;
pub mod tracker;

/// The single logic loop of the daemon. Events from all tickers arrive here and are handled one
/// at a time, so the ledger never sees concurrent writers from this process.
pub struct ProcessingModule<Processor> {
    receiver: Receiver<TrackerEvent>,
    processor: Processor,
}

impl<P: EventProcessor> ProcessingModule<P> {
    pub fn new(receiver: Receiver<TrackerEvent>, processor: P) -> Self {
        Self {
            receiver,
            processor,
        }
    }

    /// Runs until every sender is dropped, then finalizes the processor.
    pub async fn run(mut self) -> Result<()> {
        while let Some(event) = self.receiver.recv().await {
            debug!("Processing event {:?}", event);
            let span = info_span!("Processing tracker event");
            // A failed event never stops the loop, the next tick proceeds regardless.
            match self.processor.process_next(event.clone()).instrument(span).await {
                Ok(_) => {
                    trace!("Processed event {:?}", event)
                }
                Err(e) => {
                    error!("Error processing event {:?}: {e:?}", event)
                }
            }
        }

        let result = self.processor.finalize().await;
        self.receiver.close();
        result
    }
}
