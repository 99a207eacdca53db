use anyhow::Result;
use chrono::{DateTime, Local};
use tracing::info;

use crate::{
    daemon::storage::{kv_store::KeyValueStore, ledger::TimeLedger, tracker_event::TrackerEvent},
    sync::mirror::auto_sync,
    utils::time::day_key,
    view::{
        status::{StatusIndicator, StatusPresenter},
        tree::TreeView,
    },
};

use super::module::EventProcessor;

/// Bridges the tickers with the ledger and the views. Every recorded minute is followed by a
/// refresh of both the status line and the project tree.
pub struct Tracker<S, I, T> {
    ledger: TimeLedger<S>,
    project: String,
    status: StatusPresenter<I>,
    tree: T,
    finalized: bool,
}

impl<S: KeyValueStore, I: StatusIndicator, T: TreeView> Tracker<S, I, T> {
    pub fn new(ledger: TimeLedger<S>, project: String, indicator: I, tree: T) -> Self {
        Self {
            ledger,
            status: StatusPresenter::new(project.clone(), indicator),
            project,
            tree,
            finalized: false,
        }
    }

    /// Shows the views before the first tick arrives.
    pub async fn activate(&mut self, now: DateTime<Local>) -> Result<()> {
        info!("Tracking {}", self.project);
        self.refresh_views(&day_key(&now)).await
    }

    async fn record_minute(&mut self, at: DateTime<Local>) -> Result<()> {
        // The day is taken from the moment the tick fired, a tick right after midnight belongs
        // to the new day.
        let day = day_key(&at);
        self.ledger.record_minute(&self.project, &day).await?;
        self.refresh_views(&day).await
    }

    async fn refresh_views(&mut self, today: &str) -> Result<()> {
        let ledger = self.ledger.load().await?;
        self.status.refresh(&ledger, today).await?;
        self.tree.refresh(&ledger).await
    }
}

impl<S: KeyValueStore, I: StatusIndicator, T: TreeView> EventProcessor for Tracker<S, I, T> {
    async fn process_next(&mut self, message: TrackerEvent) -> Result<()> {
        match message {
            TrackerEvent::MinuteElapsed { at } => self.record_minute(at).await,
            TrackerEvent::SyncDue => {
                auto_sync(&self.ledger).await;
                Ok(())
            }
        }
    }

    async fn finalize(&mut self) -> Result<()> {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;
        info!("Stopped tracking {}", self.project);
        self.status.dispose().await
    }
}
