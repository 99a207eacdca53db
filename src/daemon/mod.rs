use std::{path::Path, time::Duration};

use anyhow::Result;
use processing::{tracker::Tracker, ProcessingModule};
use storage::{
    kv_store::{FileStore, KeyValueStore},
    ledger::TimeLedger,
    tracker_event::TrackerEvent,
};
use timer::ticker::{minute_elapsed, sync_due, EventFactory, Ticker};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    utils::clock::{Clock, DefaultClock},
    view::{status::StatusFile, tree::TreeSnapshotFile},
};

pub mod args;
pub mod processing;
pub mod shutdown;
pub mod storage;
pub mod timer;

pub const MINUTE_PERIOD: Duration = Duration::from_secs(60);
pub const AUTO_SYNC_PERIOD: Duration = Duration::from_secs(300);

/// Represents the starting point for the daemon. Activation shows the views and starts both
/// tickers, Ctrl-C deactivates.
pub async fn start_daemon(dir: &Path, project: String) -> Result<()> {
    let shutdown_token = CancellationToken::new();

    let (tracking, _) = tokio::join!(
        async {
            let result = run_tracker(dir, project, &shutdown_token, DefaultClock).await;
            // Lets signal detection finish when the tracker couldn't start.
            shutdown_token.cancel();
            result
        },
        shutdown::detect_shutdown(shutdown_token.clone()),
    );
    tracking
}

async fn run_tracker(
    dir: &Path,
    project: String,
    shutdown_token: &CancellationToken,
    clock: impl Clock + Clone,
) -> Result<()> {
    let (sender, receiver) = mpsc::channel::<TrackerEvent>(10);

    let store = FileStore::new(dir.join(FileStore::FILE_NAME))?;
    let mut tracker = create_tracker(dir, store, project);
    if let Err(e) = tracker.activate(clock.time()).await {
        error!("Failed to show initial state {e:?}");
    }
    let processor = ProcessingModule::new(receiver, tracker);

    let minutes = create_ticker(
        "minute",
        sender.clone(),
        shutdown_token,
        MINUTE_PERIOD,
        minute_elapsed,
        clock.clone(),
    );
    let syncs = create_ticker(
        "auto-sync",
        sender,
        shutdown_token,
        AUTO_SYNC_PERIOD,
        sync_due,
        clock,
    );

    info!("Tracker activated");
    let (minute_result, sync_result, processing_result) =
        tokio::join!(minutes.run(), syncs.run(), processor.run());

    if let Err(minute_result) = minute_result {
        error!("Minute ticker got an error {:?}", minute_result);
    }

    if let Err(sync_result) = sync_result {
        error!("Auto-sync ticker got an error {:?}", sync_result);
    }

    if let Err(processing_result) = processing_result {
        error!("Processing module got an error {:?}", processing_result);
    }

    info!("Tracker deactivated");
    Ok(())
}

fn create_tracker<S: KeyValueStore>(
    dir: &Path,
    store: S,
    project: String,
) -> Tracker<S, StatusFile, TreeSnapshotFile> {
    Tracker::new(
        TimeLedger::new(store),
        project,
        StatusFile::new(dir.join(StatusFile::FILE_NAME)),
        TreeSnapshotFile::new(dir.join(TreeSnapshotFile::FILE_NAME)),
    )
}

fn create_ticker(
    name: &'static str,
    sender: mpsc::Sender<TrackerEvent>,
    shutdown_token: &CancellationToken,
    period: Duration,
    event: EventFactory,
    clock: impl Clock,
) -> Ticker {
    Ticker::new(
        name,
        sender,
        shutdown_token.clone(),
        period,
        event,
        Box::new(clock),
    )
}
