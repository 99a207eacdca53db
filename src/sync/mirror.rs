use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, error, info, instrument};

use crate::daemon::storage::{
    kv_store::KeyValueStore,
    ledger::{Ledger, TimeLedger},
};

use super::interaction::{FilePrompt, Notifier};

/// Suggested name of the mirror file, placed in the home directory.
pub const DEFAULT_EXPORT_FILE_NAME: &str = "vscode-time-tracker.json";

/// Result of a user initiated export or import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The prompt was dismissed. Nothing changed.
    Cancelled,
    Completed(PathBuf),
    /// Carries the message that was shown to the user.
    Failed(String),
}

pub fn default_export_target(home: &Path) -> PathBuf {
    home.join(DEFAULT_EXPORT_FILE_NAME)
}

/// Overwrites `path` with the ledger as pretty JSON. There is no partial write protection, the
/// mirror is only a copy.
pub async fn write_mirror(path: &Path, ledger: &Ledger) -> Result<()> {
    let contents = serde_json::to_string_pretty(ledger)?;
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Couldn't write {}", path.display()))
}

pub async fn read_mirror(path: &Path) -> Result<Ledger> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Couldn't read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("{} doesn't contain time tracker data", path.display()))
}

/// Writes the ledger into a file and remembers it as the auto-sync target. Without `target` the
/// user is asked, with a file in `home` as the suggestion.
#[instrument(skip_all)]
pub async fn export_ledger<S: KeyValueStore>(
    ledger: &mut TimeLedger<S>,
    target: Option<PathBuf>,
    prompt: &mut impl FilePrompt,
    notifier: &mut impl Notifier,
    home: &Path,
) -> SyncOutcome {
    let Some(path) = target.or_else(|| prompt.pick_save_target(&default_export_target(home)))
    else {
        debug!("Export cancelled");
        return SyncOutcome::Cancelled;
    };

    match export_to(ledger, &path).await {
        Ok(()) => {
            info!("Exported ledger to {path:?}");
            notifier.info(&format!("Time tracker data synced to {}", path.display()));
            SyncOutcome::Completed(path)
        }
        Err(e) => {
            error!("Export to {path:?} failed {e:?}");
            let message = format!("Failed to sync time tracker data: {e:#}");
            notifier.error(&message);
            SyncOutcome::Failed(message)
        }
    }
}

async fn export_to<S: KeyValueStore>(ledger: &mut TimeLedger<S>, path: &Path) -> Result<()> {
    // The target is kept even when writing fails, the next auto-sync may succeed.
    ledger.remember_sync_path(path).await?;
    let current = ledger.load().await?;
    write_mirror(path, &current).await
}

/// Replaces the ledger with the contents of a file and remembers it as the auto-sync target.
/// Without `source` the user is asked to pick one. Nothing changes unless the file parses.
#[instrument(skip_all)]
pub async fn import_ledger<S: KeyValueStore>(
    ledger: &mut TimeLedger<S>,
    source: Option<PathBuf>,
    prompt: &mut impl FilePrompt,
    notifier: &mut impl Notifier,
) -> SyncOutcome {
    let Some(path) = source.or_else(|| prompt.pick_open_target()) else {
        debug!("Import cancelled");
        return SyncOutcome::Cancelled;
    };

    match import_from(ledger, &path).await {
        Ok(()) => {
            info!("Imported ledger from {path:?}");
            notifier.info(&format!("Time tracker data loaded from {}", path.display()));
            SyncOutcome::Completed(path)
        }
        Err(e) => {
            error!("Import from {path:?} failed {e:?}");
            let message = format!("Failed to load time tracker data: {e:#}");
            notifier.error(&message);
            SyncOutcome::Failed(message)
        }
    }
}

async fn import_from<S: KeyValueStore>(ledger: &mut TimeLedger<S>, path: &Path) -> Result<()> {
    let imported = read_mirror(path).await?;
    // Remembered first, a failure here leaves the ledger untouched.
    ledger.remember_sync_path(path).await?;
    ledger.replace(&imported).await
}

/// Mirrors the ledger into the remembered file, if there is one. Failures only reach the log,
/// the next cycle tries again regardless.
pub async fn auto_sync<S: KeyValueStore>(ledger: &TimeLedger<S>) {
    match auto_sync_inner(ledger).await {
        Ok(Some(path)) => info!("Auto-synced time tracker data to {path:?}"),
        Ok(None) => debug!("No sync file chosen, skipping auto-sync"),
        Err(e) => error!("Failed to auto-sync time tracker data {e:?}"),
    }
}

async fn auto_sync_inner<S: KeyValueStore>(ledger: &TimeLedger<S>) -> Result<Option<PathBuf>> {
    let Some(path) = ledger.sync_path().await? else {
        return Ok(None);
    };
    let current = ledger.load().await?;
    write_mirror(&path, &current).await?;
    Ok(Some(path))
}
