use std::{future::Future, io::ErrorKind, path::PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::daemon::storage::ledger::Ledger;

pub const STATUS_ICON: &str = "⏱";

pub fn format_status(project: &str, minutes: u64) -> String {
    format!("{STATUS_ICON} {project}: {minutes} min")
}

/// Somewhere a single status line can be displayed.
pub trait StatusIndicator {
    fn show(&mut self, text: &str) -> impl Future<Output = Result<()>>;

    /// Releases the indicator. Calling it again is a no-op.
    fn dispose(&mut self) -> impl Future<Output = Result<()>>;
}

/// Keeps today's count of the active project on the indicator.
pub struct StatusPresenter<I> {
    project: String,
    indicator: I,
}

impl<I: StatusIndicator> StatusPresenter<I> {
    pub fn new(project: String, indicator: I) -> Self {
        Self { project, indicator }
    }

    pub async fn refresh(&mut self, ledger: &Ledger, today: &str) -> Result<()> {
        let text = format_status(&self.project, ledger.minutes(&self.project, today));
        debug!("Status {text}");
        self.indicator.show(&text).await
    }

    pub async fn dispose(&mut self) -> Result<()> {
        self.indicator.dispose().await
    }
}

/// Writes the status line into a file, so shell prompts and editor status bars can read it.
pub struct StatusFile {
    path: PathBuf,
    disposed: bool,
}

impl StatusFile {
    pub const FILE_NAME: &'static str = "status";

    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            disposed: false,
        }
    }
}

impl StatusIndicator for StatusFile {
    async fn show(&mut self, text: &str) -> Result<()> {
        self.disposed = false;
        tokio::fs::write(&self.path, format!("{text}\n"))
            .await
            .with_context(|| format!("Failed to write status to {:?}", self.path))
    }

    async fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        info!("Removing status {:?}", self.path);
        match tokio::fs::remove_file(&self.path).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
