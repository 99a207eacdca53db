use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::kv_store::KeyValueStore;

/// Store key holding the [Ledger].
pub const LEDGER_KEY: &str = "timeTrackerDB";
/// Store key holding the last chosen mirror file.
pub const SYNC_PATH_KEY: &str = "timeTrackerSyncPath";
/// Project used when the workspace has no name.
pub const UNKNOWN_PROJECT: &str = "unknown-project";
/// Reserved for cross-project totals. Nothing writes it, and views skip it.
pub const OVERALL_KEY: &str = "overall";

/// Minutes per day for a single project. Day keys are `YYYY.MM.DD`.
pub type DayMinutes = BTreeMap<String, u64>;

/// Accumulated minutes, `project -> day -> minutes`. Serializes as the plain nested object so
/// the mirror file stays readable and editable by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger(BTreeMap<String, DayMinutes>);

impl Ledger {
    /// Adds a single minute, creating the project and the day when they are absent. Returns the
    /// new count for that day.
    pub fn record_minute(&mut self, project: &str, day: &str) -> u64 {
        let minutes = self
            .0
            .entry(project.to_owned())
            .or_default()
            .entry(day.to_owned())
            .or_insert(0);
        *minutes = minutes.saturating_add(1);
        *minutes
    }

    pub fn minutes(&self, project: &str, day: &str) -> u64 {
        self.0
            .get(project)
            .and_then(|days| days.get(day))
            .copied()
            .unwrap_or(0)
    }

    /// All time minutes of a project.
    pub fn project_total(&self, project: &str) -> u64 {
        self.days(project)
            .map(total_minutes)
            .unwrap_or(0)
    }

    pub fn days(&self, project: &str) -> Option<&DayMinutes> {
        self.0.get(project)
    }

    /// Projects in ascending key order.
    pub fn projects(&self) -> impl Iterator<Item = (&str, &DayMinutes)> {
        self.0.iter().map(|(project, days)| (project.as_str(), days))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn with_minutes(mut self, project: &str, day: &str, minutes: u64) -> Self {
        self.0
            .entry(project.to_owned())
            .or_default()
            .insert(day.to_owned(), minutes);
        self
    }
}

/// Sum over days. Imported counts can be arbitrarily large, so the sum stops at [u64::MAX].
pub fn total_minutes(days: &DayMinutes) -> u64 {
    days.values()
        .fold(0, |total, minutes| total.saturating_add(*minutes))
}

/// Ledger persisted through a [KeyValueStore]. Every operation goes through the store, so the
/// store remains the single source of truth.
pub struct TimeLedger<S> {
    store: S,
}

impl<S: KeyValueStore> TimeLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn load(&self) -> Result<Ledger> {
        self.store.get_or(LEDGER_KEY, Ledger::default()).await
    }

    /// Read and write happen as one store update, so a concurrent [TimeLedger::replace] is
    /// either counted into or lands after the new minute.
    pub async fn record_minute(&mut self, project: &str, day: &str) -> Result<u64> {
        let mut minutes = 0;
        self.store
            .update(LEDGER_KEY, |previous| {
                let mut ledger = match previous {
                    Some(value) => serde_json::from_value::<Ledger>(value)
                        .context("Stored time tracker data has an unexpected shape")?,
                    None => Ledger::default(),
                };
                minutes = ledger.record_minute(project, day);
                Ok(serde_json::to_value(&ledger)?)
            })
            .await?;
        debug!("{project} has {minutes} min on {day}");
        Ok(minutes)
    }

    pub async fn read_minutes(&self, project: &str, day: &str) -> Result<u64> {
        Ok(self.load().await?.minutes(project, day))
    }

    /// Swaps the whole stored ledger.
    pub async fn replace(&mut self, ledger: &Ledger) -> Result<()> {
        self.store.set_typed(LEDGER_KEY, ledger).await
    }

    pub async fn sync_path(&self) -> Result<Option<PathBuf>> {
        self.store.get_or(SYNC_PATH_KEY, None).await
    }

    pub async fn remember_sync_path(&mut self, path: &Path) -> Result<()> {
        self.store.set_typed(SYNC_PATH_KEY, &path).await
    }
}

/// Explicit names win, then the workspace directory name, then [UNKNOWN_PROJECT].
pub fn resolve_project_key(explicit: Option<&str>, workspace: Option<&Path>) -> String {
    explicit
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .or_else(|| {
            workspace
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned())
                .filter(|name| !name.is_empty())
        })
        .unwrap_or_else(|| UNKNOWN_PROJECT.to_owned())
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use anyhow::Result;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    use crate::daemon::storage::kv_store::{FileStore, KeyValueStore, MemoryStore};

    use super::{
        resolve_project_key, total_minutes, Ledger, TimeLedger, LEDGER_KEY, UNKNOWN_PROJECT,
    };

    /// File store that lets another process replace the ledger while an update holds the file.
    struct ContendedStore {
        inner: FileStore,
        path: PathBuf,
        replacement: Ledger,
        replacing: Option<std::thread::JoinHandle<Result<()>>>,
    }

    impl KeyValueStore for ContendedStore {
        async fn get(&self, key: &str) -> Result<Option<Value>> {
            self.inner.get(key).await
        }

        async fn set(&mut self, key: &str, value: Value) -> Result<()> {
            self.inner.set(key, value).await
        }

        async fn update(
            &mut self,
            key: &str,
            update: impl FnOnce(Option<Value>) -> Result<Value>,
        ) -> Result<()> {
            let path = self.path.clone();
            let replacement = self.replacement.clone();
            let replacing = &mut self.replacing;
            self.inner
                .update(key, |previous| {
                    *replacing = Some(std::thread::spawn(move || -> Result<()> {
                        let mut other = TimeLedger::new(FileStore::new(path)?);
                        tokio::runtime::Builder::new_current_thread()
                            .enable_all()
                            .build()?
                            .block_on(other.replace(&replacement))
                    }));
                    update(previous)
                })
                .await
        }
    }

    #[tokio::test]
    async fn test_minutes_accumulate_per_tick() -> Result<()> {
        let mut ledger = TimeLedger::new(MemoryStore::default());
        for _ in 0..42 {
            ledger.record_minute("tally", "2024.01.05").await?;
        }

        assert_eq!(ledger.read_minutes("tally", "2024.01.05").await?, 42);
        assert_eq!(ledger.read_minutes("tally", "2024.01.06").await?, 0);
        assert_eq!(ledger.read_minutes("other", "2024.01.05").await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_record_keeps_other_entries() -> Result<()> {
        let mut ledger = TimeLedger::new(MemoryStore::default());
        let initial = Ledger::default()
            .with_minutes("a", "2024.01.01", 10)
            .with_minutes("b", "2024.01.01", 3);
        ledger.replace(&initial).await?;

        ledger.record_minute("a", "2024.01.02").await?;

        let stored = ledger.load().await?;
        assert_eq!(stored.minutes("a", "2024.01.01"), 10);
        assert_eq!(stored.minutes("a", "2024.01.02"), 1);
        assert_eq!(stored.minutes("b", "2024.01.01"), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_import_during_tick_is_kept() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(FileStore::FILE_NAME);
        let imported = Ledger::default().with_minutes("imported", "2020.01.01", 500);
        let mut store = ContendedStore {
            inner: FileStore::new(path.clone())?,
            path: path.clone(),
            replacement: imported.clone(),
            replacing: None,
        };

        TimeLedger::new(&mut store)
            .record_minute("tally", "2024.01.05")
            .await?;
        store
            .replacing
            .take()
            .expect("update should have started the replacement")
            .join()
            .expect("replacement thread panicked")?;

        assert_eq!(TimeLedger::new(FileStore::new(path)?).load().await?, imported);
        Ok(())
    }

    #[tokio::test]
    async fn test_minute_saturates_at_max() -> Result<()> {
        let mut ledger = TimeLedger::new(MemoryStore::default());
        ledger
            .replace(&Ledger::default().with_minutes("tally", "2024.01.05", u64::MAX))
            .await?;

        assert_eq!(ledger.record_minute("tally", "2024.01.05").await?, u64::MAX);
        Ok(())
    }

    #[tokio::test]
    async fn test_stored_shape_is_nested_object() -> Result<()> {
        let mut store = MemoryStore::default();
        {
            let mut ledger = TimeLedger::new(&mut store);
            ledger.record_minute("tally", "2024.01.05").await?;
        }

        assert_eq!(
            store.get(LEDGER_KEY).await?,
            Some(json!({"tally": {"2024.01.05": 1}}))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_sync_path_is_remembered() -> Result<()> {
        let mut ledger = TimeLedger::new(MemoryStore::default());
        assert_eq!(ledger.sync_path().await?, None);

        ledger.remember_sync_path(Path::new("/tmp/mirror.json")).await?;

        assert_eq!(
            ledger.sync_path().await?,
            Some(PathBuf::from("/tmp/mirror.json"))
        );
        Ok(())
    }

    #[test]
    fn test_project_total_sums_days() {
        let ledger = Ledger::default()
            .with_minutes("p", "a", 10)
            .with_minutes("p", "b", 5);
        assert_eq!(ledger.project_total("p"), 15);
        assert_eq!(ledger.project_total("missing"), 0);
    }

    #[test]
    fn test_totals_saturate() {
        let ledger = Ledger::default()
            .with_minutes("p", "2024.01.01", u64::MAX)
            .with_minutes("p", "2024.01.02", 1);
        assert_eq!(ledger.project_total("p"), u64::MAX);
        assert_eq!(total_minutes(ledger.days("p").unwrap()), u64::MAX);
    }

    #[test]
    fn test_project_key_resolution() {
        assert_eq!(
            resolve_project_key(Some("named"), Some(Path::new("/work/dir"))),
            "named"
        );
        assert_eq!(
            resolve_project_key(Some("  "), Some(Path::new("/work/dir"))),
            "dir"
        );
        assert_eq!(resolve_project_key(None, Some(Path::new("/"))), UNKNOWN_PROJECT);
        assert_eq!(resolve_project_key(None, None), UNKNOWN_PROJECT);
    }
}
