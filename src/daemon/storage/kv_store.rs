use std::{collections::HashMap, future::Future, path::PathBuf};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::fs::operations::{read_locked, update_locked};

/// Interface for abstracting persistent state. Values are JSON so that any serde type can be
/// stored, and so that the file representation stays readable.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Value>>>;

    fn set(&mut self, key: &str, value: Value) -> impl Future<Output = Result<()>>;

    /// Replaces the value of `key` with what `update` derives from the current one. Stores
    /// shared between processes override this so nothing can be written in between.
    fn update(
        &mut self,
        key: &str,
        update: impl FnOnce(Option<Value>) -> Result<Value>,
    ) -> impl Future<Output = Result<()>> {
        async move {
            let next = update(self.get(key).await?)?;
            self.set(key, next).await
        }
    }

    /// Typed read. Missing keys yield `default`, values of a different shape are an error.
    fn get_or<T: DeserializeOwned>(
        &self,
        key: &str,
        default: T,
    ) -> impl Future<Output = Result<T>> {
        async move {
            match self.get(key).await? {
                Some(value) => serde_json::from_value(value)
                    .with_context(|| format!("Stored value for {key} has an unexpected shape")),
                None => Ok(default),
            }
        }
    }

    fn set_typed<T: Serialize>(&mut self, key: &str, value: &T) -> impl Future<Output = Result<()>> {
        async move {
            let value = serde_json::to_value(value)?;
            self.set(key, value).await
        }
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &mut T {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Value>>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: Value) -> impl Future<Output = Result<()>> {
        (**self).set(key, value)
    }

    fn update(
        &mut self,
        key: &str,
        update: impl FnOnce(Option<Value>) -> Result<Value>,
    ) -> impl Future<Output = Result<()>> {
        (**self).update(key, update)
    }
}

/// The main realization of [KeyValueStore]. All keys share one JSON object on disk. Every
/// operation goes to the file, so a daemon and a cli invocation see each other's writes.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub const FILE_NAME: &'static str = "state.json";

    pub fn new(path: PathBuf) -> Result<Self, std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    fn parse(&self, contents: Option<String>) -> Result<Map<String, Value>> {
        match contents {
            Some(contents) if !contents.trim().is_empty() => serde_json::from_str(&contents)
                .with_context(|| format!("State file {:?} is corrupted", self.path)),
            Some(_) | None => Ok(Map::new()),
        }
    }
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let contents = read_locked(&self.path)
            .await
            .with_context(|| format!("Failed to read state file {:?}", self.path))?;
        let mut values = self.parse(contents)?;
        Ok(values.remove(key))
    }

    async fn set(&mut self, key: &str, value: Value) -> Result<()> {
        debug!("Storing {key} into {:?}", self.path);
        update_locked(&self.path, |previous| {
            let mut values = self.parse(previous)?;
            values.insert(key.to_owned(), value);
            Ok(serde_json::to_vec_pretty(&values)?)
        })
        .await
        .with_context(|| format!("Failed to write state file {:?}", self.path))
    }

    async fn update(
        &mut self,
        key: &str,
        update: impl FnOnce(Option<Value>) -> Result<Value>,
    ) -> Result<()> {
        debug!("Updating {key} in {:?}", self.path);
        update_locked(&self.path, |previous| {
            let mut values = self.parse(previous)?;
            let next = update(values.remove(key))?;
            values.insert(key.to_owned(), next);
            Ok(serde_json::to_vec_pretty(&values)?)
        })
        .await
        .with_context(|| format!("Failed to update state file {:?}", self.path))
    }
}

/// Keeps everything in memory. Used where persistence isn't wanted, mostly in tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, Value>,
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.get(key).cloned())
    }

    async fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_owned(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use serde_json::json;
    use tempfile::tempdir;

    use super::{FileStore, KeyValueStore, MemoryStore};

    #[tokio::test]
    async fn test_file_store_missing_file_is_empty() -> Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path().join(FileStore::FILE_NAME))?;

        assert_eq!(store.get("anything").await?, None);
        assert_eq!(store.get_or("anything", 7u64).await?, 7);
        Ok(())
    }

    #[tokio::test]
    async fn test_file_store_survives_reopening() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join(FileStore::FILE_NAME);
        {
            let mut store = FileStore::new(path.clone())?;
            store.set("first", json!({"a": 1})).await?;
            store.set("second", json!("value")).await?;
            store.set("first", json!({"a": 2})).await?;
        }

        let store = FileStore::new(path)?;
        assert_eq!(store.get("first").await?, Some(json!({"a": 2})));
        assert_eq!(store.get_or("second", String::new()).await?, "value");
        Ok(())
    }

    #[tokio::test]
    async fn test_file_store_rejects_corrupted_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(FileStore::FILE_NAME);
        std::fs::write(&path, "{ definitely not json")?;
        let store = FileStore::new(path)?;

        assert!(store.get("key").await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_sees_current_value() -> Result<()> {
        let dir = tempdir()?;
        let mut store = FileStore::new(dir.path().join(FileStore::FILE_NAME))?;
        store.set("other", json!(1)).await?;

        store
            .update("count", |previous| {
                assert_eq!(previous, None);
                Ok(json!(1))
            })
            .await?;
        store
            .update("count", |previous| {
                assert_eq!(previous, Some(json!(1)));
                Ok(json!(2))
            })
            .await?;

        assert_eq!(store.get("count").await?, Some(json!(2)));
        assert_eq!(store.get("other").await?, Some(json!(1)));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_update_keeps_value() -> Result<()> {
        let mut store = MemoryStore::default();
        store.set("count", json!(1)).await?;

        let result = store
            .update("count", |_| Err(anyhow::anyhow!("refused")))
            .await;

        assert!(result.is_err());
        assert_eq!(store.get("count").await?, Some(json!(1)));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_or_rejects_wrong_shape() -> Result<()> {
        let mut store = MemoryStore::default();
        store.set("count", json!("twelve")).await?;

        assert!(store.get_or("count", 0u64).await.is_err());
        Ok(())
    }
}
