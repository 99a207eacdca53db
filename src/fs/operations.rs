use std::{io::ErrorKind, path::Path};

use anyhow::Result;
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};

/// Reads the whole file under a shared lock. A missing file reads as `None`.
pub async fn read_locked(path: &Path) -> Result<Option<String>> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => Err(e)?,
    };
    file.lock_shared()?;
    let mut contents = String::new();
    let result = file.read_to_string(&mut contents).await;
    file.unlock_async().await?;
    result?;
    Ok(Some(contents))
}

/// Read-modify-write of a whole file under an exclusive lock. `update` receives the current
/// contents (`None` when the file didn't exist) and returns what should replace them.
pub async fn update_locked(
    path: &Path,
    update: impl FnOnce(Option<String>) -> Result<Vec<u8>>,
) -> Result<()> {
    let mut file = File::options()
        .write(true)
        .create(true)
        .read(true)
        .truncate(false)
        .open(path)
        .await?;

    // Semi-safe acquire-release for a file
    file.lock_exclusive()?;
    let result = rewrite_with_file(&mut file, update).await;
    file.unlock_async().await?;
    result
}

async fn rewrite_with_file(
    file: &mut File,
    update: impl FnOnce(Option<String>) -> Result<Vec<u8>>,
) -> Result<()> {
    let mut previous = String::new();
    file.read_to_string(&mut previous).await?;
    let previous = (!previous.is_empty()).then_some(previous);

    let next = update(previous)?;

    file.rewind().await?;
    file.set_len(0).await?;
    file.write_all(&next).await?;
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use super::{read_locked, update_locked};

    #[tokio::test]
    async fn test_read_missing_file() -> Result<()> {
        let dir = tempdir()?;
        assert_eq!(read_locked(&dir.path().join("absent")).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_sees_previous_contents() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("state");

        update_locked(&path, |previous| {
            assert_eq!(previous, None);
            Ok(b"a much longer first value".to_vec())
        })
        .await?;

        update_locked(&path, |previous| {
            assert_eq!(previous.as_deref(), Some("a much longer first value"));
            Ok(b"short".to_vec())
        })
        .await?;

        // Shorter rewrites must not leave a tail of the old contents behind.
        assert_eq!(read_locked(&path).await?.as_deref(), Some("short"));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_update_keeps_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("state");
        update_locked(&path, |_| Ok(b"kept".to_vec())).await?;

        let result = update_locked(&path, |_| Err(anyhow::anyhow!("refused"))).await;

        assert!(result.is_err());
        assert_eq!(read_locked(&path).await?.as_deref(), Some("kept"));
        Ok(())
    }
}
