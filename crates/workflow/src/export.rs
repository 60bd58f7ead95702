//! Local saving of the current result.

use std::future::Future;
use std::path::{Path, PathBuf};

/// Fixed file name every export is saved under.
pub const EXPORT_FILE_NAME: &str = "symbol_art.png";

/// Destination for exported artifacts.
pub trait ArtifactSink: Send + Sync {
    /// Persist `bytes` under `file_name`, returning where they landed.
    fn save(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> impl Future<Output = Result<PathBuf, std::io::Error>> + Send;
}

impl<T: ArtifactSink> ArtifactSink for std::sync::Arc<T> {
    fn save(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> impl Future<Output = Result<PathBuf, std::io::Error>> + Send {
        (**self).save(file_name, bytes)
    }
}

/// Writes exports into a directory on the local filesystem, replacing any
/// previous file of the same name.
#[derive(Debug, Clone)]
pub struct LocalDirSink {
    dir: PathBuf,
}

impl LocalDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactSink for LocalDirSink {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, std::io::Error> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let dest = self.dir.join(file_name);
        tokio::fs::write(&dest, bytes).await?;
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_writes_file_and_creates_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = LocalDirSink::new(tmp.path().join("nested/out"));

        let path = sink.save(EXPORT_FILE_NAME, b"abc").await.unwrap();
        assert_eq!(path, tmp.path().join("nested/out").join(EXPORT_FILE_NAME));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"abc");
    }

    #[tokio::test]
    async fn save_overwrites_previous_export() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = LocalDirSink::new(tmp.path());

        sink.save(EXPORT_FILE_NAME, b"first").await.unwrap();
        let path = sink.save(EXPORT_FILE_NAME, b"second").await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"second");
    }
}
