//! Writing harvested documents and metadata to disk.

pub mod naming;
pub mod table;

pub use table::OutputTable;

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cannot create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output table: {0}")]
    Table(#[from] csv::Error),
}

/// What happens when the target file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistMode {
    /// Replace the existing file.
    Overwrite,
    /// Keep the existing file and report it as already downloaded.
    SkipExisting,
}

/// Where a document will live, decided before any bytes are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Fresh(PathBuf),
    Existing(PathBuf),
}

impl Placement {
    pub fn path(&self) -> &Path {
        match self {
            Placement::Fresh(path) | Placement::Existing(path) => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persisted {
    pub path: PathBuf,
    pub written: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Persister {
    mode: PersistMode,
}

impl Persister {
    pub fn new(mode: PersistMode) -> Self {
        Self { mode }
    }

    /// Create `dir` if needed and decide the target path for `file_name`.
    pub async fn place(&self, dir: &Path, file_name: &str) -> Result<Placement, StorageError> {
        fs::create_dir_all(dir)
            .await
            .map_err(|source| StorageError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;

        let path = dir.join(file_name);
        if self.mode == PersistMode::SkipExisting && fs::try_exists(&path).await.unwrap_or(false) {
            debug!(path = %path.display(), "file already exists");
            return Ok(Placement::Existing(path));
        }
        Ok(Placement::Fresh(path))
    }

    pub async fn write(
        &self,
        dir: &Path,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<Persisted, StorageError> {
        match self.place(dir, file_name).await? {
            Placement::Existing(path) => Ok(Persisted {
                path,
                written: false,
            }),
            Placement::Fresh(path) => {
                fs::write(&path, bytes)
                    .await
                    .map_err(|source| StorageError::Write {
                        path: path.clone(),
                        source,
                    })?;
                Ok(Persisted {
                    path,
                    written: true,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn creates_nested_directories() {
        let root = tempdir().unwrap();
        let dir = root.path().join("22").join("summer");

        let persister = Persister::new(PersistMode::Overwrite);
        let persisted = persister.write(&dir, "paper.pdf", b"%PDF-1.7").await.unwrap();

        assert!(persisted.written);
        assert_eq!(persisted.path, dir.join("paper.pdf"));
        assert_eq!(std::fs::read(&persisted.path).unwrap(), b"%PDF-1.7");
    }

    #[tokio::test]
    async fn skip_existing_leaves_file_untouched() {
        let root = tempdir().unwrap();
        let target = root.path().join("paper.pdf");
        std::fs::write(&target, b"original").unwrap();

        let persister = Persister::new(PersistMode::SkipExisting);
        let persisted = persister
            .write(root.path(), "paper.pdf", b"replacement")
            .await
            .unwrap();

        assert!(!persisted.written);
        assert_eq!(persisted.path, target);
        assert_eq!(std::fs::read(&target).unwrap(), b"original");
    }

    #[tokio::test]
    async fn overwrite_replaces_file() {
        let root = tempdir().unwrap();
        let target = root.path().join("paper.pdf");
        std::fs::write(&target, b"original").unwrap();

        let persister = Persister::new(PersistMode::Overwrite);
        let persisted = persister
            .write(root.path(), "paper.pdf", b"replacement")
            .await
            .unwrap();

        assert!(persisted.written);
        assert_eq!(std::fs::read(&target).unwrap(), b"replacement");
    }

    #[tokio::test]
    async fn place_reports_existing_only_in_skip_mode() {
        let root = tempdir().unwrap();
        std::fs::write(root.path().join("a.pdf"), b"x").unwrap();

        let skip = Persister::new(PersistMode::SkipExisting);
        assert!(matches!(
            skip.place(root.path(), "a.pdf").await.unwrap(),
            Placement::Existing(_)
        ));
        assert!(matches!(
            skip.place(root.path(), "b.pdf").await.unwrap(),
            Placement::Fresh(_)
        ));

        let overwrite = Persister::new(PersistMode::Overwrite);
        assert!(matches!(
            overwrite.place(root.path(), "a.pdf").await.unwrap(),
            Placement::Fresh(_)
        ));
    }

    #[tokio::test]
    async fn directory_creation_failure() {
        let root = tempdir().unwrap();
        let blocker = root.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let persister = Persister::new(PersistMode::Overwrite);
        let err = persister
            .write(&blocker.join("sub"), "a.pdf", b"x")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::CreateDir { .. }));
    }
}
