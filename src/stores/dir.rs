//! # Filesystem-backed file store.
//!
//! [`DirStore`] maps store paths (`a/b.json`) onto files under a root directory.
//! Paths must be relative and may not climb out of the root.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::error::StorageError;
use crate::wallet::FileStore;

/// Text files under one directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let rel = Path::new(path);
        let ok = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !ok {
            return Err(StorageError::Malformed {
                path: path.to_string(),
                reason: "path must be relative and stay inside the store".into(),
            });
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl FileStore for DirStore {
    async fn get_text(&self, path: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.resolve(path)?).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_text(&self, path: &str, text: &str) -> Result<(), StorageError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(full, text).await?;
        Ok(())
    }

    async fn list(&self, folder: &str) -> Result<Vec<String>, StorageError> {
        let dir = self.resolve(folder)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let folder = folder.trim_end_matches('/');
        let mut out = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                out.push(format!("{folder}/{name}"));
            }
        }
        out.sort();
        Ok(out)
    }
}
