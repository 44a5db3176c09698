//! # In-memory collaborators.
//!
//! [`MemoryStore`] is a [`FileStore`] over a sorted map. [`MemoryStorage`] is a
//! [`DurableStorage`] whose repositories are pairs of memory stores; tests and
//! embedders drive it by staging sync results and announcing remote changes.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::StorageError;
use crate::wallet::{AttachedStorage, DurableStorage, FileStore, WalletInfo};

/// Text files held in memory.
#[derive(Default, Debug)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn files(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn get_text(&self, path: &str) -> Result<Option<String>, StorageError> {
        Ok(self.files().get(path).cloned())
    }

    async fn set_text(&self, path: &str, text: &str) -> Result<(), StorageError> {
        self.files().insert(path.to_string(), text.to_string());
        Ok(())
    }

    async fn list(&self, folder: &str) -> Result<Vec<String>, StorageError> {
        let prefix = format!("{}/", folder.trim_end_matches('/'));
        Ok(self
            .files()
            .keys()
            .filter(|k| k.strip_prefix(&prefix).is_some_and(|rest| !rest.contains('/')))
            .cloned()
            .collect())
    }
}

struct Repo {
    local: Arc<MemoryStore>,
    encrypted: Arc<MemoryStore>,
    staged: Vec<String>,
    changes: broadcast::Sender<Vec<String>>,
}

impl Repo {
    fn new() -> Self {
        let (changes, _rx) = broadcast::channel(16);
        Self {
            local: Arc::new(MemoryStore::new()),
            encrypted: Arc::new(MemoryStore::new()),
            staged: Vec::new(),
            changes,
        }
    }
}

#[derive(Default)]
struct Inner {
    repos: HashMap<String, Repo>,
    attached: Vec<String>,
    fail_attach: bool,
    fail_sync: bool,
    sync_calls: usize,
}

/// Durable storage whose repositories live in memory.
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `attach` fails.
    pub fn failing_attach(self) -> Self {
        self.lock().fail_attach = true;
        self
    }

    /// Every `sync` fails.
    pub fn failing_sync(self) -> Self {
        self.lock().fail_sync = true;
        self
    }

    /// Local store of `wallet_id` (created on first use).
    pub fn local(&self, wallet_id: &str) -> Arc<MemoryStore> {
        self.with_repo(wallet_id, |r| r.local.clone())
    }

    /// Encrypted store of `wallet_id` (created on first use).
    pub fn encrypted(&self, wallet_id: &str) -> Arc<MemoryStore> {
        self.with_repo(wallet_id, |r| r.encrypted.clone())
    }

    /// Paths the next `sync` of `wallet_id` reports as changed.
    pub fn stage_changes(&self, wallet_id: &str, paths: Vec<String>) {
        self.with_repo(wallet_id, |r| r.staged.extend(paths));
    }

    /// Announces a change made by a sync the orchestrator did not run.
    pub fn announce(&self, wallet_id: &str, paths: Vec<String>) {
        self.with_repo(wallet_id, |r| {
            let _ = r.changes.send(paths);
        });
    }

    pub fn sync_calls(&self) -> usize {
        self.lock().sync_calls
    }

    /// Wallet ids attached so far, in attach order.
    pub fn attached(&self) -> Vec<String> {
        self.lock().attached.clone()
    }

    fn with_repo<R>(&self, wallet_id: &str, f: impl FnOnce(&mut Repo) -> R) -> R {
        let mut inner = self.lock();
        f(inner
            .repos
            .entry(wallet_id.to_string())
            .or_insert_with(Repo::new))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DurableStorage for MemoryStorage {
    async fn attach(&self, wallet_info: &WalletInfo) -> Result<AttachedStorage, StorageError> {
        if self.lock().fail_attach {
            return Err(StorageError::Failed {
                error: format!("cannot attach {}", wallet_info.id),
            });
        }
        self.lock().attached.push(wallet_info.id.clone());
        Ok(self.with_repo(&wallet_info.id, |r| AttachedStorage {
            local: r.local.clone(),
            encrypted: r.encrypted.clone(),
        }))
    }

    async fn sync(&self, wallet_id: &str) -> Result<Vec<String>, StorageError> {
        let mut inner = self.lock();
        inner.sync_calls += 1;
        if inner.fail_sync {
            return Err(StorageError::Failed {
                error: "sync server unreachable".into(),
            });
        }
        let repo = inner
            .repos
            .entry(wallet_id.to_string())
            .or_insert_with(Repo::new);
        Ok(std::mem::take(&mut repo.staged))
    }

    fn changes(&self, wallet_id: &str) -> broadcast::Receiver<Vec<String>> {
        self.with_repo(wallet_id, |r| r.changes.subscribe())
    }
}
