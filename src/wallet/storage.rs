//! # Storage collaborators.
//!
//! - [`FileStore`] is a small text-file store (the local file cache). Each wallet
//!   gets a local (unencrypted) and an encrypted store once its durable storage
//!   is attached.
//! - [`DurableStorage`] is the storage-sync subsystem: it attaches a wallet's
//!   repository, syncs it, and announces paths changed by syncs it ran on its own.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::StorageError;
use crate::wallet::state::WalletInfo;

/// Text-file store rooted at one wallet's directory.
#[async_trait]
pub trait FileStore: Send + Sync + 'static {
    /// Reads a file. `Ok(None)` if it does not exist.
    async fn get_text(&self, path: &str) -> Result<Option<String>, StorageError>;

    /// Writes a file, creating parent folders as needed.
    async fn set_text(&self, path: &str, text: &str) -> Result<(), StorageError>;

    /// Lists file paths directly under `folder`, sorted.
    async fn list(&self, folder: &str) -> Result<Vec<String>, StorageError>;
}

/// Handles returned by a successful [`DurableStorage::attach`].
#[derive(Clone)]
pub struct AttachedStorage {
    pub local: Arc<dyn FileStore>,
    pub encrypted: Arc<dyn FileStore>,
}

/// The storage-sync subsystem, as seen by the orchestrator.
#[async_trait]
pub trait DurableStorage: Send + Sync + 'static {
    /// Attaches (opens or creates) the wallet's repository.
    async fn attach(&self, wallet_info: &WalletInfo) -> Result<AttachedStorage, StorageError>;

    /// Syncs the wallet's repository; returns the paths the sync changed.
    async fn sync(&self, wallet_id: &str) -> Result<Vec<String>, StorageError>;

    /// Receives batches of changed paths for `wallet_id` from syncs not
    /// started by the orchestrator.
    fn changes(&self, wallet_id: &str) -> broadcast::Receiver<Vec<String>>;
}
