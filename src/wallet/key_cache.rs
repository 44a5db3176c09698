//! # Public-key cache.
//!
//! Derived public keys are persisted in the wallet's local store as
//! `{"walletInfo": {"id": ..., "type": ..., "keys": {...}}}` at a fixed path.
//!
//! ## Rules
//! - A missing, unreadable or malformed file is a cache miss, never an error.
//! - A cached entry with empty keys is a miss too.
//! - Empty key sets are never written, so a non-empty entry can never be
//!   replaced by an empty one.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::wallet::plugin::CurrencyPlugin;
use crate::wallet::state::{JsonObject, WalletInfo};
use crate::wallet::storage::FileStore;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheFile {
    wallet_info: WalletInfo,
}

/// Reader/writer for one wallet's public-key cache file.
pub struct PublicKeyCache {
    store: Arc<dyn FileStore>,
    path: String,
}

impl PublicKeyCache {
    pub fn new(store: Arc<dyn FileStore>, path: impl Into<String>) -> Self {
        Self {
            store,
            path: path.into(),
        }
    }

    /// Loads the cached public info, if present and non-empty.
    pub async fn load(&self) -> Option<WalletInfo> {
        let text = match self.store.get_text(&self.path).await {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(path = %self.path, error = %e, "public key cache unreadable");
                return None;
            }
        };
        match serde_json::from_str::<CacheFile>(&text) {
            Ok(file) if !file.wallet_info.keys.is_empty() => Some(file.wallet_info),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(path = %self.path, error = %e, "public key cache malformed");
                None
            }
        }
    }

    /// Persists `info`. Returns `Ok(false)` without writing if its keys are empty.
    pub async fn save(&self, info: &WalletInfo) -> Result<bool, StorageError> {
        if info.keys.is_empty() {
            return Ok(false);
        }
        let text = serde_json::to_string(&CacheFile {
            wallet_info: info.clone(),
        })?;
        self.store.set_text(&self.path, &text).await?;
        Ok(true)
    }
}

/// Produces the wallet's public info: cache first, then best-effort derivation.
///
/// A derivation failure yields empty keys. A fresh non-empty derivation is
/// written to the cache; a failed write is logged and otherwise ignored.
pub async fn resolve_public_info(
    plugin: &dyn CurrencyPlugin,
    wallet_info: &WalletInfo,
    cache: &PublicKeyCache,
) -> WalletInfo {
    if let Some(cached) = cache.load().await {
        return cached;
    }

    let keys = match plugin.derive_public_key(wallet_info).await {
        Ok(keys) => keys,
        Err(e) => {
            tracing::debug!(wallet = %wallet_info.id, error = %e, "public key derivation failed; using empty keys");
            JsonObject::new()
        }
    };
    let public = WalletInfo::new(wallet_info.id.clone(), wallet_info.wallet_type.clone(), keys);

    if let Err(e) = cache.save(&public).await {
        tracing::warn!(wallet = %wallet_info.id, error = %e, "public key cache write failed");
    }
    public
}
