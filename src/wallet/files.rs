//! # Wallet file reload.
//!
//! Reads the wallet's cached files from its encrypted store and dispatches the
//! results:
//!
//! | File | Event | Missing file |
//! |---|---|---|
//! | `WalletName.json` `{"walletName": ...}` | `NameLoaded` | `name: None` |
//! | `Currency.json` `{"fiat": ...}` | `FiatLoaded` | `iso:USD` |
//! | `transaction/*` | `FileNamesLoaded` | empty list |
//!
//! A malformed file still dispatches the default so the wallet can proceed; the
//! first failure is returned for the error channel.

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::events::{Dispatcher, EventKind};
use crate::wallet::storage::FileStore;

pub const NAME_FILE: &str = "WalletName.json";
pub const FIAT_FILE: &str = "Currency.json";
pub const TRANSACTION_FOLDER: &str = "transaction";
pub const DEFAULT_FIAT: &str = "iso:USD";

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NameFile {
    #[serde(default)]
    pub wallet_name: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct FiatFile {
    pub fiat: String,
}

/// Reloads name, fiat and transaction file names; dispatches one event each.
pub async fn reload_files(store: &dyn FileStore, dispatcher: &Dispatcher) -> Result<(), StorageError> {
    let mut first_err = None;

    let name = read_json::<NameFile>(store, NAME_FILE)
        .await
        .unwrap_or_else(|e| {
            first_err.get_or_insert(e);
            None
        })
        .and_then(|f| f.wallet_name);
    dispatcher.dispatch(EventKind::NameLoaded { name });

    let fiat = read_json::<FiatFile>(store, FIAT_FILE)
        .await
        .unwrap_or_else(|e| {
            first_err.get_or_insert(e);
            None
        })
        .map_or_else(|| DEFAULT_FIAT.to_string(), |f| f.fiat);
    dispatcher.dispatch(EventKind::FiatLoaded { fiat });

    let names = store.list(TRANSACTION_FOLDER).await.unwrap_or_else(|e| {
        first_err.get_or_insert(e);
        Vec::new()
    });
    dispatcher.dispatch(EventKind::FileNamesLoaded { names });

    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

async fn read_json<T: for<'de> Deserialize<'de>>(
    store: &dyn FileStore,
    path: &str,
) -> Result<Option<T>, StorageError> {
    let Some(text) = store.get_text(path).await? else {
        return Ok(None);
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| StorageError::Malformed {
            path: path.to_string(),
            reason: e.to_string(),
        })
}
