//! # State slices read by the orchestrator.
//!
//! - [`SharedState`] is ambient and owned by the host application: global pause,
//!   per-plugin user settings, and durable-storage sync status per wallet.
//! - [`WalletSelfState`] is the per-wallet slice. It changes only through
//!   [`WalletSelfState::apply`], which folds one dispatched [`EventKind`] into it.
//!
//! Both are handed to workers behind `Arc`s; a changed slice is a new `Arc`, so
//! "did anything change" is a pointer comparison.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::events::EventKind;

/// A JSON object, as used for key material and user settings.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Per-plugin user settings. Compared by reference between ticks.
pub type UserSettings = Arc<JsonObject>;

/// Identity, type and key material of a wallet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub wallet_type: String,
    #[serde(default)]
    pub keys: JsonObject,
}

impl WalletInfo {
    pub fn new(id: impl Into<String>, wallet_type: impl Into<String>, keys: JsonObject) -> Self {
        Self {
            id: id.into(),
            wallet_type: wallet_type.into(),
            keys,
        }
    }

    /// Same wallet with `public`'s keys laid over this one's.
    pub fn merged_with(&self, public: &WalletInfo) -> WalletInfo {
        let mut keys = self.keys.clone();
        keys.extend(public.keys.iter().map(|(k, v)| (k.clone(), v.clone())));
        WalletInfo {
            id: self.id.clone(),
            wallet_type: self.wallet_type.clone(),
            keys,
        }
    }
}

/// One staked position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakedAmount {
    pub native_amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlock_at: Option<u64>,
}

/// Staking status reported by an engine that supports staking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingStatus {
    pub staked_amounts: Vec<StakedAmount>,
}

/// Sync status of one wallet's durable storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageStatus {
    /// Unix time (seconds) of the last successful sync, if any.
    pub last_sync: Option<u64>,
    /// Hash of the last synced revision, if known.
    pub last_hash: Option<String>,
}

/// Ambient state visible to every wallet.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    /// Global pause: no wallet starts, stops or syncs.
    pub paused: bool,
    /// User settings keyed by plugin id.
    pub user_settings: HashMap<String, UserSettings>,
    /// Durable storage status keyed by wallet id.
    pub storage_wallets: HashMap<String, StorageStatus>,
}

impl SharedState {
    pub fn settings_for(&self, plugin_id: &str) -> Option<&UserSettings> {
        self.user_settings.get(plugin_id)
    }

    pub fn last_sync(&self, wallet_id: &str) -> Option<u64> {
        self.storage_wallets
            .get(wallet_id)
            .and_then(|s| s.last_sync)
    }
}

/// Per-wallet state slice.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletSelfState {
    pub id: String,
    pub wallet_type: String,

    pub paused: bool,
    pub engine_started: bool,
    /// Message of the engine construction failure, if this generation failed.
    pub engine_failure: Option<String>,

    pub name_loaded: bool,
    pub fiat_loaded: bool,
    pub file_names_loaded: bool,
    pub name: Option<String>,
    pub fiat: Option<String>,
    pub file_names: Vec<String>,

    pub public_wallet_info: Option<WalletInfo>,
    pub display_private_seed: Option<String>,
    pub display_public_seed: Option<String>,

    pub balances: BTreeMap<String, String>,
    pub height: u64,
    pub staking: Option<StakingStatus>,
}

impl WalletSelfState {
    /// Fresh slice for a newly registered wallet.
    pub fn new(info: &WalletInfo) -> Self {
        Self {
            id: info.id.clone(),
            wallet_type: info.wallet_type.clone(),
            paused: false,
            engine_started: false,
            engine_failure: None,
            name_loaded: false,
            fiat_loaded: false,
            file_names_loaded: false,
            name: None,
            fiat: None,
            file_names: Vec::new(),
            public_wallet_info: None,
            display_private_seed: None,
            display_public_seed: None,
            balances: BTreeMap::new(),
            height: 0,
            staking: None,
        }
    }

    /// Folds one event into the slice. Returns whether anything changed.
    pub fn apply(&mut self, kind: &EventKind) -> bool {
        let before = self.clone();
        match kind {
            EventKind::PublicInfoUpdated { wallet_info } => {
                self.public_wallet_info = Some(wallet_info.clone());
            }
            EventKind::SeedsChanged {
                display_private_seed,
                display_public_seed,
            } => {
                self.display_private_seed = display_private_seed.clone();
                self.display_public_seed = display_public_seed.clone();
            }
            EventKind::EngineFailed { error } => {
                self.engine_failure = Some(error.clone());
            }
            EventKind::EngineStarted => self.engine_started = true,
            EventKind::EngineStopped => self.engine_started = false,
            EventKind::BalanceChanged {
                currency_code,
                balance,
            } => {
                self.balances.insert(currency_code.clone(), balance.clone());
            }
            EventKind::HeightChanged { height } => self.height = *height,
            EventKind::StakingChanged { status } => self.staking = Some(status.clone()),
            EventKind::NameLoaded { name } => {
                self.name = name.clone();
                self.name_loaded = true;
            }
            EventKind::FiatLoaded { fiat } => {
                self.fiat = Some(fiat.clone());
                self.fiat_loaded = true;
            }
            EventKind::FileNamesLoaded { names } => {
                self.file_names = names.clone();
                self.file_names_loaded = true;
            }
            EventKind::PauseChanged { paused } => self.paused = *paused,
        }
        *self != before
    }

    /// Folds into a shared slice, producing a new `Arc` only if something changed.
    pub fn fold(current: &Arc<Self>, kind: &EventKind) -> Option<Arc<Self>> {
        let mut next = Self::clone(current);
        next.apply(kind).then(|| Arc::new(next))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn keys(v: serde_json::Value) -> JsonObject {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_merge_prefers_public_keys() {
        let private = WalletInfo::new("w", "wallet:test", keys(json!({"seed": "s", "pub": "old"})));
        let public = WalletInfo::new("w", "wallet:test", keys(json!({"pub": "new"})));
        let merged = private.merged_with(&public);
        assert_eq!(merged.keys, keys(json!({"seed": "s", "pub": "new"})));
        assert_eq!(merged.id, "w");
    }

    #[test]
    fn test_wallet_info_json_shape() {
        let info = WalletInfo::new("w", "wallet:test", keys(json!({"k": 1})));
        let v = serde_json::to_value(&info).unwrap();
        assert_eq!(v, json!({"id": "w", "type": "wallet:test", "keys": {"k": 1}}));
    }

    #[test]
    fn test_apply_reports_changes() {
        let mut s = WalletSelfState::new(&WalletInfo::new("w", "t", JsonObject::new()));
        assert!(s.apply(&EventKind::EngineStarted));
        assert!(!s.apply(&EventKind::EngineStarted));
        assert!(s.engine_started);

        assert!(s.apply(&EventKind::NameLoaded { name: None }));
        assert!(s.name_loaded);
        assert!(s.apply(&EventKind::EngineStopped));
        assert!(!s.engine_started);
    }

    #[test]
    fn test_fold_keeps_arc_when_unchanged() {
        let s = Arc::new(WalletSelfState::new(&WalletInfo::new("w", "t", JsonObject::new())));
        assert!(WalletSelfState::fold(&s, &EventKind::PauseChanged { paused: false }).is_none());
        let next = WalletSelfState::fold(&s, &EventKind::PauseChanged { paused: true }).unwrap();
        assert!(next.paused);
        assert!(!s.paused);
    }

    #[test]
    fn test_last_sync_lookup() {
        let mut shared = SharedState::default();
        assert_eq!(shared.last_sync("w"), None);
        shared.storage_wallets.insert(
            "w".into(),
            StorageStatus {
                last_sync: Some(1),
                last_hash: None,
            },
        );
        assert_eq!(shared.last_sync("w"), Some(1));
    }
}
