//! Wallet domain: state slices, collaborators, and the per-wallet orchestrator.
//!
//! ## Contents
//! - [`SharedState`], [`WalletSelfState`] the state slices a tick reads
//! - [`PluginRegistry`], [`CurrencyPlugin`], [`CurrencyEngine`] plugin capabilities
//! - [`FileStore`], [`DurableStorage`] storage capabilities
//! - [`PublicKeyCache`] public-key persistence
//! - [`WalletOrchestrator`] the worker tree supervising one wallet
//! - [`WalletApi`] the handle published once a wallet is usable

mod api;
mod files;
mod key_cache;
mod orchestrator;
mod plugin;
mod state;
mod storage;
mod workers;

pub use api::{WalletApi, WalletSnapshot};
pub use files::{reload_files, DEFAULT_FIAT, FIAT_FILE, NAME_FILE, TRANSACTION_FOLDER};
pub use key_cache::{resolve_public_info, PublicKeyCache};
pub use orchestrator::{not_paused, Collaborators, WalletOrchestrator, WalletOutput, WalletTick};
pub use plugin::{
    CurrencyEngine, CurrencyPlugin, EngineCallbacks, EngineOptions, PluginMap, PluginRegistry,
};
pub use state::{
    JsonObject, SharedState, StakedAmount, StakingStatus, StorageStatus, UserSettings, WalletInfo,
    WalletSelfState,
};
pub use storage::{AttachedStorage, DurableStorage, FileStore};
