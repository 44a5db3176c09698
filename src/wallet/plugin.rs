//! # Plugin, engine and registry capabilities.
//!
//! A currency plugin knows how to derive public keys for a wallet type and how to
//! build a [`CurrencyEngine`] for one wallet. The engine is the long-lived worker
//! the orchestrator supervises.
//!
//! Optional capabilities are explicit flags checked before use
//! ([`CurrencyEngine::supports_staking`]), never discovered by calling and failing.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::PluginError;
use crate::events::{Dispatcher, EventKind};
use crate::wallet::state::{JsonObject, StakingStatus, UserSettings, WalletInfo};
use crate::wallet::storage::FileStore;

/// Resolves a plugin from a wallet type.
///
/// `None` means "not available yet"; the orchestrator re-checks on every tick.
pub trait PluginRegistry: Send + Sync + 'static {
    fn resolve(&self, wallet_type: &str) -> Option<Arc<dyn CurrencyPlugin>>;
}

/// A currency plugin.
#[async_trait]
pub trait CurrencyPlugin: Send + Sync + 'static {
    /// Stable plugin id; user settings are keyed by it.
    fn plugin_id(&self) -> &str;

    /// Native currency code of the engines this plugin builds.
    fn currency_code(&self) -> &str;

    /// Derives the public key material for `wallet_info`.
    ///
    /// Wallet types without offline derivation return an error; the caller
    /// continues with empty keys.
    async fn derive_public_key(&self, wallet_info: &WalletInfo) -> Result<JsonObject, PluginError>;

    /// Builds an engine for one wallet.
    async fn make_engine(
        &self,
        wallet_info: WalletInfo,
        opts: EngineOptions,
    ) -> Result<Arc<dyn CurrencyEngine>, PluginError>;
}

/// A running (or runnable) currency engine.
#[async_trait]
pub trait CurrencyEngine: Send + Sync + 'static {
    async fn start_engine(&self) -> Result<(), PluginError>;

    async fn kill_engine(&self) -> Result<(), PluginError>;

    /// Balance of `currency_code` as an integer string.
    fn balance(&self, currency_code: &str) -> String;

    fn block_height(&self) -> u64;

    fn display_private_seed(&self) -> Option<String> {
        None
    }

    fn display_public_seed(&self) -> Option<String> {
        None
    }

    /// Whether [`staking_status`](Self::staking_status) is implemented.
    fn supports_staking(&self) -> bool {
        false
    }

    async fn staking_status(&self) -> Result<StakingStatus, PluginError> {
        Err(PluginError::Unsupported {
            what: "staking_status",
        })
    }

    async fn change_user_settings(&self, settings: UserSettings) -> Result<(), PluginError>;
}

/// Everything an engine receives at construction.
#[derive(Clone)]
pub struct EngineOptions {
    pub callbacks: EngineCallbacks,
    /// Unencrypted per-wallet store.
    pub local: Arc<dyn FileStore>,
    /// Encrypted, synced per-wallet store.
    pub encrypted: Arc<dyn FileStore>,
    /// Current user settings for the plugin, if any.
    pub user_settings: Option<UserSettings>,
}

/// Hooks an engine calls to report state changes.
///
/// Each call becomes a dispatched event on the wallet's queue.
#[derive(Clone, Debug)]
pub struct EngineCallbacks {
    dispatcher: Dispatcher,
}

impl EngineCallbacks {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn on_balance_changed(&self, currency_code: &str, balance: &str) {
        self.dispatcher.dispatch(EventKind::BalanceChanged {
            currency_code: currency_code.to_string(),
            balance: integer_or_zero(balance),
        });
    }

    pub fn on_block_height_changed(&self, height: u64) {
        self.dispatcher
            .dispatch(EventKind::HeightChanged { height });
    }

    pub fn on_staking_status_changed(&self, status: StakingStatus) {
        self.dispatcher
            .dispatch(EventKind::StakingChanged { status });
    }
}

/// Returns `s` if it is an integer string, `"0"` otherwise.
pub(crate) fn integer_or_zero(s: &str) -> String {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        s.to_string()
    } else {
        "0".to_string()
    }
}

/// In-process plugin registry keyed by wallet type.
#[derive(Default)]
pub struct PluginMap {
    plugins: RwLock<HashMap<String, Arc<dyn CurrencyPlugin>>>,
}

impl PluginMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `plugin` for `wallet_type`, replacing any previous one.
    pub fn register(&self, wallet_type: impl Into<String>, plugin: Arc<dyn CurrencyPlugin>) {
        let mut plugins = self.plugins.write().unwrap_or_else(|e| e.into_inner());
        plugins.insert(wallet_type.into(), plugin);
    }
}

impl PluginRegistry for PluginMap {
    fn resolve(&self, wallet_type: &str) -> Option<Arc<dyn CurrencyPlugin>> {
        let plugins = self.plugins.read().unwrap_or_else(|e| e.into_inner());
        plugins.get(wallet_type).cloned()
    }
}
