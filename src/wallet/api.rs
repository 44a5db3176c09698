//! # Externally visible wallet handle.
//!
//! [`WalletApi`] is published once plugin, engine, public info and the wallet
//! name are all known. Observers read [`WalletSnapshot`]s from it; the watcher
//! worker publishes a new snapshot whenever the wallet state changed, so
//! subscribers see updates in publish order without polling.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use crate::wallet::plugin::{CurrencyEngine, CurrencyPlugin};
use crate::wallet::state::{StakingStatus, WalletInfo, WalletSelfState};

/// Observable properties of a wallet at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletSnapshot {
    pub id: String,
    pub wallet_type: String,
    pub currency_code: String,
    pub name: Option<String>,
    pub fiat: Option<String>,
    pub balances: BTreeMap<String, String>,
    pub height: u64,
    pub staking: Option<StakingStatus>,
    pub paused: bool,
    pub engine_started: bool,
    pub engine_failure: Option<String>,
}

impl WalletSnapshot {
    pub fn from_state(state: &WalletSelfState, currency_code: &str) -> Self {
        Self {
            id: state.id.clone(),
            wallet_type: state.wallet_type.clone(),
            currency_code: currency_code.to_string(),
            name: state.name.clone(),
            fiat: state.fiat.clone(),
            balances: state.balances.clone(),
            height: state.height,
            staking: state.staking.clone(),
            paused: state.paused,
            engine_started: state.engine_started,
            engine_failure: state.engine_failure.clone(),
        }
    }

    /// Balance of the native currency, `"0"` if unknown.
    pub fn native_balance(&self) -> &str {
        self.balances
            .get(&self.currency_code)
            .map(String::as_str)
            .unwrap_or("0")
    }
}

/// Handle to one supervised wallet.
pub struct WalletApi {
    public_info: WalletInfo,
    currency_code: String,
    plugin: Arc<dyn CurrencyPlugin>,
    engine: Arc<dyn CurrencyEngine>,
    snapshot: watch::Sender<Arc<WalletSnapshot>>,
}

impl WalletApi {
    pub(crate) fn new(
        plugin: Arc<dyn CurrencyPlugin>,
        engine: Arc<dyn CurrencyEngine>,
        public_info: WalletInfo,
        state: &WalletSelfState,
    ) -> Self {
        let currency_code = plugin.currency_code().to_string();
        let first = Arc::new(WalletSnapshot::from_state(state, &currency_code));
        let (snapshot, _rx) = watch::channel(first);
        Self {
            public_info,
            currency_code,
            plugin,
            engine,
            snapshot,
        }
    }

    pub fn id(&self) -> &str {
        &self.public_info.id
    }

    pub fn wallet_type(&self) -> &str {
        &self.public_info.wallet_type
    }

    pub fn currency_code(&self) -> &str {
        &self.currency_code
    }

    /// Public (never private) key material.
    pub fn public_info(&self) -> &WalletInfo {
        &self.public_info
    }

    pub fn plugin(&self) -> &Arc<dyn CurrencyPlugin> {
        &self.plugin
    }

    pub fn engine(&self) -> &Arc<dyn CurrencyEngine> {
        &self.engine
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<WalletSnapshot> {
        self.snapshot.borrow().clone()
    }

    /// Receiver woken on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<WalletSnapshot>> {
        self.snapshot.subscribe()
    }

    /// Publishes a snapshot built from `state`.
    pub(crate) fn publish(&self, state: &WalletSelfState) {
        let next = WalletSnapshot::from_state(state, &self.currency_code);
        self.snapshot.send_replace(Arc::new(next));
    }
}

impl fmt::Debug for WalletApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletApi")
            .field("id", &self.public_info.id)
            .field("wallet_type", &self.public_info.wallet_type)
            .field("currency_code", &self.currency_code)
            .finish_non_exhaustive()
    }
}
