//! # Wallet registry: owns the running wallet actors.
//!
//! ## Architecture
//! ```text
//! Supervisor::add_wallet(info)
//!     └─► Registry::add(info)
//!            ├─ id already present ─► RuntimeError::DuplicateWallet
//!            └─ spawn:
//!                 Dispatcher::channel(id) ─► WalletOrchestrator ─► WalletActor
//!                 child token = runtime_token.child_token()
//!                 tokio::spawn(actor.run(child))
//! Supervisor::remove_wallet(id) / shutdown()
//!     └─► Registry::remove(id) / drain() ─► slots handed back for cancel + join
//! ```
//!
//! ## Rules
//! - The registry owns the slot handles (JoinHandle + CancellationToken)
//! - Spawning happens inside the registry, under its write lock, so one id
//!   never has two actors
//! - Removal only hands the slot back; cancelling and joining is the caller's job

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{watch, Notify, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::actor::WalletActor;
use crate::core::handle::WalletHandle;
use crate::core::Config;
use crate::error::RuntimeError;
use crate::events::{Bus, Dispatcher, ErrorSink};
use crate::wallet::{Collaborators, SharedState, WalletInfo, WalletOrchestrator, WalletSelfState};

/// Handle to a running wallet actor.
pub(crate) struct Slot {
    pub handle: WalletHandle,
    pub dispatcher: Dispatcher,
    pub refresh: Arc<Notify>,
    pub cancel: CancellationToken,
    pub join: JoinHandle<()>,
}

/// Registry of supervised wallets.
pub(crate) struct Registry {
    wallets: RwLock<HashMap<String, Slot>>,
    cfg: Config,
    bus: Bus,
    errors: ErrorSink,
    collaborators: Collaborators,
    ambient: Arc<watch::Sender<Arc<SharedState>>>,
    runtime_token: CancellationToken,
}

impl Registry {
    pub fn new(
        cfg: Config,
        bus: Bus,
        errors: ErrorSink,
        collaborators: Collaborators,
        ambient: Arc<watch::Sender<Arc<SharedState>>>,
        runtime_token: CancellationToken,
    ) -> Self {
        Self {
            wallets: RwLock::new(HashMap::new()),
            cfg,
            bus,
            errors,
            collaborators,
            ambient,
            runtime_token,
        }
    }

    /// Spawns an actor for `info` and registers it.
    pub async fn add(&self, info: WalletInfo) -> Result<WalletHandle, RuntimeError> {
        let mut wallets = self.wallets.write().await;
        if wallets.contains_key(&info.id) {
            return Err(RuntimeError::DuplicateWallet { id: info.id });
        }
        let id = info.id.clone();
        let slot = self.spawn(info);
        let handle = slot.handle.clone();
        wallets.insert(id.clone(), slot);
        drop(wallets);

        tracing::info!(wallet = %id, "wallet added");
        Ok(handle)
    }

    fn spawn(&self, info: WalletInfo) -> Slot {
        let (dispatcher, events) = Dispatcher::channel(info.id.as_str());
        let state = Arc::new(WalletSelfState::new(&info));
        let (state_tx, state_rx) = watch::channel(state);
        let orchestrator = WalletOrchestrator::new(
            info,
            self.collaborators.clone(),
            dispatcher.clone(),
            self.errors.clone(),
            self.cfg.clone(),
        );
        let handle = WalletHandle::new(
            dispatcher.wallet().clone(),
            orchestrator.output().subscribe(),
            state_rx,
        );

        let refresh = Arc::new(Notify::new());
        let actor = WalletActor::new(
            orchestrator,
            events,
            self.ambient.subscribe(),
            state_tx,
            self.bus.clone(),
            refresh.clone(),
        );
        let cancel = self.runtime_token.child_token();
        let join = tokio::spawn(actor.run(cancel.clone()));

        Slot {
            handle,
            dispatcher,
            refresh,
            cancel,
            join,
        }
    }

    /// Atomically removes a slot.
    pub async fn remove(&self, id: &str) -> Option<Slot> {
        self.wallets.write().await.remove(id)
    }

    /// Removes every slot.
    pub async fn drain(&self) -> Vec<(String, Slot)> {
        self.wallets.write().await.drain().collect()
    }

    pub async fn handle(&self, id: &str) -> Option<WalletHandle> {
        self.wallets.read().await.get(id).map(|s| s.handle.clone())
    }

    pub async fn dispatcher(&self, id: &str) -> Option<Dispatcher> {
        self.wallets.read().await.get(id).map(|s| s.dispatcher.clone())
    }

    /// Requests a forced tick from every wallet.
    pub async fn refresh_all(&self) {
        for slot in self.wallets.read().await.values() {
            slot.refresh.notify_one();
        }
    }

    /// Returns sorted list of registered wallet ids.
    pub async fn list(&self) -> Vec<String> {
        let wallets = self.wallets.read().await;
        let mut ids: Vec<String> = wallets.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }
}
