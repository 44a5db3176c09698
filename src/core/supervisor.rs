//! # Supervisor: runs wallet actors, fans out events, and tears down with a grace period.
//!
//! The [`Supervisor`] owns the event bus, the error channel, the ambient
//! [`SharedState`] and the registry of wallet actors. Each added wallet gets its
//! own [`WalletOrchestrator`](crate::wallet::WalletOrchestrator) driven by a
//! dedicated actor task.
//!
//! ## High-level architecture
//! ```text
//! add_wallet(info) ──► Registry ──► WalletActor (one per wallet)
//!                                        │
//!            update_state(f) ─► ambient ─┤ (every actor re-ticks)
//!            pause_wallet(id) ─► PauseChanged dispatched to that wallet
//!            refresh() ─► forced tick on every wallet
//!
//! Event flow:
//!   WalletActor ── fold + publish(Event) ──► Bus ──► subscriber_listener()
//!                                                     ├─► EngineTracker::update
//!                                                     └─► SubscriberSet::emit ─► [queue S1..SN]
//!   workers ── report(WalletError) ──► ErrorSink ──► errors() receivers
//!
//! Teardown (remove_wallet / shutdown):
//!   cancel child token(s) ─► orchestrator.destroy() (engine stop, output cleared)
//!   wait up to Config::grace:
//!      ├─ all joined     → Ok(())
//!      └─ grace exceeded → RuntimeError::GraceExceeded { stuck }
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use walletvisor::stores::MemoryStorage;
//! use walletvisor::wallet::{Collaborators, PluginMap};
//! use walletvisor::{Config, Supervisor};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let collaborators = Collaborators {
//!         plugins: Arc::new(PluginMap::new()),
//!         storage: Arc::new(MemoryStorage::new()),
//!     };
//!     let sup = Supervisor::builder(Config::default(), collaborators).build();
//!     sup.set_paused(true);
//!     sup.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::alive::EngineTracker;
use crate::core::builder::SupervisorBuilder;
use crate::core::handle::WalletHandle;
use crate::core::registry::{Registry, Slot};
use crate::core::Config;
use crate::error::{RuntimeError, WalletError};
use crate::events::{Bus, ErrorSink, Event, EventKind};
use crate::subscribers::SubscriberSet;
use crate::wallet::{Collaborators, SharedState, WalletInfo};

/// Coordinates wallet actors, event delivery and teardown.
pub struct Supervisor {
    cfg: Config,
    bus: Bus,
    errors: ErrorSink,
    engines: Arc<EngineTracker>,
    registry: Registry,
    ambient: Arc<watch::Sender<Arc<SharedState>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
    listener_token: CancellationToken,
    runtime_token: CancellationToken,
}

impl Supervisor {
    /// Starts building a supervisor.
    pub fn builder(cfg: Config, collaborators: Collaborators) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg, collaborators)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        collaborators: Collaborators,
        subs: SubscriberSet,
        initial: SharedState,
    ) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let errors = ErrorSink::new(cfg.bus_capacity_clamped());
        let engines = Arc::new(EngineTracker::new());
        let (ambient, _rx) = watch::channel(Arc::new(initial));
        let ambient = Arc::new(ambient);
        let runtime_token = CancellationToken::new();
        let listener_token = CancellationToken::new();

        let registry = Registry::new(
            cfg.clone(),
            bus.clone(),
            errors.clone(),
            collaborators,
            ambient.clone(),
            runtime_token.clone(),
        );
        let listener =
            Self::subscriber_listener(&bus, subs, engines.clone(), listener_token.clone());

        Self {
            cfg,
            bus,
            errors,
            engines,
            registry,
            ambient,
            listener: Mutex::new(Some(listener)),
            listener_token,
            runtime_token,
        }
    }

    /// Forwards bus events to the engine tracker and the subscriber set.
    ///
    /// Pending events are drained before the listener honours its token.
    fn subscriber_listener(
        bus: &Bus,
        subs: SubscriberSet,
        engines: Arc<EngineTracker>,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Ok(ev) => {
                            engines.update(&ev).await;
                            subs.emit(&ev);
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "event listener lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = token.cancelled() => break,
                }
            }
            subs.shutdown().await;
        })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Registers a wallet and starts supervising it.
    pub async fn add_wallet(&self, info: WalletInfo) -> Result<WalletHandle, RuntimeError> {
        self.registry.add(info).await
    }

    /// Tears one wallet down, waiting up to [`Config::grace`].
    pub async fn remove_wallet(&self, id: &str) -> Result<(), RuntimeError> {
        let slot = self
            .registry
            .remove(id)
            .await
            .ok_or_else(|| RuntimeError::UnknownWallet { id: id.to_string() })?;
        tracing::info!(wallet = %id, "removing wallet");
        self.stop_with_grace(vec![(id.to_string(), slot)]).await
    }

    pub async fn wallet(&self, id: &str) -> Option<WalletHandle> {
        self.registry.handle(id).await
    }

    /// Sorted ids of supervised wallets.
    pub async fn wallet_ids(&self) -> Vec<String> {
        self.registry.list().await
    }

    /// Sorted ids of wallets whose engine is currently started.
    pub async fn live_engines(&self) -> Vec<String> {
        self.engines.snapshot().await
    }

    /// Current ambient state.
    pub fn state(&self) -> Arc<SharedState> {
        self.ambient.borrow().clone()
    }

    /// Replaces the ambient state with a modified copy; every wallet re-ticks.
    pub fn update_state(&self, f: impl FnOnce(&mut SharedState)) {
        self.ambient.send_modify(|current| {
            let mut next = SharedState::clone(current);
            f(&mut next);
            *current = Arc::new(next);
        });
    }

    /// Global pause: no wallet starts or syncs while set.
    pub fn set_paused(&self, paused: bool) {
        tracing::info!(paused, "global pause changed");
        self.update_state(|s| s.paused = paused);
    }

    /// Pauses or resumes one wallet.
    pub async fn pause_wallet(&self, id: &str, paused: bool) -> Result<(), RuntimeError> {
        let dispatcher = self
            .registry
            .dispatcher(id)
            .await
            .ok_or_else(|| RuntimeError::UnknownWallet { id: id.to_string() })?;
        dispatcher.dispatch(EventKind::PauseChanged { paused });
        Ok(())
    }

    /// Forces one tick on every wallet, e.g. after registering a plugin.
    pub async fn refresh(&self) {
        self.registry.refresh_all().await;
    }

    /// Receiver of every folded wallet event.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Receiver of the out-of-band error channel.
    pub fn errors(&self) -> broadcast::Receiver<Arc<WalletError>> {
        self.errors.subscribe()
    }

    /// Tears every wallet down and stops event delivery.
    ///
    /// Subscribers have seen every event published by the torn-down wallets
    /// when this returns `Ok`.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        tracing::info!("shutdown requested");
        self.runtime_token.cancel();
        let slots = self.registry.drain().await;
        let res = self.stop_with_grace(slots).await;

        self.listener_token.cancel();
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(listener) = listener {
            let _ = listener.await;
        }
        res
    }

    /// Cancels the given wallets and waits for them within the configured grace.
    async fn stop_with_grace(&self, slots: Vec<(String, Slot)>) -> Result<(), RuntimeError> {
        for (_, slot) in &slots {
            slot.cancel.cancel();
        }
        let mut joins: Vec<(String, JoinHandle<()>)> =
            slots.into_iter().map(|(id, slot)| (id, slot.join)).collect();

        let all_joined = match self.cfg.grace_limit() {
            Some(grace) => tokio::time::timeout(grace, async {
                for (id, join) in joins.iter_mut() {
                    if let Err(e) = join.await {
                        tracing::warn!(wallet = %id, error = %e, "wallet actor failed");
                    }
                }
            })
            .await
            .is_ok(),
            None => joins.iter().all(|(_, join)| join.is_finished()),
        };
        if all_joined {
            tracing::debug!(wallets = joins.len(), "all wallets stopped within grace");
            return Ok(());
        }

        let mut stuck: Vec<String> = joins
            .iter()
            .filter(|(_, join)| !join.is_finished())
            .map(|(id, _)| id.clone())
            .collect();
        stuck.sort_unstable();
        tracing::warn!(grace = ?self.cfg.grace, stuck = ?stuck, "grace exceeded");
        Err(RuntimeError::GraceExceeded {
            grace: self.cfg.grace,
            stuck,
        })
    }
}
