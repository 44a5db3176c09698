//! # WalletActor: drives one wallet orchestrator.
//!
//! The actor is the host side of a wallet: it owns the wallet's self state,
//! folds dispatched events into it and ticks the orchestrator whenever any
//! input changed.
//!
//! ## Architecture
//! ```text
//! Supervisor ──► WalletActor::run(token)
//!
//! loop select! (biased) {
//!   ├─► token cancelled        → break
//!   ├─► event dispatched       → fold into self state, publish on Bus
//!   ├─► ambient state changed
//!   ├─► orchestrator output changed
//!   └─► refresh requested      → forced tick
//!   then: orchestrator.tick(ambient, self_state)   (skipped if nothing changed)
//! }
//! orchestrator.destroy()   → stop engine, clear output
//! drain remaining events   → EngineStopped reaches the Bus
//! ```
//!
//! ## Rules
//! - Events are folded **in dispatch order**, one wallet at a time.
//! - Every event is republished on the bus after it was folded, so subscribers
//!   never observe an event before the state reflects it.
//! - A self-state `Arc` is replaced only when the event changed something.

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Notify};
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event};
use crate::wallet::{SharedState, WalletOrchestrator, WalletSelfState};

/// Host loop of one wallet.
pub(crate) struct WalletActor {
    orchestrator: WalletOrchestrator,
    events: mpsc::UnboundedReceiver<Event>,
    ambient: watch::Receiver<Arc<SharedState>>,
    state: watch::Sender<Arc<WalletSelfState>>,
    bus: Bus,
    refresh: Arc<Notify>,
}

impl WalletActor {
    pub fn new(
        orchestrator: WalletOrchestrator,
        events: mpsc::UnboundedReceiver<Event>,
        ambient: watch::Receiver<Arc<SharedState>>,
        state: watch::Sender<Arc<WalletSelfState>>,
        bus: Bus,
        refresh: Arc<Notify>,
    ) -> Self {
        Self {
            orchestrator,
            events,
            ambient,
            state,
            bus,
            refresh,
        }
    }

    /// Runs until `token` is cancelled, then tears the wallet down.
    pub async fn run(mut self, token: CancellationToken) {
        let wallet = self.orchestrator.wallet_id().to_string();
        let mut output = self.orchestrator.output().subscribe();
        tracing::debug!(wallet = %wallet, "wallet actor started");

        self.tick(false);
        loop {
            let force = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                Some(ev) = self.events.recv() => {
                    self.fold(ev);
                    while let Ok(ev) = self.events.try_recv() {
                        self.fold(ev);
                    }
                    false
                }
                Ok(()) = self.ambient.changed() => false,
                Ok(()) = output.changed() => {
                    output.borrow_and_update();
                    false
                }
                _ = self.refresh.notified() => true,
            };
            self.tick(force);
        }

        self.orchestrator.destroy().await;
        while let Ok(ev) = self.events.try_recv() {
            self.fold(ev);
        }
        tracing::debug!(wallet = %wallet, "wallet actor exited");
    }

    fn fold(&mut self, ev: Event) {
        let current = self.state.borrow().clone();
        if let Some(next) = WalletSelfState::fold(&current, &ev.kind) {
            self.state.send_replace(next);
        }
        self.bus.publish(ev);
    }

    fn tick(&mut self, force: bool) {
        let ambient = self.ambient.borrow_and_update().clone();
        let state = self.state.borrow().clone();
        if force {
            self.orchestrator.force_tick(ambient, state);
        } else {
            self.orchestrator.tick(ambient, state);
        }
    }
}
