//! # Engine lifecycle tracker with sequence-based ordering.
//!
//! Maintains which wallets currently have a started engine, using event
//! sequence numbers to handle out-of-order delivery.
//!
//! ## Architecture
//! ```text
//! WalletActor ──► Bus ──► subscriber_listener() ──► EngineTracker::update()
//!                                                         │
//!                                                         ▼
//!                                              HashMap<String, EngineState>
//!                                                (wallet → {seq, live})
//! ```
//!
//! ## Rules
//! - Only `EngineStarted` / `EngineStopped` / `EngineFailed` change live state
//! - Read operations (`snapshot`, `is_live`) are **eventually consistent**
//! - Other events **update seq** but don't affect live status
//! - Events with `seq <= last_seq` are **rejected** (stale)

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::events::{Event, EventKind};

#[derive(Debug, Clone, Copy)]
struct EngineState {
    last_seq: u64,
    live: bool,
}

/// Thread-safe tracker of live engines.
pub struct EngineTracker {
    state: RwLock<HashMap<String, EngineState>>,
}

impl Default for EngineTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineTracker {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(HashMap::new()),
        }
    }

    /// Applies `ev` if it is newer than the last event seen for its wallet.
    ///
    /// Returns whether the live state changed.
    pub async fn update(&self, ev: &Event) -> bool {
        let mut state = self.state.write().await;
        let entry = state
            .entry(ev.wallet.to_string())
            .or_insert(EngineState {
                last_seq: 0,
                live: false,
            });

        if ev.seq <= entry.last_seq {
            return false;
        }
        entry.last_seq = ev.seq;
        let live = match ev.kind {
            EventKind::EngineStarted => true,
            EventKind::EngineStopped | EventKind::EngineFailed { .. } => false,
            _ => return false,
        };
        std::mem::replace(&mut entry.live, live) != live
    }

    /// Returns the sorted ids of wallets with a live engine.
    pub async fn snapshot(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut live: Vec<String> = state
            .iter()
            .filter(|(_, s)| s.live)
            .map(|(id, _)| id.clone())
            .collect();
        live.sort_unstable();
        live
    }

    pub async fn is_live(&self, wallet: &str) -> bool {
        self.state
            .read()
            .await
            .get(wallet)
            .is_some_and(|s| s.live)
    }
}
