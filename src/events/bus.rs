//! # Event bus for broadcasting wallet events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`]. An event
//! reaches the bus only after its wallet actor has folded it into that
//! wallet's [`WalletSelfState`](crate::wallet::WalletSelfState), so by the time
//! a receiver sees `BalanceChanged` or `EngineStarted` the matching
//! [`WalletHandle::state`](crate::WalletHandle::state) already reflects it.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                 Subscribers (many):
//!   WalletActor 1 ──┐
//!   WalletActor 2 ──┼──────► Bus ───────► subscriber_listener ──► SubscriberSet
//!   WalletActor N ──┘  (broadcast chan)   Supervisor::subscribe() receivers
//! ```
//!
//! ## Rules
//! - **Per-wallet order**: events of one wallet arrive in dispatch order, so their
//!   `seq` values increase. Events of different wallets interleave in whatever
//!   order their actors publish, which need not follow `seq`.
//! - **Non-blocking publish**: `publish()` never blocks.
//! - **Bounded capacity**: a single ring buffer stores recent events for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no active receivers at send time.
//!
//! Wallet state itself never depends on the bus: actors fold events from their
//! own ordered [`Dispatcher`](crate::events::Dispatcher) queue before republishing.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for wallet events.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
