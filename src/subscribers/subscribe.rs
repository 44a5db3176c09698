//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for observing wallet events. Each
//! subscriber is driven by a dedicated worker loop fed by a bounded queue owned
//! by the [`SubscriberSet`](crate::subscribers::SubscriberSet).
//!
//! ## What a subscriber sees
//! - Every [`EventKind`](crate::EventKind) of every supervised wallet, after the
//!   wallet actor folded it into the wallet's state. [`Event::wallet`] tells
//!   wallets apart.
//! - Events of one wallet in dispatch order. A typical engine lifetime reads
//!   `PublicInfoUpdated`, `SeedsChanged`, `BalanceChanged`/`HeightChanged`,
//!   `EngineStarted`, then `EngineStopped` when the wallet is paused, removed or
//!   the supervisor shuts down.
//! - `EngineStarted`/`EngineStopped` only after the supervisor's
//!   [`EngineTracker`](crate::EngineTracker) has recorded them.
//! - Gaps when the listener lags behind the bus; the skipped events are logged,
//!   not replayed.
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching, retries); they do **not** block
//!   wallet actors nor other subscribers.
//! - Each subscriber **declares** its preferred queue capacity via
//!   [`Subscribe::queue_capacity`]. If a queue overflows, events for that
//!   subscriber are **dropped** (warn).
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use walletvisor::subscribers::Subscribe;
//! use walletvisor::{Event, EventKind};
//!
//! struct Balances;
//!
//! #[async_trait]
//! impl Subscribe for Balances {
//!     async fn on_event(&self, ev: &Event) {
//!         if let EventKind::BalanceChanged { currency_code, balance } = &ev.kind {
//!             let _ = (currency_code, balance);
//!         }
//!     }
//!     fn name(&self) -> &'static str { "balances" }
//!     fn queue_capacity(&self) -> usize { 512 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Observer of wallet lifecycle, balance and sync events.
///
/// Called from a subscriber-dedicated worker task, never from a wallet actor.
/// Implementations should avoid blocking the async runtime.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
