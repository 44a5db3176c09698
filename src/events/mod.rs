//! Wallet events: types, broadcast bus, per-wallet dispatch and error channel.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//! - [`Dispatcher`] ordered per-wallet dispatch consumed by the wallet actor
//! - [`ErrorSink`] the out-of-band error channel
//!
//! ## Quick reference
//! - **Publishers**: orchestrator workers (through `Dispatcher`), engine callbacks.
//! - **Consumers**: `WalletActor` (folds into wallet state, republishes on `Bus`),
//!   `Supervisor::subscriber_listener()` (fans out to `SubscriberSet`, updates `EngineTracker`).

mod bus;
mod dispatch;
mod event;

pub use bus::Bus;
pub use dispatch::{Dispatcher, ErrorSink};
pub use event::{Event, EventKind};
