//! # Event subscribers for the walletvisor runtime.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] that
//! fans wallet events out to subscribers.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   WalletActor ── publish(Event) ──► Bus ──► subscriber_listener()
//!                                                 │
//!                                                 ├──► EngineTracker::update(&Event)
//!                                                 └──► SubscriberSet::emit(&Event)
//!                                                           │
//!                                                  ┌────────┼─────────┐
//!                                                  ▼        ▼         ▼
//!                                              LogWriter  Custom     ...
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use async_trait::async_trait;
//! use walletvisor::subscribers::Subscribe;
//! use walletvisor::{Event, EventKind};
//!
//! struct FailureAlerts;
//!
//! #[async_trait]
//! impl Subscribe for FailureAlerts {
//!     async fn on_event(&self, event: &Event) {
//!         if let EventKind::EngineFailed { error } = &event.kind {
//!             eprintln!("wallet {} failed: {error}", event.wallet);
//!         }
//!     }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscribe;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
