//! # walletvisor
//!
//! **Walletvisor** supervises the lifecycle of cryptocurrency wallets.
//!
//! For every wallet it resolves the currency plugin, attaches durable storage,
//! derives (and caches) public keys, creates and starts the currency engine,
//! loads the wallet's files, keeps it synced and publishes a usable
//! [`WalletApi`](wallet::WalletApi) once everything is in place. Pausing,
//! removing or shutting down reverses the process.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  WalletInfo  │   │  WalletInfo  │   │  WalletInfo  │
//!     │  (wallet #1) │   │  (wallet #2) │   │  (wallet #3) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor                                                       │
//! │  - SharedState (pause flag, user settings, sync status; watch)    │
//! │  - Bus (broadcast events)     - ErrorSink (broadcast errors)      │
//! │  - EngineTracker (live engines, sequence-checked)                 │
//! │  - Registry (wallet actors by id)                                 │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ WalletActor  │   │ WalletActor  │   │ WalletActor  │
//!     │ (tick loop)  │   │ (tick loop)  │   │ (tick loop)  │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘
//!      │ drives one WalletOrchestrator (Reconciler over a WorkerGroup):
//!      │   plugin ─► engine ─► api ─► engine_started ─► sync_timer ─► watcher
//!      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                   (capacity: Config::bus_capacity)                │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       └───┬────────────────┬───┘
//!                           ▼                ▼
//!                    EngineTracker     SubscriberSet
//!                                   (per-sub queues)
//! ```
//!
//! ### Tick
//! ```text
//! event / ambient change / output change / refresh
//!   └─► fold event into WalletSelfState ─► publish on Bus
//!   └─► WalletTick { ambient, self_state, output }
//!         ├─ same inputs as last tick ─► skipped
//!         └─ WorkerGroup::update: workers run in order, each sees what the
//!            previous ones published in the same tick
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                         |
//! |-------------------|--------------------------------------------------------------|--------------------------------------------|
//! | **Supervision**   | Add, pause, remove wallets; graceful shutdown.               | [`Supervisor`], [`WalletHandle`]           |
//! | **Collaborators** | Plugins, engines and storage supplied by the host.           | [`CurrencyPlugin`](wallet::CurrencyPlugin), [`DurableStorage`](wallet::DurableStorage) |
//! | **Workers**       | Tick-driven units with ordered groups and guards.            | [`Worker`], [`WorkerFn`], [`Update`]       |
//! | **Subscriber API**| Hook into wallet events (logging, metrics, UI).              | [`Subscribe`](subscribers::Subscribe)      |
//! | **Errors**        | Typed errors for plugins, storage, wallets and the runtime.  | [`WalletError`], [`RuntimeError`]          |
//! | **Configuration** | Grace period, bus capacity, sync interval.                   | [`Config`]                                 |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`](subscribers::LogWriter) subscriber.

mod core;
mod error;
pub mod events;
pub mod stores;
pub mod subscribers;
pub mod wallet;
pub mod workers;

#[cfg(test)]
mod testkit;

// ---- Public re-exports ----

pub use core::{Config, EngineTracker, Supervisor, SupervisorBuilder, WalletHandle};
pub use error::{PluginError, RuntimeError, StorageError, WalletError};
pub use events::{Event, EventKind};
pub use workers::{Update, Worker, WorkerFn};
