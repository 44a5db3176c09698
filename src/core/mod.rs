//! Runtime core: wallet actors, registry and lifecycle.
//!
//! The public API of this module is [`Supervisor`] (with its builder),
//! [`WalletHandle`] and [`Config`].
//!
//! Internal modules:
//! - [`reconciler`]: deduplicated ticks into a root worker;
//! - [`actor`]: drives one wallet orchestrator from events and state changes;
//! - [`alive`]: tracks which wallets have a started engine;
//! - [`registry`]: owns the wallet actors;
//! - [`supervisor`]: wires bus, error channel, subscribers and teardown.

mod actor;
mod alive;
mod builder;
mod config;
mod handle;
pub(crate) mod reconciler;
mod registry;
mod supervisor;

pub use alive::EngineTracker;
pub use builder::SupervisorBuilder;
pub use config::Config;
pub use handle::WalletHandle;
pub use supervisor::Supervisor;
