//! Workers of a wallet orchestrator, in declaration order.
//!
//! | Worker | Guard | Publishes | Done when |
//! |---|---|---|---|
//! | [`plugin`] | - | `output.plugin` | plugin resolved |
//! | [`EngineWorker`] | - | `output.engine`, key/seed/balance events | creation spawned |
//! | [`ApiWorker`] | - | `output.api` | never |
//! | [`EngineStartedWorker`] | not paused | `EngineStarted` / `EngineStopped` | start spawned |
//! | [`SyncTimerWorker`] | not paused | file reload events | never |
//! | [`WatcherWorker`] | - | api snapshots, settings pushes | never |

mod api;
mod engine;
mod engine_started;
mod plugin;
mod sync_timer;
mod watcher;

pub(crate) use api::ApiWorker;
pub(crate) use engine::EngineWorker;
pub(crate) use engine_started::EngineStartedWorker;
pub(crate) use plugin::plugin;
pub(crate) use sync_timer::SyncTimerWorker;
pub(crate) use watcher::WatcherWorker;
