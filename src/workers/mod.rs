//! # Declarative supervision mechanism.
//!
//! This module provides the building blocks of a supervision tree:
//! - [`Worker`] - trait with `update` (every tick) and `destroy` (once)
//! - [`Update`] - `Continue` or the `Done` sentinel
//! - [`WorkerFn`] - closure-backed worker
//! - [`Guard`], [`Guarded`] - predicate-gated worker
//! - [`WorkerGroup`] - ordered composition; a group is itself a worker
//! - [`Outputs`] - the observable bundle a group publishes
//! - [`PeriodicTask`] - best-effort repeating timer owned by a worker

mod group;
mod guard;
mod output;
mod periodic;
mod worker;
mod worker_fn;

pub use group::WorkerGroup;
pub use guard::{Guard, Guarded};
pub use output::Outputs;
pub use periodic::{PeriodicTask, StartOptions};
pub use worker::{Update, Worker};
pub use worker_fn::WorkerFn;
