//! # Worker group: ordered composition of named workers.
//!
//! A [`WorkerGroup`] is itself a [`Worker`], so groups nest into trees.
//!
//! ## Rules
//! - Members are updated in **declared order** on every tick. Declare them in
//!   data-dependency order: a member may read outputs published by earlier ones
//!   in the same tick.
//! - A member that returned [`Update::Done`] is never updated again.
//! - The group reports `Done` once every member is done.
//! - `destroy` runs once, in **reverse** declared order, awaiting each member
//!   before the next; dependents are released before what they depend on.
//! - After `destroy`, `update` is a no-op.
//!
//! ```text
//! update:  plugin ─► engine ─► api ─► engine_started ─► sync_timer ─► watcher
//! destroy: watcher ─► sync_timer ─► engine_started ─► api ─► engine ─► plugin
//! ```

use async_trait::async_trait;

use crate::workers::worker::{Update, Worker};

struct Member<I> {
    name: &'static str,
    worker: Box<dyn Worker<I>>,
    done: bool,
}

/// Ordered, named composition of workers.
pub struct WorkerGroup<I> {
    members: Vec<Member<I>>,
    destroyed: bool,
}

impl<I: 'static> Default for WorkerGroup<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: 'static> WorkerGroup<I> {
    /// Creates an empty group.
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
            destroyed: false,
        }
    }

    /// Appends a member; declaration order is update order.
    pub fn with(mut self, name: &'static str, worker: impl Worker<I>) -> Self {
        self.push(name, worker);
        self
    }

    /// Appends a member in place.
    pub fn push(&mut self, name: &'static str, worker: impl Worker<I>) {
        self.members.push(Member {
            name,
            worker: Box::new(worker),
            done: false,
        });
    }

    /// Member names in declared order.
    pub fn names(&self) -> Vec<&'static str> {
        self.members.iter().map(|m| m.name).collect()
    }

    /// Whether the named member has returned `Done`.
    pub fn is_done(&self, name: &str) -> bool {
        self.members.iter().any(|m| m.name == name && m.done)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

#[async_trait]
impl<I: 'static> Worker<I> for WorkerGroup<I> {
    fn update(&mut self, input: &I) -> Update {
        if self.destroyed {
            return Update::Done;
        }
        for m in self.members.iter_mut().filter(|m| !m.done) {
            if m.worker.update(input).is_done() {
                tracing::trace!(worker = m.name, "worker done");
                m.done = true;
            }
        }
        if self.members.iter().all(|m| m.done) {
            Update::Done
        } else {
            Update::Continue
        }
    }

    async fn destroy(&mut self) {
        if std::mem::replace(&mut self.destroyed, true) {
            return;
        }
        for m in self.members.iter_mut().rev() {
            tracing::trace!(worker = m.name, "destroying worker");
            m.worker.destroy().await;
        }
    }
}
