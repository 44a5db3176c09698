//! # Reconciler: the tick entry point of a supervision tree.
//!
//! The host calls [`Reconciler::reconcile`] with the newest inputs whenever its own
//! state-change notifier fires. If the inputs are identical (by reference) to the
//! previous tick, nothing runs; otherwise the root worker is updated once.
//!
//! ```text
//! host state change ──► reconcile(next)
//!                          ├─ next.same_as(prev) ─► skipped
//!                          └─ root.update(&next) ─► workers publish / dispatch
//! teardown ──► destroy() ─► root.destroy()   (once)
//! ```

use crate::workers::{Update, Worker};

/// Tick input that can tell whether anything changed since a previous tick.
pub trait TickInput: Send + Sync + 'static {
    /// `true` if every part of `self` is the same as in `prev`.
    fn same_as(&self, prev: &Self) -> bool;
}

/// Drives a root worker with deduplicated ticks.
pub struct Reconciler<I, W> {
    root: W,
    last: Option<I>,
    ticks: u64,
}

impl<I, W> Reconciler<I, W>
where
    I: TickInput,
    W: Worker<I>,
{
    pub fn new(root: W) -> Self {
        Self {
            root,
            last: None,
            ticks: 0,
        }
    }

    /// Ticks the root unless `next` is unchanged. Returns whether it ticked.
    pub fn reconcile(&mut self, next: I) -> bool {
        if let Some(prev) = &self.last {
            if next.same_as(prev) {
                return false;
            }
        }
        self.force(next);
        true
    }

    /// Ticks the root regardless of whether `next` changed.
    pub fn force(&mut self, next: I) -> Update {
        let res = self.root.update(&next);
        self.last = Some(next);
        self.ticks += 1;
        res
    }

    /// Number of ticks that actually ran.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Destroys the root worker.
    pub async fn destroy(&mut self) {
        self.root.destroy().await;
        self.last = None;
    }
}
