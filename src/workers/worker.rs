//! # Worker abstraction.
//!
//! A [`Worker`] is one node of a supervision tree. It is constructed once per
//! parent lifetime and driven by two callbacks:
//!
//! - [`update`](Worker::update) runs synchronously on every tick. It may spawn
//!   asynchronous work but must not block. Calling it again with unchanged
//!   inputs must not repeat side effects.
//! - [`destroy`](Worker::destroy) runs at most once, when the parent is torn
//!   down. It releases everything the worker owns and awaits in-flight work
//!   that must settle first.
//!
//! `update` returns [`Update::Done`] once the worker has nothing left to do
//! (e.g. a one-shot resource was created); the parent then stops calling
//! `update` but still calls `destroy`.

use async_trait::async_trait;

/// Result of one [`Worker::update`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    /// Keep calling `update` on subsequent ticks.
    Continue,
    /// Stop calling `update`; the worker stays alive until `destroy`.
    Done,
}

impl Update {
    #[inline]
    pub fn is_done(self) -> bool {
        matches!(self, Update::Done)
    }
}

/// # Reactive unit of a supervision tree.
///
/// `I` is the tick input: a cheap-to-clone snapshot of everything the worker may read.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use walletvisor::{Update, Worker};
///
/// struct Counter { seen: u32 }
///
/// #[async_trait]
/// impl Worker<u32> for Counter {
///     fn update(&mut self, input: &u32) -> Update {
///         self.seen = *input;
///         if self.seen >= 3 { Update::Done } else { Update::Continue }
///     }
/// }
///
/// let mut w = Counter { seen: 0 };
/// assert_eq!(w.update(&1), Update::Continue);
/// assert_eq!(w.update(&3), Update::Done);
/// ```
#[async_trait]
pub trait Worker<I>: Send + 'static {
    /// Re-evaluates the worker against the current tick input.
    fn update(&mut self, input: &I) -> Update;

    /// Tears the worker down. Called at most once by the owning group.
    async fn destroy(&mut self) {}
}

#[async_trait]
impl<I: 'static> Worker<I> for Box<dyn Worker<I>> {
    fn update(&mut self, input: &I) -> Update {
        (**self).update(input)
    }

    async fn destroy(&mut self) {
        (**self).destroy().await
    }
}
