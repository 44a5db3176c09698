//! # Guarded (filtered) workers.
//!
//! [`Guarded`] wraps a worker with a [`Guard`], a pure predicate over the tick input.
//!
//! ## Rules
//! - Guard false: the inner worker gets **no** `update` call this tick. Whatever it
//!   already owns is left untouched; the guard only gates new activity.
//! - Guard true: `update` is forwarded as usual.
//! - `destroy` is always forwarded, whatever the guard currently says.
//!
//! ```text
//! tick ──► guard.allows(input)?
//!            ├─ false ─► Update::Continue   (inner untouched)
//!            └─ true  ─► inner.update(input)
//! destroy ─► inner.destroy()                (unconditional)
//! ```

use async_trait::async_trait;

use crate::workers::worker::{Update, Worker};

/// Pure predicate deciding whether a worker is active this tick.
///
/// Implemented for every `Fn(&I) -> bool` closure or function.
pub trait Guard<I>: Send + Sync + 'static {
    fn allows(&self, input: &I) -> bool;
}

impl<I, F> Guard<I> for F
where
    F: Fn(&I) -> bool + Send + Sync + 'static,
{
    fn allows(&self, input: &I) -> bool {
        self(input)
    }
}

/// A worker gated by a [`Guard`].
pub struct Guarded<W, G> {
    inner: W,
    guard: G,
}

impl<W, G> Guarded<W, G> {
    /// Wraps `inner` with `guard`.
    pub fn new(inner: W, guard: G) -> Self {
        Self { inner, guard }
    }

    /// Access to the wrapped worker.
    pub fn inner(&self) -> &W {
        &self.inner
    }
}

#[async_trait]
impl<I, W, G> Worker<I> for Guarded<W, G>
where
    I: 'static,
    W: Worker<I>,
    G: Guard<I>,
{
    fn update(&mut self, input: &I) -> Update {
        if !self.guard.allows(input) {
            return Update::Continue;
        }
        self.inner.update(input)
    }

    async fn destroy(&mut self) {
        self.inner.destroy().await
    }
}
