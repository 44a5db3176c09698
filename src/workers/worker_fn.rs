//! # Function-backed worker (`WorkerFn`)
//!
//! [`WorkerFn`] wraps a closure `F: FnMut(&I) -> Update`. State the worker needs
//! between ticks lives in the closure's captures. Its `destroy` is a no-op, so it
//! suits workers that own no resource.
//!
//! ## Example
//! ```rust
//! use walletvisor::{Update, Worker, WorkerFn};
//!
//! let mut last = None;
//! let mut w = WorkerFn::new("remember", move |x: &u8| {
//!     last = Some(*x);
//!     Update::Continue
//! });
//! assert_eq!(w.name(), "remember");
//! assert_eq!(w.update(&1), Update::Continue);
//! ```

use std::borrow::Cow;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::workers::worker::{Update, Worker};

/// Function-backed worker implementation.
pub struct WorkerFn<I, F> {
    name: Cow<'static, str>,
    f: F,
    _input: PhantomData<fn(&I)>,
}

impl<I, F> WorkerFn<I, F>
where
    F: FnMut(&I) -> Update,
{
    /// Creates a new function-backed worker.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
            _input: PhantomData,
        }
    }

    /// Name given at construction (for logs).
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl<I, F> Worker<I> for WorkerFn<I, F>
where
    I: 'static,
    F: FnMut(&I) -> Update + Send + 'static,
{
    fn update(&mut self, input: &I) -> Update {
        (self.f)(input)
    }
}
