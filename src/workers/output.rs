//! # Published output bundle.
//!
//! [`Outputs`] is the named bundle a worker group exposes: one value of type `O`
//! (usually a struct of `Option` fields) stored in a [`tokio::sync::watch`] channel.
//!
//! - Workers of the group hold clones and publish with [`Outputs::modify`];
//!   later workers read the live value with [`Outputs::get`] in the same tick.
//! - The parent scope reads via [`Outputs::subscribe`]. Receivers observe values
//!   in publish order and are only woken when a modification actually changed
//!   something.

use std::sync::Arc;

use tokio::sync::watch;

/// Shared, observable output bundle of a worker group.
pub struct Outputs<O> {
    tx: Arc<watch::Sender<O>>,
}

impl<O> Clone for Outputs<O> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<O: Default> Default for Outputs<O> {
    fn default() -> Self {
        Self::new(O::default())
    }
}

impl<O> Outputs<O> {
    /// Creates a bundle holding `initial`.
    pub fn new(initial: O) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Returns a copy of the current bundle.
    pub fn get(&self) -> O
    where
        O: Clone,
    {
        self.tx.borrow().clone()
    }

    /// Reads the current bundle through a closure without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&O) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Modifies the bundle in place.
    ///
    /// `f` returns whether it changed anything; receivers are only notified if so.
    pub fn modify(&self, f: impl FnOnce(&mut O) -> bool) -> bool {
        self.tx.send_if_modified(f)
    }

    /// Replaces the bundle and notifies receivers.
    pub fn replace(&self, value: O) {
        self.tx.send_replace(value);
    }

    /// Creates a receiver observing subsequent changes.
    pub fn subscribe(&self) -> watch::Receiver<O> {
        self.tx.subscribe()
    }
}
