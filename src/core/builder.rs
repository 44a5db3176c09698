use std::sync::Arc;

use crate::core::{Config, Supervisor};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::wallet::{Collaborators, SharedState};

/// Builder for constructing a [`Supervisor`].
pub struct SupervisorBuilder {
    cfg: Config,
    collaborators: Collaborators,
    subscribers: Vec<Arc<dyn Subscribe>>,
    initial: SharedState,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration and host collaborators.
    pub fn new(cfg: Config, collaborators: Collaborators) -> Self {
        Self {
            cfg,
            collaborators,
            subscribers: Vec::new(),
            initial: SharedState::default(),
        }
    }

    /// Sets event subscribers.
    ///
    /// Subscribers receive every folded wallet event through dedicated workers
    /// with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Sets the initial ambient state (pause flag, user settings, sync status).
    pub fn with_state(mut self, state: SharedState) -> Self {
        self.initial = state;
        self
    }

    /// Builds the supervisor and spawns its event listener.
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Arc<Supervisor> {
        let subs = SubscriberSet::new(self.subscribers);
        Arc::new(Supervisor::new_internal(
            self.cfg,
            self.collaborators,
            subs,
            self.initial,
        ))
    }
}
