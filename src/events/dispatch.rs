//! # Per-wallet dispatch and the error channel.
//!
//! - [`Dispatcher`] is how an orchestrator emits [`EventKind`]s. It feeds an
//!   unbounded, ordered queue owned by the wallet's actor, which folds each
//!   event into the wallet state and republishes it on the [`Bus`](crate::events::Bus).
//! - [`ErrorSink`] is the out-of-band error channel (`onError`). Every report is
//!   logged and broadcast to [`ErrorSink::subscribe`] receivers.
//!
//! Both are fire-and-forget: a closed queue or a missing receiver never
//! propagates back into the worker that dispatched.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::error::WalletError;
use crate::events::{Event, EventKind};

/// Ordered, fire-and-forget dispatch for one wallet.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    wallet: Arc<str>,
    tx: mpsc::UnboundedSender<Event>,
}

impl Dispatcher {
    /// Creates a dispatcher and the receiving end of its queue.
    pub fn channel(wallet: impl Into<Arc<str>>) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let me = Self {
            wallet: wallet.into(),
            tx,
        };
        (me, rx)
    }

    /// Wallet this dispatcher belongs to.
    pub fn wallet(&self) -> &Arc<str> {
        &self.wallet
    }

    /// Dispatches one event. Dropped silently once the wallet actor is gone.
    pub fn dispatch(&self, kind: EventKind) {
        let ev = Event::new(self.wallet.clone(), kind);
        if self.tx.send(ev).is_err() {
            tracing::trace!(wallet = %self.wallet, "dispatch after actor exit; dropped");
        }
    }
}

/// Out-of-band error channel.
#[derive(Clone, Debug)]
pub struct ErrorSink {
    tx: broadcast::Sender<Arc<WalletError>>,
}

impl ErrorSink {
    /// Creates a sink with the given ring-buffer capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Reports an error: logs it and hands it to every receiver.
    pub fn report(&self, err: WalletError) {
        tracing::warn!(
            wallet = err.wallet(),
            label = err.as_label(),
            fatal = err.is_fatal(),
            "{err}"
        );
        let _ = self.tx.send(Arc::new(err));
    }

    /// Creates a receiver that observes subsequent reports.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<WalletError>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PluginError;

    #[tokio::test]
    async fn test_dispatch_preserves_order() {
        let (d, mut rx) = Dispatcher::channel("w1");
        d.dispatch(EventKind::EngineStarted);
        d.dispatch(EventKind::HeightChanged { height: 7 });
        d.dispatch(EventKind::EngineStopped);

        let kinds: Vec<_> = [
            rx.recv().await.unwrap(),
            rx.recv().await.unwrap(),
            rx.recv().await.unwrap(),
        ]
        .into_iter()
        .map(|ev| ev.kind)
        .collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::EngineStarted,
                EventKind::HeightChanged { height: 7 },
                EventKind::EngineStopped
            ]
        );
    }

    #[test]
    fn test_dispatch_after_receiver_dropped_is_silent() {
        let (d, rx) = Dispatcher::channel("w1");
        drop(rx);
        d.dispatch(EventKind::EngineStarted);
    }

    #[tokio::test]
    async fn test_report_reaches_subscriber() {
        let sink = ErrorSink::new(8);
        let mut rx = sink.subscribe();
        sink.report(WalletError::EngineKill {
            wallet: Arc::from("w1"),
            source: PluginError::failed("stuck"),
        });
        let err = rx.recv().await.unwrap();
        assert_eq!(err.as_label(), "wallet_engine_kill");
    }
}
