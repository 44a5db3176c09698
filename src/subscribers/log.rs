//! # Logging subscriber.
//!
//! [`LogWriter`] turns wallet events into `tracing` records under the
//! `walletvisor::events` target. Lifecycle events log at `info`, failures at
//! `warn`, and balance/height/file updates at `debug`.
//!
//! ## Output (with a `fmt` subscriber)
//! ```text
//! INFO walletvisor::events: engine started wallet=w1 seq=12
//! WARN walletvisor::events: engine failed wallet=w1 seq=5 error="plugin call failed: bad keys"
//! DEBUG walletvisor::events: balance changed wallet=w1 seq=9 currency=BTC balance=1000
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Logs every wallet event through `tracing`.
///
/// Enabled via the `logging` feature.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let wallet = &*e.wallet;
        let seq = e.seq;
        match &e.kind {
            EventKind::EngineStarted => {
                tracing::info!(target: "walletvisor::events", wallet, seq, "engine started");
            }
            EventKind::EngineStopped => {
                tracing::info!(target: "walletvisor::events", wallet, seq, "engine stopped");
            }
            EventKind::EngineFailed { error } => {
                tracing::warn!(target: "walletvisor::events", wallet, seq, error = %error, "engine failed");
            }
            EventKind::PauseChanged { paused } => {
                tracing::info!(target: "walletvisor::events", wallet, seq, paused, "pause changed");
            }
            EventKind::BalanceChanged {
                currency_code,
                balance,
            } => {
                tracing::debug!(target: "walletvisor::events", wallet, seq, currency = %currency_code, balance = %balance, "balance changed");
            }
            EventKind::HeightChanged { height } => {
                tracing::debug!(target: "walletvisor::events", wallet, seq, height, "height changed");
            }
            EventKind::FileNamesLoaded { names } => {
                tracing::debug!(target: "walletvisor::events", wallet, seq, files = names.len(), "transaction files loaded");
            }
            other => {
                tracing::debug!(target: "walletvisor::events", wallet, seq, event = other.as_label());
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
