use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::wallet::files::reload_files;
use crate::wallet::orchestrator::{WalletContext, WalletTick};
use crate::workers::{Guard, PeriodicTask, StartOptions, Update, Worker};

/// Periodic durable-storage sync.
///
/// The timer starts (first run after one interval) once the storage reports a
/// previous sync for the wallet. While the guard rejects the tick the timer is
/// stopped, so a paused wallet schedules no syncs; it restarts on the next
/// allowed tick.
pub(crate) struct SyncTimerWorker<G> {
    wallet: Arc<str>,
    wallet_id: String,
    guard: G,
    task: PeriodicTask,
}

impl<G: Guard<WalletTick>> SyncTimerWorker<G> {
    pub fn new(ctx: Arc<WalletContext>, guard: G) -> Self {
        let wallet = ctx.wallet.clone();
        let wallet_id = ctx.wallet_info.id.clone();
        let interval = ctx.config.sync_interval;
        let task = PeriodicTask::new(format!("sync:{wallet}"), interval, move || sync_once(ctx.clone()));
        Self {
            wallet,
            wallet_id,
            guard,
            task,
        }
    }
}

#[async_trait]
impl<G: Guard<WalletTick>> Worker<WalletTick> for SyncTimerWorker<G> {
    fn update(&mut self, tick: &WalletTick) -> Update {
        if !self.guard.allows(tick) {
            if self.task.is_running() {
                tracing::debug!(wallet = %self.wallet, "sync paused");
                self.task.stop();
            }
            return Update::Continue;
        }
        if tick.ambient.last_sync(&self.wallet_id).is_some() && !self.task.is_running() {
            self.task.start(StartOptions { wait: true });
        }
        Update::Continue
    }

    async fn destroy(&mut self) {
        self.task.stop();
    }
}

/// One sync; reloads wallet files if it changed anything.
async fn sync_once(ctx: Arc<WalletContext>) -> Result<(), StorageError> {
    let changes = ctx.storage.sync(&ctx.wallet_info.id).await?;
    if changes.is_empty() || ctx.cancel.is_cancelled() {
        return Ok(());
    }
    tracing::debug!(wallet = %ctx.wallet, changed = changes.len(), "sync changed files; reloading");
    let attached = ctx.attached.get().ok_or_else(|| StorageError::NotAttached {
        wallet: ctx.wallet_info.id.clone(),
    })?;
    reload_files(attached.encrypted.as_ref(), &ctx.dispatcher).await
}
