//! # Engine creation.
//!
//! Once the plugin is known, creation runs as one spawned task:
//!
//! ```text
//! attach storage ── Err ─► report StorageAttach, stop
//!   │
//! public info (cache, else derive; empty keys on failure)
//!   │
//! dispatch PublicInfoUpdated(public only)
//!   │
//! make_engine(private ∪ public) ── Err ─► dispatch EngineFailed, report EngineCreate
//!   │ Ok
//! dispatch SeedsChanged, publish output.engine,
//! dispatch balance + height, fetch staking (if supported)
//!   │
//! reload files + watch storage changes   (also after EngineFailed)
//! ```
//!
//! Every suspension point races the wallet's cancellation token; a cancelled
//! creation publishes nothing further.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::WalletError;
use crate::events::EventKind;
use crate::wallet::key_cache::{resolve_public_info, PublicKeyCache};
use crate::wallet::orchestrator::{WalletContext, WalletOutput, WalletTick};
use crate::wallet::plugin::{integer_or_zero, CurrencyEngine, CurrencyPlugin, EngineCallbacks, EngineOptions};
use crate::wallet::state::UserSettings;
use crate::workers::{Outputs, Update, Worker};

/// Creates the engine once per wallet lifetime.
pub(crate) struct EngineWorker {
    ctx: Arc<WalletContext>,
    creation: Option<JoinHandle<()>>,
}

impl EngineWorker {
    pub fn new(ctx: Arc<WalletContext>) -> Self {
        Self {
            ctx,
            creation: None,
        }
    }
}

#[async_trait]
impl Worker<WalletTick> for EngineWorker {
    fn update(&mut self, tick: &WalletTick) -> Update {
        if self.creation.is_some() {
            return Update::Done;
        }
        let Some(plugin) = tick.output.with(|o| o.plugin.clone()) else {
            return Update::Continue;
        };
        let settings = tick.ambient.settings_for(plugin.plugin_id()).cloned();
        let _ = self.ctx.engine_settings.set(settings.clone());
        self.creation = Some(tokio::spawn(create_engine(
            self.ctx.clone(),
            plugin,
            settings,
            tick.output.clone(),
        )));
        Update::Done
    }

    async fn destroy(&mut self) {
        if let Some(creation) = self.creation.take() {
            if let Err(e) = creation.await {
                tracing::warn!(wallet = %self.ctx.wallet, error = %e, "engine creation task failed");
            }
        }
    }
}

/// Resolves to `None` if `token` is cancelled first.
async fn until_cancelled<F: Future>(token: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = token.cancelled() => None,
        out = fut => Some(out),
    }
}

async fn create_engine(
    ctx: Arc<WalletContext>,
    plugin: Arc<dyn CurrencyPlugin>,
    settings: Option<UserSettings>,
    output: Outputs<WalletOutput>,
) {
    let attached = match until_cancelled(&ctx.cancel, ctx.storage.attach(&ctx.wallet_info)).await {
        None => return,
        Some(Ok(attached)) => attached,
        Some(Err(source)) => {
            ctx.errors.report(WalletError::StorageAttach {
                wallet: ctx.wallet.clone(),
                source,
            });
            return;
        }
    };
    let _ = ctx.attached.set(attached.clone());

    let cache = PublicKeyCache::new(attached.local.clone(), ctx.config.public_key_path.clone());
    let Some(public) = until_cancelled(
        &ctx.cancel,
        resolve_public_info(plugin.as_ref(), &ctx.wallet_info, &cache),
    )
    .await
    else {
        return;
    };
    let merged = ctx.wallet_info.merged_with(&public);
    ctx.dispatcher.dispatch(EventKind::PublicInfoUpdated {
        wallet_info: public,
    });

    let opts = EngineOptions {
        callbacks: EngineCallbacks::new(ctx.dispatcher.clone()),
        local: attached.local.clone(),
        encrypted: attached.encrypted.clone(),
        user_settings: settings,
    };
    match until_cancelled(&ctx.cancel, plugin.make_engine(merged, opts)).await {
        None => return,
        Some(Ok(engine)) => {
            if ctx.cancel.is_cancelled() {
                return;
            }
            tracing::info!(wallet = %ctx.wallet, plugin = plugin.plugin_id(), "engine created");
            publish_engine(&ctx, plugin.as_ref(), engine, &output);
        }
        Some(Err(source)) => {
            ctx.dispatcher.dispatch(EventKind::EngineFailed {
                error: source.to_string(),
            });
            ctx.errors.report(WalletError::EngineCreate {
                wallet: ctx.wallet.clone(),
                source,
            });
        }
    }

    let changes = ctx.storage.changes(&ctx.wallet_info.id);
    tokio::spawn({
        let ctx = ctx.clone();
        async move {
            until_cancelled(&ctx.cancel, ctx.reload_files()).await;
        }
    });
    tokio::spawn(watch_changes(ctx, changes));
}

fn publish_engine(
    ctx: &Arc<WalletContext>,
    plugin: &dyn CurrencyPlugin,
    engine: Arc<dyn CurrencyEngine>,
    output: &Outputs<WalletOutput>,
) {
    ctx.dispatcher.dispatch(EventKind::SeedsChanged {
        display_private_seed: engine.display_private_seed(),
        display_public_seed: engine.display_public_seed(),
    });
    output.modify(|o| {
        o.engine = Some(engine.clone());
        true
    });

    let code = plugin.currency_code();
    ctx.dispatcher.dispatch(EventKind::BalanceChanged {
        currency_code: code.to_string(),
        balance: integer_or_zero(&engine.balance(code)),
    });
    ctx.dispatcher.dispatch(EventKind::HeightChanged {
        height: engine.block_height(),
    });

    if engine.supports_staking() {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            match until_cancelled(&ctx.cancel, engine.staking_status()).await {
                None => {}
                Some(Ok(status)) => ctx.dispatcher.dispatch(EventKind::StakingChanged { status }),
                Some(Err(source)) => ctx.errors.report(WalletError::Staking {
                    wallet: ctx.wallet.clone(),
                    source,
                }),
            }
        });
    }
}

/// Reloads wallet files whenever the storage reports changes from syncs it ran itself.
async fn watch_changes(
    ctx: Arc<WalletContext>,
    mut changes: tokio::sync::broadcast::Receiver<Vec<String>>,
) {
    loop {
        let paths = tokio::select! {
            _ = ctx.cancel.cancelled() => return,
            res = changes.recv() => res,
        };
        match paths {
            Ok(paths) => {
                tracing::debug!(wallet = %ctx.wallet, changed = paths.len(), "storage changed; reloading files");
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(wallet = %ctx.wallet, skipped, "storage change notices lagged; reloading files");
            }
            Err(RecvError::Closed) => return,
        }
        if until_cancelled(&ctx.cancel, ctx.reload_files()).await.is_none() {
            return;
        }
    }
}
