//! # Engine start/stop.
//!
//! ## Rules
//! - Starts at most once per wallet lifetime, after the api is published and
//!   the fiat and transaction file names are loaded.
//! - `EngineStarted` is dispatched before `start_engine` is called, so the
//!   condition is not re-entered on the next tick.
//! - On teardown the stop waits for the start to settle, then kills the engine
//!   and dispatches `EngineStopped`. Start and kill failures, panics included,
//!   go to the error channel and do not block the teardown.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::task::JoinHandle;

use crate::error::{PluginError, WalletError};
use crate::events::EventKind;
use crate::wallet::orchestrator::{WalletContext, WalletTick};
use crate::wallet::plugin::CurrencyEngine;
use crate::workers::{Update, Worker};

pub(crate) struct EngineStartedWorker {
    ctx: Arc<WalletContext>,
    started: Option<(Arc<dyn CurrencyEngine>, JoinHandle<()>)>,
}

impl EngineStartedWorker {
    pub fn new(ctx: Arc<WalletContext>) -> Self {
        Self { ctx, started: None }
    }
}

#[async_trait]
impl Worker<WalletTick> for EngineStartedWorker {
    fn update(&mut self, tick: &WalletTick) -> Update {
        if self.started.is_some() {
            return Update::Done;
        }
        let Some(engine) = tick
            .output
            .with(|o| o.api.as_ref().and(o.engine.clone()))
        else {
            return Update::Continue;
        };
        let state = &tick.self_state;
        if !state.fiat_loaded || !state.file_names_loaded || state.engine_started {
            return Update::Continue;
        }

        tracing::info!(wallet = %self.ctx.wallet, "starting engine");
        self.ctx.dispatcher.dispatch(EventKind::EngineStarted);

        let ctx = self.ctx.clone();
        let starting = engine.clone();
        let handle = tokio::spawn(async move {
            if let Err(source) = call_engine(starting.start_engine()).await {
                ctx.errors.report(WalletError::EngineStart {
                    wallet: ctx.wallet.clone(),
                    source,
                });
            }
        });
        self.started = Some((engine, handle));
        Update::Done
    }

    async fn destroy(&mut self) {
        let Some((engine, start)) = self.started.take() else {
            return;
        };
        if let Err(e) = start.await {
            tracing::warn!(wallet = %self.ctx.wallet, error = %e, "engine start task failed");
        }
        if let Err(source) = call_engine(engine.kill_engine()).await {
            self.ctx.errors.report(WalletError::EngineKill {
                wallet: self.ctx.wallet.clone(),
                source,
            });
        }
        tracing::info!(wallet = %self.ctx.wallet, "engine stopped");
        self.ctx.dispatcher.dispatch(EventKind::EngineStopped);
    }
}

/// Awaits an engine call, turning a panic into a [`PluginError`].
async fn call_engine<F>(fut: F) -> Result<(), PluginError>
where
    F: Future<Output = Result<(), PluginError>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(res) => res,
        Err(panic) => Err(PluginError::failed(panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("engine panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("engine panicked: {s}")
    } else {
        "engine panicked".to_string()
    }
}
