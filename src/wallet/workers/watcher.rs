use std::sync::Arc;

use async_trait::async_trait;

use crate::error::WalletError;
use crate::wallet::api::WalletApi;
use crate::wallet::orchestrator::{opt_ptr_eq, WalletContext, WalletTick};
use crate::wallet::state::{UserSettings, WalletSelfState};
use crate::workers::{Update, Worker};

/// Keeps observers and the engine in step with state changes.
///
/// - A new api handle or a new self state publishes a fresh snapshot.
/// - A user-settings reference for the plugin other than the one the engine
///   was built with is pushed into the live engine, including one that
///   changed while the engine was still being constructed.
pub(crate) struct WatcherWorker {
    ctx: Arc<WalletContext>,
    api: Option<Arc<WalletApi>>,
    state: Option<Arc<WalletSelfState>>,
    settings: Option<UserSettings>,
}

impl WatcherWorker {
    pub fn new(ctx: Arc<WalletContext>) -> Self {
        Self {
            ctx,
            api: None,
            state: None,
            settings: None,
        }
    }
}

#[async_trait]
impl Worker<WalletTick> for WatcherWorker {
    fn update(&mut self, tick: &WalletTick) -> Update {
        let out = tick.output.get();

        let state_changed = !self
            .state
            .as_ref()
            .is_some_and(|s| Arc::ptr_eq(s, &tick.self_state));
        if state_changed || !opt_ptr_eq(&self.api, &out.api) {
            if let Some(api) = &out.api {
                api.publish(&tick.self_state);
            }
            self.api = out.api.clone();
            self.state = Some(tick.self_state.clone());
        }

        let (Some(plugin), Some(engine)) = (&out.plugin, out.engine) else {
            return Update::Continue;
        };
        let Some(settings) = tick.ambient.settings_for(plugin.plugin_id()) else {
            return Update::Continue;
        };
        if self.settings.is_none() {
            self.settings = self.ctx.engine_settings.get().cloned().flatten();
        }
        if self.settings.as_ref().is_some_and(|s| Arc::ptr_eq(s, settings)) {
            return Update::Continue;
        }
        self.settings = Some(settings.clone());

        tracing::debug!(wallet = %self.ctx.wallet, "pushing user settings");
        let ctx = self.ctx.clone();
        let settings = settings.clone();
        tokio::spawn(async move {
            if let Err(source) = engine.change_user_settings(settings).await {
                ctx.errors.report(WalletError::Settings {
                    wallet: ctx.wallet.clone(),
                    source,
                });
            }
        });
        Update::Continue
    }
}
