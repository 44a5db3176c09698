use std::sync::Arc;

use async_trait::async_trait;

use crate::wallet::api::WalletApi;
use crate::wallet::orchestrator::WalletTick;
use crate::workers::{Update, Worker};

/// Publishes the wallet handle while plugin, engine, public info and name are known.
///
/// The handle is built once; if a precondition drops the output reverts to
/// `None`, and the same handle is published again when it returns.
pub(crate) struct ApiWorker {
    built: Option<Arc<WalletApi>>,
}

impl ApiWorker {
    pub fn new() -> Self {
        Self { built: None }
    }
}

#[async_trait]
impl Worker<WalletTick> for ApiWorker {
    fn update(&mut self, tick: &WalletTick) -> Update {
        let out = tick.output.get();
        let state = &tick.self_state;

        let parts = match (out.plugin, out.engine, &state.public_wallet_info) {
            (Some(plugin), Some(engine), Some(info)) if state.name_loaded => Some((plugin, engine, info)),
            _ => None,
        };
        let Some((plugin, engine, info)) = parts else {
            tick.output.modify(|o| o.api.take().is_some());
            return Update::Continue;
        };

        let api = self
            .built
            .get_or_insert_with(|| {
                tracing::debug!(wallet = %state.id, "wallet api ready");
                Arc::new(WalletApi::new(plugin, engine, info.clone(), state))
            })
            .clone();
        tick.output.modify(|o| match &o.api {
            Some(current) if Arc::ptr_eq(current, &api) => false,
            _ => {
                o.api = Some(api);
                true
            }
        });
        Update::Continue
    }
}
