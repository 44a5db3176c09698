use std::sync::Arc;

use crate::wallet::orchestrator::{WalletContext, WalletTick};
use crate::workers::{Update, Worker, WorkerFn};

/// Resolves the wallet's plugin once the registry knows its type.
///
/// Unknown types are not an error: the registry is asked again on every tick.
pub(crate) fn plugin(ctx: Arc<WalletContext>) -> impl Worker<WalletTick> {
    WorkerFn::new("plugin", move |tick: &WalletTick| {
        if tick.output.with(|o| o.plugin.is_some()) {
            return Update::Done;
        }
        let Some(plugin) = ctx.plugins.resolve(&ctx.wallet_info.wallet_type) else {
            tracing::trace!(wallet = %ctx.wallet, wallet_type = %ctx.wallet_info.wallet_type, "plugin not available yet");
            return Update::Continue;
        };
        tracing::debug!(wallet = %ctx.wallet, plugin = plugin.plugin_id(), "plugin resolved");
        tick.output.modify(|o| {
            o.plugin = Some(plugin);
            true
        });
        Update::Done
    })
}
