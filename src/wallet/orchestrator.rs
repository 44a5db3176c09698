//! # Per-wallet orchestrator.
//!
//! One [`WalletOrchestrator`] supervises one wallet. It owns a worker group,
//! built once per wallet lifetime, and publishes a [`WalletOutput`] bundle.
//!
//! ```text
//! WalletTick { ambient, self_state, output }
//!     │
//!     ▼
//! WorkerGroup (declared order; destroyed in reverse)
//!   1. plugin          resolve plugin by wallet type                 ─► output.plugin
//!   2. engine          attach storage, keys, build engine (spawned)  ─► output.engine
//!   3. api             publish handle once everything is known       ─► output.api
//!   4. engine_started  [not paused] start engine; stop on teardown
//!   5. sync_timer      [not paused] periodic storage sync
//!   6. watcher         republish snapshots, push settings changes
//! ```
//!
//! ## Rules
//! - A tick whose ambient state, self state and output are all unchanged (by
//!   reference) is skipped.
//! - Async work spawned by the workers observes one cancellation token; once the
//!   orchestrator is destroyed, nothing more is published into the output.
//! - After [`WalletOrchestrator::destroy`] the output is empty again.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;

use crate::core::reconciler::{Reconciler, TickInput};
use crate::core::Config;
use crate::error::WalletError;
use crate::events::{Dispatcher, ErrorSink};
use crate::wallet::api::WalletApi;
use crate::wallet::files::reload_files;
use crate::wallet::plugin::{CurrencyEngine, CurrencyPlugin, PluginRegistry};
use crate::wallet::state::{SharedState, UserSettings, WalletInfo, WalletSelfState};
use crate::wallet::storage::{AttachedStorage, DurableStorage};
use crate::wallet::workers;
use crate::workers::{Guarded, Outputs, WorkerGroup};

/// Named output bundle of a wallet's worker group.
#[derive(Clone, Default)]
pub struct WalletOutput {
    pub plugin: Option<Arc<dyn CurrencyPlugin>>,
    pub engine: Option<Arc<dyn CurrencyEngine>>,
    pub api: Option<Arc<WalletApi>>,
}

impl WalletOutput {
    /// `true` if every field refers to the same object as in `other`.
    pub fn same_as(&self, other: &WalletOutput) -> bool {
        opt_ptr_eq(&self.plugin, &other.plugin)
            && opt_ptr_eq(&self.engine, &other.engine)
            && opt_ptr_eq(&self.api, &other.api)
    }

    pub fn is_empty(&self) -> bool {
        self.plugin.is_none() && self.engine.is_none() && self.api.is_none()
    }
}

impl fmt::Debug for WalletOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletOutput")
            .field("plugin", &self.plugin.as_ref().map(|p| p.plugin_id().to_string()))
            .field("engine", &self.engine.is_some())
            .field("api", &self.api)
            .finish()
    }
}

pub(crate) fn opt_ptr_eq<T: ?Sized>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Input of one orchestrator tick.
#[derive(Clone)]
pub struct WalletTick {
    pub ambient: Arc<SharedState>,
    pub self_state: Arc<WalletSelfState>,
    /// Live output bundle; workers read what earlier workers published this tick.
    pub output: Outputs<WalletOutput>,
    /// Output as it was when the tick was built. Used only for change detection.
    seen: WalletOutput,
}

impl WalletTick {
    pub fn new(
        ambient: Arc<SharedState>,
        self_state: Arc<WalletSelfState>,
        output: Outputs<WalletOutput>,
    ) -> Self {
        let seen = output.get();
        Self {
            ambient,
            self_state,
            output,
            seen,
        }
    }
}

impl TickInput for WalletTick {
    fn same_as(&self, prev: &Self) -> bool {
        Arc::ptr_eq(&self.ambient, &prev.ambient)
            && Arc::ptr_eq(&self.self_state, &prev.self_state)
            && self.seen.same_as(&prev.seen)
    }
}

/// Not globally paused and not paused individually.
pub fn not_paused(tick: &WalletTick) -> bool {
    !tick.ambient.paused && !tick.self_state.paused
}

/// Host collaborators shared by every wallet of a runtime.
#[derive(Clone)]
pub struct Collaborators {
    pub plugins: Arc<dyn PluginRegistry>,
    pub storage: Arc<dyn DurableStorage>,
}

/// Everything the workers of one wallet share.
pub(crate) struct WalletContext {
    pub wallet_info: WalletInfo,
    pub wallet: Arc<str>,
    pub plugins: Arc<dyn PluginRegistry>,
    pub storage: Arc<dyn DurableStorage>,
    pub dispatcher: Dispatcher,
    pub errors: ErrorSink,
    pub config: Config,
    /// Set once storage attached successfully.
    pub attached: OnceLock<AttachedStorage>,
    /// Settings handed to the engine factory; the watcher pushes only newer ones.
    pub engine_settings: OnceLock<Option<UserSettings>>,
    /// Cancelled when the orchestrator is destroyed.
    pub cancel: CancellationToken,
}

impl WalletContext {
    /// Reloads cached wallet files; failures go to the error channel.
    pub async fn reload_files(&self) {
        let res = match self.attached.get() {
            Some(attached) => reload_files(attached.encrypted.as_ref(), &self.dispatcher).await,
            None => Err(crate::error::StorageError::NotAttached {
                wallet: self.wallet_info.id.clone(),
            }),
        };
        if let Err(source) = res {
            self.errors.report(WalletError::FileReload {
                wallet: self.wallet.clone(),
                source,
            });
        }
    }
}

/// Supervises one wallet.
pub struct WalletOrchestrator {
    ctx: Arc<WalletContext>,
    output: Outputs<WalletOutput>,
    reconciler: Reconciler<WalletTick, WorkerGroup<WalletTick>>,
}

impl WalletOrchestrator {
    /// Builds the worker group for `wallet_info`. Nothing runs until the first tick.
    pub fn new(
        wallet_info: WalletInfo,
        collaborators: Collaborators,
        dispatcher: Dispatcher,
        errors: ErrorSink,
        config: Config,
    ) -> Self {
        let ctx = Arc::new(WalletContext {
            wallet: dispatcher.wallet().clone(),
            wallet_info,
            plugins: collaborators.plugins,
            storage: collaborators.storage,
            dispatcher,
            errors,
            config,
            attached: OnceLock::new(),
            engine_settings: OnceLock::new(),
            cancel: CancellationToken::new(),
        });

        let group = WorkerGroup::new()
            .with("plugin", workers::plugin(ctx.clone()))
            .with("engine", workers::EngineWorker::new(ctx.clone()))
            .with("api", workers::ApiWorker::new())
            .with(
                "engine_started",
                Guarded::new(workers::EngineStartedWorker::new(ctx.clone()), not_paused),
            )
            .with("sync_timer", workers::SyncTimerWorker::new(ctx.clone(), not_paused))
            .with("watcher", workers::WatcherWorker::new(ctx.clone()));

        Self {
            ctx,
            output: Outputs::default(),
            reconciler: Reconciler::new(group),
        }
    }

    pub fn wallet_id(&self) -> &str {
        &self.ctx.wallet_info.id
    }

    /// The published output bundle.
    pub fn output(&self) -> &Outputs<WalletOutput> {
        &self.output
    }

    /// Number of ticks that reached the worker group.
    pub fn ticks(&self) -> u64 {
        self.reconciler.ticks()
    }

    /// Ticks the worker group unless nothing changed. Returns whether it ran.
    pub fn tick(&mut self, ambient: Arc<SharedState>, self_state: Arc<WalletSelfState>) -> bool {
        if self.ctx.cancel.is_cancelled() {
            return false;
        }
        let tick = WalletTick::new(ambient, self_state, self.output.clone());
        self.reconciler.reconcile(tick)
    }

    /// Ticks the worker group even if nothing changed.
    pub fn force_tick(&mut self, ambient: Arc<SharedState>, self_state: Arc<WalletSelfState>) {
        if self.ctx.cancel.is_cancelled() {
            return;
        }
        let tick = WalletTick::new(ambient, self_state, self.output.clone());
        self.reconciler.force(tick);
    }

    /// Tears the wallet down: cancels spawned work, destroys workers in
    /// reverse order and clears the output.
    pub async fn destroy(&mut self) {
        if self.ctx.cancel.is_cancelled() {
            return;
        }
        tracing::debug!(wallet = %self.ctx.wallet, "destroying wallet orchestrator");
        self.ctx.cancel.cancel();
        self.reconciler.destroy().await;
        self.output.replace(WalletOutput::default());
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::events::EventKind;
    use crate::stores::MemoryStorage;
    use crate::testkit::{FakePlugin, Harness};
    use crate::wallet::files::{FIAT_FILE, NAME_FILE};
    use crate::wallet::storage::FileStore;
    use crate::wallet::state::StorageStatus;

    #[tokio::test]
    async fn test_full_bring_up_publishes_api_and_starts_engine() {
        let mut h = Harness::new(FakePlugin::new());
        h.run().await;

        let out = h.output();
        assert!(out.plugin.is_some());
        assert!(out.engine.is_some());
        let api = out.api.expect("api published");
        assert_eq!(api.id(), "wallet-1");
        assert_eq!(api.currency_code(), "FAKE");
        assert!(h.state.engine_started);
        assert_eq!(h.engine().calls(), vec!["start:begin", "start:end"]);
        assert_eq!(h.count("engine_started"), 1);
        assert_eq!(h.count("public_info_updated"), 1);
        assert_eq!(h.state.balances.get("FAKE").map(String::as_str), Some("100"));
        assert_eq!(h.state.height, 7);
    }

    #[tokio::test]
    async fn test_missing_plugin_waits_then_proceeds() {
        let mut h = Harness::without_plugin();
        for _ in 0..5 {
            h.run().await;
        }
        assert!(h.output().is_empty());
        assert_eq!(h.storage.attached(), Vec::<String>::new());

        h.register_plugin(FakePlugin::new());
        h.refresh();
        h.run().await;
        assert!(h.output().api.is_some());
        assert_eq!(h.plugin().make_calls(), 1);
    }

    #[tokio::test]
    async fn test_engine_created_once_across_ticks() {
        let mut h = Harness::new(FakePlugin::new());
        h.run().await;
        for _ in 0..5 {
            h.refresh();
            h.run().await;
        }
        assert_eq!(h.plugin().make_calls(), 1);
        assert_eq!(h.count("engine_started"), 1);
        assert_eq!(h.engine().calls(), vec!["start:begin", "start:end"]);
    }

    #[tokio::test]
    async fn test_public_info_keeps_private_keys_out() {
        let mut h = Harness::new(FakePlugin::new());
        h.run().await;

        let public = h.state.public_wallet_info.clone().unwrap();
        assert!(public.keys.get("seed").is_none());
        assert_eq!(public.keys.get("publicKey").and_then(|v| v.as_str()), Some("pub-wallet-1"));

        // The engine sees private and public keys merged.
        let seen = h.plugin().last_wallet_info().unwrap();
        assert!(seen.keys.contains_key("seed"));
        assert!(seen.keys.contains_key("publicKey"));
    }

    #[tokio::test]
    async fn test_cached_public_key_skips_derivation() {
        let mut h = Harness::new(FakePlugin::new());
        h.storage
            .local("wallet-1")
            .set_text(
                "PublicKey.json",
                r#"{"walletInfo":{"id":"wallet-1","type":"wallet:fake","keys":{"publicKey":"cached"}}}"#,
            )
            .await
            .unwrap();
        h.run().await;

        assert_eq!(h.plugin().derive_calls(), 0);
        let public = h.state.public_wallet_info.clone().unwrap();
        assert_eq!(public.keys.get("publicKey").and_then(|v| v.as_str()), Some("cached"));
    }

    #[tokio::test]
    async fn test_derivation_failure_still_builds_engine() {
        let mut h = Harness::new(FakePlugin::new().fail_derive());
        h.run().await;

        let public = h.state.public_wallet_info.clone().unwrap();
        assert!(public.keys.is_empty());
        assert_eq!(h.count("public_info_updated"), 1);
        assert!(h.output().api.is_some());
        assert_eq!(h.storage.local("wallet-1").get_text("PublicKey.json").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_engine_factory_failure_halts_generation() {
        let mut h = Harness::new(FakePlugin::new().fail_make());
        h.run().await;

        assert_eq!(h.count("engine_failed"), 1);
        assert!(h.output().engine.is_none());
        assert!(h.output().api.is_none());
        assert!(h.state.engine_failure.is_some());
        assert_eq!(h.error_labels(), vec!["wallet_engine_create"]);
        // Files are still reloaded.
        assert!(h.state.name_loaded);
        assert!(h.state.fiat_loaded);
    }

    #[tokio::test]
    async fn test_attach_failure_reports_and_stops() {
        let mut h = Harness::with_storage(MemoryStorage::new().failing_attach(), FakePlugin::new());
        h.run().await;

        assert_eq!(h.error_labels(), vec!["wallet_storage_attach"]);
        assert_eq!(h.plugin().make_calls(), 0);
        assert_eq!(h.count("engine_failed"), 0);
        assert!(!h.state.name_loaded);
    }

    #[tokio::test]
    async fn test_files_loaded_from_encrypted_store() {
        let mut h = Harness::new(FakePlugin::new());
        let enc = h.storage.encrypted("wallet-1");
        enc.set_text(NAME_FILE, r#"{"walletName":"Savings"}"#).await.unwrap();
        enc.set_text(FIAT_FILE, r#"{"fiat":"iso:EUR"}"#).await.unwrap();
        h.run().await;

        assert_eq!(h.state.name.as_deref(), Some("Savings"));
        assert_eq!(h.state.fiat.as_deref(), Some("iso:EUR"));
        let api = h.output().api.unwrap();
        assert_eq!(api.snapshot().name.as_deref(), Some("Savings"));
    }

    #[tokio::test]
    async fn test_paused_wallet_never_starts() {
        let mut h = Harness::new(FakePlugin::new());
        h.set_ambient(|s| s.paused = true);
        h.run().await;

        assert!(h.output().api.is_some());
        assert_eq!(h.count("engine_started"), 0);
        assert!(h.engine().calls().is_empty());

        h.set_ambient(|s| s.paused = false);
        h.run().await;
        assert_eq!(h.count("engine_started"), 1);
    }

    #[tokio::test]
    async fn test_pause_after_start_does_not_stop_engine() {
        let mut h = Harness::new(FakePlugin::new());
        h.run().await;
        h.dispatch(EventKind::PauseChanged { paused: true });
        h.run().await;

        assert!(h.state.paused);
        assert!(h.output().engine.is_some());
        assert!(h.output().api.is_some());
        assert_eq!(h.engine().calls(), vec!["start:begin", "start:end"]);
        assert_eq!(h.count("engine_stopped"), 0);

        h.destroy().await;
        assert_eq!(h.engine().calls(), vec!["start:begin", "start:end", "kill"]);
        assert_eq!(h.count("engine_stopped"), 1);
    }

    #[tokio::test]
    async fn test_pause_during_start_then_destroy_waits_for_start() {
        let mut h = Harness::new(FakePlugin::new().gate_start());
        h.run().await;
        assert_eq!(h.engine().calls(), vec!["start:begin"]);

        h.dispatch(EventKind::PauseChanged { paused: true });
        h.run().await;
        assert!(h.state.paused);
        assert!(h.output().engine.is_some());
        assert_eq!(h.engine().calls(), vec!["start:begin"]);

        let engine = h.engine();
        let mut orchestrator = h.take_orchestrator();
        let teardown = tokio::spawn(async move {
            orchestrator.destroy().await;
            orchestrator
        });
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        assert_eq!(engine.calls(), vec!["start:begin"]);

        engine.release_start();
        teardown.await.unwrap();
        assert_eq!(engine.calls(), vec!["start:begin", "start:end", "kill"]);
        h.settle().await;
        assert_eq!(h.count("engine_stopped"), 1);
    }

    #[tokio::test]
    async fn test_destroy_stops_engine_and_clears_output() {
        let mut h = Harness::new(FakePlugin::new());
        h.run().await;
        h.destroy().await;

        assert_eq!(h.engine().calls(), vec!["start:begin", "start:end", "kill"]);
        assert_eq!(h.count("engine_stopped"), 1);
        assert!(!h.state.engine_started);
        assert!(h.output().is_empty());
    }

    #[tokio::test]
    async fn test_stop_waits_for_start_to_settle() {
        let mut h = Harness::new(FakePlugin::new().gate_start());
        h.run().await;
        assert_eq!(h.engine().calls(), vec!["start:begin"]);

        let engine = h.engine();
        let mut orchestrator = h.take_orchestrator();
        let teardown = tokio::spawn(async move {
            orchestrator.destroy().await;
            orchestrator
        });
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        assert_eq!(engine.calls(), vec!["start:begin"]);

        engine.release_start();
        teardown.await.unwrap();
        assert_eq!(engine.calls(), vec!["start:begin", "start:end", "kill"]);
    }

    #[tokio::test]
    async fn test_start_and_kill_failures_are_reported() {
        let mut h = Harness::new(FakePlugin::new().fail_start().fail_kill());
        h.run().await;
        h.destroy().await;

        assert_eq!(
            h.error_labels(),
            vec!["wallet_engine_start", "wallet_engine_kill"]
        );
        assert_eq!(h.count("engine_stopped"), 1);
    }

    #[tokio::test]
    async fn test_api_reverts_when_name_unloaded() {
        let mut h = Harness::new(FakePlugin::new());
        h.run().await;
        let first = h.output().api.unwrap();

        h.override_state(|s| s.name_loaded = false);
        h.run().await;
        assert!(h.output().api.is_none());

        h.dispatch(EventKind::NameLoaded { name: None });
        h.run().await;
        let again = h.output().api.unwrap();
        assert!(Arc::ptr_eq(&first, &again));
    }

    #[tokio::test]
    async fn test_watcher_publishes_new_snapshots() {
        let mut h = Harness::new(FakePlugin::new());
        h.run().await;
        let api = h.output().api.unwrap();
        let mut rx = api.subscribe();
        rx.borrow_and_update();

        h.engine().callbacks().on_block_height_changed(42);
        h.run().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().height, 42);
    }

    #[tokio::test]
    async fn test_settings_pushed_only_on_change() {
        let mut h = Harness::new(FakePlugin::new());
        let first = Arc::new(serde_json::Map::new());
        h.set_ambient(|s| {
            s.user_settings.insert("fake".into(), first.clone());
        });
        h.run().await;
        // Settings given at construction are not pushed again.
        assert!(h.engine().settings_pushed().is_empty());

        h.set_ambient(|s| s.paused = false);
        h.run().await;
        assert!(h.engine().settings_pushed().is_empty());

        let mut next = serde_json::Map::new();
        next.insert("fee".into(), serde_json::json!("high"));
        let next = Arc::new(next);
        h.set_ambient(|s| {
            s.user_settings.insert("fake".into(), next.clone());
        });
        h.run().await;
        assert_eq!(h.engine().settings_pushed(), vec![next]);
    }

    #[tokio::test]
    async fn test_settings_changed_during_creation_reach_engine() {
        let mut h = Harness::new(FakePlugin::new().gate_make());
        let first = Arc::new(serde_json::Map::new());
        h.set_ambient(|s| {
            s.user_settings.insert("fake".into(), first.clone());
        });
        h.run().await;
        assert!(h.output().engine.is_none());

        let mut next = serde_json::Map::new();
        next.insert("fee".into(), serde_json::json!("high"));
        let next = Arc::new(next);
        h.set_ambient(|s| {
            s.user_settings.insert("fake".into(), next.clone());
        });
        h.run().await;

        h.plugin().release_make();
        h.run().await;
        assert!(h.output().engine.is_some());
        assert_eq!(h.engine().settings_pushed(), vec![next.clone()]);

        h.run().await;
        assert_eq!(h.engine().settings_pushed(), vec![next]);
    }

    #[tokio::test]
    async fn test_staking_fetched_when_supported() {
        let mut h = Harness::new(FakePlugin::new().with_staking());
        h.run().await;
        assert_eq!(h.count("staking_changed"), 1);
        assert!(h.state.staking.is_some());

        let mut plain = Harness::new(FakePlugin::new());
        plain.run().await;
        assert_eq!(plain.count("staking_changed"), 0);
    }

    #[tokio::test]
    async fn test_external_changes_reload_files() {
        let mut h = Harness::new(FakePlugin::new());
        h.run().await;
        assert_eq!(h.state.name, None);

        h.storage
            .encrypted("wallet-1")
            .set_text(NAME_FILE, r#"{"walletName":"Renamed"}"#)
            .await
            .unwrap();
        h.storage.announce("wallet-1", vec![NAME_FILE.into()]);
        h.run().await;
        assert_eq!(h.state.name.as_deref(), Some("Renamed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_timer_waits_for_last_sync() {
        let mut h = Harness::new(FakePlugin::new());
        let interval = h.config().sync_interval;
        for _ in 0..5 {
            h.refresh();
            h.run().await;
        }
        tokio::time::sleep(interval * 3).await;
        assert_eq!(h.storage.sync_calls(), 0);

        h.set_ambient(|s| {
            s.storage_wallets.insert(
                "wallet-1".into(),
                StorageStatus {
                    last_sync: Some(1),
                    last_hash: None,
                },
            );
        });
        h.run().await;
        // Started with `wait`: nothing runs before one interval elapsed.
        assert_eq!(h.storage.sync_calls(), 0);

        tokio::time::sleep(interval + Duration::from_millis(10)).await;
        h.settle().await;
        assert_eq!(h.storage.sync_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_with_changes_reloads_files() {
        let mut h = Harness::new(FakePlugin::new());
        h.set_ambient(|s| {
            s.storage_wallets.insert(
                "wallet-1".into(),
                StorageStatus {
                    last_sync: Some(1),
                    last_hash: None,
                },
            );
        });
        h.run().await;
        let loads = h.count("name_loaded");

        h.storage
            .encrypted("wallet-1")
            .set_text(NAME_FILE, r#"{"walletName":"Synced"}"#)
            .await
            .unwrap();
        h.storage.stage_changes("wallet-1", vec![NAME_FILE.into()]);
        tokio::time::sleep(h.config().sync_interval + Duration::from_millis(10)).await;
        h.run().await;

        assert_eq!(h.count("name_loaded"), loads + 1);
        assert_eq!(h.state.name.as_deref(), Some("Synced"));
    }

    #[tokio::test]
    async fn test_nothing_published_after_destroy() {
        let mut h = Harness::new(FakePlugin::new().gate_make());
        h.run().await;
        assert!(h.output().engine.is_none());

        let plugin = h.plugin();
        let mut orchestrator = h.take_orchestrator();
        let teardown = tokio::spawn(async move {
            orchestrator.destroy().await;
            orchestrator
        });
        let orchestrator = teardown.await.unwrap();
        plugin.release_make();
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        assert!(orchestrator.output().get().is_empty());
    }
}
