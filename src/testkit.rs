//! Test doubles and a tick harness for orchestrator tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::{broadcast, mpsc, Semaphore};

use crate::core::Config;
use crate::error::{PluginError, WalletError};
use crate::events::{Dispatcher, ErrorSink, Event, EventKind};
use crate::stores::MemoryStorage;
use crate::wallet::{
    Collaborators, CurrencyEngine, CurrencyPlugin, EngineCallbacks, EngineOptions, JsonObject,
    PluginMap, SharedState, StakedAmount, StakingStatus, UserSettings, WalletInfo,
    WalletOrchestrator, WalletOutput, WalletSelfState,
};

pub(crate) const WALLET_ID: &str = "wallet-1";
pub(crate) const WALLET_TYPE: &str = "wallet:fake";

pub(crate) fn wallet_info() -> WalletInfo {
    let keys = json!({"seed": "secret"}).as_object().cloned().unwrap_or_default();
    WalletInfo::new(WALLET_ID, WALLET_TYPE, keys)
}

/// Engine recording every lifecycle call.
pub(crate) struct FakeEngine {
    calls: Mutex<Vec<&'static str>>,
    settings: Mutex<Vec<UserSettings>>,
    callbacks: Mutex<Option<EngineCallbacks>>,
    gated: AtomicBool,
    gate: Semaphore,
    fail_start: AtomicBool,
    fail_kill: AtomicBool,
    staking: AtomicBool,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            settings: Mutex::new(Vec::new()),
            callbacks: Mutex::new(None),
            gated: AtomicBool::new(false),
            gate: Semaphore::new(0),
            fail_start: AtomicBool::new(false),
            fail_kill: AtomicBool::new(false),
            staking: AtomicBool::new(false),
        }
    }
}

impl FakeEngine {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn settings_pushed(&self) -> Vec<UserSettings> {
        self.settings.lock().unwrap().clone()
    }

    /// Callbacks handed over at construction.
    pub fn callbacks(&self) -> EngineCallbacks {
        self.callbacks.lock().unwrap().clone().expect("engine not constructed")
    }

    /// Lets a gated `start_engine` complete.
    pub fn release_start(&self) {
        self.gate.add_permits(1);
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl CurrencyEngine for FakeEngine {
    async fn start_engine(&self) -> Result<(), PluginError> {
        self.record("start:begin");
        if self.gated.load(Ordering::SeqCst) {
            self.gate.acquire().await.expect("gate closed").forget();
        }
        self.record("start:end");
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(PluginError::failed("cannot connect"));
        }
        Ok(())
    }

    async fn kill_engine(&self) -> Result<(), PluginError> {
        self.record("kill");
        if self.fail_kill.load(Ordering::SeqCst) {
            return Err(PluginError::failed("still syncing"));
        }
        Ok(())
    }

    fn balance(&self, _currency_code: &str) -> String {
        "100".to_string()
    }

    fn block_height(&self) -> u64 {
        7
    }

    fn display_private_seed(&self) -> Option<String> {
        Some("secret".to_string())
    }

    fn supports_staking(&self) -> bool {
        self.staking.load(Ordering::SeqCst)
    }

    async fn staking_status(&self) -> Result<StakingStatus, PluginError> {
        Ok(StakingStatus {
            staked_amounts: vec![StakedAmount {
                native_amount: "5".into(),
                unlock_at: None,
            }],
        })
    }

    async fn change_user_settings(&self, settings: UserSettings) -> Result<(), PluginError> {
        self.settings.lock().unwrap().push(settings);
        Ok(())
    }
}

/// Plugin handing out one shared [`FakeEngine`].
pub(crate) struct FakePlugin {
    engine: Arc<FakeEngine>,
    fail_derive: bool,
    fail_make: bool,
    gated_make: bool,
    make_gate: Semaphore,
    derive_calls: AtomicUsize,
    make_calls: AtomicUsize,
    last_info: Mutex<Option<WalletInfo>>,
}

impl FakePlugin {
    pub fn new() -> Self {
        Self {
            engine: Arc::new(FakeEngine::default()),
            fail_derive: false,
            fail_make: false,
            gated_make: false,
            make_gate: Semaphore::new(0),
            derive_calls: AtomicUsize::new(0),
            make_calls: AtomicUsize::new(0),
            last_info: Mutex::new(None),
        }
    }

    pub fn fail_derive(mut self) -> Self {
        self.fail_derive = true;
        self
    }

    pub fn fail_make(mut self) -> Self {
        self.fail_make = true;
        self
    }

    /// `make_engine` blocks until [`release_make`](Self::release_make).
    pub fn gate_make(mut self) -> Self {
        self.gated_make = true;
        self
    }

    pub fn release_make(&self) {
        self.make_gate.add_permits(1);
    }

    /// `start_engine` blocks until [`FakeEngine::release_start`].
    pub fn gate_start(self) -> Self {
        self.engine.gated.store(true, Ordering::SeqCst);
        self
    }

    pub fn fail_start(self) -> Self {
        self.engine.fail_start.store(true, Ordering::SeqCst);
        self
    }

    pub fn fail_kill(self) -> Self {
        self.engine.fail_kill.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_staking(self) -> Self {
        self.engine.staking.store(true, Ordering::SeqCst);
        self
    }

    pub fn engine(&self) -> Arc<FakeEngine> {
        self.engine.clone()
    }

    pub fn derive_calls(&self) -> usize {
        self.derive_calls.load(Ordering::SeqCst)
    }

    pub fn make_calls(&self) -> usize {
        self.make_calls.load(Ordering::SeqCst)
    }

    /// Wallet info last passed to `make_engine`.
    pub fn last_wallet_info(&self) -> Option<WalletInfo> {
        self.last_info.lock().unwrap().clone()
    }
}

#[async_trait]
impl CurrencyPlugin for FakePlugin {
    fn plugin_id(&self) -> &str {
        "fake"
    }

    fn currency_code(&self) -> &str {
        "FAKE"
    }

    async fn derive_public_key(&self, wallet_info: &WalletInfo) -> Result<JsonObject, PluginError> {
        self.derive_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_derive {
            return Err(PluginError::Unsupported {
                what: "derive_public_key",
            });
        }
        let keys = json!({"publicKey": format!("pub-{}", wallet_info.id)});
        Ok(keys.as_object().cloned().unwrap_or_default())
    }

    async fn make_engine(
        &self,
        wallet_info: WalletInfo,
        opts: EngineOptions,
    ) -> Result<Arc<dyn CurrencyEngine>, PluginError> {
        self.make_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_info.lock().unwrap() = Some(wallet_info);
        if self.gated_make {
            self.make_gate.acquire().await.expect("gate closed").forget();
        }
        if self.fail_make {
            return Err(PluginError::failed("bad keys"));
        }
        *self.engine.callbacks.lock().unwrap() = Some(opts.callbacks);
        Ok(self.engine.clone())
    }
}

/// Drives one orchestrator the way the wallet actor does.
pub(crate) struct Harness {
    orchestrator: Option<WalletOrchestrator>,
    pub ambient: Arc<SharedState>,
    pub state: Arc<WalletSelfState>,
    pub storage: Arc<MemoryStorage>,
    plugins: Arc<PluginMap>,
    plugin: Option<Arc<FakePlugin>>,
    dispatcher: Dispatcher,
    events_rx: mpsc::UnboundedReceiver<Event>,
    events: Vec<EventKind>,
    errors: broadcast::Receiver<Arc<WalletError>>,
    config: Config,
}

impl Harness {
    pub fn new(plugin: FakePlugin) -> Self {
        Self::with_storage(MemoryStorage::new(), plugin)
    }

    pub fn with_storage(storage: MemoryStorage, plugin: FakePlugin) -> Self {
        let mut h = Self::build(storage);
        h.register_plugin(plugin);
        h
    }

    pub fn without_plugin() -> Self {
        Self::build(MemoryStorage::new())
    }

    fn build(storage: MemoryStorage) -> Self {
        let storage = Arc::new(storage);
        let plugins = Arc::new(PluginMap::new());
        let (dispatcher, events_rx) = Dispatcher::channel(WALLET_ID);
        let sink = ErrorSink::new(64);
        let errors = sink.subscribe();
        let config = Config::default();
        let info = wallet_info();
        let state = Arc::new(WalletSelfState::new(&info));
        let orchestrator = WalletOrchestrator::new(
            info,
            Collaborators {
                plugins: plugins.clone(),
                storage: storage.clone(),
            },
            dispatcher.clone(),
            sink,
            config.clone(),
        );
        Self {
            orchestrator: Some(orchestrator),
            ambient: Arc::new(SharedState::default()),
            state,
            storage,
            plugins,
            plugin: None,
            dispatcher,
            events_rx,
            events: Vec::new(),
            errors,
            config,
        }
    }

    pub fn register_plugin(&mut self, plugin: FakePlugin) {
        let plugin = Arc::new(plugin);
        self.plugins.register(WALLET_TYPE, plugin.clone());
        self.plugin = Some(plugin);
    }

    pub fn plugin(&self) -> Arc<FakePlugin> {
        self.plugin.clone().expect("no plugin registered")
    }

    pub fn engine(&self) -> Arc<FakeEngine> {
        self.plugin().engine()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn orchestrator(&mut self) -> &mut WalletOrchestrator {
        self.orchestrator.as_mut().expect("orchestrator taken")
    }

    pub fn take_orchestrator(&mut self) -> WalletOrchestrator {
        self.orchestrator.take().expect("orchestrator taken")
    }

    pub fn output(&self) -> WalletOutput {
        self.orchestrator
            .as_ref()
            .expect("orchestrator taken")
            .output()
            .get()
    }

    pub fn tick(&mut self) -> bool {
        let (ambient, state) = (self.ambient.clone(), self.state.clone());
        self.orchestrator().tick(ambient, state)
    }

    /// Forces a tick with unchanged inputs.
    pub fn refresh(&mut self) {
        let (ambient, state) = (self.ambient.clone(), self.state.clone());
        self.orchestrator().force_tick(ambient, state);
    }

    /// Lets spawned work run, then folds every dispatched event into `state`.
    pub async fn settle(&mut self) {
        loop {
            for _ in 0..20 {
                tokio::task::yield_now().await;
            }
            let mut drained = false;
            while let Ok(ev) = self.events_rx.try_recv() {
                drained = true;
                if let Some(next) = WalletSelfState::fold(&self.state, &ev.kind) {
                    self.state = next;
                }
                self.events.push(ev.kind);
            }
            if !drained {
                return;
            }
        }
    }

    /// Ticks and settles until nothing changes.
    pub async fn run(&mut self) {
        for _ in 0..10 {
            self.settle().await;
            self.tick();
        }
        self.settle().await;
    }

    pub async fn destroy(&mut self) {
        self.orchestrator().destroy().await;
        self.settle().await;
    }

    pub fn set_ambient(&mut self, f: impl FnOnce(&mut SharedState)) {
        let mut next = SharedState::clone(&self.ambient);
        f(&mut next);
        self.ambient = Arc::new(next);
    }

    /// Replaces the self state without going through an event.
    pub fn override_state(&mut self, f: impl FnOnce(&mut WalletSelfState)) {
        let mut next = WalletSelfState::clone(&self.state);
        f(&mut next);
        self.state = Arc::new(next);
    }

    pub fn dispatch(&self, kind: EventKind) {
        self.dispatcher.dispatch(kind);
    }

    /// Number of dispatched events with the given label.
    pub fn count(&self, label: &str) -> usize {
        self.events.iter().filter(|k| k.as_label() == label).count()
    }

    /// Labels of errors reported since the last call.
    pub fn error_labels(&mut self) -> Vec<&'static str> {
        let mut out = Vec::new();
        while let Ok(err) = self.errors.try_recv() {
            out.push(err.as_label());
        }
        out
    }
}
