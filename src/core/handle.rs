use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use crate::wallet::{WalletApi, WalletOutput, WalletSelfState};

/// Read side of one supervised wallet.
///
/// Cheap to clone. Once the wallet is removed its output is empty and the
/// waiting helpers return `None`.
#[derive(Clone)]
pub struct WalletHandle {
    id: Arc<str>,
    output: watch::Receiver<WalletOutput>,
    state: watch::Receiver<Arc<WalletSelfState>>,
}

impl fmt::Debug for WalletHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletHandle")
            .field("id", &self.id)
            .field("usable", &self.output.borrow().api.is_some())
            .finish_non_exhaustive()
    }
}

impl WalletHandle {
    pub(crate) fn new(
        id: Arc<str>,
        output: watch::Receiver<WalletOutput>,
        state: watch::Receiver<Arc<WalletSelfState>>,
    ) -> Self {
        Self { id, output, state }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current output bundle of the orchestrator.
    pub fn output(&self) -> WalletOutput {
        self.output.borrow().clone()
    }

    /// The published api, if the wallet is usable right now.
    pub fn api(&self) -> Option<Arc<WalletApi>> {
        self.output.borrow().api.clone()
    }

    /// Current self state.
    pub fn state(&self) -> Arc<WalletSelfState> {
        self.state.borrow().clone()
    }

    /// Waits until the api is published.
    pub async fn ready(&mut self) -> Option<Arc<WalletApi>> {
        let out = self.output.wait_for(|o| o.api.is_some()).await.ok()?;
        out.api.clone()
    }

    /// Waits until the self state satisfies `pred`.
    pub async fn wait_state(
        &mut self,
        mut pred: impl FnMut(&WalletSelfState) -> bool,
    ) -> Option<Arc<WalletSelfState>> {
        let state = self.state.wait_for(|s| pred(s)).await.ok()?;
        Some(state.clone())
    }
}
