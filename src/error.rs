//! Error types used by the walletvisor runtime and its collaborators.
//!
//! This module defines four enums:
//!
//! - [`PluginError`]: failures reported by a currency plugin or its engine.
//! - [`StorageError`]: failures of the durable storage or a file store.
//! - [`WalletError`]: what the orchestrator reports on its error channel.
//! - [`RuntimeError`]: errors raised by the [`Supervisor`](crate::Supervisor) itself.
//!
//! All of them provide `as_label` (a short stable label for logs/metrics).

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// # Errors produced by plugin and engine implementations.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    /// The call ran and failed.
    #[error("plugin call failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// The plugin does not implement this capability.
    #[error("unsupported capability: {what}")]
    Unsupported {
        /// The capability name.
        what: &'static str,
    },
}

impl PluginError {
    /// Shorthand for [`PluginError::Failed`].
    pub fn failed(error: impl Into<String>) -> Self {
        PluginError::Failed {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            PluginError::Failed { .. } => "plugin_failed",
            PluginError::Unsupported { .. } => "plugin_unsupported",
        }
    }
}

/// # Errors produced by durable storage and file stores.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StorageError {
    /// Filesystem failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A file could not be encoded or decoded as JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A file decoded but did not have the expected shape.
    #[error("malformed file {path}: {reason}")]
    Malformed {
        /// Path of the offending file.
        path: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The wallet's storage has not been attached.
    #[error("storage for wallet {wallet} is not attached")]
    NotAttached {
        /// Wallet id.
        wallet: String,
    },

    /// Any other backend failure.
    #[error("storage failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },
}

impl StorageError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StorageError::Io(_) => "storage_io",
            StorageError::Json(_) => "storage_json",
            StorageError::Malformed { .. } => "storage_malformed",
            StorageError::NotAttached { .. } => "storage_not_attached",
            StorageError::Failed { .. } => "storage_failed",
        }
    }
}

/// # Errors reported through the orchestrator error channel.
///
/// Every variant carries the wallet id. None of them unwinds already-published
/// state; fatal variants ([`WalletError::StorageAttach`], [`WalletError::EngineCreate`])
/// halt the current engine generation only.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WalletError {
    /// Attaching durable storage failed (fatal for the generation).
    #[error("wallet {wallet}: storage attach failed: {source}")]
    StorageAttach {
        wallet: Arc<str>,
        #[source]
        source: StorageError,
    },

    /// The plugin's engine factory failed (fatal for the generation).
    #[error("wallet {wallet}: engine creation failed: {source}")]
    EngineCreate {
        wallet: Arc<str>,
        #[source]
        source: PluginError,
    },

    /// `start_engine` failed.
    #[error("wallet {wallet}: engine start failed: {source}")]
    EngineStart {
        wallet: Arc<str>,
        #[source]
        source: PluginError,
    },

    /// `kill_engine` failed.
    #[error("wallet {wallet}: engine kill failed: {source}")]
    EngineKill {
        wallet: Arc<str>,
        #[source]
        source: PluginError,
    },

    /// Reloading cached wallet files failed.
    #[error("wallet {wallet}: file reload failed: {source}")]
    FileReload {
        wallet: Arc<str>,
        #[source]
        source: StorageError,
    },

    /// Fetching staking status failed.
    #[error("wallet {wallet}: staking status failed: {source}")]
    Staking {
        wallet: Arc<str>,
        #[source]
        source: PluginError,
    },

    /// Pushing user settings into the engine failed.
    #[error("wallet {wallet}: settings change failed: {source}")]
    Settings {
        wallet: Arc<str>,
        #[source]
        source: PluginError,
    },
}

impl WalletError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            WalletError::StorageAttach { .. } => "wallet_storage_attach",
            WalletError::EngineCreate { .. } => "wallet_engine_create",
            WalletError::EngineStart { .. } => "wallet_engine_start",
            WalletError::EngineKill { .. } => "wallet_engine_kill",
            WalletError::FileReload { .. } => "wallet_file_reload",
            WalletError::Staking { .. } => "wallet_staking",
            WalletError::Settings { .. } => "wallet_settings",
        }
    }

    /// Returns the id of the wallet the error belongs to.
    pub fn wallet(&self) -> &str {
        match self {
            WalletError::StorageAttach { wallet, .. }
            | WalletError::EngineCreate { wallet, .. }
            | WalletError::EngineStart { wallet, .. }
            | WalletError::EngineKill { wallet, .. }
            | WalletError::FileReload { wallet, .. }
            | WalletError::Staking { wallet, .. }
            | WalletError::Settings { wallet, .. } => wallet,
        }
    }

    /// Whether this error halted the engine generation.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            WalletError::StorageAttach { .. } | WalletError::EngineCreate { .. }
        )
    }
}

/// # Errors produced by the walletvisor runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Teardown grace period was exceeded; some engines were still live.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Wallets whose engines had not stopped in time.
        stuck: Vec<String>,
    },

    /// A wallet with this id is already supervised.
    #[error("wallet {id} is already registered")]
    DuplicateWallet { id: String },

    /// No wallet with this id is supervised.
    #[error("wallet {id} is not registered")]
    UnknownWallet { id: String },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use walletvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::DuplicateWallet { .. } => "runtime_duplicate_wallet",
            RuntimeError::UnknownWallet { .. } => "runtime_unknown_wallet",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let wallet: Arc<str> = Arc::from("w1");
        let attach = WalletError::StorageAttach {
            wallet: wallet.clone(),
            source: StorageError::Failed {
                error: "disk".into(),
            },
        };
        let start = WalletError::EngineStart {
            wallet,
            source: PluginError::failed("boom"),
        };
        assert!(attach.is_fatal());
        assert!(!start.is_fatal());
        assert_eq!(start.wallet(), "w1");
        assert_eq!(start.as_label(), "wallet_engine_start");
    }

    #[test]
    fn test_display_includes_source() {
        let err = WalletError::EngineCreate {
            wallet: Arc::from("abc"),
            source: PluginError::failed("no network"),
        };
        assert_eq!(
            err.to_string(),
            "wallet abc: engine creation failed: plugin call failed: no network"
        );
    }
}
