//! # Wallet events dispatched by the orchestrator.
//!
//! The [`EventKind`] enum classifies events across three categories:
//! - **Key/engine events**: public info derived, seeds, engine failed/started/stopped
//! - **Engine callbacks**: balance, block height and staking changes
//! - **Wallet files**: name, fiat and file-name reloads, plus pause toggles
//!
//! The [`Event`] struct carries the wallet id, a timestamp and a sequence number.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Events of one wallet are delivered in dispatch order.
//!
//! ## Example
//! ```rust
//! use walletvisor::{Event, EventKind};
//!
//! let ev = Event::new("wallet-1", EventKind::HeightChanged { height: 42 });
//! assert_eq!(ev.wallet.as_ref(), "wallet-1");
//! assert_eq!(ev.kind.as_label(), "height_changed");
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::wallet::{StakingStatus, WalletInfo};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Classification of wallet events, with payload.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    // === Keys and engine lifecycle ===
    /// Public key material is known for the wallet (derived or cached).
    ///
    /// Published before the engine factory runs, so dependents see the
    /// key data even when engine construction fails.
    PublicInfoUpdated { wallet_info: WalletInfo },

    /// Engine reported its display seeds after construction.
    SeedsChanged {
        display_private_seed: Option<String>,
        display_public_seed: Option<String>,
    },

    /// Engine construction failed; the generation halts.
    EngineFailed { error: String },

    /// `start_engine` was issued (optimistic; failures go to the error channel).
    EngineStarted,

    /// `kill_engine` settled (successfully or not).
    EngineStopped,

    // === Engine callbacks ===
    /// Balance of one currency code changed (integer string).
    BalanceChanged {
        currency_code: String,
        balance: String,
    },

    /// Block height changed.
    HeightChanged { height: u64 },

    /// Staking status changed.
    StakingChanged { status: StakingStatus },

    // === Wallet files ===
    /// Wallet name loaded from the encrypted store (`None` = unnamed).
    NameLoaded { name: Option<String> },

    /// Fiat currency loaded from the encrypted store.
    FiatLoaded { fiat: String },

    /// Transaction metadata file names listed from the encrypted store.
    FileNamesLoaded { names: Vec<String> },

    // === Control ===
    /// The per-wallet pause flag changed.
    PauseChanged { paused: bool },
}

impl EventKind {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::PublicInfoUpdated { .. } => "public_info_updated",
            EventKind::SeedsChanged { .. } => "seeds_changed",
            EventKind::EngineFailed { .. } => "engine_failed",
            EventKind::EngineStarted => "engine_started",
            EventKind::EngineStopped => "engine_stopped",
            EventKind::BalanceChanged { .. } => "balance_changed",
            EventKind::HeightChanged { .. } => "height_changed",
            EventKind::StakingChanged { .. } => "staking_changed",
            EventKind::NameLoaded { .. } => "name_loaded",
            EventKind::FiatLoaded { .. } => "fiat_loaded",
            EventKind::FileNamesLoaded { .. } => "file_names_loaded",
            EventKind::PauseChanged { .. } => "pause_changed",
        }
    }
}

/// Wallet event with metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - `wallet`: id of the wallet the event belongs to
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Wallet id.
    pub wallet: Arc<str>,
    /// Event classification and payload.
    pub kind: EventKind,
}

impl Event {
    /// Creates a new event with current timestamp and next sequence number.
    pub fn new(wallet: impl Into<Arc<str>>, kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            wallet: wallet.into(),
            kind,
        }
    }

    #[inline]
    pub fn is_engine_lifecycle(&self) -> bool {
        matches!(
            self.kind,
            EventKind::EngineStarted | EventKind::EngineStopped | EventKind::EngineFailed { .. }
        )
    }
}
