//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the supervisor runtime.
//!
//! Config is used in two ways:
//! 1. **Supervisor creation**: `Supervisor::builder(config, collaborators)`
//! 2. **Orchestrator defaults**: every `WalletOrchestrator` carries a copy
//!    (sync interval, public-key cache path).
//!
//! ## Sentinel values
//! - `grace = 0s` → do not wait for engines to stop on shutdown
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

/// Global configuration for the supervisor runtime.
///
/// ## Field semantics
/// - `grace`: Maximum wait for wallets to tear down (`0s` = no wait)
/// - `bus_capacity`: Event bus and error channel ring buffer size (min 1)
/// - `sync_interval`: Period of the durable-storage sync timer
/// - `public_key_path`: Path of the public-key cache file in each wallet's local store
///
/// ## Notes
/// All fields are public for flexibility. Prefer using helper accessors to avoid
/// sprinkling sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time to wait for wallets to tear down.
    ///
    /// On shutdown or wallet removal:
    /// - Orchestrators are cancelled via `CancellationToken`
    /// - Supervisor waits up to `grace` for engines to stop
    /// - If the timeout is exceeded, returns `RuntimeError::GraceExceeded`
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages will
    /// receive `Lagged` and skip older items.
    pub bus_capacity: usize,

    /// Interval between durable-storage syncs of one wallet.
    ///
    /// The first sync runs one full interval after the timer starts.
    pub sync_interval: Duration,

    /// File holding the cached public keys, relative to the local store.
    pub public_key_path: String,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the teardown grace as an `Option`.
    ///
    /// - `None` → do not wait
    /// - `Some(d)` → wait up to `d`
    #[inline]
    pub fn grace_limit(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `grace = 10s`
    /// - `bus_capacity = 1024`
    /// - `sync_interval = 30s`
    /// - `public_key_path = "PublicKey.json"`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(10),
            bus_capacity: 1024,
            sync_interval: Duration::from_secs(30),
            public_key_path: "PublicKey.json".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        let cfg = Config {
            grace: Duration::ZERO,
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.grace_limit(), None);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(Config::default().grace_limit(), Some(Duration::from_secs(10)));
    }
}
