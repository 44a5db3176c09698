//! # Periodic task: a best-effort repeating timer.
//!
//! [`PeriodicTask`] invokes an async action on a fixed interval on a spawned tokio task.
//!
//! ## Loop
//! ```text
//! start({ wait })
//!   ├─ already running ─► no-op
//!   └─ spawn:
//!        if wait: sleep(interval)        (cancellable)
//!        loop {
//!          ├─► action().await           (never raced against stop)
//!          │     └─ Err ─► logged at debug, swallowed
//!          └─► sleep(interval)          (cancellable)
//!        }
//! stop()
//!   └─ cancel token: pending sleep aborts; an in-flight action finishes but
//!      nothing further is scheduled. `stop` itself never waits.
//! ```
//!
//! ## Rules
//! - The next run is scheduled one interval after the previous run **completed**;
//!   runs never overlap within one start.
//! - Failures are never surfaced to the caller.
//! - Dropping the task stops it.

use std::borrow::Cow;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::{select, time};
use tokio_util::sync::CancellationToken;

type Action = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Options for [`PeriodicTask::start`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartOptions {
    /// Delay the first run by one full interval.
    pub wait: bool,
}

/// Repeating best-effort timer.
pub struct PeriodicTask {
    name: Cow<'static, str>,
    interval: Duration,
    action: Action,
    running: Mutex<Option<CancellationToken>>,
}

impl PeriodicTask {
    /// Creates a stopped task running `f` every `interval`.
    ///
    /// Errors returned by `f` are logged and swallowed.
    pub fn new<F, Fut, E>(name: impl Into<Cow<'static, str>>, interval: Duration, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let name = name.into();
        let label = name.clone();
        let action: Action = Arc::new(move || {
            let label = label.clone();
            f().map(move |res| {
                if let Err(e) = res {
                    tracing::debug!(task = %label, error = %e, "periodic run failed; ignored");
                }
            })
            .boxed()
        });
        Self {
            name,
            interval,
            action,
            running: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the task is currently scheduled.
    pub fn is_running(&self) -> bool {
        self.lock().as_ref().is_some_and(|t| !t.is_cancelled())
    }

    /// Starts the loop; no-op if already running. Must be called inside a tokio runtime.
    pub fn start(&self, opts: StartOptions) {
        let mut running = self.lock();
        if running.as_ref().is_some_and(|t| !t.is_cancelled()) {
            return;
        }
        let token = CancellationToken::new();
        *running = Some(token.clone());
        drop(running);

        tracing::debug!(task = %self.name, wait = opts.wait, "periodic task started");
        tokio::spawn(run_loop(
            self.action.clone(),
            self.interval,
            opts.wait,
            token,
        ));
    }

    /// Stops scheduling further runs. Does not wait for an in-flight run.
    pub fn stop(&self) {
        if let Some(token) = self.lock().take() {
            tracing::debug!(task = %self.name, "periodic task stopped");
            token.cancel();
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        // A poisoned lock only means a panic elsewhere; the token is still valid.
        self.running.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_loop(action: Action, interval: Duration, wait: bool, token: CancellationToken) {
    if wait && !sleep_or_cancel(interval, &token).await {
        return;
    }
    loop {
        if token.is_cancelled() {
            break;
        }
        action().await;
        if !sleep_or_cancel(interval, &token).await {
            break;
        }
    }
}

/// Returns `false` if cancelled before the sleep elapsed.
async fn sleep_or_cancel(d: Duration, token: &CancellationToken) -> bool {
    let sleep = time::sleep(d);
    tokio::pin!(sleep);
    select! {
        _ = &mut sleep => true,
        _ = token.cancelled() => false,
    }
}
