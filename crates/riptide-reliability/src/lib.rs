//! The Abort/Timeout Manager (C13): composes an external cancellation
//! signal (crawl-level, or overall server shutdown) with a per-scrape
//! timer derived from `options.timeout_ms` into a single
//! [`riptide_types::CancellationSignal`] that engines can poll at every
//! suspension point.
//!
//! Wraps the shared mutable state in `Arc<Mutex<..>>` guarded by a small
//! owning struct, scaled down to the one `Option<CancellationKind>` cell
//! this manager actually needs.

use riptide_types::{CancellationKind, CancellationSignal, NeverCancelled};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Polling interval for [`with_cancellation`]. `CancellationSignal` only
/// exposes a synchronous poll (no wakeup channel), so racing a future
/// against it means checking on a tick rather than awaiting a notification.
const CANCELLATION_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs `fut` to completion, but polls `signal` every
/// [`CANCELLATION_POLL_INTERVAL`] and returns early with the firing tier if
/// it cancels first. This is how engines honor the composite abort signal
/// during an in-flight network await (spec.md §5) instead of only checking
/// between attempts.
pub async fn with_cancellation<F: Future>(
    signal: &Arc<dyn CancellationSignal>,
    fut: F,
) -> Result<F::Output, CancellationKind> {
    tokio::pin!(fut);
    let mut ticks = tokio::time::interval(CANCELLATION_POLL_INTERVAL);
    ticks.tick().await; // first tick fires immediately; consume it up front
    loop {
        tokio::select! {
            out = &mut fut => return Ok(out),
            _ = ticks.tick() => {
                if let Some(kind) = signal.cancelled() {
                    return Err(kind);
                }
            }
        }
    }
}

/// Owns the per-scrape timer task and the latch recording which tier
/// fired first. Dropping the manager aborts the timer, satisfying the
/// "timers are cleared on scrape completion regardless of outcome"
/// guarantee as long as callers drop their `Arc` when the scrape ends.
pub struct AbortTimeoutManager {
    external: Arc<dyn CancellationSignal>,
    fired: Arc<Mutex<Option<CancellationKind>>>,
    timer: Option<JoinHandle<()>>,
}

impl AbortTimeoutManager {
    /// `timeout` is `None` when the caller supplied no `timeout_ms`; the
    /// manager then only ever reflects the external signal.
    pub fn new(external: Arc<dyn CancellationSignal>, timeout: Option<Duration>) -> Arc<Self> {
        let fired = Arc::new(Mutex::new(None));

        let timer = timeout.map(|duration| {
            let fired = fired.clone();
            tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                let mut guard = fired.lock().expect("abort/timeout latch poisoned");
                if guard.is_none() {
                    debug!(?duration, "scrape timeout fired");
                    *guard = Some(CancellationKind::ScrapeTimeout);
                }
            })
        });

        Arc::new(Self {
            external,
            fired,
            timer,
        })
    }

    /// Builds a manager with no external signal and no timeout; used where
    /// cancellation is not wired up (tests, one-off tooling).
    pub fn passthrough() -> Arc<Self> {
        Self::new(Arc::new(NeverCancelled), None)
    }

    /// Hands back a trait object suitable for [`riptide_types::Meta`].
    pub fn signal(self: &Arc<Self>) -> Arc<dyn CancellationSignal> {
        self.clone()
    }
}

impl CancellationSignal for AbortTimeoutManager {
    fn cancelled(&self) -> Option<CancellationKind> {
        let mut guard = self.fired.lock().expect("abort/timeout latch poisoned");
        if let Some(kind) = *guard {
            return Some(kind);
        }
        if let Some(kind) = self.external.cancelled() {
            *guard = Some(kind);
            return Some(kind);
        }
        None
    }
}

impl Drop for AbortTimeoutManager {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
