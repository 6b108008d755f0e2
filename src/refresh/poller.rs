//! Interval-driven background refresh.
//!
//! Every tick dispatches one fetch as its own task without waiting for the
//! previous one, tagged with an increasing sequence number. Results flow
//! back into the poll loop, which is the only writer of the
//! [`RefreshState`], and are published to subscribers through a `watch`
//! channel.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use super::state::{Applied, RefreshState};
use crate::error::Result;

/// Handle to a running refresh loop.
///
/// Dropping the handle stops the loop. Fetches still in flight are aborted
/// and their results never applied.
#[derive(Debug)]
pub struct Poller<T> {
    label: &'static str,
    updates: watch::Receiver<RefreshState<T>>,
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl<T> Poller<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Starts polling `fetch` every `every`, with the first fetch issued
    /// immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<F, Fut>(label: &'static str, every: Duration, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let (state_tx, updates) = watch::channel(RefreshState::new());
        let (stop, stop_rx) = watch::channel(false);

        info!(label, interval_secs = every.as_secs(), "starting refresh loop");
        let task = tokio::spawn(run_loop(label, every, fetch, state_tx, stop_rx));

        Self {
            label,
            updates,
            stop,
            task: Some(task),
        }
    }

    /// Returns a new receiver for state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RefreshState<T>> {
        self.updates.clone()
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn current(&self) -> RefreshState<T> {
        self.updates.borrow().clone()
    }

    /// Waits for the next state change.
    ///
    /// Returns `None` once the loop has stopped.
    pub async fn changed(&mut self) -> Option<RefreshState<T>> {
        self.updates.changed().await.ok()?;
        Some(self.updates.borrow_and_update().clone())
    }

    /// Stops the loop and waits for it to exit. No tick fires afterwards.
    pub async fn shutdown(mut self) {
        let _ = self.stop.send(true);
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!(label = self.label, error = %e, "refresh loop ended abnormally");
        }
        info!(label = self.label, "refresh loop stopped");
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run_loop<T, F, Fut>(
    label: &'static str,
    every: Duration,
    fetch: F,
    state_tx: watch::Sender<RefreshState<T>>,
    mut stop_rx: watch::Receiver<bool>,
) where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let mut timer = interval(every);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut in_flight: JoinSet<(u64, Result<T>)> = JoinSet::new();
    let mut next_seq: u64 = 0;

    loop {
        tokio::select! {
            _ = timer.tick() => {
                next_seq += 1;
                let seq = next_seq;
                debug!(label, seq, pending = in_flight.len(), "refresh tick");
                let request = fetch();
                in_flight.spawn(async move { (seq, request.await) });
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                let (seq, outcome) = match joined {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(label, error = %e, "refresh task aborted");
                        continue;
                    }
                };
                if let Err(e) = &outcome {
                    warn!(label, seq, error = %e, "refresh failed; keeping previous data");
                }
                let now = Utc::now();
                state_tx.send_if_modified(|state| match state.apply(seq, outcome, now) {
                    Applied::Stale => {
                        debug!(
                            label,
                            seq,
                            latest = state.latest_applied(),
                            "discarding out-of-order result"
                        );
                        false
                    }
                    Applied::Updated | Applied::Failed => true,
                });
            }
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
        }
    }

    in_flight.abort_all();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ProviderError};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    const TICK: Duration = Duration::from_secs(15);

    #[tokio::test(start_paused = true)]
    async fn test_failed_tick_keeps_previous_data() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let mut poller = Poller::spawn("test", TICK, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n == 1 {
                    Ok(vec![1, 2, 3])
                } else {
                    Err(Error::from(ProviderError::Status { status: 503 }))
                }
            }
        });

        let first = poller.changed().await.unwrap();
        assert_eq!(first.data(), Some(&vec![1, 2, 3]));
        let stamp = first.last_updated();
        assert!(stamp.is_some());

        let second = poller.changed().await.unwrap();
        assert_eq!(second.data(), Some(&vec![1, 2, 3]));
        assert_eq!(second.last_updated(), stamp);
        assert!(second.error().is_some());

        poller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_response_does_not_overwrite_newer() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let mut poller = Poller::spawn("race", TICK, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n == 1 {
                    tokio::time::sleep(Duration::from_secs(40)).await;
                }
                Ok::<u64, Error>(n)
            }
        });

        // Tick 2 (t=15) and tick 3 (t=30) resolve before tick 1 (t=40).
        assert_eq!(poller.changed().await.unwrap().data(), Some(&2));
        assert_eq!(poller.changed().await.unwrap().data(), Some(&3));

        tokio::time::sleep(Duration::from_secs(11)).await;
        let state = poller.current();
        assert_eq!(state.data(), Some(&3));
        assert_eq!(state.latest_applied(), 3);

        poller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_ticks() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let mut poller = Poller::spawn("stop", TICK, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<(), Error>(()) }
        });

        poller.changed().await.unwrap();
        poller.shutdown().await;
        let seen = calls.load(Ordering::SeqCst);

        tokio::time::sleep(TICK * 4).await;
        assert_eq!(calls.load(Ordering::SeqCst), seen);
    }
}
