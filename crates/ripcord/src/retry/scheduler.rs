//! The retry scheduler
//!
//! This module provides the core scheduling logic: given a caller-supplied
//! unit of work representing "try the operation again", decide how long to
//! wait before invoking it, apply exponential backoff with jitter on repeated
//! failures, and reset to immediate retries after a reported success.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::BackoffConfig;
use crate::error::Result;

use super::backoff::{apply_jitter, next_backoff};
use super::jitter::{JitterSource, ThreadRngJitter};
use super::observer::{NoOpObserver, RetryObserver};

const POISONED: &str = "retry scheduler state poisoned";

/// Builder for configuring a `RetryScheduler`
///
/// # Example
///
/// ```rust
/// use ripcord::{BackoffConfig, RetryScheduler, TracingObserver};
///
/// let scheduler = RetryScheduler::builder()
///     .with_config(BackoffConfig::default())
///     .with_observer(TracingObserver::new("reconnect"))
///     .build()
///     .expect("default config is valid");
/// ```
pub struct RetrySchedulerBuilder {
    config: BackoffConfig,
    jitter: Box<dyn JitterSource>,
    observer: Box<dyn RetryObserver>,
}

impl Default for RetrySchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RetrySchedulerBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            config: BackoffConfig::default(),
            jitter: Box::new(ThreadRngJitter),
            observer: Box::new(NoOpObserver),
        }
    }

    /// Set the backoff configuration
    pub fn with_config(mut self, config: BackoffConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the jitter source
    ///
    /// Defaults to the thread-local RNG. Supply a deterministic source to
    /// make scheduling reproducible in tests.
    pub fn with_jitter(mut self, jitter: impl JitterSource + 'static) -> Self {
        self.jitter = Box::new(jitter);
        self
    }

    /// Set the observer
    ///
    /// The observer receives callbacks as retries are scheduled, superseded,
    /// cancelled, and fired.
    pub fn with_observer(mut self, observer: impl RetryObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Build the scheduler, validating the configuration
    pub fn build(self) -> Result<RetryScheduler> {
        self.config.validate()?;
        Ok(RetryScheduler {
            inner: Arc::new(Shared {
                config: self.config,
                jitter: Mutex::new(self.jitter),
                observer: self.observer,
                state: Mutex::new(State {
                    last_was_success: true,
                    current_delay: Duration::ZERO,
                    pending: None,
                }),
            }),
        })
    }
}

/// Schedules retries of a caller-supplied unit of work
///
/// One scheduler serves one logical connection or session. Consumers call
/// [`retry`](Self::retry) each time an attempt fails,
/// [`signal_success`](Self::signal_success) once the operation is confirmed
/// healthy, and [`cancel`](Self::cancel) when tearing down the owning
/// session.
///
/// The first retry after a reported success runs with zero delay; after
/// that, consecutive retries back off exponentially from the configured
/// floor to the configured ceiling, with a jittered fraction of each delay
/// randomized to decorrelate clients reconnecting in lockstep.
///
/// At most one retry task is outstanding at a time: a newer `retry()` call
/// always cancels and replaces the previous one, and a cancelled task's work
/// never runs even if its timer already elapsed.
///
/// `retry()` must be called from within a Tokio runtime context; the wait is
/// performed by a spawned timer task. Observers must not call back into the
/// scheduler.
///
/// # Example
///
/// ```rust,no_run
/// use ripcord::{BackoffConfig, RetryScheduler};
///
/// # async fn example() -> ripcord::Result<()> {
/// let scheduler = RetryScheduler::new(BackoffConfig::default())?;
///
/// scheduler.retry(|| {
///     // attempt the operation again
/// });
///
/// // ... the attempt succeeded:
/// scheduler.signal_success();
/// # Ok(())
/// # }
/// ```
pub struct RetryScheduler {
    inner: Arc<Shared>,
}

struct Shared {
    config: BackoffConfig,
    jitter: Mutex<Box<dyn JitterSource>>,
    observer: Box<dyn RetryObserver>,
    state: Mutex<State>,
}

struct State {
    /// Starts true: the very first retry of a session runs immediately.
    last_was_success: bool,
    /// Zero until the first failure-driven delay is computed.
    current_delay: Duration,
    pending: Option<ScheduledRetry>,
}

/// One pending scheduled retry
///
/// The timer task is aborted on cancellation, but abort is best-effort once
/// the sleep has completed; the flag, re-checked under the state lock at
/// fire time, is what guarantees a cancelled task's work never runs.
struct ScheduledRetry {
    cancelled: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ScheduledRetry {
    fn cancel(self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.handle.abort();
    }
}

impl RetryScheduler {
    /// Create a scheduler with the given configuration, the thread-local RNG
    /// for jitter, and no observer
    pub fn new(config: BackoffConfig) -> Result<Self> {
        Self::builder().with_config(config).build()
    }

    /// Create a builder for a customized scheduler
    pub fn builder() -> RetrySchedulerBuilder {
        RetrySchedulerBuilder::new()
    }

    /// Schedule `work` to run after the computed backoff delay
    ///
    /// Any previously scheduled retry is cancelled and replaced. If the last
    /// reported state was a success the work is scheduled with zero delay
    /// (still asynchronously - `work` is never invoked from inside this
    /// call); otherwise the failure delay grows by the configured exponent,
    /// is capped at the ceiling, and a jittered fraction of it is randomized
    /// with a fresh draw.
    ///
    /// Calling `retry` always consumes the success fast-path: the next call
    /// without an intervening [`signal_success`](Self::signal_success) backs
    /// off.
    ///
    /// This method never blocks and cannot fail. `work` itself reports its
    /// outcome only through a subsequent `retry` or `signal_success` call.
    pub fn retry<F>(&self, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let (superseded, delay, fast_path) = {
            let mut state = self.inner.state.lock().expect(POISONED);

            let superseded = match state.pending.take() {
                Some(previous) => {
                    previous.cancel();
                    true
                }
                None => false,
            };

            let fast_path = state.last_was_success;
            let delay = if fast_path {
                Duration::ZERO
            } else {
                state.current_delay = next_backoff(state.current_delay, &self.inner.config);
                let unit = self.inner.jitter.lock().expect(POISONED).unit();
                apply_jitter(state.current_delay, self.inner.config.jitter_factor, unit)
            };
            state.last_was_success = false;

            let cancelled = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&cancelled);
            let shared = Arc::clone(&self.inner);
            let handle = tokio::spawn(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                // Re-check cancellation under the lock: a supersede or
                // cancel that raced with the timer sets the flag before
                // this task can observe it clear.
                let fire = {
                    let mut state = shared.state.lock().expect(POISONED);
                    if flag.load(Ordering::SeqCst) {
                        false
                    } else {
                        state.pending = None;
                        true
                    }
                };
                if fire {
                    shared.observer.on_fired(delay);
                    work();
                }
            });
            state.pending = Some(ScheduledRetry { cancelled, handle });

            (superseded, delay, fast_path)
        };

        if superseded {
            self.inner.observer.on_superseded();
        }
        self.inner.observer.on_scheduled(delay, fast_path);
    }

    /// Cancel any outstanding scheduled retry without scheduling a new one
    ///
    /// Resets the failure delay to zero, so a later `retry` backs off from
    /// the floor again. Idempotent. Does not alter the success fast-path
    /// state.
    pub fn cancel(&self) {
        let had_pending = {
            let mut state = self.inner.state.lock().expect(POISONED);
            let had_pending = match state.pending.take() {
                Some(previous) => {
                    previous.cancel();
                    true
                }
                None => false,
            };
            state.current_delay = Duration::ZERO;
            had_pending
        };
        if had_pending {
            self.inner.observer.on_cancelled();
        }
    }

    /// Report that the operation succeeded
    ///
    /// The next `retry` call (if any) runs with zero delay and backoff
    /// restarts from the floor. Any already-outstanding scheduled task is
    /// left untouched.
    pub fn signal_success(&self) {
        {
            let mut state = self.inner.state.lock().expect(POISONED);
            state.last_was_success = true;
            state.current_delay = Duration::ZERO;
        }
        self.inner.observer.on_backoff_reset();
    }

    /// Whether a retry task is currently outstanding
    pub fn is_scheduled(&self) -> bool {
        self.inner.state.lock().expect(POISONED).pending.is_some()
    }

    /// The current failure-driven delay, before jitter
    ///
    /// Zero until the first backoff-path retry, and after every reset.
    pub fn current_delay(&self) -> Duration {
        self.inner.state.lock().expect(POISONED).current_delay
    }
}

impl Drop for RetryScheduler {
    fn drop(&mut self) {
        // The timer task holds its own Arc to the shared state; cancel it so
        // a dropped scheduler cannot fire work later.
        if let Ok(mut state) = self.inner.state.lock() {
            if let Some(previous) = state.pending.take() {
                previous.cancel();
            }
        }
    }
}

impl std::fmt::Debug for RetryScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock().expect(POISONED);
        f.debug_struct("RetryScheduler")
            .field("config", &self.inner.config)
            .field("last_was_success", &state.last_was_success)
            .field("current_delay", &state.current_delay)
            .field("scheduled", &state.pending.is_some())
            .finish()
    }
}
