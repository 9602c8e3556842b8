//! Scheduling observation and logging
//!
//! This module provides the `RetryObserver` trait for monitoring scheduler
//! lifecycle events and a `TracingObserver` implementation that logs using
//! the `tracing` crate.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Observer trait for retry scheduling events
///
/// Implement this trait to receive callbacks as retries are scheduled,
/// superseded, cancelled, and fired. This is useful for logging, metrics
/// collection, or debugging.
pub trait RetryObserver: Send + Sync {
    /// Called when a retry task is scheduled
    ///
    /// # Arguments
    ///
    /// * `delay` - The computed delay before the work runs
    /// * `fast_path` - Whether this is the zero-delay retry after a success
    fn on_scheduled(&self, delay: Duration, fast_path: bool);

    /// Called when an outstanding task is replaced by a newer `retry()` call
    fn on_superseded(&self) {}

    /// Called when an outstanding task is cancelled via `cancel()`
    fn on_cancelled(&self);

    /// Called when a task's delay elapses and its work is about to run
    ///
    /// # Arguments
    ///
    /// * `delay` - The delay that was originally scheduled
    fn on_fired(&self, delay: Duration);

    /// Called when `signal_success()` resets the backoff state
    fn on_backoff_reset(&self);
}

/// A no-op observer that does nothing
///
/// Use this when you don't need observation but the API requires an observer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl RetryObserver for NoOpObserver {
    fn on_scheduled(&self, _delay: Duration, _fast_path: bool) {}

    fn on_cancelled(&self) {}

    fn on_fired(&self, _delay: Duration) {}

    fn on_backoff_reset(&self) {}
}

/// An observer that logs scheduling events using the `tracing` crate
///
/// # Log Levels
///
/// - `on_scheduled`: DEBUG (fast path) or INFO (backoff path)
/// - `on_superseded`: DEBUG
/// - `on_cancelled`: DEBUG
/// - `on_fired`: DEBUG
/// - `on_backoff_reset`: DEBUG
#[derive(Debug, Clone)]
pub struct TracingObserver {
    /// Name of the operation being rescheduled (for log context)
    operation: String,
}

impl TracingObserver {
    /// Create a new tracing observer
    ///
    /// # Arguments
    ///
    /// * `operation` - A descriptive name for the operation being retried
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }

    /// Get the operation name
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("retry")
    }
}

impl RetryObserver for TracingObserver {
    fn on_scheduled(&self, delay: Duration, fast_path: bool) {
        if fast_path {
            tracing::debug!(
                operation = %self.operation,
                "scheduling immediate retry"
            );
        } else {
            tracing::info!(
                operation = %self.operation,
                delay_ms = delay.as_millis() as u64,
                "scheduling retry with backoff"
            );
        }
    }

    fn on_superseded(&self) {
        tracing::debug!(
            operation = %self.operation,
            "pending retry superseded by a newer one"
        );
    }

    fn on_cancelled(&self) {
        tracing::debug!(
            operation = %self.operation,
            "pending retry cancelled"
        );
    }

    fn on_fired(&self, delay: Duration) {
        tracing::debug!(
            operation = %self.operation,
            delay_ms = delay.as_millis() as u64,
            "retry firing"
        );
    }

    fn on_backoff_reset(&self) {
        tracing::debug!(
            operation = %self.operation,
            "backoff reset after success"
        );
    }
}

/// An observer that collects statistics about scheduling events
///
/// Useful for testing and metrics collection. Alongside the event counters
/// it records every scheduled delay in order, so tests can assert on the
/// exact backoff ladder.
#[derive(Debug, Default)]
pub struct StatsObserver {
    /// Scheduled events
    pub scheduled: AtomicU32,
    /// Superseded events
    pub superseded: AtomicU32,
    /// Cancelled events
    pub cancelled: AtomicU32,
    /// Fired events
    pub fired: AtomicU32,
    /// Backoff reset events
    pub resets: AtomicU32,
    delays: Mutex<Vec<Duration>>,
}

impl StatsObserver {
    /// Create a new stats observer
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of scheduled events
    pub fn scheduled(&self) -> u32 {
        self.scheduled.load(Ordering::SeqCst)
    }

    /// Get the number of superseded events
    pub fn superseded(&self) -> u32 {
        self.superseded.load(Ordering::SeqCst)
    }

    /// Get the number of cancelled events
    pub fn cancelled(&self) -> u32 {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Get the number of fired events
    pub fn fired(&self) -> u32 {
        self.fired.load(Ordering::SeqCst)
    }

    /// Get the number of backoff resets
    pub fn resets(&self) -> u32 {
        self.resets.load(Ordering::SeqCst)
    }

    /// Get the scheduled delays in order
    pub fn scheduled_delays(&self) -> Vec<Duration> {
        self.delays.lock().expect("stats delays poisoned").clone()
    }

    /// Get the most recently scheduled delay, if any
    pub fn last_delay(&self) -> Option<Duration> {
        self.delays
            .lock()
            .expect("stats delays poisoned")
            .last()
            .copied()
    }
}

impl RetryObserver for StatsObserver {
    fn on_scheduled(&self, delay: Duration, _fast_path: bool) {
        self.scheduled.fetch_add(1, Ordering::SeqCst);
        self.delays.lock().expect("stats delays poisoned").push(delay);
    }

    fn on_superseded(&self) {
        self.superseded.fetch_add(1, Ordering::SeqCst);
    }

    fn on_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
    }

    fn on_fired(&self, _delay: Duration) {
        self.fired.fetch_add(1, Ordering::SeqCst);
    }

    fn on_backoff_reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

/// Implement RetryObserver for Arc<T> where T: RetryObserver
impl<T: RetryObserver + ?Sized> RetryObserver for std::sync::Arc<T> {
    fn on_scheduled(&self, delay: Duration, fast_path: bool) {
        (**self).on_scheduled(delay, fast_path)
    }

    fn on_superseded(&self) {
        (**self).on_superseded()
    }

    fn on_cancelled(&self) {
        (**self).on_cancelled()
    }

    fn on_fired(&self, delay: Duration) {
        (**self).on_fired(delay)
    }

    fn on_backoff_reset(&self) {
        (**self).on_backoff_reset()
    }
}

/// Implement RetryObserver for Box<T> where T: RetryObserver
impl<T: RetryObserver + ?Sized> RetryObserver for Box<T> {
    fn on_scheduled(&self, delay: Duration, fast_path: bool) {
        (**self).on_scheduled(delay, fast_path)
    }

    fn on_superseded(&self) {
        (**self).on_superseded()
    }

    fn on_cancelled(&self) {
        (**self).on_cancelled()
    }

    fn on_fired(&self, delay: Duration) {
        (**self).on_fired(delay)
    }

    fn on_backoff_reset(&self) {
        (**self).on_backoff_reset()
    }
}
