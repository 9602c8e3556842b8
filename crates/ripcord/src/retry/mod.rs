//! Retry scheduling with exponential backoff and jitter
//!
//! This module provides the retry scheduler: a long-lived object that
//! decides when to re-invoke a caller-supplied unit of work after a failure.
//!
//! # Features
//!
//! - Exponential backoff from a configured floor to a configured ceiling
//! - Configurable jitter to decorrelate clients reconnecting in lockstep
//! - Zero-delay fast path for the first retry after a reported success
//! - Single-slot scheduling: a newer retry always supersedes the pending one
//! - Cooperative cancellation checked at fire time
//! - Observable scheduling events via the `RetryObserver` trait
//! - Injectable jitter source for deterministic tests
//!
//! # Example
//!
//! ```rust,no_run
//! use ripcord::RetryScheduler;
//!
//! fn reconnect(scheduler: &RetryScheduler) {
//!     scheduler.retry(|| {
//!         // attempt to open the connection; on failure the owner calls
//!         // reconnect() again, on success scheduler.signal_success()
//!     });
//! }
//! ```

mod backoff;
mod jitter;
mod observer;
mod scheduler;

pub use backoff::{apply_jitter, next_backoff};
pub use jitter::{FixedJitter, JitterSource, SequenceJitter, ThreadRngJitter};
pub use observer::{NoOpObserver, RetryObserver, StatsObserver, TracingObserver};
pub use scheduler::{RetryScheduler, RetrySchedulerBuilder};

#[cfg(test)]
mod tests;
