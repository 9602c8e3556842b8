//! Backoff delay computation
//!
//! Pure functions, kept free of the runtime and the random source so the
//! arithmetic is directly unit-testable.

use std::time::Duration;

use crate::config::BackoffConfig;

/// Grow the failure-driven delay by one step
///
/// A zero `current` means no prior failure-driven delay: the result is the
/// configured floor. Otherwise the delay is multiplied by the retry exponent
/// and capped at the configured ceiling. The returned value is monotonically
/// non-decreasing across consecutive calls for any valid configuration.
///
/// # Example
///
/// ```rust
/// use ripcord::{next_backoff, BackoffConfig};
/// use std::time::Duration;
///
/// let config = BackoffConfig {
///     min_delay_ms: 1_000,
///     max_delay_ms: 8_000,
///     retry_exponent: 2.0,
///     jitter_factor: 0.0,
/// };
///
/// let d1 = next_backoff(Duration::ZERO, &config);
/// assert_eq!(d1, Duration::from_secs(1));
///
/// let d2 = next_backoff(d1, &config);
/// assert_eq!(d2, Duration::from_secs(2));
/// ```
pub fn next_backoff(current: Duration, config: &BackoffConfig) -> Duration {
    if current.is_zero() {
        return config.min_delay();
    }
    let grown = current.as_secs_f64() * config.retry_exponent;
    let capped = grown.min(config.max_delay().as_secs_f64());
    Duration::from_secs_f64(capped)
}

/// Randomize a computed delay
///
/// Maps a uniform draw `unit` in [0, 1) to
/// `(1 - jitter_factor) * delay + jitter_factor * delay * unit`, so the
/// result always lies in `[(1 - jitter_factor) * delay, delay]`. A jitter
/// factor of zero is the identity; a factor of one spreads the delay
/// uniformly over `[0, delay)`.
pub fn apply_jitter(delay: Duration, jitter_factor: f64, unit: f64) -> Duration {
    if jitter_factor == 0.0 || delay.is_zero() {
        return delay;
    }
    let scale = (1.0 - jitter_factor) + jitter_factor * unit;
    Duration::from_secs_f64(delay.as_secs_f64() * scale)
}
