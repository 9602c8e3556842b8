//! Error types for ripcord

use thiserror::Error;

/// Result type alias using ripcord's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration errors for ripcord
///
/// Construction is the only fallible surface in this crate: scheduling,
/// cancellation, and success signalling cannot fail. Absurd configuration is
/// rejected here rather than silently clamped, since clamping could mask
/// caller bugs.
#[derive(Error, Debug)]
pub enum Error {
    /// The minimum retry delay must be positive
    #[error("min-delay-ms must be greater than zero")]
    ZeroMinDelay,

    /// The delay ceiling is below the floor
    #[error("max-delay-ms ({max_ms}) must be at least min-delay-ms ({min_ms})")]
    DelayBoundsInverted { min_ms: u64, max_ms: u64 },

    /// The backoff exponent would not grow the delay
    #[error("retry-exponent ({exponent}) must be a finite value greater than 1.0")]
    ExponentOutOfRange { exponent: f64 },

    /// The jitter factor is not a fraction
    #[error("jitter-factor ({factor}) must be a finite value in [0, 1]")]
    JitterOutOfRange { factor: f64 },
}

impl Error {
    /// Create a delay bounds error
    pub fn delay_bounds_inverted(min_ms: u64, max_ms: u64) -> Self {
        Self::DelayBoundsInverted { min_ms, max_ms }
    }

    /// Create an exponent range error
    pub fn exponent_out_of_range(exponent: f64) -> Self {
        Self::ExponentOutOfRange { exponent }
    }

    /// Create a jitter range error
    pub fn jitter_out_of_range(factor: f64) -> Self {
        Self::JitterOutOfRange { factor }
    }
}
