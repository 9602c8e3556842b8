//! Backoff configuration
//!
//! Hosts typically embed [`BackoffConfig`] inside their own configuration
//! files, so the struct derives serde with kebab-case field names and
//! per-field defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

/// Backoff tuning for a [`RetryScheduler`](crate::RetryScheduler)
///
/// All values are fixed at construction; the scheduler owns the mutable
/// backoff state. The defaults are the tuning used for persistent database
/// connection reconnects: a one second floor, a thirty second ceiling, gentle
/// 1.3x growth, and 70% jitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BackoffConfig {
    /// Delay used for the first retry after a failure, in milliseconds
    #[serde(default = "default_min_delay")]
    pub min_delay_ms: u64,

    /// Ceiling on backoff growth, in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Multiplicative growth factor applied per consecutive failure
    #[serde(default = "default_retry_exponent")]
    pub retry_exponent: f64,

    /// Fraction of the computed delay that is randomized, in [0, 1]
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay(),
            max_delay_ms: default_max_delay(),
            retry_exponent: default_retry_exponent(),
            jitter_factor: default_jitter_factor(),
        }
    }
}

fn default_min_delay() -> u64 {
    1_000
}
fn default_max_delay() -> u64 {
    30_000
}
fn default_retry_exponent() -> f64 {
    1.3
}
fn default_jitter_factor() -> f64 {
    0.7
}

impl BackoffConfig {
    /// Validate the configuration
    ///
    /// Rejects a zero delay floor, an inverted floor/ceiling pair, an
    /// exponent that would not grow the delay, and a jitter factor outside
    /// [0, 1].
    pub fn validate(&self) -> Result<()> {
        if self.min_delay_ms == 0 {
            return Err(Error::ZeroMinDelay);
        }
        if self.max_delay_ms < self.min_delay_ms {
            return Err(Error::delay_bounds_inverted(
                self.min_delay_ms,
                self.max_delay_ms,
            ));
        }
        if !self.retry_exponent.is_finite() || self.retry_exponent <= 1.0 {
            return Err(Error::exponent_out_of_range(self.retry_exponent));
        }
        if !self.jitter_factor.is_finite() || !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(Error::jitter_out_of_range(self.jitter_factor));
        }
        Ok(())
    }

    /// The delay floor as a `Duration`
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    /// The delay ceiling as a `Duration`
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = BackoffConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_delay(), Duration::from_secs(1));
        assert_eq!(config.max_delay(), Duration::from_secs(30));
    }

    #[test]
    fn rejects_zero_min_delay() {
        let config = BackoffConfig {
            min_delay_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::ZeroMinDelay)));
    }

    #[test]
    fn rejects_inverted_bounds() {
        let config = BackoffConfig {
            min_delay_ms: 5_000,
            max_delay_ms: 1_000,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::DelayBoundsInverted {
                min_ms: 5_000,
                max_ms: 1_000
            })
        ));
    }

    #[test]
    fn rejects_non_growing_exponent() {
        for exponent in [1.0, 0.5, f64::NAN, f64::INFINITY] {
            let config = BackoffConfig {
                retry_exponent: exponent,
                ..Default::default()
            };
            assert!(
                config.validate().is_err(),
                "exponent {exponent} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_jitter_outside_unit_interval() {
        for factor in [-0.1, 1.1, f64::NAN] {
            let config = BackoffConfig {
                jitter_factor: factor,
                ..Default::default()
            };
            assert!(
                config.validate().is_err(),
                "jitter {factor} should be rejected"
            );
        }
    }

    #[test]
    fn jitter_endpoints_are_allowed() {
        for factor in [0.0, 1.0] {
            let config = BackoffConfig {
                jitter_factor: factor,
                ..Default::default()
            };
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn deserializes_with_field_defaults() {
        let config: BackoffConfig = serde_json::from_str(r#"{"min-delay-ms": 250}"#)
            .expect("partial config should deserialize");
        assert_eq!(config.min_delay_ms, 250);
        assert_eq!(config.max_delay_ms, 30_000);
        assert_eq!(config.retry_exponent, 1.3);
        assert_eq!(config.jitter_factor, 0.7);
    }
}
