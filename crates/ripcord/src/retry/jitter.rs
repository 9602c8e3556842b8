//! Injectable jitter randomness
//!
//! The scheduler draws one uniform value per scheduled retry. The source is
//! injected rather than hardcoded to a global PRNG so tests can supply a
//! deterministic one.

use rand::Rng;

/// A source of uniform random draws for jitter
pub trait JitterSource: Send {
    /// Return a uniformly distributed value in [0, 1), freshly drawn per call
    fn unit(&mut self) -> f64;
}

/// Production jitter source backed by the thread-local RNG
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngJitter;

impl JitterSource for ThreadRngJitter {
    fn unit(&mut self) -> f64 {
        rand::rng().random_range(0.0..1.0)
    }
}

/// A jitter source that always returns the same value
///
/// Out-of-range values are clamped into [0, 1) at construction.
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(f64);

impl FixedJitter {
    /// Create a fixed source returning `value` on every draw
    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 1.0 - f64::EPSILON))
    }
}

impl JitterSource for FixedJitter {
    fn unit(&mut self) -> f64 {
        self.0
    }
}

/// A jitter source that cycles through a fixed sequence of draws
#[derive(Debug, Clone)]
pub struct SequenceJitter {
    values: Vec<f64>,
    next: usize,
}

impl SequenceJitter {
    /// Create a source cycling through `values`
    ///
    /// The sequence must be non-empty; each value is clamped into [0, 1).
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        let values: Vec<f64> = values
            .into_iter()
            .map(|v| v.clamp(0.0, 1.0 - f64::EPSILON))
            .collect();
        assert!(!values.is_empty(), "sequence jitter needs at least one value");
        Self { values, next: 0 }
    }
}

impl JitterSource for SequenceJitter {
    fn unit(&mut self) -> f64 {
        let value = self.values[self.next];
        self.next = (self.next + 1) % self.values.len();
        value
    }
}
