//! Configuration for circuit breaker behavior.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default cooldown an open circuit waits before probing recovery (1s)
const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Default number of consecutive failures tolerated before tripping
const DEFAULT_THRESHOLD: u32 = 5;

/// Configuration for circuit breaker behavior
///
/// Both values stay mutable on a live breaker through
/// [`CircuitBreaker::set_timeout`](crate::CircuitBreaker::set_timeout) and
/// [`CircuitBreaker::set_threshold`](crate::CircuitBreaker::set_threshold).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Duration the circuit stays open before allowing a trial call
    pub timeout: Duration,
    /// Number of consecutive failures tolerated before the circuit trips;
    /// the (threshold + 1)-th consecutive failure opens the circuit
    pub threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a configuration with explicit values
    pub const fn new(timeout: Duration, threshold: u32) -> Self {
        Self { timeout, threshold }
    }

    /// Check that all values are usable before they reach a live breaker.
    /// Zero values are rejected, never clamped.
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(Error::configuration("timeout must be greater than zero"));
        }
        if self.threshold == 0 {
            return Err(Error::configuration("threshold must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.timeout, Duration::from_millis(1000));
        assert_eq!(config.threshold, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = CircuitBreakerConfig::new(Duration::ZERO, 5);
        assert!(matches!(
            config.validate(),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let config = CircuitBreakerConfig::new(Duration::from_millis(100), 0);
        assert!(matches!(
            config.validate(),
            Err(Error::Configuration { .. })
        ));
    }
}
