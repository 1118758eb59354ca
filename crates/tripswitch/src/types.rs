//! Core types for circuit breaker state and notifications.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitState {
    /// Circuit is closed - calls pass through normally
    Closed,
    /// Circuit is open - calls fail immediately without execution
    Open,
    /// Circuit is half-open - a single trial call is allowed to probe recovery
    HalfOpen,
}

impl CircuitState {
    pub(crate) const fn as_u8(self) -> u8 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }

    pub(crate) const fn from_u8(value: u8) -> Self {
        match value {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Notification payload delivered to subscribers on every state transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    /// Name of the breaker that transitioned
    pub breaker: String,
    /// The state the breaker transitioned into
    pub state: CircuitState,
}

/// Snapshot of circuit breaker internals
#[derive(Debug, Clone)]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    /// Consecutive failures observed since the last success or transition
    pub failure_count: u32,
    /// Whether the single half-open trial call is currently executing
    pub probe_in_flight: bool,
    pub last_state_change: Instant,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_display_matches_wire_names() {
        assert_eq!(CircuitState::Closed.to_string(), "closed");
        assert_eq!(CircuitState::Open.to_string(), "open");
        assert_eq!(CircuitState::HalfOpen.to_string(), "half-open");
    }

    #[test]
    fn state_round_trips_through_u8() {
        for state in [
            CircuitState::Closed,
            CircuitState::Open,
            CircuitState::HalfOpen,
        ] {
            assert_eq!(CircuitState::from_u8(state.as_u8()), state);
        }
    }
}
