//! The public circuit breaker facade and its execution gate.

use crate::config::CircuitBreakerConfig;
use crate::errors::{Error, Result};
use crate::events::StateChangeSubscriber;
use crate::transitions::Shared;
use crate::types::{CircuitBreakerStats, CircuitState, StateChange};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Monotonic source for auto-generated breaker names
static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// An in-process circuit breaker guarding one downstream dependency.
///
/// Wraps a fallible operation and tracks consecutive failures. Once the
/// configured threshold is exceeded the circuit opens, calls fail fast
/// without touching the dependency, and a cooldown timer is armed. When
/// the cooldown expires the circuit goes half-open and exactly one trial
/// call probes recovery.
///
/// The breaker owns a tokio timer task while open, so it must be created
/// and driven inside a tokio runtime.
pub struct CircuitBreaker {
    shared: Arc<Shared>,
}

impl CircuitBreaker {
    /// Create a breaker with an auto-generated name.
    /// Rejects zero timeout or threshold.
    pub fn new(config: CircuitBreakerConfig) -> Result<Self> {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        Self::named(format!("breaker-{id}"), config)
    }

    /// Create a named breaker; the name identifies it in notifications
    /// and transition logs
    pub fn named(name: impl Into<String>, config: CircuitBreakerConfig) -> Result<Self> {
        config.validate()?;
        let name: Arc<str> = name.into().into();
        Ok(Self {
            shared: Shared::new(name, &config),
        })
    }

    /// Name carried on every [`StateChange`] this breaker emits
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Current state; never blocks
    pub fn state(&self) -> CircuitState {
        self.shared.state()
    }

    /// Cooldown duration an open circuit waits before probing recovery
    pub fn timeout(&self) -> Duration {
        self.shared.inner.lock().timeout
    }

    /// Change the cooldown duration, rejecting zero. A pending cooldown is
    /// rescheduled so the new duration runs from the time of the change; a
    /// stale, shorter duration can never fire.
    pub fn set_timeout(&self, timeout: Duration) -> Result<()> {
        if timeout.is_zero() {
            return Err(Error::configuration("timeout must be greater than zero"));
        }
        let mut inner = self.shared.inner.lock();
        inner.timeout = timeout;
        if inner.state == CircuitState::Open {
            self.shared.arm_cooldown(&mut inner);
        }
        Ok(())
    }

    /// Number of consecutive failures tolerated before the circuit trips
    pub fn threshold(&self) -> u32 {
        self.shared.inner.lock().threshold
    }

    /// Change the failure threshold, rejecting zero. Takes effect on the
    /// next recorded failure.
    pub fn set_threshold(&self, threshold: u32) -> Result<()> {
        if threshold == 0 {
            return Err(Error::configuration("threshold must be greater than zero"));
        }
        self.shared.inner.lock().threshold = threshold;
        Ok(())
    }

    /// Force the circuit open, e.g. from an external health check.
    /// No-op (and no notification) when already open.
    pub fn trip(&self) {
        let mut inner = self.shared.inner.lock();
        self.shared.transition_to_open(&mut inner);
    }

    /// Force the circuit closed, cancelling any pending cooldown.
    /// No-op (and no notification) when already closed.
    pub fn reset(&self) {
        let mut inner = self.shared.inner.lock();
        self.shared.transition_to_closed(&mut inner);
    }

    /// Register a subscriber; dispatch is synchronous, in registration order
    pub fn subscribe(&self, subscriber: Arc<dyn StateChangeSubscriber>) {
        self.shared.subscribers.register(subscriber);
    }

    /// Register a closure as a subscriber
    pub fn subscribe_fn<F>(&self, subscriber: F)
    where
        F: Fn(&StateChange) + Send + Sync + 'static,
    {
        self.shared.subscribers.register(Arc::new(subscriber));
    }

    /// Remove every subscriber with the given name
    pub fn unsubscribe(&self, name: &str) {
        self.shared.subscribers.unregister(name);
    }

    /// Execute an operation through the circuit breaker.
    ///
    /// While open the operation is never invoked and the call fails with
    /// [`Error::OpenCircuit`]. While half-open only the first caller gets
    /// the trial slot; a concurrent second caller is rejected the same way.
    /// A failure of the invoked operation is returned as
    /// [`Error::OperationFailed`] with the original error chained, after
    /// the resulting transition and its notifications have been applied.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        // The admission generation scopes the outcome: if any transition
        // happens while the operation is in flight, the outcome no longer
        // describes the state that admitted it and must not be counted.
        let (generation, probe) = {
            let mut inner = self.shared.inner.lock();
            match inner.state {
                CircuitState::Open => return Err(Error::OpenCircuit),
                CircuitState::HalfOpen => {
                    if inner.probe_in_flight {
                        return Err(Error::OpenCircuit);
                    }
                    inner.probe_in_flight = true;
                    let probe = ProbeSlot {
                        shared: Arc::clone(&self.shared),
                        generation: inner.generation,
                        released: false,
                    };
                    (inner.generation, Some(probe))
                }
                CircuitState::Closed => (inner.generation, None),
            }
        };

        let outcome = operation().await;
        if let Some(probe) = probe {
            probe.disarm();
        }

        match outcome {
            Ok(value) => {
                self.shared.record_success(generation);
                Ok(value)
            }
            Err(source) => {
                self.shared.record_failure(generation);
                Err(Error::operation_failed(source))
            }
        }
    }

    /// Snapshot of the breaker internals
    pub fn stats(&self) -> CircuitBreakerStats {
        let inner = self.shared.inner.lock();
        CircuitBreakerStats {
            state: inner.state,
            failure_count: inner.failure_count,
            probe_in_flight: inner.probe_in_flight,
            last_state_change: inner.last_state_change,
        }
    }
}

impl Drop for CircuitBreaker {
    fn drop(&mut self) {
        let mut inner = self.shared.inner.lock();
        self.shared.abort_cooldown(&mut inner);
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name())
            .field("state", &self.state())
            .finish()
    }
}

/// Releases the half-open probe slot if the gate future is dropped before
/// the outcome is recorded
struct ProbeSlot {
    shared: Arc<Shared>,
    generation: u64,
    released: bool,
}

impl ProbeSlot {
    fn disarm(mut self) {
        self.released = true;
    }
}

impl Drop for ProbeSlot {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let mut inner = self.shared.inner.lock();
        if inner.generation == self.generation && inner.state == CircuitState::HalfOpen {
            inner.probe_in_flight = false;
        }
    }
}
