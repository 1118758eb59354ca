//! State transition application and cooldown timer ownership.
//!
//! Every transition (state change, counter reset, timer arm/cancel,
//! notification dispatch) is applied as one atomic unit under a single
//! mutex. The cooldown timer is a spawned one-shot task that sleeps on the
//! tokio timer wheel and acquires the same mutex before applying
//! open -> half-open; a generation counter turns any superseded expiry
//! into a no-op.

use crate::config::CircuitBreakerConfig;
use crate::events::Subscribers;
use crate::types::{CircuitState, StateChange};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Mutable breaker internals, serialized by `Shared::inner`
pub(crate) struct Inner {
    pub(crate) state: CircuitState,
    pub(crate) failure_count: u32,
    pub(crate) threshold: u32,
    pub(crate) timeout: Duration,
    pub(crate) probe_in_flight: bool,
    /// Bumped on every transition and every cooldown (re)arm; a cooldown
    /// expiry only applies if its captured generation is still current
    pub(crate) generation: u64,
    pub(crate) cooldown: Option<JoinHandle<()>>,
    pub(crate) last_state_change: Instant,
}

/// State shared between the public facade and the cooldown task
pub(crate) struct Shared {
    pub(crate) name: Arc<str>,
    /// Mirror of `Inner::state` so reads never take the transition lock;
    /// subscribers invoked during dispatch rely on this
    state_mirror: AtomicU8,
    pub(crate) inner: Mutex<Inner>,
    pub(crate) subscribers: Subscribers,
    /// Self-reference handed to cooldown tasks so a pending timer does not
    /// keep a dropped breaker alive
    weak: Weak<Shared>,
}

impl Shared {
    pub(crate) fn new(name: Arc<str>, config: &CircuitBreakerConfig) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            name,
            state_mirror: AtomicU8::new(CircuitState::Closed.as_u8()),
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failure_count: 0,
                threshold: config.threshold,
                timeout: config.timeout,
                probe_in_flight: false,
                generation: 0,
                cooldown: None,
                last_state_change: Instant::now(),
            }),
            subscribers: Subscribers::default(),
            weak: weak.clone(),
        })
    }

    /// Lock-free read of the current state
    pub(crate) fn state(&self) -> CircuitState {
        CircuitState::from_u8(self.state_mirror.load(Ordering::SeqCst))
    }

    /// Record a successful call and apply any resulting transition. Only
    /// counts if the breaker is still in the generation that admitted the
    /// call; an outcome that straddled a transition is discarded.
    pub(crate) fn record_success(&self, generation: u64) {
        let mut inner = self.inner.lock();
        if generation != inner.generation {
            debug!(
                breaker = %self.name,
                "outcome from a superseded generation ignored"
            );
            return;
        }
        match inner.state {
            CircuitState::HalfOpen => self.transition_to_closed(&mut inner),
            CircuitState::Closed => inner.failure_count = 0,
            CircuitState::Open => {
                warn!(
                    breaker = %self.name,
                    "success recorded while the circuit is open; not counted"
                );
            }
        }
    }

    /// Record a failed call and apply any resulting transition, under the
    /// same generation guard as `record_success`
    pub(crate) fn record_failure(&self, generation: u64) {
        let mut inner = self.inner.lock();
        if generation != inner.generation {
            debug!(
                breaker = %self.name,
                "outcome from a superseded generation ignored"
            );
            return;
        }
        match inner.state {
            CircuitState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count > inner.threshold {
                    self.transition_to_open(&mut inner);
                }
            }
            // Any trial failure reopens the circuit, regardless of threshold
            CircuitState::HalfOpen => self.transition_to_open(&mut inner),
            CircuitState::Open => {
                warn!(
                    breaker = %self.name,
                    "failure recorded while the circuit is open; not counted"
                );
            }
        }
    }

    /// Closed/HalfOpen -> Open: reset the counter, arm the cooldown, notify.
    /// No-op (and no notification) when already open.
    pub(crate) fn transition_to_open(&self, inner: &mut Inner) {
        if inner.state == CircuitState::Open {
            return;
        }
        warn!(breaker = %self.name, from = %inner.state, "circuit opening");
        self.apply(inner, CircuitState::Open);
        self.arm_cooldown(inner);
        self.notify(CircuitState::Open);
    }

    /// Open -> HalfOpen, driven only by the cooldown expiring
    fn transition_to_half_open(&self, inner: &mut Inner) {
        if inner.state != CircuitState::Open {
            return;
        }
        info!(breaker = %self.name, "circuit half-open: allowing one trial call");
        // The timer that got us here has already fired; drop its handle.
        inner.cooldown = None;
        self.apply(inner, CircuitState::HalfOpen);
        self.notify(CircuitState::HalfOpen);
    }

    /// Open/HalfOpen -> Closed: cancel any pending cooldown, reset the
    /// counter, notify. No-op (and no notification) when already closed.
    pub(crate) fn transition_to_closed(&self, inner: &mut Inner) {
        if inner.state == CircuitState::Closed {
            return;
        }
        info!(breaker = %self.name, from = %inner.state, "circuit closing");
        self.abort_cooldown(inner);
        self.apply(inner, CircuitState::Closed);
        self.notify(CircuitState::Closed);
    }

    /// Replace any pending cooldown with one for the current timeout,
    /// measured from now
    pub(crate) fn arm_cooldown(&self, inner: &mut Inner) {
        self.abort_cooldown(inner);
        inner.generation += 1;
        let generation = inner.generation;
        let timeout = inner.timeout;
        let shared = self.weak.clone();
        inner.cooldown = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let Some(shared) = shared.upgrade() else {
                return;
            };
            let mut inner = shared.inner.lock();
            if inner.generation == generation && inner.state == CircuitState::Open {
                shared.transition_to_half_open(&mut inner);
            } else {
                debug!(breaker = %shared.name, "stale cooldown expiry ignored");
            }
        }));
    }

    /// Cancel a pending cooldown so it can never fire
    pub(crate) fn abort_cooldown(&self, inner: &mut Inner) {
        if let Some(handle) = inner.cooldown.take() {
            handle.abort();
        }
    }

    /// Set the new state: mirror it for lock-free readers, invalidate any
    /// outstanding cooldown generation, release the half-open probe slot
    fn apply(&self, inner: &mut Inner, next: CircuitState) {
        inner.state = next;
        inner.failure_count = 0;
        inner.probe_in_flight = false;
        inner.generation += 1;
        inner.last_state_change = Instant::now();
        self.state_mirror.store(next.as_u8(), Ordering::SeqCst);
    }

    fn notify(&self, state: CircuitState) {
        let change = StateChange {
            breaker: self.name.to_string(),
            state,
        };
        self.subscribers.notify(&change);
    }
}
