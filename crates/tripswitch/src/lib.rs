//! In-process circuit breaker guarding calls to a failing dependency.
//!
//! The breaker wraps a fallible operation and counts consecutive failures.
//! Once the configured threshold is exceeded the circuit opens: calls fail
//! fast without touching the downstream dependency, shedding load while it
//! recovers. After a cooldown the circuit goes half-open and exactly one
//! trial call probes recovery; its outcome closes or reopens the circuit.
//!
//! ## Architecture
//!
//! - [`types`] - circuit states, notification payloads, stats snapshots
//! - [`config`] - breaker configuration and validation
//! - [`errors`] - the error taxonomy surfaced by the execution gate
//! - [`events`] - state-change subscription and synchronous dispatch
//! - [`breaker`] - the public [`CircuitBreaker`] facade
//!
//! ## Example
//!
//! ```rust,no_run
//! use tripswitch::{CircuitBreaker, CircuitBreakerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let breaker = CircuitBreaker::new(CircuitBreakerConfig::default())?;
//!
//! breaker.subscribe_fn(|change| {
//!     eprintln!("{} is now {}", change.breaker, change.state);
//! });
//!
//! let value = breaker
//!     .execute(|| async {
//!         // Your operation here
//!         Ok::<_, std::io::Error>("payload")
//!     })
//!     .await?;
//! assert_eq!(value, "payload");
//! # Ok(())
//! # }
//! ```

pub mod breaker;
pub mod config;
pub mod errors;
pub mod events;
pub mod types;

mod transitions;

// Re-export public API
pub use breaker::CircuitBreaker;
pub use config::CircuitBreakerConfig;
pub use errors::{Error, Result};
pub use events::StateChangeSubscriber;
pub use types::{CircuitBreakerStats, CircuitState, StateChange};
