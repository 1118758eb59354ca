//! Error types surfaced by the circuit breaker.

/// Result type alias for breaker operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the execution gate and configuration setters
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The circuit is open: the call was rejected and the wrapped operation
    /// was never invoked. Recoverable by the caller (fall back, retry later).
    #[error("circuit is open: call rejected without executing the operation")]
    OpenCircuit,

    /// The wrapped operation was invoked and failed. The original failure is
    /// chained as the source and is never swallowed.
    #[error("wrapped operation failed")]
    OperationFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Invalid configuration value, rejected at the point of assignment
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Wrap an operation failure, chaining the original error
    pub fn operation_failed(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::OperationFailed {
            source: Box::new(source),
        }
    }

    /// Whether this error means the call was rejected without execution
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Error::OpenCircuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn operation_failed_chains_the_source() {
        let err = Error::operation_failed(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(err.source().is_some());
        assert!(!err.is_rejection());
    }

    #[test]
    fn open_circuit_is_a_rejection() {
        assert!(Error::OpenCircuit.is_rejection());
    }
}
