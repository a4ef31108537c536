use thiserror::Error;
use uuid::Uuid;

/// Error taxonomy shared by every subsystem. Kinds, not type names: callers
/// branch on the variant, never on the message text.
#[derive(Error, Debug)]
pub enum SignalError {
    /// Caller-supplied value violates a syntactic or semantic precondition.
    /// Never retried; surfaced to the caller as-is.
    #[error("bad input: {0}")]
    BadInput(String),

    /// Network error, timeout, HTTP 429/5xx. Retried with backoff; repeated
    /// occurrences engage the circuit breaker.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Circuit breaker open, or a provider chain exhausted with no cache.
    /// Does not abort the request; the caller degrades the affected field.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Request succeeded but with partial data.
    #[error("degraded: {0}")]
    Degraded(String),

    /// State-machine violation (illegal status transition, empty backtest
    /// selection, unknown allocation mode).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Programmer error or data-store corruption. Logged, not retried.
    #[error("fatal error [{correlation_id}]: {message}")]
    Fatal {
        message: String,
        correlation_id: Uuid,
    },
}

impl SignalError {
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal {
            message: message.into(),
            correlation_id: Uuid::new_v4(),
        }
    }

    /// Whether a failure of this kind is worth retrying under the
    /// policy (network error, timeout, HTTP 429/5xx).
    pub fn is_retryable(&self) -> bool {
        matches!(self, SignalError::Transient(_))
    }
}

pub type SignalResult<T> = Result<T, SignalError>;
