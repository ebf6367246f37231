use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Error taxonomy a provider adapter may return, per the capability
/// interface. Distinct from `ohp_store::StorageError` — this is the vendor
/// boundary, the Store is the durable-state boundary.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("input unreadable: {0}")]
    InputUnreadable(String),

    #[error("input too large: {0}")]
    InputTooLarge(String),

    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("transient provider error: {0}")]
    Transient(String),

    #[error("provider authentication failed: {0}")]
    Auth(String),

    #[error("permanent provider error: {0}")]
    Permanent(String),

    /// Translation/evaluation returned a different segment count than
    /// requested. Never silently coerced.
    #[error("alignment mismatch: requested {requested} segments, got {got}")]
    AlignmentMismatch { requested: usize, got: usize },
}

impl ProviderError {
    /// `rate_limited` and `transient` are retryable; everything else is
    /// not, per the retry policy table.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. } | ProviderError::Transient(_))
    }

    /// Provider-declared delay hint, when present (`rate_limited` only).
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }

    /// The `error_kind` string recorded on `StageStatus.last_error_kind`.
    pub fn error_kind(&self) -> &'static str {
        match self {
            ProviderError::InputUnreadable(_) => "input_unreadable",
            ProviderError::InputTooLarge(_) => "input_too_large",
            ProviderError::RateLimited { .. } => "provider_rate_limited",
            ProviderError::Transient(_) => "provider_transient",
            ProviderError::Auth(_) => "provider_auth",
            ProviderError::Permanent(_) => "provider_permanent",
            ProviderError::AlignmentMismatch { .. } => "alignment_mismatch",
        }
    }
}
