//! Error types for the session-core crate

use crate::store::StoreError;

/// Result type alias for session-core operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Main error type for session-core
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session max age is less than zero")]
    NegativeMaxAge,

    #[error("Session last activity timeout is less than zero")]
    NegativeLastActivityTimeout,

    #[error("Session max age is shorter than the last activity timeout")]
    MaxAgeBelowActivityTimeout,

    #[error("Session key cannot be empty")]
    EmptyKey,

    #[error("Value serialization error")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}
