use crate::provider::ProviderError;
use thiserror::Error;

/// Failure taxonomy for session and access operations.
///
/// Login surfaces `InvalidCredentials`/`NetworkFailure` to the calling screen
/// without touching an existing session. `SessionExpired` takes the logout
/// path. `Unauthorized` is never rendered as a message; the guard handles it
/// by redirect.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("session expired")]
    SessionExpired,

    #[error("unauthorized")]
    Unauthorized,

    #[error("authentication failure: {0}")]
    Unknown(String),
}

impl From<ProviderError> for AuthError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::CredentialsRejected => AuthError::InvalidCredentials,
            ProviderError::Transport(msg) => AuthError::NetworkFailure(msg),
            ProviderError::TokenExpired => AuthError::SessionExpired,
            ProviderError::Unexpected(msg) => AuthError::Unknown(msg),
        }
    }
}
