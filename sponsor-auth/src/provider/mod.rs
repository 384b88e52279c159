//! The identity platform boundary.
//!
//! Token issuance, session persistence, password reset delivery, and user
//! records all live on the remote platform; this module only defines the
//! calls the application makes against it and the session/claims shape it
//! consumes back. Token internals are opaque throughout.

mod http;
mod mock;

pub use http::{HttpIdentityProvider, ProviderConfig};
pub use mock::MockIdentityProvider;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Failures at the provider boundary, classified for the session layer.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider rejected the supplied credentials.
    #[error("credentials rejected by identity provider")]
    CredentialsRejected,

    /// The provider signaled that the token is no longer valid.
    #[error("token no longer valid")]
    TokenExpired,

    /// Transport-level failure reaching the provider.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Anything the provider returned that we could not classify.
    #[error("unexpected provider response: {0}")]
    Unexpected(String),
}

/// What the provider hands back for an authenticated identity.
#[derive(Debug, Clone)]
pub struct ProviderSession {
    pub user_id: String,
    pub email: Option<String>,
    pub claims: HashMap<String, Value>,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Calls the application makes against the identity platform.
///
/// The admin surface (`invite_user`, `send_password_reset`, `set_password`)
/// backs the portal's admin-gated endpoints; the rest backs the session
/// lifecycle.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Recover an existing session from the provider's persisted token, if
    /// one exists and is still honored.
    async fn recover(&self) -> Result<Option<ProviderSession>, ProviderError>;

    async fn sign_in(&self, email: &str, password: &str)
        -> Result<ProviderSession, ProviderError>;

    /// Revoke the session remotely. Callers must not depend on this
    /// succeeding; local state is cleared regardless.
    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError>;

    async fn refresh(&self, refresh_token: &str) -> Result<ProviderSession, ProviderError>;

    /// Invite a new user with a pre-assigned role. Admin credentialed.
    async fn invite_user(&self, email: &str, role: &str) -> Result<(), ProviderError>;

    /// Ask the provider to deliver a password reset email.
    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError>;

    /// Set a user's password directly. Admin credentialed.
    async fn set_password(&self, user_id: &str, new_password: &str)
        -> Result<(), ProviderError>;
}
