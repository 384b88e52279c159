//! Session model and the store that owns it.

mod store;

pub use store::{SessionStore, SessionWatch};

use crate::provider::ProviderSession;
use crate::roles::NormalizedRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Opaque provider tokens carried by a session. Their internal format belongs
/// to the identity platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Local representation of an authenticated identity, sourced from the
/// identity platform. Owned exclusively by the [`SessionStore`]; destroyed on
/// logout or expiry with no local recovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: Option<String>,
    pub claims: HashMap<String, Value>,
    pub tokens: SessionTokens,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn from_provider(provider: ProviderSession) -> Self {
        Session {
            user_id: provider.user_id,
            email: provider.email,
            claims: provider.claims,
            tokens: SessionTokens {
                access_token: provider.access_token,
                refresh_token: provider.refresh_token,
            },
            expires_at: provider.expires_at,
        }
    }
}

/// The unit of publication on the store's watch channel.
///
/// Session and derived role travel together so no consumer can observe a torn
/// pair (cleared session with a stale role, or vice versa). `resolved` is
/// false only before the store's first resolution in this process.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub resolved: bool,
    pub session: Option<Session>,
    pub role: NormalizedRole,
}

impl SessionSnapshot {
    pub(crate) fn hydrating() -> Self {
        SessionSnapshot {
            resolved: false,
            session: None,
            role: NormalizedRole::None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// The identity key used to suppress no-op notifications: a transition is
    /// only a transition if resolution, user, or role actually changed.
    pub(crate) fn identity(&self) -> (bool, Option<&str>, NormalizedRole) {
        (
            self.resolved,
            self.session.as_ref().map(|s| s.user_id.as_str()),
            self.role,
        )
    }
}
