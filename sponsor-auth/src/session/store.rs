//! The session store: single writer over the process's one shared session.
//!
//! All mutation flows through this type, in response to explicit calls
//! (`initialize`, `login`, `logout`, `refresh`); consumers read atomically
//! published [`SessionSnapshot`]s through [`SessionWatch`] handles.

use crate::error::AuthError;
use crate::provider::{IdentityProvider, ProviderError};
use crate::roles::{NormalizedRole, RoleResolver};
use crate::session::{Session, SessionSnapshot};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, OnceCell};

pub struct SessionStore {
    provider: Arc<dyn IdentityProvider>,
    resolver: RoleResolver,
    tx: watch::Sender<SessionSnapshot>,
    init: OnceCell<()>,
    // Counts applied identity transitions; lets a slow recovery detect that it
    // lost the race against an explicit login/logout and discard its result.
    generation: AtomicU64,
}

impl SessionStore {
    pub fn new(provider: Arc<dyn IdentityProvider>, resolver: RoleResolver) -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::hydrating());
        SessionStore {
            provider,
            resolver,
            tx,
            init: OnceCell::new(),
            generation: AtomicU64::new(0),
        }
    }

    pub fn resolver(&self) -> &RoleResolver {
        &self.resolver
    }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    /// Current snapshot, readable without subscribing.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    /// Register for change notification. Delivery fires at most once per
    /// actual state transition; dropping the handle cancels it.
    pub fn subscribe(&self) -> SessionWatch {
        SessionWatch {
            rx: self.tx.subscribe(),
        }
    }

    /// Attempt to recover an existing session from the provider's persisted
    /// token. Idempotent: concurrent callers share a single resolution.
    ///
    /// Recovery failure resolves to the signed-out state rather than leaving
    /// consumers hydrating forever. A result that arrives after an explicit
    /// login or logout already happened is discarded, not applied.
    pub async fn initialize(&self) {
        self.init
            .get_or_init(|| async {
                let started_at = self.generation.load(Ordering::Acquire);
                let recovered = match self.provider.recover().await {
                    Ok(recovered) => recovered,
                    Err(ProviderError::TokenExpired) => None,
                    Err(err) => {
                        tracing::warn!(error = %err, "Session recovery failed; starting signed out");
                        None
                    }
                };

                if self.generation.load(Ordering::Acquire) != started_at {
                    tracing::debug!("Discarding stale session recovery result");
                    return;
                }

                self.publish(recovered.map(Session::from_provider));
            })
            .await;
    }

    /// Exchange credentials for a session. On success the new snapshot is
    /// published before this call resolves; on failure the prior session is
    /// left untouched.
    pub async fn login(&self, email: &str, secret: &str) -> Result<Session, AuthError> {
        let provider_session = self.provider.sign_in(email, secret).await?;
        let session = Session::from_provider(provider_session);
        tracing::info!(user_id = %session.user_id, "Login succeeded");
        self.publish(Some(session.clone()));
        Ok(session)
    }

    /// Local-first logout: the cleared snapshot is published immediately and
    /// unconditionally; remote revocation runs detached and its failure is
    /// only logged. Consumers observe the cleared session before any
    /// navigation can start.
    pub fn logout(&self) {
        let prior = self.tx.borrow().session.clone();
        self.publish(None);

        if let Some(session) = prior {
            let provider = Arc::clone(&self.provider);
            tokio::spawn(async move {
                if let Err(err) = provider.sign_out(&session.tokens.access_token).await {
                    tracing::warn!(error = %err, "Remote revocation failed after local logout");
                }
            });
        }
    }

    /// Exchange the stored refresh token for fresh tokens. A refresh that
    /// does not change identity updates tokens silently (no notification).
    /// Provider-signaled expiry clears the session like a logout and surfaces
    /// `SessionExpired`; transient transport failures leave it in place.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let refresh_token = self
            .tx
            .borrow()
            .session
            .as_ref()
            .map(|s| s.tokens.refresh_token.clone());
        let Some(refresh_token) = refresh_token else {
            return Ok(());
        };

        match self.provider.refresh(&refresh_token).await {
            Ok(provider_session) => {
                self.publish(Some(Session::from_provider(provider_session)));
                Ok(())
            }
            Err(ProviderError::TokenExpired) => {
                tracing::info!("Session expired; clearing local state");
                self.publish(None);
                Err(AuthError::SessionExpired)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Publish a new session state. The snapshot value (including tokens) is
    /// always updated; subscribers are only notified when the identity
    /// (resolution, user, role) actually changed.
    fn publish(&self, session: Option<Session>) {
        let role = session
            .as_ref()
            .map(|s| self.resolver.normalize(s))
            .unwrap_or(NormalizedRole::None);
        let next = SessionSnapshot {
            resolved: true,
            session,
            role,
        };

        self.tx.send_if_modified(|current| {
            let transitioned = current.identity() != next.identity();
            *current = next.clone();
            if transitioned {
                self.generation.fetch_add(1, Ordering::AcqRel);
            }
            transitioned
        });
    }
}

/// Cancellable subscription to session transitions. Dropping the handle stops
/// delivery, so a consumer torn down mid-resolution never receives a late
/// update.
pub struct SessionWatch {
    rx: watch::Receiver<SessionSnapshot>,
}

impl SessionWatch {
    pub fn current(&self) -> SessionSnapshot {
        self.rx.borrow().clone()
    }

    /// Wait for the next transition. Returns `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<SessionSnapshot> {
        match self.rx.changed().await {
            Ok(()) => Some(self.rx.borrow_and_update().clone()),
            Err(_) => None,
        }
    }
}
