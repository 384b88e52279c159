//! In-memory identity provider for tests.

use crate::provider::{IdentityProvider, ProviderError, ProviderSession};
use crate::roles::ROLE_CLAIM;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Semaphore;

struct MockAccount {
    password: String,
    role: String,
}

/// Scriptable stand-in for the identity platform. Accounts are registered up
/// front; toggles simulate transport failure, failed revocation, and a slow
/// recovery that must lose races against explicit transitions.
pub struct MockIdentityProvider {
    accounts: Mutex<HashMap<String, MockAccount>>,
    recoverable: Mutex<Option<ProviderSession>>,
    token_counter: AtomicU64,
    recover_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
    offline: AtomicBool,
    fail_sign_out: AtomicBool,
    gate_recover: AtomicBool,
    recover_gate: Semaphore,
    invites: Mutex<Vec<(String, String)>>,
    password_resets: Mutex<Vec<String>>,
    password_sets: Mutex<Vec<(String, String)>>,
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        MockIdentityProvider {
            accounts: Mutex::new(HashMap::new()),
            recoverable: Mutex::new(None),
            token_counter: AtomicU64::new(0),
            recover_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
            fail_sign_out: AtomicBool::new(false),
            gate_recover: AtomicBool::new(false),
            recover_gate: Semaphore::new(0),
            invites: Mutex::new(Vec::new()),
            password_resets: Mutex::new(Vec::new()),
            password_sets: Mutex::new(Vec::new()),
        }
    }
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, email: &str, password: &str, role: &str) -> Self {
        self.add_account(email, password, role);
        self
    }

    pub fn add_account(&self, email: &str, password: &str, role: &str) {
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            MockAccount {
                password: password.to_string(),
                role: role.to_string(),
            },
        );
    }

    /// Seed a session that `recover()` will return.
    pub fn set_recoverable(&self, email: &str, role: &str) {
        let session = self.mint_session(email, role);
        *self.recoverable.lock().unwrap() = Some(session);
    }

    /// All provider calls fail with a transport error while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// `sign_out` fails remotely while set; local logout must not care.
    pub fn set_fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    /// Block `recover()` until [`release_recover`](Self::release_recover).
    pub fn hold_recover(&self) {
        self.gate_recover.store(true, Ordering::SeqCst);
    }

    pub fn release_recover(&self) {
        self.recover_gate.add_permits(1);
    }

    pub fn recover_calls(&self) -> usize {
        self.recover_calls.load(Ordering::SeqCst)
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    pub fn invites(&self) -> Vec<(String, String)> {
        self.invites.lock().unwrap().clone()
    }

    pub fn password_resets(&self) -> Vec<String> {
        self.password_resets.lock().unwrap().clone()
    }

    pub fn password_sets(&self) -> Vec<(String, String)> {
        self.password_sets.lock().unwrap().clone()
    }

    fn mint_session(&self, email: &str, role: &str) -> ProviderSession {
        let serial = self.token_counter.fetch_add(1, Ordering::SeqCst);
        ProviderSession {
            user_id: format!("uid-{email}"),
            email: Some(email.to_string()),
            claims: HashMap::from([(ROLE_CLAIM.to_string(), json!(role))]),
            access_token: format!("access-{serial}"),
            refresh_token: format!("refresh-{serial}"),
            expires_at: None,
        }
    }

    fn check_offline(&self) -> Result<(), ProviderError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(ProviderError::Transport("provider unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn recover(&self) -> Result<Option<ProviderSession>, ProviderError> {
        self.recover_calls.fetch_add(1, Ordering::SeqCst);
        if self.gate_recover.load(Ordering::SeqCst) {
            let permit = self
                .recover_gate
                .acquire()
                .await
                .map_err(|_| ProviderError::Unexpected("gate closed".to_string()))?;
            permit.forget();
        }
        self.check_offline()?;
        Ok(self.recoverable.lock().unwrap().clone())
    }

    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, ProviderError> {
        self.check_offline()?;

        let role = {
            let accounts = self.accounts.lock().unwrap();
            let account = accounts
                .get(email)
                .ok_or(ProviderError::CredentialsRejected)?;
            if account.password != password {
                return Err(ProviderError::CredentialsRejected);
            }
            account.role.clone()
        };

        let session = self.mint_session(email, &role);
        *self.recoverable.lock().unwrap() = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), ProviderError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        *self.recoverable.lock().unwrap() = None;
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(ProviderError::Transport("revocation failed".to_string()));
        }
        self.check_offline()?;
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<ProviderSession, ProviderError> {
        self.check_offline()?;

        let current = self.recoverable.lock().unwrap().clone();
        match current {
            Some(session) if session.refresh_token == refresh_token => {
                let email = session.email.clone().unwrap_or_default();
                let role = session
                    .claims
                    .get(ROLE_CLAIM)
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                // Same identity, rotated tokens.
                let rotated = self.mint_session(&email, &role);
                *self.recoverable.lock().unwrap() = Some(rotated.clone());
                Ok(rotated)
            }
            _ => Err(ProviderError::TokenExpired),
        }
    }

    async fn invite_user(&self, email: &str, role: &str) -> Result<(), ProviderError> {
        self.check_offline()?;
        self.invites
            .lock()
            .unwrap()
            .push((email.to_string(), role.to_string()));
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError> {
        self.check_offline()?;
        self.password_resets.lock().unwrap().push(email.to_string());
        Ok(())
    }

    async fn set_password(
        &self,
        user_id: &str,
        new_password: &str,
    ) -> Result<(), ProviderError> {
        self.check_offline()?;
        self.password_sets
            .lock()
            .unwrap()
            .push((user_id.to_string(), new_password.to_string()));
        Ok(())
    }
}
