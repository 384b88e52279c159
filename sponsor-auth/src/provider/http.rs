//! HTTP implementation of the identity provider boundary.
//!
//! Targets a GoTrue-style REST surface: password and refresh-token grants,
//! `/logout`, `/invite`, `/recover`, and the admin user endpoint. The refresh
//! token is persisted to a configured file so a restarted process can recover
//! its session; the token contents are never inspected.

use crate::provider::{IdentityProvider, ProviderError, ProviderSession};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Clone)]
pub struct ProviderConfig {
    /// Platform base URL, e.g. `https://project.example.co`.
    pub base_url: String,
    /// Publishable key sent with end-user calls.
    pub anon_key: Secret<String>,
    /// Privileged key for the admin surface. Never reaches a browser.
    pub service_key: Secret<String>,
    /// Where the refresh token is persisted between runs. `None` disables
    /// recovery.
    pub token_file: Option<PathBuf>,
}

pub struct HttpIdentityProvider {
    client: reqwest::Client,
    config: ProviderConfig,
}

#[derive(Debug, Deserialize)]
struct TokenGrantPayload {
    access_token: String,
    refresh_token: String,
    expires_in: Option<i64>,
    user: UserPayload,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: HashMap<String, Value>,
    #[serde(default)]
    app_metadata: HashMap<String, Value>,
}

impl HttpIdentityProvider {
    pub fn new(config: ProviderConfig) -> Self {
        HttpIdentityProvider {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.config.base_url, path)
    }

    /// Claims are user metadata overlaid with app metadata; the
    /// provider-controlled side wins when both carry the same key.
    fn session_from_payload(payload: TokenGrantPayload) -> ProviderSession {
        let mut claims = payload.user.user_metadata;
        claims.extend(payload.user.app_metadata);

        ProviderSession {
            user_id: payload.user.id,
            email: payload.user.email,
            claims,
            access_token: payload.access_token,
            refresh_token: payload.refresh_token,
            expires_at: payload
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
        }
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: Value,
    ) -> Result<ProviderSession, ProviderError> {
        let url = format!("{}?grant_type={}", self.auth_url("/token"), grant_type);
        let response = self
            .client
            .post(&url)
            .header("apikey", self.config.anon_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status.is_success() {
            let payload: TokenGrantPayload = response
                .json()
                .await
                .map_err(|e| ProviderError::Unexpected(e.to_string()))?;
            let session = Self::session_from_payload(payload);
            self.persist_refresh_token(&session.refresh_token).await;
            return Ok(session);
        }

        let detail = error_detail(response).await;
        if status.as_u16() == 400 || status.as_u16() == 401 {
            // The platform answers both bad passwords and dead refresh tokens
            // with a rejected grant; the grant type tells them apart.
            if grant_type == "refresh_token" {
                Err(ProviderError::TokenExpired)
            } else {
                Err(ProviderError::CredentialsRejected)
            }
        } else {
            Err(ProviderError::Unexpected(format!("{status}: {detail}")))
        }
    }

    async fn persist_refresh_token(&self, refresh_token: &str) {
        if let Some(path) = &self.config.token_file {
            if let Err(err) = tokio::fs::write(path, refresh_token).await {
                tracing::warn!(error = %err, "Failed to persist refresh token");
            }
        }
    }

    async fn stored_refresh_token(&self) -> Option<String> {
        let path = self.config.token_file.as_ref()?;
        match tokio::fs::read_to_string(path).await {
            Ok(token) if !token.trim().is_empty() => Some(token.trim().to_string()),
            Ok(_) => None,
            Err(_) => None,
        }
    }

    async fn discard_refresh_token(&self) {
        if let Some(path) = &self.config.token_file {
            let _ = tokio::fs::remove_file(path).await;
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn recover(&self) -> Result<Option<ProviderSession>, ProviderError> {
        let Some(refresh_token) = self.stored_refresh_token().await else {
            return Ok(None);
        };

        match self.refresh(&refresh_token).await {
            Ok(session) => Ok(Some(session)),
            Err(ProviderError::TokenExpired) => {
                self.discard_refresh_token().await;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, ProviderError> {
        self.token_grant("password", json!({ "email": email, "password": password }))
            .await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError> {
        self.discard_refresh_token().await;

        let response = self
            .client
            .post(self.auth_url("/logout"))
            .header("apikey", self.config.anon_key.expose_secret())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport)?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            Err(ProviderError::Unexpected(format!(
                "{status}: {}",
                error_detail(response).await
            )))
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<ProviderSession, ProviderError> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn invite_user(&self, email: &str, role: &str) -> Result<(), ProviderError> {
        let response = self
            .client
            .post(self.auth_url("/invite"))
            .header("apikey", self.config.service_key.expose_secret())
            .bearer_auth(self.config.service_key.expose_secret())
            .json(&json!({ "email": email, "data": { "role": role } }))
            .send()
            .await
            .map_err(transport)?;

        expect_success(response).await
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError> {
        let response = self
            .client
            .post(self.auth_url("/recover"))
            .header("apikey", self.config.anon_key.expose_secret())
            .json(&json!({ "email": email }))
            .send()
            .await
            .map_err(transport)?;

        expect_success(response).await
    }

    async fn set_password(
        &self,
        user_id: &str,
        new_password: &str,
    ) -> Result<(), ProviderError> {
        let url = format!("{}/{}", self.auth_url("/admin/users"), user_id);
        let response = self
            .client
            .put(&url)
            .header("apikey", self.config.service_key.expose_secret())
            .bearer_auth(self.config.service_key.expose_secret())
            .json(&json!({ "password": new_password }))
            .send()
            .await
            .map_err(transport)?;

        expect_success(response).await
    }
}

fn transport(err: reqwest::Error) -> ProviderError {
    ProviderError::Transport(err.to_string())
}

async fn expect_success(response: reqwest::Response) -> Result<(), ProviderError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(ProviderError::Unexpected(format!(
            "{status}: {}",
            error_detail(response).await
        )))
    }
}

/// Pull the provider's error message out of a failure body, tolerating the
/// few shapes it uses.
async fn error_detail(response: reqwest::Response) -> String {
    let body: Value = match response.json().await {
        Ok(body) => body,
        Err(_) => return "no error detail".to_string(),
    };

    for key in ["error_description", "msg", "message", "error"] {
        if let Some(detail) = body.get(key).and_then(Value::as_str) {
            return detail.to_string();
        }
    }
    body.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_with_token_file(token_file: Option<PathBuf>) -> HttpIdentityProvider {
        HttpIdentityProvider::new(ProviderConfig {
            base_url: "http://localhost:54321".to_string(),
            anon_key: Secret::new("anon".to_string()),
            service_key: Secret::new("service".to_string()),
            token_file,
        })
    }

    #[tokio::test]
    async fn recover_without_token_file_is_signed_out() {
        let provider = provider_with_token_file(None);
        let recovered = provider.recover().await.unwrap();
        assert!(recovered.is_none());
    }

    #[tokio::test]
    async fn recover_with_blank_persisted_token_is_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session-token");
        tokio::fs::write(&path, "  \n").await.unwrap();

        let provider = provider_with_token_file(Some(path));
        let recovered = provider.recover().await.unwrap();
        assert!(recovered.is_none());
    }

    #[test]
    fn app_metadata_wins_over_user_metadata() {
        let payload = TokenGrantPayload {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_in: Some(3600),
            user: UserPayload {
                id: "uid-1".to_string(),
                email: Some("amina@example.com".to_string()),
                user_metadata: HashMap::from([
                    ("role".to_string(), json!("student")),
                    ("display_name".to_string(), json!("Amina")),
                ]),
                app_metadata: HashMap::from([("role".to_string(), json!("admin"))]),
            },
        };

        let session = HttpIdentityProvider::session_from_payload(payload);
        assert_eq!(session.claims.get("role"), Some(&json!("admin")));
        assert_eq!(session.claims.get("display_name"), Some(&json!("Amina")));
        assert!(session.expires_at.is_some());
    }
}
