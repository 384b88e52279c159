//! The data platform boundary: named remote procedures.
//!
//! Sponsorship assignment and purchase-order transitions live as stored
//! procedures on the platform; this client only carries scalar arguments over
//! and a result payload or error string back. Failures are surfaced verbatim
//! and never retried — the procedures give no idempotency guarantee, so a
//! blind retry could double-apply a transition.

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde_json::{json, Value};
use std::sync::Mutex;
use thiserror::Error;

use crate::config::PlatformSettings;

#[derive(Debug, Error)]
pub enum RpcError {
    /// The procedure ran and reported failure; the message is the platform's,
    /// verbatim.
    #[error("{0}")]
    Remote(String),

    /// The platform could not be reached.
    #[error("platform unreachable: {0}")]
    Transport(String),
}

#[async_trait]
pub trait SponsorshipRpc: Send + Sync {
    async fn assign_sponsorship(
        &self,
        student_id: &str,
        donor_id: &str,
        points: i64,
    ) -> Result<Value, RpcError>;

    async fn approve_purchase_order(&self, order_id: &str) -> Result<Value, RpcError>;

    async fn reject_purchase_order(
        &self,
        order_id: &str,
        reason: Option<&str>,
    ) -> Result<Value, RpcError>;

    async fn fulfill_purchase_order(&self, order_id: &str) -> Result<Value, RpcError>;
}

pub struct PlatformRpcClient {
    client: reqwest::Client,
    rest_url: String,
    service_key: Secret<String>,
}

impl PlatformRpcClient {
    pub fn new(settings: &PlatformSettings) -> Self {
        PlatformRpcClient {
            client: reqwest::Client::new(),
            rest_url: settings.rest_url.clone(),
            service_key: settings.service_key.clone(),
        }
    }

    async fn call(&self, procedure: &str, args: Value) -> Result<Value, RpcError> {
        let url = format!("{}/rpc/{}", self.rest_url, procedure);

        let response = self
            .client
            .post(&url)
            .header("apikey", self.service_key.expose_secret())
            .bearer_auth(self.service_key.expose_secret())
            .json(&args)
            .send()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if status.is_success() {
            return Ok(body);
        }

        let message = ["message", "error", "msg", "hint"]
            .iter()
            .find_map(|key| body.get(key).and_then(Value::as_str))
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("procedure {procedure} failed with {status}"));

        tracing::warn!(procedure, status = %status, "Remote procedure failed");
        Err(RpcError::Remote(message))
    }
}

#[async_trait]
impl SponsorshipRpc for PlatformRpcClient {
    async fn assign_sponsorship(
        &self,
        student_id: &str,
        donor_id: &str,
        points: i64,
    ) -> Result<Value, RpcError> {
        self.call(
            "assign_sponsorship",
            json!({
                "p_student_id": student_id,
                "p_donor_id": donor_id,
                "p_points": points,
            }),
        )
        .await
    }

    async fn approve_purchase_order(&self, order_id: &str) -> Result<Value, RpcError> {
        self.call("approve_purchase_order", json!({ "p_order_id": order_id }))
            .await
    }

    async fn reject_purchase_order(
        &self,
        order_id: &str,
        reason: Option<&str>,
    ) -> Result<Value, RpcError> {
        self.call(
            "reject_purchase_order",
            json!({ "p_order_id": order_id, "p_reason": reason }),
        )
        .await
    }

    async fn fulfill_purchase_order(&self, order_id: &str) -> Result<Value, RpcError> {
        self.call("fulfill_purchase_order", json!({ "p_order_id": order_id }))
            .await
    }
}

/// Recording stand-in for tests. Returns `{"status": "ok"}` unless scripted
/// to fail, in which case the scripted message surfaces verbatim.
#[derive(Default)]
pub struct MockSponsorshipRpc {
    calls: Mutex<Vec<(String, Value)>>,
    fail_message: Mutex<Option<String>>,
}

impl MockSponsorshipRpc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_with(&self, message: &str) {
        *self.fail_message.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, procedure: &str, args: Value) -> Result<Value, RpcError> {
        self.calls
            .lock()
            .unwrap()
            .push((procedure.to_string(), args));
        match self.fail_message.lock().unwrap().clone() {
            Some(message) => Err(RpcError::Remote(message)),
            None => Ok(json!({ "status": "ok" })),
        }
    }
}

#[async_trait]
impl SponsorshipRpc for MockSponsorshipRpc {
    async fn assign_sponsorship(
        &self,
        student_id: &str,
        donor_id: &str,
        points: i64,
    ) -> Result<Value, RpcError> {
        self.record(
            "assign_sponsorship",
            json!({ "student_id": student_id, "donor_id": donor_id, "points": points }),
        )
    }

    async fn approve_purchase_order(&self, order_id: &str) -> Result<Value, RpcError> {
        self.record("approve_purchase_order", json!({ "order_id": order_id }))
    }

    async fn reject_purchase_order(
        &self,
        order_id: &str,
        reason: Option<&str>,
    ) -> Result<Value, RpcError> {
        self.record(
            "reject_purchase_order",
            json!({ "order_id": order_id, "reason": reason }),
        )
    }

    async fn fulfill_purchase_order(&self, order_id: &str) -> Result<Value, RpcError> {
        self.record("fulfill_purchase_order", json!({ "order_id": order_id }))
    }
}
