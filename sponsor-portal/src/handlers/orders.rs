//! Purchase-order transitions, delegated to the platform's stored
//! procedures. Approval and rejection are admin actions; fulfillment belongs
//! to the vendor. Remote failures surface their message verbatim and are not
//! retried.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use sponsor_auth::NormalizedRole;
use tower_sessions::Session;

use crate::dtos::OrderActionRequest;
use crate::middleware::authorize_api;
use crate::services::rpc::RpcError;
use crate::utils::ValidatedJson;
use crate::AppState;
use service_core::error::AppError;

/// POST /api/orders/approve
pub async fn approve_order(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(req): ValidatedJson<OrderActionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let admin = authorize_api(&state, &session, NormalizedRole::Admin).await?;

    let result = state
        .rpc
        .approve_purchase_order(&req.order_id)
        .await
        .map_err(map_rpc_error)?;

    tracing::info!(order_id = %req.order_id, by = %admin.user_id, "Purchase order approved");
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "ok": true, "result": result })),
    ))
}

/// POST /api/orders/reject
pub async fn reject_order(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(req): ValidatedJson<OrderActionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let admin = authorize_api(&state, &session, NormalizedRole::Admin).await?;

    let result = state
        .rpc
        .reject_purchase_order(&req.order_id, req.reason.as_deref())
        .await
        .map_err(map_rpc_error)?;

    tracing::info!(order_id = %req.order_id, by = %admin.user_id, "Purchase order rejected");
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "ok": true, "result": result })),
    ))
}

/// POST /api/orders/fulfill
pub async fn fulfill_order(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(req): ValidatedJson<OrderActionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let vendor = authorize_api(&state, &session, NormalizedRole::Vendor).await?;

    let result = state
        .rpc
        .fulfill_purchase_order(&req.order_id)
        .await
        .map_err(map_rpc_error)?;

    tracing::info!(order_id = %req.order_id, by = %vendor.user_id, "Purchase order fulfilled");
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "ok": true, "result": result })),
    ))
}

pub(crate) fn map_rpc_error(err: RpcError) -> AppError {
    match err {
        RpcError::Remote(message) => AppError::BadRequest(anyhow::anyhow!(message)),
        RpcError::Transport(message) => AppError::BadGateway(message),
    }
}
