//! Admin-only identity operations, proxied to the identity platform.
//!
//! The privileged service key stays on this side of the boundary; browsers
//! only ever hold their own session.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use sponsor_auth::NormalizedRole;
use tower_sessions::Session;

use crate::dtos::{InviteRequest, ResetPasswordRequest, SetPasswordRequest};
use crate::middleware::authorize_api;
use crate::utils::ValidatedJson;
use crate::AppState;
use service_core::error::AppError;

/// POST /api/admin/invite — invite a user with a pre-assigned role.
pub async fn invite_user(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(req): ValidatedJson<InviteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let admin = authorize_api(&state, &session, NormalizedRole::Admin).await?;

    state
        .provider
        .invite_user(&req.email, &req.role)
        .await
        .map_err(|e| AppError::BadGateway(e.to_string()))?;

    tracing::info!(invited = %req.email, role = %req.role, by = %admin.user_id, "User invited");
    Ok((StatusCode::OK, Json(serde_json::json!({ "ok": true }))))
}

/// POST /api/admin/reset-password — have the platform deliver a reset email.
pub async fn reset_password(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize_api(&state, &session, NormalizedRole::Admin).await?;

    state
        .provider
        .send_password_reset(&req.email)
        .await
        .map_err(|e| AppError::BadGateway(e.to_string()))?;

    Ok((StatusCode::OK, Json(serde_json::json!({ "ok": true }))))
}

/// POST /api/admin/set-password — set a user's password directly.
pub async fn set_password(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(req): ValidatedJson<SetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let admin = authorize_api(&state, &session, NormalizedRole::Admin).await?;

    state
        .provider
        .set_password(&req.user_id, &req.password)
        .await
        .map_err(|e| AppError::BadGateway(e.to_string()))?;

    tracing::info!(target_user = %req.user_id, by = %admin.user_id, "Password set by admin");
    Ok((StatusCode::OK, Json(serde_json::json!({ "ok": true }))))
}
