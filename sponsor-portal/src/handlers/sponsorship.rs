//! Sponsorship assignment, delegated to the platform's stored procedure.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use sponsor_auth::NormalizedRole;
use tower_sessions::Session;

use crate::dtos::AssignSponsorshipRequest;
use crate::handlers::orders::map_rpc_error;
use crate::middleware::authorize_api;
use crate::utils::ValidatedJson;
use crate::AppState;
use service_core::error::AppError;

/// POST /api/sponsorships/assign — allocate a donor's points to a student.
pub async fn assign_sponsorship(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(req): ValidatedJson<AssignSponsorshipRequest>,
) -> Result<impl IntoResponse, AppError> {
    let admin = authorize_api(&state, &session, NormalizedRole::Admin).await?;

    let result = state
        .rpc
        .assign_sponsorship(&req.student_id, &req.donor_id, req.points)
        .await
        .map_err(map_rpc_error)?;

    tracing::info!(
        student_id = %req.student_id,
        donor_id = %req.donor_id,
        points = req.points,
        by = %admin.user_id,
        "Sponsorship assigned"
    );
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "ok": true, "result": result })),
    ))
}
