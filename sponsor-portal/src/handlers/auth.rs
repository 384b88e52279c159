//! Login and logout for the browser session.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use sponsor_auth::{AuthError, Session as AuthSession, LOGIN_PATH};
use std::sync::Arc;
use tower_sessions::Session;

use crate::dtos::LoginRequest;
use crate::middleware::SESSION_KEY;
use crate::utils::ValidatedJson;
use crate::AppState;
use service_core::error::AppError;

/// Exchange credentials with the identity platform and establish the browser
/// session. The response carries the role's landing path from the navigation
/// map — the same mapping the guard redirects with.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let provider_session = state
        .provider
        .sign_in(&req.email, &req.password)
        .await
        .map_err(|err| map_auth_error(AuthError::from(err)))?;

    let auth_session = AuthSession::from_provider(provider_session);
    let role = state.resolver.normalize(&auth_session);

    session
        .insert(SESSION_KEY, &auth_session)
        .await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Session store error: {e}")))?;

    tracing::info!(user_id = %auth_session.user_id, role = %role, "User logged in");

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "ok": true,
            "role": role,
            "redirect_to": state.nav.landing_path(role),
        })),
    ))
}

/// Local-first logout: the browser session is cleared before anything else;
/// remote revocation runs detached and only gets logged on failure.
pub async fn logout(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let stored: Option<AuthSession> = session.get(SESSION_KEY).await.unwrap_or(None);
    session.clear().await;

    if let Some(auth_session) = stored {
        let provider = Arc::clone(&state.provider);
        tokio::spawn(async move {
            if let Err(err) = provider
                .sign_out(&auth_session.tokens.access_token)
                .await
            {
                tracing::warn!(error = %err, "Remote revocation failed after local logout");
            }
        });
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "ok": true,
            "redirect_to": LOGIN_PATH,
        })),
    )
}

/// Login failures keep their classification but share the portal's error
/// envelope. Credentials problems stay a 401 with a user-facing message;
/// transport problems surface as an upstream failure.
fn map_auth_error(err: AuthError) -> AppError {
    match err {
        AuthError::InvalidCredentials => {
            AppError::AuthError(anyhow::anyhow!("Invalid email or password"))
        }
        AuthError::NetworkFailure(msg) => AppError::BadGateway(msg),
        AuthError::SessionExpired => {
            AppError::AuthError(anyhow::anyhow!("Session expired, please log in again"))
        }
        AuthError::Unauthorized => AppError::Unauthorized(anyhow::anyhow!("unauthorized")),
        AuthError::Unknown(msg) => AppError::InternalError(anyhow::anyhow!(msg)),
    }
}
