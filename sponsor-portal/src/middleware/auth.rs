//! Per-request access guarding.
//!
//! The browser session cookie carries the kernel session; each protected
//! route declares a [`RouteRequirement`] and this middleware replays the
//! kernel's pure guard decision against it. A failed screen check is answered
//! with a redirect and nothing else — which role was missing is never
//! disclosed. The JSON API uses [`authorize_api`] instead, answering a
//! generic 401.

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use sponsor_auth::{decide, NormalizedRole, RoleResolver, SessionSnapshot, LOGIN_PATH};
use sponsor_auth::{RouteRequirement, Session as AuthSession};
use tower_sessions::Session;

use crate::AppState;
use service_core::error::AppError;

/// Key the kernel session is stored under in the browser session.
pub const SESSION_KEY: &str = "auth.session";

/// Rebuild the kernel's snapshot from the browser session. The cookie lookup
/// resolves synchronously, so a request-scoped snapshot is always `resolved`;
/// the hydrating phase only exists for the in-process store.
pub async fn load_snapshot(resolver: &RoleResolver, session: &Session) -> SessionSnapshot {
    let stored: Option<AuthSession> = session.get(SESSION_KEY).await.unwrap_or(None);
    let role = stored
        .as_ref()
        .map(|s| resolver.normalize(s))
        .unwrap_or(NormalizedRole::None);
    SessionSnapshot {
        resolved: true,
        session: stored,
        role,
    }
}

/// Route-level guard for the dashboard screens.
pub async fn guard_middleware(
    State((state, requirement)): State<(AppState, RouteRequirement)>,
    session: Session,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let snapshot = load_snapshot(&state.resolver, &session).await;
    let decision = decide(&state.resolver, &state.nav, &snapshot, &requirement);

    if decision.allow {
        Ok(next.run(request).await)
    } else {
        let target = decision.redirect_to.unwrap_or_else(|| LOGIN_PATH.to_string());
        Ok(Redirect::to(&target).into_response())
    }
}

/// Role check for the JSON API. Succeeds with the caller's session; fails
/// with a generic 401 that does not name the missing role.
pub async fn authorize_api(
    state: &AppState,
    session: &Session,
    required: NormalizedRole,
) -> Result<AuthSession, AppError> {
    let snapshot = load_snapshot(&state.resolver, session).await;
    let authenticated = snapshot
        .session
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("unauthorized")))?;

    if state.resolver.satisfies_any(&authenticated, &[required]) {
        Ok(authenticated)
    } else {
        tracing::warn!(user_id = %authenticated.user_id, "API role check failed");
        Err(AppError::Unauthorized(anyhow::anyhow!("unauthorized")))
    }
}
