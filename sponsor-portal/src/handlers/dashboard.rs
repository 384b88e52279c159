//! Role dashboards.
//!
//! The guard middleware has already admitted the session by the time these
//! run; each handler just assembles the role's view model. Menus come from
//! the navigation map and the *current* snapshot, never from cached state.

use axum::{extract::State, response::IntoResponse, Json};
use sponsor_auth::NormalizedRole;
use tower_sessions::Session;

use crate::middleware::load_snapshot;
use crate::AppState;

async fn dashboard_payload(
    state: &AppState,
    session: &Session,
    role: NormalizedRole,
) -> serde_json::Value {
    let snapshot = load_snapshot(&state.resolver, session).await;
    let email = snapshot
        .session
        .as_ref()
        .and_then(|s| s.email.clone());

    serde_json::json!({
        "role": role,
        "email": email,
        "menu": state.nav.menu_entries(role),
        "landing": state.nav.landing_path(role),
    })
}

pub async fn student_dashboard(
    State(state): State<AppState>,
    session: Session,
) -> impl IntoResponse {
    Json(dashboard_payload(&state, &session, NormalizedRole::Student).await)
}

pub async fn donor_dashboard(
    State(state): State<AppState>,
    session: Session,
) -> impl IntoResponse {
    Json(dashboard_payload(&state, &session, NormalizedRole::Donor).await)
}

pub async fn vendor_dashboard(
    State(state): State<AppState>,
    session: Session,
) -> impl IntoResponse {
    Json(dashboard_payload(&state, &session, NormalizedRole::Vendor).await)
}

pub async fn admin_dashboard(
    State(state): State<AppState>,
    session: Session,
) -> impl IntoResponse {
    Json(dashboard_payload(&state, &session, NormalizedRole::Admin).await)
}
