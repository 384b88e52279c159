use axum::{
    extract::State,
    response::{IntoResponse, Redirect},
    Json,
};
use tower_sessions::Session;

use crate::middleware::load_snapshot;
use crate::AppState;

/// Index: send the visitor to their role's landing path (login when signed
/// out). Same mapping the guard uses, so the two can never disagree.
pub async fn index(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let snapshot = load_snapshot(&state.resolver, &session).await;
    Redirect::to(state.nav.landing_path(snapshot.role))
}

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "sponsor-portal",
    }))
}
