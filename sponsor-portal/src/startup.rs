use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    rate_limit::ip_rate_limit_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use sponsor_auth::{NormalizedRole, RouteRequirement};
use time::Duration;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::handlers::{
    admin::{invite_user, reset_password, set_password},
    app::{health_check, index},
    auth::{login, logout},
    dashboard::{admin_dashboard, donor_dashboard, student_dashboard, vendor_dashboard},
    orders::{approve_order, fulfill_order, reject_order},
    sponsorship::assign_sponsorship,
};
use crate::middleware::guard_middleware;
use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    // Browser session setup
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false) // Set to true in production with HTTPS
        .with_expiry(Expiry::OnInactivity(Duration::hours(24)));

    // Login carries the only credential-guessing surface; rate limit it by IP.
    let login_limiter = state.login_rate_limiter.clone();
    let login_route = Router::new()
        .route("/login", post(login))
        .layer(from_fn_with_state(login_limiter, ip_rate_limit_middleware));

    let guard = |role: NormalizedRole| {
        from_fn_with_state(
            (state.clone(), RouteRequirement::role(role)),
            guard_middleware,
        )
    };

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .merge(login_route)
        .route("/logout", post(logout))
        // Role dashboards; the guard decides allow/redirect per request.
        .route(
            "/student/dashboard",
            get(student_dashboard).layer(guard(NormalizedRole::Student)),
        )
        .route(
            "/donor/dashboard",
            get(donor_dashboard).layer(guard(NormalizedRole::Donor)),
        )
        .route(
            "/vendor/dashboard",
            get(vendor_dashboard).layer(guard(NormalizedRole::Vendor)),
        )
        .route(
            "/admin/dashboard",
            get(admin_dashboard).layer(guard(NormalizedRole::Admin)),
        )
        // Admin identity operations (role checked in-handler, generic 401)
        .route("/api/admin/invite", post(invite_user))
        .route("/api/admin/reset-password", post(reset_password))
        .route("/api/admin/set-password", post(set_password))
        // Purchase-order transitions and sponsorship assignment
        .route("/api/orders/approve", post(approve_order))
        .route("/api/orders/reject", post(reject_order))
        .route("/api/orders/fulfill", post(fulfill_order))
        .route("/api/sponsorships/assign", post(assign_sponsorship))
        .with_state(state.clone())
        .layer(session_layer)
        // Add tracing layer
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        // Add security headers middleware
        .layer(from_fn(security_headers_middleware))
}
