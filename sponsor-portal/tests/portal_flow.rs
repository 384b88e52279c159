//! Integration tests for the portal: login/logout flow, role-gated
//! dashboards, the admin API surface, and remote-procedure error passthrough.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use secrecy::Secret;
use serde_json::{json, Value};
use sponsor_auth::provider::MockIdentityProvider;
use sponsor_portal::config::{
    IdentitySettings, PlatformSettings, RateLimitSettings, ServerSettings, Settings,
};
use sponsor_portal::services::rpc::MockSponsorshipRpc;
use sponsor_portal::startup::build_router;
use sponsor_portal::AppState;
use std::sync::Arc;
use tower::util::ServiceExt;

struct TestApp {
    router: Router,
    provider: Arc<MockIdentityProvider>,
    rpc: Arc<MockSponsorshipRpc>,
}

fn test_settings() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        identity: IdentitySettings {
            url: "http://localhost:54321".to_string(),
            anon_key: Secret::new("anon".to_string()),
            service_key: Secret::new("service".to_string()),
            token_file: None,
        },
        platform: PlatformSettings {
            rest_url: "http://localhost:54321/rest/v1".to_string(),
            service_key: Secret::new("service".to_string()),
        },
        rate_limit: RateLimitSettings::default(),
    }
}

fn spawn_app() -> TestApp {
    let provider = Arc::new(
        MockIdentityProvider::new()
            .with_account("student@example.com", "pw", "student")
            .with_account("donor@example.com", "pw", "donor")
            .with_account("vendor@example.com", "pw", "vendor")
            .with_account("admin@example.com", "pw", "admin")
            .with_account("manager@example.com", "pw", "System Manager"),
    );
    let rpc = Arc::new(MockSponsorshipRpc::new());
    let state = AppState::new(test_settings(), provider.clone(), rpc.clone());
    TestApp {
        router: build_router(state),
        provider,
        rpc,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// Log in and return the session cookie for subsequent requests.
async fn login_as(app: &TestApp, email: &str) -> String {
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "email": email, "password": "pw" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK, "login should succeed");
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login response should set a session cookie")
        .to_str()
        .unwrap();
    cookie.split(';').next().unwrap().to_string()
}

async fn get_with_cookie(app: &TestApp, uri: &str, cookie: &str) -> axum::response::Response {
    app.router
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn post_json_with_cookie(
    app: &TestApp,
    uri: &str,
    cookie: &str,
    body: Value,
) -> axum::response::Response {
    app.router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::COOKIE, cookie)
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect should carry a Location header")
        .to_str()
        .unwrap()
}

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unauthenticated_dashboard_visit_redirects_to_login() {
    let app = spawn_app();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/donor/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn login_reports_role_landing_path() {
    let app = spawn_app();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "email": "student@example.com", "password": "pw" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["role"], json!("student"));
    assert_eq!(body["redirect_to"], json!("/student/dashboard"));
}

#[tokio::test]
async fn invalid_credentials_do_not_establish_a_session() {
    let app = spawn_app();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "email": "student@example.com", "password": "wrong" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("Invalid email or password"));
}

#[tokio::test]
async fn student_sees_student_dashboard() {
    let app = spawn_app();
    let cookie = login_as(&app, "student@example.com").await;

    let response = get_with_cookie(&app, "/student/dashboard", &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["role"], json!("student"));
    assert_eq!(body["email"], json!("student@example.com"));
    assert!(body["menu"].as_array().is_some_and(|m| !m.is_empty()));
}

#[tokio::test]
async fn role_mismatch_redirects_to_own_landing_area() {
    let app = spawn_app();
    let cookie = login_as(&app, "student@example.com").await;

    let response = get_with_cookie(&app, "/vendor/dashboard", &cookie).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    // Not the login screen: an authenticated student lands on their own
    // dashboard instead.
    assert_eq!(location(&response), "/student/dashboard");
}

#[tokio::test]
async fn index_redirects_by_role() {
    let app = spawn_app();

    let anonymous = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&anonymous), "/login");

    let cookie = login_as(&app, "donor@example.com").await;
    let donor = get_with_cookie(&app, "/", &cookie).await;
    assert_eq!(donor.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&donor), "/donor/dashboard");
}

#[tokio::test]
async fn logout_clears_the_session_before_redirecting() {
    let app = spawn_app();
    let cookie = login_as(&app, "student@example.com").await;

    let response = post_json_with_cookie(&app, "/logout", &cookie, json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["redirect_to"], json!("/login"));

    // The same cookie no longer grants access to anything.
    let after = get_with_cookie(&app, "/student/dashboard", &cookie).await;
    assert_eq!(after.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&after), "/login");
}

#[tokio::test]
async fn admin_api_rejects_non_admin_with_generic_error() {
    let app = spawn_app();
    let cookie = login_as(&app, "student@example.com").await;

    let response = post_json_with_cookie(
        &app,
        "/api/admin/invite",
        &cookie,
        json!({ "email": "new@example.com", "role": "donor" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    // Generic message only; which role was required is not disclosed.
    assert_eq!(body["error"], json!("unauthorized"));
    assert!(app.provider.invites().is_empty());
}

#[tokio::test]
async fn admin_can_invite_with_role() {
    let app = spawn_app();
    let cookie = login_as(&app, "admin@example.com").await;

    let response = post_json_with_cookie(
        &app,
        "/api/admin/invite",
        &cookie,
        json!({ "email": "new@example.com", "role": "donor" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], json!(true));
    assert_eq!(
        app.provider.invites(),
        vec![("new@example.com".to_string(), "donor".to_string())]
    );
}

#[tokio::test]
async fn alias_role_passes_admin_api_checks() {
    let app = spawn_app();
    let cookie = login_as(&app, "manager@example.com").await;

    let response = post_json_with_cookie(
        &app,
        "/api/admin/reset-password",
        &cookie,
        json!({ "email": "student@example.com" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        app.provider.password_resets(),
        vec!["student@example.com".to_string()]
    );
}

#[tokio::test]
async fn admin_sets_password_via_provider() {
    let app = spawn_app();
    let cookie = login_as(&app, "admin@example.com").await;

    let response = post_json_with_cookie(
        &app,
        "/api/admin/set-password",
        &cookie,
        json!({ "user_id": "uid-student@example.com", "password": "longenough" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        app.provider.password_sets(),
        vec![(
            "uid-student@example.com".to_string(),
            "longenough".to_string()
        )]
    );
}

#[tokio::test]
async fn order_approval_runs_the_remote_procedure() {
    let app = spawn_app();
    let cookie = login_as(&app, "admin@example.com").await;

    let response = post_json_with_cookie(
        &app,
        "/api/orders/approve",
        &cookie,
        json!({ "order_id": "po-7" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let calls = app.rpc.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "approve_purchase_order");
}

#[tokio::test]
async fn remote_procedure_errors_surface_verbatim() {
    let app = spawn_app();
    app.rpc.fail_with("purchase order po-7 is not pending");
    let cookie = login_as(&app, "admin@example.com").await;

    let response = post_json_with_cookie(
        &app,
        "/api/orders/approve",
        &cookie,
        json!({ "order_id": "po-7" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("purchase order po-7 is not pending"));
}

#[tokio::test]
async fn fulfillment_is_vendor_gated() {
    let app = spawn_app();

    let vendor_cookie = login_as(&app, "vendor@example.com").await;
    let response = post_json_with_cookie(
        &app,
        "/api/orders/fulfill",
        &vendor_cookie,
        json!({ "order_id": "po-9" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let donor_cookie = login_as(&app, "donor@example.com").await;
    let response = post_json_with_cookie(
        &app,
        "/api/orders/fulfill",
        &donor_cookie,
        json!({ "order_id": "po-9" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sponsorship_assignment_carries_arguments_through() {
    let app = spawn_app();
    let cookie = login_as(&app, "admin@example.com").await;

    let response = post_json_with_cookie(
        &app,
        "/api/sponsorships/assign",
        &cookie,
        json!({ "student_id": "stu-1", "donor_id": "don-2", "points": 40 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let calls = app.rpc.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "assign_sponsorship");
    assert_eq!(calls[0].1["points"], json!(40));
}

#[tokio::test]
async fn validation_errors_are_reported() {
    let app = spawn_app();
    let cookie = login_as(&app, "admin@example.com").await;

    let response = post_json_with_cookie(
        &app,
        "/api/admin/invite",
        &cookie,
        json!({ "email": "not-an-email", "role": "donor" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
