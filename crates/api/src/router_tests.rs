//! End-to-end tests of the HTTP surface.
//!
//! Requests go through the real router with `tower::ServiceExt::oneshot`;
//! the backend is a `MockOntology` and accounts live in a `MemoryAdminStore`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use ontology::mock::{MockCall, MockOntology};
use ontology::models::ResourceKind;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::token::{IMPERSONATION_COOKIE, SUPER_ADMIN_COOKIE};
use crate::auth::MemoryAdminStore;
use crate::{build_router, AppConfig, AppState, OidcConfig};

const SECRET: &str = "router-test-secret";
const OIDC_SECRET: &str = "oidc-test-secret";
const EMAIL: &str = "root@example.com";
const PASSWORD: &str = "correct horse battery";

struct Harness {
    app: Router,
    state: AppState,
    backend: MockOntology,
    admins: Arc<MemoryAdminStore>,
    admin_id: Uuid,
}

fn harness() -> Harness {
    harness_with(|_| {})
}

fn harness_with(configure: impl FnOnce(&mut AppConfig)) -> Harness {
    let backend = MockOntology::new()
        .with_entities(ResourceKind::Organizations, vec![json!({ "id": "org-1", "name": "Acme" })])
        .with_entities(
            ResourceKind::Integrations,
            vec![json!({ "id": "wa", "name": "WhatsApp", "channel": "whatsapp", "is_active": true })],
        )
        .with_entities(ResourceKind::Agents, vec![json!({ "id": "u1", "name": "Ana" })])
        .with_entities(ResourceKind::Queues, vec![json!({ "id": "vip", "name": "VIP" })]);

    let admins = Arc::new(MemoryAdminStore::new());
    let hash = bcrypt::hash(PASSWORD, 4).unwrap();
    let admin = admins.insert(EMAIL, &hash);

    let mut config = AppConfig {
        super_admin_jwt_secret: SECRET.into(),
        bcrypt_cost: 4,
        secure_cookies: false,
        login_max_attempts: 3,
        oidc: OidcConfig { hs256_secret: Some(OIDC_SECRET.into()), ..OidcConfig::default() },
        ontology_service_token: Some("service-token".into()),
        ..AppConfig::default()
    };
    configure(&mut config);
    let state = AppState::new(config, admins.clone(), Arc::new(backend.clone())).unwrap();

    Harness { app: build_router(state.clone()), state, backend, admins, admin_id: admin.id }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, headers, body)
}

fn json_body(builder: axum::http::request::Builder, body: Value) -> Request<Body> {
    builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty(builder: axum::http::request::Builder) -> Request<Body> {
    builder.body(Body::empty()).unwrap()
}

/// `name=value` of a cookie set by the response.
fn set_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{name}=")))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

fn user_token(org_id: Option<&str>) -> String {
    let claims = json!({
        "sub": "user-1",
        "email": "ana@acme.test",
        "exp": Utc::now().timestamp() + 3600,
        "org_id": org_id,
    });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(OIDC_SECRET.as_bytes())).unwrap()
}

fn as_user(builder: axum::http::request::Builder, tenant: Option<&str>) -> axum::http::request::Builder {
    let builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", user_token(None)));
    match tenant {
        Some(tenant) => builder.header("X-Tenant-ID", tenant),
        None => builder,
    }
}

async fn login(h: &Harness, ip: &str, email: &str, password: &str) -> (StatusCode, HeaderMap, Value) {
    login_via(h, ip, None, email, password).await
}

/// Login from socket peer `peer`, optionally with an `X-Forwarded-For` header.
async fn login_via(
    h: &Harness,
    peer: &str,
    forwarded_for: Option<&str>,
    email: &str,
    password: &str,
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::post("/api/v1/super-admin/login");
    if let Some(chain) = forwarded_for {
        builder = builder.header("x-forwarded-for", chain);
    }
    let mut req = json_body(builder, json!({ "email": email, "password": password }));
    let addr: SocketAddr = format!("{peer}:40000").parse().unwrap();
    req.extensions_mut().insert(ConnectInfo(addr));
    send(&h.app, req).await
}

async fn admin_cookie(h: &Harness) -> String {
    let (status, headers, _) = login(h, "198.51.100.1", EMAIL, PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    set_cookie(&headers, SUPER_ADMIN_COOKIE).expect("session cookie")
}

// ============================================================
// Liveness
// ============================================================

#[tokio::test]
async fn liveness_needs_no_auth() {
    let h = harness();
    let (status, _, body) = send(&h.app, empty(Request::get("/health"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

// ============================================================
// Super admin session
// ============================================================

#[tokio::test]
async fn login_sets_http_only_cookie_and_me_reads_it() {
    let h = harness();
    let (status, headers, body) = login(&h, "198.51.100.1", "ROOT@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], EMAIL);

    let raw = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(raw.contains("HttpOnly"));
    assert!(raw.contains("SameSite=Strict"));

    let cookie = set_cookie(&headers, SUPER_ADMIN_COOKIE).unwrap();
    let (status, _, body) = send(
        &h.app,
        empty(Request::get("/api/v1/super-admin/me").header(header::COOKIE, cookie)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], h.admin_id.to_string());
    assert!(body["last_login_at"].is_string());
    assert!(body["impersonating"].is_null());
}

#[tokio::test]
async fn me_without_cookie_is_unauthorized() {
    let h = harness();
    let (status, _, body) = send(&h.app, empty(Request::get("/api/v1/super-admin/me"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication required");

    let forged = format!("{SUPER_ADMIN_COOKIE}=not-a-token");
    let (status, _, _) = send(
        &h.app,
        empty(Request::get("/api/v1/super-admin/me").header(header::COOKIE, forged)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_email_and_wrong_password_look_the_same() {
    let h = harness();
    let wrong_password = login(&h, "198.51.100.2", EMAIL, "nope").await;
    let wrong_email = login(&h, "198.51.100.3", "ghost@example.com", PASSWORD).await;

    assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.0, wrong_email.0);
    assert_eq!(wrong_password.2, wrong_email.2);
    assert_eq!(wrong_password.2, json!({ "error": "invalid credentials" }));
    assert!(set_cookie(&wrong_password.1, SUPER_ADMIN_COOKIE).is_none());
}

#[tokio::test]
async fn unknown_email_pays_for_a_password_check_too() {
    let h = harness();
    assert_eq!(h.state.passwords.checks(), 0);

    login(&h, "198.51.100.2", "ghost@example.com", PASSWORD).await;
    assert_eq!(h.state.passwords.checks(), 1);

    login(&h, "198.51.100.2", EMAIL, "nope").await;
    assert_eq!(h.state.passwords.checks(), 2);
}

#[tokio::test]
async fn repeated_failures_lock_out_the_ip_only() {
    let h = harness();
    for _ in 0..3 {
        let (status, _, _) = login(&h, "203.0.113.9", EMAIL, "bad").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    // Even the right password is refused while the IP is blocked.
    let (status, headers, _) = login(&h, "203.0.113.9", EMAIL, PASSWORD).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(headers.contains_key(header::RETRY_AFTER));

    let (status, _, _) = login(&h, "203.0.113.10", EMAIL, PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn rotating_forwarded_for_does_not_dodge_the_lockout() {
    let h = harness();
    for n in 0..3 {
        let spoofed = format!("192.0.2.{n}");
        let (status, _, _) = login_via(&h, "203.0.113.9", Some(&spoofed), EMAIL, "bad").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, _, _) = login_via(&h, "203.0.113.9", Some("192.0.2.200"), EMAIL, PASSWORD).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn trusted_proxy_is_keyed_on_the_address_it_saw() {
    let h = harness_with(|config| config.trusted_proxies = vec!["10.0.0.1".parse().unwrap()]);
    for n in 0..3 {
        // Clients can prepend anything; the proxy appends the real peer.
        let chain = format!("192.0.2.{n}, 198.51.100.7");
        let (status, _, _) = login_via(&h, "10.0.0.1", Some(&chain), EMAIL, "bad").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, _, _) = login_via(&h, "10.0.0.1", Some("198.51.100.7"), EMAIL, PASSWORD).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let (status, _, _) = login_via(&h, "10.0.0.1", Some("198.51.100.8"), EMAIL, PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn logout_clears_the_session_cookie() {
    let h = harness();
    let cookie = admin_cookie(&h).await;
    let (status, headers, _) = send(
        &h.app,
        empty(Request::post("/api/v1/super-admin/logout").header(header::COOKIE, cookie)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(set_cookie(&headers, SUPER_ADMIN_COOKIE).as_deref(), Some("super_admin_token="));
}

// ============================================================
// Impersonation
// ============================================================

#[tokio::test]
async fn impersonation_scopes_tenant_routes_to_the_organization() {
    let h = harness();
    let session = admin_cookie(&h).await;

    // Without impersonation a super admin has no tenant.
    let (status, _, _) = send(
        &h.app,
        empty(Request::get("/api/v1/routing/rules").header(header::COOKIE, session.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, headers, body) = send(
        &h.app,
        json_body(
            Request::post("/api/v1/super-admin/impersonate").header(header::COOKIE, session.clone()),
            json!({ "organization_id": "org-1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["organization_id"], "org-1");
    assert_eq!(h.admins.open_impersonations(h.admin_id), vec!["org-1".to_string()]);

    let impersonation = set_cookie(&headers, IMPERSONATION_COOKIE).unwrap();
    let both = format!("{session}; {impersonation}");

    let (status, _, _) = send(
        &h.app,
        empty(Request::get("/api/v1/routing/rules").header(header::COOKIE, both.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let scope = h.backend.scopes().pop().unwrap();
    assert_eq!(scope.tenant_id.as_deref(), Some("org-1"));
    assert_eq!(scope.bearer.as_deref(), Some("service-token"));

    let (_, _, me) = send(
        &h.app,
        empty(Request::get("/api/v1/super-admin/me").header(header::COOKIE, both.clone())),
    )
    .await;
    assert_eq!(me["impersonating"], "org-1");

    let (status, _, _) = send(
        &h.app,
        empty(Request::delete("/api/v1/super-admin/impersonate").header(header::COOKIE, both)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(h.admins.open_impersonations(h.admin_id).is_empty());
}

#[tokio::test]
async fn deleted_admin_loses_tenant_access() {
    let h = harness();
    let session = admin_cookie(&h).await;
    let (_, headers, _) = send(
        &h.app,
        json_body(
            Request::post("/api/v1/super-admin/impersonate").header(header::COOKIE, session.clone()),
            json!({ "organization_id": "org-1" }),
        ),
    )
    .await;
    let impersonation = set_cookie(&headers, IMPERSONATION_COOKIE).unwrap();
    let both = format!("{session}; {impersonation}");

    assert!(h.admins.remove(h.admin_id));

    let (status, _, _) = send(
        &h.app,
        empty(Request::get("/api/v1/routing/rules").header(header::COOKIE, both.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(h.backend.count(|c| matches!(c, MockCall::ListRoutingRules)), 0);

    let (status, _, _) = send(
        &h.app,
        empty(Request::get("/api/v1/super-admin/me").header(header::COOKIE, both)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn impersonating_an_unknown_organization_is_not_found() {
    let h = harness();
    let session = admin_cookie(&h).await;
    let (status, headers, _) = send(
        &h.app,
        json_body(
            Request::post("/api/v1/super-admin/impersonate").header(header::COOKIE, session),
            json!({ "organization_id": "org-404" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(set_cookie(&headers, IMPERSONATION_COOKIE).is_none());
    assert!(h.admins.open_impersonations(h.admin_id).is_empty());
}

// ============================================================
// Tenant access
// ============================================================

#[tokio::test]
async fn tenant_routes_require_a_session_and_a_tenant() {
    let h = harness();
    let (status, _, _) = send(&h.app, empty(Request::get("/api/v1/routing/rules"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, body) = send(&h.app, empty(as_user(Request::get("/api/v1/routing/rules"), None))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("tenant"));

    let (status, _, _) =
        send(&h.app, empty(as_user(Request::get("/api/v1/routing/rules"), Some("org-1")))).await;
    assert_eq!(status, StatusCode::OK);

    let scope = h.backend.scopes().pop().unwrap();
    assert_eq!(scope.tenant_id.as_deref(), Some("org-1"));
    // The caller's own token is forwarded, not the service token.
    assert_eq!(scope.bearer.unwrap().split('.').count(), 3);
}

#[tokio::test]
async fn tenant_can_come_from_the_session_claims() {
    let h = harness();
    let req = Request::get("/api/v1/routing/rules")
        .header(header::AUTHORIZATION, format!("Bearer {}", user_token(Some("org-1"))));
    let (status, _, _) = send(&h.app, empty(req)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.backend.scopes().pop().unwrap().tenant_id.as_deref(), Some("org-1"));
}

#[tokio::test]
async fn tenant_header_cannot_override_the_session_organization() {
    let h = harness();
    let bound = |tenant: &str| {
        Request::get("/api/v1/routing/rules")
            .header(header::AUTHORIZATION, format!("Bearer {}", user_token(Some("org-1"))))
            .header("x-tenant-id", tenant)
    };

    let (status, _, body) = send(&h.app, empty(bound("org-2"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("org-2"));
    assert!(h.backend.scopes().iter().all(|scope| scope.tenant_id.is_none()));
    assert_eq!(h.backend.count(|c| matches!(c, MockCall::ListRoutingRules)), 0);

    let (status, _, _) = send(&h.app, empty(bound("org-1"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.backend.scopes().pop().unwrap().tenant_id.as_deref(), Some("org-1"));
}

#[tokio::test]
async fn resources_check_kind_and_tenant() {
    let h = harness();

    let (status, _, body) =
        send(&h.app, empty(as_user(Request::get("/api/v1/resources/organizations"), None))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], "org-1");

    let (status, _, _) =
        send(&h.app, empty(as_user(Request::get("/api/v1/resources/departments"), None))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) =
        send(&h.app, empty(as_user(Request::get("/api/v1/resources/widgets"), Some("org-1")))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("widgets"));

    let (status, _, _) = send(
        &h.app,
        json_body(as_user(Request::post("/api/v1/resources/departments"), Some("org-1")), json!([1, 2])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(
        &h.app,
        json_body(
            as_user(Request::post("/api/v1/resources/departments"), Some("org-1")),
            json!({ "name": "Support" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

// ============================================================
// Routing
// ============================================================

#[tokio::test]
async fn illegal_connection_is_rejected_before_the_backend() {
    let h = harness();
    let (status, _, body) = send(
        &h.app,
        json_body(
            as_user(Request::post("/api/v1/routing/connections"), Some("org-1")),
            json!({ "source": "agent_u1", "target": "integration_wa" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("integration"));
    assert_eq!(h.backend.count(|c| matches!(c, MockCall::CreateRoutingRule(_))), 0);
}

#[tokio::test]
async fn legal_connection_creates_a_rule() {
    let h = harness();
    let (status, _, body) = send(
        &h.app,
        json_body(
            as_user(Request::post("/api/v1/routing/connections"), Some("org-1")),
            json!({ "source": "integration_wa", "target": "queue_vip", "priority": 5 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["source_type"], "integration");
    assert_eq!(body["destination_id"], "vip");
    assert_eq!(body["priority"], 5);
    assert_eq!(h.backend.rules().len(), 1);
}

#[tokio::test]
async fn validate_reports_allowed_destinations() {
    let h = harness();
    let (status, _, body) = send(
        &h.app,
        json_body(
            as_user(Request::post("/api/v1/routing/validate"), None),
            json!({ "source": "integration_wa", "target": "agent_u1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
    assert_eq!(body["allowed_destinations"], json!(["ai_agent", "department", "queue"]));
    assert_eq!(h.backend.count(|c| matches!(c, MockCall::CreateRoutingRule(_))), 0);
}

#[tokio::test]
async fn canvas_save_sends_the_legacy_node_without_id() {
    let h = harness();
    let (status, _, _) = send(
        &h.app,
        json_body(
            as_user(Request::put("/api/v1/routing/canvas"), Some("org-1")),
            json!({ "nodes": [
                { "id": "ai_agent", "position": { "x": 1.0, "y": 2.0 } },
                { "id": "queue_vip_2", "position": { "x": 3.0, "y": 4.0 } },
            ]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let saved = h.backend.saved_layouts().pop().unwrap();
    assert_eq!(saved[0].node_type, "ai_agent");
    assert_eq!(saved[0].node_id, None);
    assert_eq!(saved[1].node_id.as_deref(), Some("vip_2"));

    let (status, _, _) = send(
        &h.app,
        json_body(
            as_user(Request::put("/api/v1/routing/canvas"), Some("org-1")),
            json!({ "nodes": [{ "id": "robot_1", "position": { "x": 0.0, "y": 0.0 } }] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn canvas_lists_nodes_and_edges() {
    let h = harness();
    let (status, _, body) =
        send(&h.app, empty(as_user(Request::get("/api/v1/routing/canvas"), Some("org-1")))).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|n| n["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["integration_wa", "queue_vip", "agent_u1"]);
    assert_eq!(body["edges"], json!([]));
}

// ============================================================
// Integrations
// ============================================================

#[tokio::test]
async fn disabling_a_used_integration_needs_confirmation() {
    let h = harness();
    h.backend.clone().with_impact("wa", 2);

    let (status, _, body) = send(
        &h.app,
        empty(as_user(Request::post("/api/v1/integrations/wa/disable"), Some("org-1"))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "outcome": "needs_confirmation", "affected_rules": 2 }));
    assert_eq!(h.backend.count(|c| matches!(c, MockCall::SetIntegrationActive(..))), 0);

    let (status, _, body) = send(
        &h.app,
        json_body(
            as_user(Request::post("/api/v1/integrations/wa/disable"), Some("org-1")),
            json!({ "confirm": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "disabled");
    assert_eq!(body["integration"]["is_active"], false);
}

#[tokio::test]
async fn malformed_disable_body_is_rejected() {
    let h = harness();
    let (status, _, body) = send(
        &h.app,
        json_body(
            as_user(Request::post("/api/v1/integrations/wa/disable"), Some("org-1")),
            json!({ "confirm": "yes" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("invalid disable request"));
    assert_eq!(
        h.backend.count(|c| matches!(c, MockCall::RoutingImpact(_) | MockCall::SetIntegrationActive(..))),
        0
    );
}

#[tokio::test]
async fn unused_integration_is_disabled_at_once() {
    let h = harness();
    let (status, _, body) = send(
        &h.app,
        empty(as_user(Request::post("/api/v1/integrations/wa/disable"), Some("org-1"))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "disabled");

    let (status, _, body) = send(
        &h.app,
        empty(as_user(Request::post("/api/v1/integrations/wa/enable"), Some("org-1"))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], true);
}

// ============================================================
// Preferences
// ============================================================

#[tokio::test]
async fn preferences_validate_before_saving() {
    let h = harness();
    let (status, _, _) = send(
        &h.app,
        json_body(
            as_user(Request::put("/api/v1/ai-config"), Some("org-1")),
            json!({ "confidence_threshold": 1.5 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(
        &h.app,
        json_body(
            as_user(Request::put("/api/v1/ai-delegations"), Some("org-1")),
            json!({ "delegations": { "bot": ["bot"] } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(h.backend.count(|c| matches!(c, MockCall::PutDelegationMatrix(_))), 0);

    let (status, _, body) = send(
        &h.app,
        json_body(
            as_user(Request::put("/api/v1/preferences/active-organization"), None),
            json!({ "organization_id": "org-1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["organization_id"], "org-1");
}
