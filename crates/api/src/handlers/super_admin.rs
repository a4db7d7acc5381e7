//! Super-admin session and impersonation endpoints.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use db::DbError;
use ontology::models::{Organization, ResourceKind};
use ontology::list_typed;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::token::{IMPERSONATION_COOKIE, SUPER_ADMIN_COOKIE};
use crate::error::ApiError;
use crate::identity::{client_ip, SuperAdmin};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SuperAdminView {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub impersonating: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImpersonateRequest {
    pub organization_id: String,
}

#[derive(Debug, Serialize)]
pub struct ImpersonationView {
    pub organization_id: String,
    pub expires_in_secs: u64,
}

/// `POST /api/v1/super-admin/login`
///
/// Blocked IPs are rejected before the password is looked at.  Unknown
/// email and wrong password produce the same response and both cost one
/// bcrypt check.
pub async fn login(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SuperAdminView>), ApiError> {
    let peer = connect_info.map(|ConnectInfo(addr)| addr);
    let ip = client_ip(&headers, peer, &state.config.trusted_proxies);
    state
        .limiter
        .check(ip)
        .map_err(|retry| ApiError::TooManyAttempts { retry_after_secs: retry.as_secs().max(1) })?;

    let found = state.admins.find_by_email(&req.email).await?;
    let stored = found.as_ref().map(|admin| admin.password_hash.as_str());
    let matched = state.passwords.verify(&req.password, stored).await?;
    let verified = found.filter(|_| matched);

    let Some(admin) = verified else {
        state.limiter.record_failure(ip);
        warn!(%ip, "super admin login failed");
        return Err(ApiError::InvalidCredentials);
    };

    state.limiter.reset(ip);
    state.admins.touch_last_login(admin.id).await?;
    let token = state.tokens.issue_session(admin.id, &admin.email)?;
    info!(admin = %admin.id, "super admin logged in");

    let jar = jar.add(auth_cookie(SUPER_ADMIN_COOKIE, token, state.config.secure_cookies));
    Ok((
        jar,
        Json(SuperAdminView {
            id: admin.id,
            email: admin.email,
            display_name: admin.display_name,
            last_login_at: Some(Utc::now()),
            impersonating: None,
        }),
    ))
}

/// `POST /api/v1/super-admin/logout`: clears both cookies; always succeeds.
pub async fn logout(
    State(state): State<AppState>,
    admin: Option<SuperAdmin>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), ApiError> {
    if let Some(admin) = admin {
        if admin.impersonating.is_some() {
            state.admins.impersonation_ended(admin.id).await?;
        }
        info!(admin = %admin.id, "super admin logged out");
    }

    let jar = jar
        .remove(Cookie::build(SUPER_ADMIN_COOKIE).path("/"))
        .remove(Cookie::build(IMPERSONATION_COOKIE).path("/"));
    Ok((jar, StatusCode::NO_CONTENT))
}

/// `GET /api/v1/super-admin/me`
pub async fn me(State(state): State<AppState>, admin: SuperAdmin) -> Result<Json<SuperAdminView>, ApiError> {
    // Deleted accounts lose their session even if the cookie is still valid.
    let row = state.admins.get(admin.id).await.map_err(|err| match err {
        DbError::NotFound => ApiError::Unauthorized,
        other => ApiError::Db(other),
    })?;

    Ok(Json(SuperAdminView {
        id: row.id,
        email: row.email,
        display_name: row.display_name,
        last_login_at: row.last_login_at,
        impersonating: admin.impersonating,
    }))
}

/// `POST /api/v1/super-admin/impersonate`
pub async fn start_impersonation(
    State(state): State<AppState>,
    admin: SuperAdmin,
    jar: CookieJar,
    Json(req): Json<ImpersonateRequest>,
) -> Result<(CookieJar, Json<ImpersonationView>), ApiError> {
    let organization_id = req.organization_id.trim();
    if organization_id.is_empty() {
        return Err(ApiError::BadRequest("organization_id is required".into()));
    }

    let organizations: Vec<Organization> =
        list_typed(state.service_api().as_ref(), ResourceKind::Organizations).await?;
    if !organizations.iter().any(|org| org.id == organization_id) {
        return Err(ApiError::NotFound(format!("organization {organization_id}")));
    }

    if admin.impersonating.is_some() {
        state.admins.impersonation_ended(admin.id).await?;
    }
    state.admins.impersonation_started(admin.id, organization_id).await?;

    let token = state.tokens.issue_impersonation(admin.id, organization_id)?;
    info!(admin = %admin.id, organization = organization_id, "impersonation started");

    let jar = jar.add(auth_cookie(IMPERSONATION_COOKIE, token, state.config.secure_cookies));
    Ok((
        jar,
        Json(ImpersonationView {
            organization_id: organization_id.to_string(),
            expires_in_secs: state.tokens.impersonation_ttl().as_secs(),
        }),
    ))
}

/// `DELETE /api/v1/super-admin/impersonate`
pub async fn stop_impersonation(
    State(state): State<AppState>,
    admin: SuperAdmin,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), ApiError> {
    state.admins.impersonation_ended(admin.id).await?;
    info!(admin = %admin.id, "impersonation ended");
    Ok((jar.remove(Cookie::build(IMPERSONATION_COOKIE).path("/")), StatusCode::NO_CONTENT))
}

fn auth_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .build()
}
