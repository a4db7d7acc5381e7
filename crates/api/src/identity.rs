//! Who is calling: request extractors for super admins and tenant users.
//!
//! Tenant routes accept either an OIDC-issued bearer token plus the tenant
//! header, or a super admin who is impersonating an organization.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::CookieJar;
use db::DbError;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use ontology::{OntologyApi, TenantScope, TENANT_HEADER};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::auth::token::{IMPERSONATION_COOKIE, SUPER_ADMIN_COOKIE};
use crate::config::OidcConfig;
use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// OIDC session tokens
// ---------------------------------------------------------------------------

/// Claims the console reads from an OIDC session token.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Organization the identity provider bound the session to, if any.
    #[serde(default)]
    pub org_id: Option<String>,
}

pub struct OidcVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl OidcVerifier {
    /// `None` when no verification key is configured.
    pub fn from_config(config: &OidcConfig) -> Result<Option<Self>, ApiError> {
        let (key, algorithm) = match (&config.rs256_public_key_pem, &config.hs256_secret) {
            (Some(pem), _) => {
                let key = DecodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|e| ApiError::Internal(format!("invalid OIDC public key: {e}")))?;
                (key, Algorithm::RS256)
            }
            (None, Some(secret)) => (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256),
            (None, None) => return Ok(None),
        };

        let mut validation = Validation::new(algorithm);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Some(Self { key, validation }))
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, ApiError> {
        decode::<SessionClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("session token rejected: {e}");
                ApiError::Unauthorized
            })
    }
}

// ---------------------------------------------------------------------------
// Super admin
// ---------------------------------------------------------------------------

/// A request carrying a valid super-admin cookie.
#[derive(Debug, Clone)]
pub struct SuperAdmin {
    pub id: Uuid,
    pub email: String,
    /// Organization currently impersonated, from the impersonation cookie.
    pub impersonating: Option<String>,
}

impl SuperAdmin {
    /// The session in `jar`, provided its account still exists.
    async fn from_cookies(jar: &CookieJar, state: &AppState) -> Result<Option<Self>, ApiError> {
        let tokens = &state.tokens;
        let Some(claims) = jar
            .get(SUPER_ADMIN_COOKIE)
            .and_then(|cookie| tokens.verify_session(cookie.value()).ok())
        else {
            return Ok(None);
        };

        match state.admins.get(claims.sub).await {
            Ok(_) => {}
            Err(DbError::NotFound) => {
                debug!(admin = %claims.sub, "session cookie for a deleted super admin");
                return Ok(None);
            }
            Err(other) => return Err(other.into()),
        }

        let impersonating = jar
            .get(IMPERSONATION_COOKIE)
            .and_then(|cookie| tokens.verify_impersonation(cookie.value()).ok())
            .filter(|imp| imp.sub == claims.sub)
            .map(|imp| imp.org);

        Ok(Some(Self { id: claims.sub, email: claims.email, impersonating }))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SuperAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Self::from_cookies(&jar, state).await?.ok_or(ApiError::Unauthorized)
    }
}

// ---------------------------------------------------------------------------
// Any authenticated caller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    User { subject: String, email: Option<String> },
    SuperAdmin { id: Uuid, email: String },
}

/// An authenticated caller and the backend scope requests run under.
#[derive(Debug, Clone)]
pub struct Caller {
    pub principal: Principal,
    pub scope: TenantScope,
}

impl Caller {
    pub fn api(&self, state: &AppState) -> Arc<dyn OntologyApi> {
        state.ontology.connect(self.scope.clone())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        if let Some(admin) = SuperAdmin::from_cookies(&jar, state).await? {
            return Ok(Caller {
                principal: Principal::SuperAdmin { id: admin.id, email: admin.email },
                scope: TenantScope {
                    tenant_id: admin.impersonating,
                    bearer: state.config.ontology_service_token.clone(),
                },
            });
        }

        let token = bearer_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
        let verifier = state.oidc.as_ref().ok_or(ApiError::Unauthorized)?;
        let claims = verifier.verify(token)?;

        let tenant_id = resolve_tenant(claims.org_id, tenant_header(&parts.headers))?;
        Ok(Caller {
            principal: Principal::User { subject: claims.sub, email: claims.email },
            scope: TenantScope { tenant_id, bearer: Some(token.to_string()) },
        })
    }
}

/// A caller that has a tenant selected, with a backend client bound to it.
pub struct Tenant {
    pub caller: Caller,
    pub api: Arc<dyn OntologyApi>,
}

impl Tenant {
    pub fn id(&self) -> &str {
        self.caller.scope.tenant_id.as_deref().unwrap_or_default()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Tenant {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let caller = Caller::from_request_parts(parts, state).await?;
        if caller.scope.tenant_id.is_none() {
            return Err(ApiError::MissingTenant);
        }
        let api = caller.api(state);
        Ok(Tenant { caller, api })
    }
}

// ---------------------------------------------------------------------------
// Header helpers
// ---------------------------------------------------------------------------

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn tenant_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(TENANT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Tenant for a user session. An organization bound by the identity provider
/// wins; a header naming a different one is refused.
fn resolve_tenant(claimed: Option<String>, header: Option<String>) -> Result<Option<String>, ApiError> {
    match (claimed, header) {
        (Some(claimed), Some(header)) if claimed != header => {
            debug!(%claimed, requested = %header, "tenant header contradicts session");
            Err(ApiError::Forbidden(format!("session is not valid for organization {header}")))
        }
        (Some(claimed), _) => Ok(Some(claimed)),
        (None, header) => Ok(header),
    }
}

/// Client address for rate limiting.
///
/// The socket peer is the client unless it is one of `trusted_proxies`. Then
/// `X-Forwarded-For` is read from the right, skipping further trusted hops,
/// so the entry taken is the one a trusted proxy appended. `X-Real-IP` is the
/// fallback when the chain holds nothing usable.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trusted_proxies: &[IpAddr]) -> IpAddr {
    let Some(peer) = peer.map(|addr| addr.ip()) else {
        return IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    };
    if !trusted_proxies.contains(&peer) {
        return peer;
    }

    let forwarded: Option<IpAddr> = headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .map_while(|hop| hop.parse::<IpAddr>().ok())
        .find(|hop| !trusted_proxies.contains(hop));

    let real_ip = || -> Option<IpAddr> {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    };

    forwarded.or_else(real_ip).unwrap_or(peer)
}
