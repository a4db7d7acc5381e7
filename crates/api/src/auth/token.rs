//! Signed cookie tokens for super admins and impersonation.
//!
//! Both are HS256 JWTs signed with the same secret; the `kind` claim keeps
//! one from being replayed as the other.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

pub const SUPER_ADMIN_COOKIE: &str = "super_admin_token";
pub const IMPERSONATION_COOKIE: &str = "impersonation_token";

const SESSION_KIND: &str = "super_admin";
const IMPERSONATION_KIND: &str = "impersonation";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperAdminClaims {
    /// Super admin id.
    pub sub: Uuid,
    pub email: String,
    pub kind: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpersonationClaims {
    /// Super admin doing the impersonation.
    pub sub: Uuid,
    /// Organization being impersonated.
    pub org: String,
    pub kind: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    session_ttl: Duration,
    impersonation_ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, session_ttl: Duration, impersonation_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            session_ttl,
            impersonation_ttl,
        }
    }

    pub fn issue_session(&self, admin_id: Uuid, email: &str) -> Result<String, ApiError> {
        let iat = Utc::now().timestamp();
        let claims = SuperAdminClaims {
            sub: admin_id,
            email: email.to_string(),
            kind: SESSION_KIND.to_string(),
            iat,
            exp: iat + self.session_ttl.as_secs() as i64,
        };
        self.sign(&claims)
    }

    pub fn issue_impersonation(&self, admin_id: Uuid, organization_id: &str) -> Result<String, ApiError> {
        let iat = Utc::now().timestamp();
        let claims = ImpersonationClaims {
            sub: admin_id,
            org: organization_id.to_string(),
            kind: IMPERSONATION_KIND.to_string(),
            iat,
            exp: iat + self.impersonation_ttl.as_secs() as i64,
        };
        self.sign(&claims)
    }

    pub fn verify_session(&self, token: &str) -> Result<SuperAdminClaims, ApiError> {
        let claims: SuperAdminClaims = self.verify(token)?;
        if claims.kind != SESSION_KIND {
            return Err(ApiError::Unauthorized);
        }
        Ok(claims)
    }

    pub fn verify_impersonation(&self, token: &str) -> Result<ImpersonationClaims, ApiError> {
        let claims: ImpersonationClaims = self.verify(token)?;
        if claims.kind != IMPERSONATION_KIND {
            return Err(ApiError::Unauthorized);
        }
        Ok(claims)
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub fn impersonation_ttl(&self) -> Duration {
        self.impersonation_ttl
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, ApiError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
    }

    fn verify<T: for<'de> Deserialize<'de>>(&self, token: &str) -> Result<T, ApiError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<T>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| ApiError::Unauthorized)
    }
}
