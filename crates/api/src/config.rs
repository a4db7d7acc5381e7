//! Runtime configuration for the HTTP layer.
//!
//! Built by the `cli` crate from flags and environment variables.

use std::net::IpAddr;
use std::time::Duration;

/// How OIDC session tokens are verified.
///
/// Exactly one of `hs256_secret` / `rs256_public_key_pem` is expected; with
/// neither set, only super-admin impersonation can reach tenant routes.
#[derive(Debug, Clone, Default)]
pub struct OidcConfig {
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub hs256_secret: Option<String>,
    pub rs256_public_key_pem: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HMAC secret for the super-admin and impersonation cookies.
    pub super_admin_jwt_secret: String,
    pub session_ttl: Duration,
    pub impersonation_ttl: Duration,
    /// Set the `Secure` attribute on auth cookies.
    pub secure_cookies: bool,
    /// Failed logins allowed per IP inside `login_window`.
    pub login_max_attempts: usize,
    pub login_window: Duration,
    /// Reverse proxies whose forwarding headers are believed. Empty means the
    /// socket peer is always the client.
    pub trusted_proxies: Vec<IpAddr>,
    /// Cost of the placeholder hash checked for unknown login emails. Keep it
    /// equal to the cost stored admin hashes were created with.
    pub bcrypt_cost: u32,
    pub oidc: OidcConfig,
    /// Bearer sent to the Ontology Service on behalf of super admins.
    pub ontology_service_token: Option<String>,
    /// Browser origins allowed to call the API with credentials.
    pub cors_origins: Vec<String>,
    pub health_poll_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            super_admin_jwt_secret: String::new(),
            session_ttl: Duration::from_secs(8 * 60 * 60),
            impersonation_ttl: Duration::from_secs(60 * 60),
            secure_cookies: true,
            login_max_attempts: 5,
            login_window: Duration::from_secs(15 * 60),
            trusted_proxies: Vec::new(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            oidc: OidcConfig::default(),
            ontology_service_token: None,
            cors_origins: Vec::new(),
            health_poll_interval: Duration::from_secs(30),
        }
    }
}
