//! Shared application state handed to every handler.

use std::sync::Arc;

use engine::health::HealthMonitor;
use ontology::{OntologyApi, OntologyConnector, TenantScope};

use crate::auth::{AdminStore, LoginRateLimiter, PasswordChecker, TokenSigner};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::identity::OidcVerifier;

#[derive(Clone)]
pub struct AppState {
    pub admins: Arc<dyn AdminStore>,
    pub ontology: Arc<dyn OntologyConnector>,
    pub limiter: Arc<LoginRateLimiter>,
    pub passwords: Arc<PasswordChecker>,
    pub tokens: TokenSigner,
    pub oidc: Option<Arc<OidcVerifier>>,
    pub health: Arc<HealthMonitor>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Build the state and start the backend health poller.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn new(
        config: AppConfig,
        admins: Arc<dyn AdminStore>,
        ontology: Arc<dyn OntologyConnector>,
    ) -> Result<Self, ApiError> {
        if config.super_admin_jwt_secret.is_empty() {
            return Err(ApiError::Internal("super admin JWT secret must not be empty".into()));
        }

        let oidc = OidcVerifier::from_config(&config.oidc)?.map(Arc::new);
        let tokens = TokenSigner::new(
            &config.super_admin_jwt_secret,
            config.session_ttl,
            config.impersonation_ttl,
        );
        let limiter = Arc::new(LoginRateLimiter::new(config.login_max_attempts, config.login_window));
        let passwords = Arc::new(PasswordChecker::new(config.bcrypt_cost)?);

        let service = ontology.connect(service_scope(&config));
        let health = Arc::new(HealthMonitor::spawn(service, config.health_poll_interval));

        Ok(Self { admins, ontology, limiter, passwords, tokens, oidc, health, config: Arc::new(config) })
    }

    /// Backend client acting for the console itself, outside any tenant.
    pub fn service_api(&self) -> Arc<dyn OntologyApi> {
        self.ontology.connect(service_scope(&self.config))
    }

    /// Backend client acting for the console inside `tenant_id`.
    pub fn service_api_for(&self, tenant_id: &str) -> Arc<dyn OntologyApi> {
        let mut scope = service_scope(&self.config);
        scope.tenant_id = Some(tenant_id.to_string());
        self.ontology.connect(scope)
    }
}

fn service_scope(config: &AppConfig) -> TenantScope {
    TenantScope { tenant_id: None, bearer: config.ontology_service_token.clone() }
}
