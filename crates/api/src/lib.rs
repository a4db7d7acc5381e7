//! `api` crate — the admin console's HTTP surface.
//!
//! Exposes:
//!   GET    /health
//!   GET    /api/v1/status
//!   POST   /api/v1/super-admin/login | logout
//!   GET    /api/v1/super-admin/me
//!   POST   /api/v1/super-admin/impersonate      DELETE to stop
//!   GET    /api/v1/resources/{kind}             POST to create
//!   PATCH  /api/v1/resources/{kind}/{id}        DELETE to remove
//!   GET    /api/v1/routing/rules
//!   DELETE /api/v1/routing/rules/{id}
//!   POST   /api/v1/routing/validate
//!   POST   /api/v1/routing/connections
//!   GET    /api/v1/routing/canvas               PUT to save the layout
//!   GET    /api/v1/integrations/{id}/routing-impact
//!   POST   /api/v1/integrations/{id}/disable | enable
//!   GET    /api/v1/preferences/active-organization    PUT to change
//!   GET    /api/v1/ai-config                    PUT to change
//!   GET    /api/v1/ai-delegations               PUT to change

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod state;

use std::net::SocketAddr;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use handlers::{health, integrations, preferences, resources, routing, super_admin};

pub use config::{AppConfig, OidcConfig};
pub use error::ApiError;
pub use state::AppState;

pub fn build_router(state: AppState) -> Router {
    let super_admin_routes = Router::new()
        .route("/login", post(super_admin::login))
        .route("/logout", post(super_admin::logout))
        .route("/me", get(super_admin::me))
        .route(
            "/impersonate",
            post(super_admin::start_impersonation).delete(super_admin::stop_impersonation),
        );

    let routing_routes = Router::new()
        .route("/rules", get(routing::list_rules))
        .route("/rules/:id", delete(routing::delete_rule))
        .route("/validate", post(routing::validate))
        .route("/connections", post(routing::create_connection))
        .route("/canvas", get(routing::get_canvas).put(routing::save_canvas));

    let v1 = Router::new()
        .route("/status", get(health::backend_status))
        .nest("/super-admin", super_admin_routes)
        .route("/resources/:kind", get(resources::list).post(resources::create))
        .route("/resources/:kind/:id", patch(resources::update).delete(resources::delete))
        .nest("/routing", routing_routes)
        .route("/integrations/:id/routing-impact", get(integrations::routing_impact))
        .route("/integrations/:id/disable", post(integrations::disable))
        .route("/integrations/:id/enable", post(integrations::enable))
        .route(
            "/preferences/active-organization",
            get(preferences::get_active_organization).put(preferences::set_active_organization),
        )
        .route("/ai-config", get(preferences::get_ai_config).put(preferences::put_ai_config))
        .route(
            "/ai-delegations",
            get(preferences::get_delegations).put(preferences::put_delegations),
        );

    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health::liveness))
        .nest("/api/v1", v1)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind to `bind` and serve until the process is stopped.
pub async fn serve(bind: &str, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("API listening on {}", listener.local_addr()?);
    let app = build_router(state).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app).await
}

/// Credentialed CORS for the configured browser origins only.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-tenant-id"),
        ])
}

#[cfg(test)]
mod router_tests;
