//! `routing-admin` CLI entry-point.
//!
//! Available sub-commands:
//! - `serve`              — start the admin API server.
//! - `migrate`            — run pending database migrations.
//! - `create-super-admin` — add a super-admin account.
//! - `check-edge`         — check whether two canvas nodes may be connected.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use api::auth::PgAdminStore;
use api::{AppConfig, AppState, OidcConfig};
use clap::{Args, Parser, Subcommand};
use ontology::{ClientConfig, HttpOntologyClient};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "routing-admin",
    about = "Admin console backend for multi-tenant conversation routing",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the REST API server.
    Serve(ServeArgs),
    /// Run pending database migrations.
    Migrate {
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
    },
    /// Create a super-admin account.
    CreateSuperAdmin {
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "SUPER_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        display_name: Option<String>,
    },
    /// Check whether an edge between two canvas node ids is legal.
    CheckEdge {
        /// Source node id, e.g. `integration_wa_main`.
        source: String,
        /// Target node id, e.g. `queue_vip`.
        target: String,
    },
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind: String,
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 10)]
    max_connections: u32,
    /// Apply pending migrations before serving.
    #[arg(long)]
    migrate: bool,

    #[arg(long, env = "ONTOLOGY_BASE_URL", default_value = "http://localhost:8000")]
    ontology_base_url: String,
    #[arg(long, env = "ONTOLOGY_TIMEOUT_SECS", default_value_t = 15)]
    ontology_timeout_secs: u64,
    /// Bearer used for backend calls made on behalf of super admins.
    #[arg(long, env = "ONTOLOGY_SERVICE_TOKEN", hide_env_values = true)]
    ontology_service_token: Option<String>,

    #[arg(long, env = "SUPER_ADMIN_JWT_SECRET", hide_env_values = true)]
    super_admin_jwt_secret: String,
    #[arg(long, env = "SUPER_ADMIN_SESSION_HOURS", default_value_t = 8)]
    session_hours: u64,
    #[arg(long, env = "IMPERSONATION_MINUTES", default_value_t = 60)]
    impersonation_minutes: u64,
    /// Drop the `Secure` cookie attribute (plain-HTTP local development).
    #[arg(long, env = "INSECURE_COOKIES")]
    insecure_cookies: bool,
    #[arg(long, env = "LOGIN_MAX_ATTEMPTS", default_value_t = 5)]
    login_max_attempts: usize,
    #[arg(long, env = "LOGIN_WINDOW_SECS", default_value_t = 900)]
    login_window_secs: u64,
    /// Reverse proxies allowed to set `X-Forwarded-For` / `X-Real-IP`.
    #[arg(long, env = "TRUSTED_PROXIES", value_delimiter = ',')]
    trusted_proxies: Vec<IpAddr>,

    #[arg(long, env = "OIDC_ISSUER")]
    oidc_issuer: Option<String>,
    #[arg(long, env = "OIDC_AUDIENCE")]
    oidc_audience: Option<String>,
    #[arg(long, env = "OIDC_HS256_SECRET", hide_env_values = true)]
    oidc_hs256_secret: Option<String>,
    /// PEM file with the identity provider's RS256 public key.
    #[arg(long, env = "OIDC_PUBLIC_KEY_FILE")]
    oidc_public_key_file: Option<PathBuf>,

    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',')]
    cors_origins: Vec<String>,
    #[arg(long, env = "HEALTH_POLL_SECS", default_value_t = 30)]
    health_poll_secs: u64,
}

impl ServeArgs {
    fn app_config(&self) -> anyhow::Result<AppConfig> {
        let rs256_public_key_pem = self
            .oidc_public_key_file
            .as_ref()
            .map(|path| {
                std::fs::read_to_string(path)
                    .with_context(|| format!("cannot read OIDC public key {}", path.display()))
            })
            .transpose()?;

        Ok(AppConfig {
            super_admin_jwt_secret: self.super_admin_jwt_secret.clone(),
            session_ttl: Duration::from_secs(self.session_hours * 60 * 60),
            impersonation_ttl: Duration::from_secs(self.impersonation_minutes * 60),
            secure_cookies: !self.insecure_cookies,
            login_max_attempts: self.login_max_attempts,
            login_window: Duration::from_secs(self.login_window_secs),
            trusted_proxies: self.trusted_proxies.clone(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            oidc: OidcConfig {
                issuer: self.oidc_issuer.clone(),
                audience: self.oidc_audience.clone(),
                hs256_secret: self.oidc_hs256_secret.clone(),
                rs256_public_key_pem,
            },
            ontology_service_token: self.ontology_service_token.clone(),
            cors_origins: self.cors_origins.clone(),
            health_poll_interval: Duration::from_secs(self.health_poll_secs),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => serve(args).await?,
        Command::Migrate { database_url } => {
            let pool = db::pool::create_pool(&database_url, 2)
                .await
                .context("failed to connect to database")?;
            db::pool::run_migrations(&pool).await.context("migration failed")?;
            info!("Migrations applied successfully");
        }
        Command::CreateSuperAdmin { database_url, email, password, display_name } => {
            let pool = db::pool::create_pool(&database_url, 2)
                .await
                .context("failed to connect to database")?;
            let hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST).context("cannot hash password")?;
            let admin = db::repository::super_admins::create_super_admin(
                &pool,
                &email,
                &hash,
                display_name.as_deref(),
            )
            .await?;
            println!("✅ Created super admin {} ({})", admin.email, admin.id);
        }
        Command::CheckEdge { source, target } => match engine::validate_connection(&source, &target) {
            Ok(connection) => {
                println!(
                    "✅ {} -> {} is allowed ({} -> {})",
                    source, target, connection.source_type, connection.destination_type
                );
            }
            Err(e) => {
                eprintln!("❌ {source} -> {target} rejected: {e}");
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = args.app_config()?;

    let pool = db::pool::create_pool(&args.database_url, args.max_connections)
        .await
        .context("failed to connect to database")?;
    if args.migrate {
        db::pool::run_migrations(&pool).await.context("migration failed")?;
    }

    let ontology = HttpOntologyClient::new(ClientConfig {
        base_url: args.ontology_base_url.clone(),
        timeout: Duration::from_secs(args.ontology_timeout_secs),
    })?;
    info!("Using Ontology Service at {}", args.ontology_base_url);

    let state = AppState::new(config, Arc::new(PgAdminStore::new(pool)), Arc::new(ontology))?;

    info!("Starting API server on {}", args.bind);
    api::serve(&args.bind, state).await?;
    Ok(())
}
