//! Postgres pool and embedded migrations.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::DbError;

/// The pool every repository function takes.
pub type DbPool = PgPool;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Open a pool of at most `max_connections` and check it answers.
#[instrument(skip(database_url))]
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, DbError> {
    info!(host = %redacted_host(database_url), "connecting to database");
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await?;
    ping(&pool).await?;
    Ok(pool)
}

/// Round-trip a trivial query.
pub async fn ping(pool: &DbPool) -> Result<(), DbError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the SQL files under `migrations/` at the workspace root, embedded at
/// build time.
pub async fn run_migrations(pool: &DbPool) -> Result<(), DbError> {
    info!("applying database migrations");
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

/// `host[:port]/db` part of a connection URL, without credentials.
fn redacted_host(database_url: &str) -> &str {
    let rest = database_url.split_once("://").map_or(database_url, |(_, rest)| rest);
    rest.rsplit_once('@').map_or(rest, |(_, host)| host)
}

#[cfg(test)]
mod tests {
    use super::redacted_host;

    #[test]
    fn credentials_never_reach_the_logs() {
        assert_eq!(redacted_host("postgres://admin:s3cret@db:5432/console"), "db:5432/console");
        assert_eq!(redacted_host("postgres://db/console"), "db/console");
    }
}
