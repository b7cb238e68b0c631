//! SQLite pool setup and the embedded schema migration.

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::str::FromStr;

const INIT_SQL: &str = include_str!("../migrations/0001_init.sql");

/// Open a pool on `database_url`, creating the file if needed.
/// Foreign keys are enforced on every connection.
pub async fn connect(database_url: &str, max_connections: u32) -> sqlx::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// Single-connection in-memory pool. Every connection to `:memory:` is a
/// separate database, so the pool must never open a second one.
pub async fn connect_in_memory() -> sqlx::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

/// Apply the embedded schema. Statements are idempotent.
pub async fn run_migrations(db: &SqlitePool) -> sqlx::Result<usize> {
    let statements = INIT_SQL
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    tracing::info!("Running {} migration statements...", statements.len());

    for stmt in &statements {
        tracing::debug!("Executing migration SQL: {}", stmt);
        sqlx::query(stmt).execute(db).await?;
    }

    Ok(statements.len())
}
