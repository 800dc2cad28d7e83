use std::str::FromStr;
use std::time::Duration;

use sqlx::migrate::MigrateError;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{PgPool, SqlitePool};

use crate::{POSTGRES_MIGRATOR, SQLITE_MIGRATOR};

/// Creates a PostgreSQL connection pool and verifies connectivity.
pub async fn create_postgres_pool(
    options: PgConnectOptions,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect_with(options)
        .await
}

/// Creates a SQLite connection pool, creating the database file if needed.
pub async fn create_sqlite_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<SqlitePool, sqlx::Error> {
    let options = database_url
        .parse::<SqliteConnectOptions>()?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// Parses a libpq-style `sslmode` value (`disable`, `require`, ...).
pub fn parse_ssl_mode(value: &str) -> Result<PgSslMode, sqlx::Error> {
    PgSslMode::from_str(value)
}

/// Runs all outstanding PostgreSQL migrations.
pub async fn run_postgres_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    POSTGRES_MIGRATOR.run(pool).await
}

/// Runs all outstanding SQLite migrations.
pub async fn run_sqlite_migrations(pool: &SqlitePool) -> Result<(), MigrateError> {
    SQLITE_MIGRATOR.run(pool).await
}
