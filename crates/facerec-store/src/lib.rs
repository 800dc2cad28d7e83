//! sqlx-backed identity store adapters.
//!
//! PostgreSQL is the production backend; SQLite serves local development
//! and tests. Both persist vectors with the textual codec from
//! `facerec_core::codec` so the two behave identically.

mod postgres;
mod row;
mod sqlite;
mod util;

pub use postgres::PgIdentityStore;
pub use sqlite::SqliteIdentityStore;
pub use util::{
    create_postgres_pool, create_sqlite_pool, parse_ssl_mode, run_postgres_migrations,
    run_sqlite_migrations,
};

/// Embedded migrations for the PostgreSQL schema.
pub const POSTGRES_MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations/postgres");

/// Embedded migrations for the SQLite schema.
pub const SQLITE_MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations/sqlite");
