//! Builds the process-wide service graph from configuration.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;
use thiserror::Error;

use facerec_core::IdentityStore;
use facerec_gateway::{ProcessExtractor, ProcessGalleryWriter, ProcessMatcher};
use facerec_store::{
    create_postgres_pool, create_sqlite_pool, parse_ssl_mode, run_postgres_migrations,
    run_sqlite_migrations, PgIdentityStore, SqliteIdentityStore,
};

use crate::config::{Config, ConfigError, DatabaseBackend, DatabaseConfig};
use crate::gallery::GalleryExporter;
use crate::service::FaceService;
use crate::staging::StagingArea;

/// Failures while wiring the service at startup.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("cannot create staging directories under {path}: {source}")]
    Staging {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Connects to the configured backend and brings its schema up to date.
pub async fn connect_store(
    config: &DatabaseConfig,
) -> Result<Arc<dyn IdentityStore>, BootstrapError> {
    match config.backend {
        DatabaseBackend::Postgres => {
            let options = PgConnectOptions::new()
                .host(&config.host)
                .port(config.port)
                .username(&config.user)
                .password(&config.password)
                .database(&config.name)
                .ssl_mode(parse_ssl_mode(&config.ssl_mode)?);

            let pool = create_postgres_pool(
                options,
                config.max_connections,
                Duration::from_secs(config.connect_timeout_seconds),
            )
            .await?;
            run_postgres_migrations(&pool).await?;

            tracing::info!(
                host = %config.host,
                port = config.port,
                database = %config.name,
                "connected to postgres"
            );
            Ok(Arc::new(PgIdentityStore::new(pool)))
        }
        DatabaseBackend::Sqlite => {
            let url = format!("sqlite://{}", config.sqlite_path.display());
            let pool = create_sqlite_pool(&url, config.max_connections).await?;
            run_sqlite_migrations(&pool).await?;

            tracing::info!(path = %config.sqlite_path.display(), "opened sqlite database");
            Ok(Arc::new(SqliteIdentityStore::new(pool)))
        }
    }
}

/// Validates `config` and builds the service with subprocess gateways.
///
/// Creates the staging directories if they are missing. Does not export
/// the gallery; callers do that before serving.
pub async fn build_service(config: &Config) -> Result<FaceService, BootstrapError> {
    config.validate()?;

    let staging = StagingArea::new(&config.paths.staging_root);
    staging
        .ensure_dirs()
        .await
        .map_err(|source| BootstrapError::Staging {
            path: staging.root().display().to_string(),
            source,
        })?;

    let store = connect_store(&config.database).await?;

    let extractor = Arc::new(ProcessExtractor::new(config.gateway.extractor_command()));
    let matcher = Arc::new(ProcessMatcher::new(config.gateway.matcher_command()));
    let writer = Arc::new(ProcessGalleryWriter::new(config.gateway.writer_command()));

    let exporter = Arc::new(GalleryExporter::new(
        Arc::clone(&store),
        writer,
        staging.clone(),
        &config.paths.gallery_path,
    ));

    Ok(FaceService::new(store, extractor, matcher, staging, exporter))
}
