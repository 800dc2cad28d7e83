//! Service layer for the face registration server.
//! Registration and match workflows shared by the HTTP API and tests.

mod bootstrap;
mod config;
mod error;
mod gallery;
mod service;
mod staging;

pub use bootstrap::{build_service, connect_store, BootstrapError};
pub use config::{
    Config, ConfigError, DatabaseBackend, DatabaseConfig, Environment, GatewayConfig,
    LoggingConfig, PathsConfig, ServerConfig, ENV_PREFIX,
};
pub use error::{ServiceError, ServiceResult};
pub use gallery::{ExportSummary, GalleryExporter};
pub use service::{FaceService, MatchedUser, Registration};
pub use staging::{StagedFile, StagingArea, StagingKind};
