//! Configuration management for the face registration server.
//!
//! Supports multiple configuration sources with precedence:
//! 1. Environment variables (highest priority)
//! 2. TOML configuration file
//! 3. Default values (lowest priority)
//!
//! Everything is read once at startup and passed explicitly to the
//! components that need it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use facerec_gateway::ScriptCommand;

/// Prefix shared by every environment variable the server reads.
pub const ENV_PREFIX: &str = "FACE_REC_SYSTEM_";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Deployment mode
    #[serde(default)]
    pub environment: Environment,

    /// HTTP listener configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Identity store connection
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Staging and gallery locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// External program invocations
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Deployment mode selected by `FACE_REC_SYSTEM_ENVIRONMENT`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    /// Anything other than `production` is treated as development.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("production") {
            Ok(Self::Production)
        } else {
            Ok(Self::Development)
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Listening port (default: 4000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-request deadline in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,

    /// Maximum accepted request body (default: 10 MiB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

/// Which relational backend holds the identity store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Postgres,
    Sqlite,
}

impl FromStr for DatabaseBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(ConfigError::ValidationError(format!(
                "unknown database backend `{other}` (expected postgres or sqlite)"
            ))),
        }
    }
}

/// Identity store connection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Backend selection (default: postgres)
    #[serde(default)]
    pub backend: DatabaseBackend,

    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// Database name
    #[serde(default)]
    pub name: String,

    /// libpq-style sslmode (default: "disable")
    #[serde(default = "default_ssl_mode")]
    pub ssl_mode: String,

    /// SQLite database file, used when `backend = "sqlite"`
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,

    /// Max connections in pool (default: 10)
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection timeout in seconds (default: 5)
    #[serde(default = "default_connection_timeout")]
    pub connect_timeout_seconds: u64,
}

/// Filesystem locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding `temp-images/` and `temp-embeddings/` (default: ".")
    #[serde(default = "default_staging_root")]
    pub staging_root: PathBuf,

    /// Gallery artifact consumed by the matcher
    #[serde(default = "default_gallery_path")]
    pub gallery_path: PathBuf,
}

/// External program invocations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Interpreter used to run the scripts (default: "python3")
    #[serde(default = "default_python")]
    pub python: String,

    #[serde(default = "default_extractor_script")]
    pub extractor_script: String,

    #[serde(default = "default_matcher_script")]
    pub matcher_script: String,

    #[serde(default = "default_writer_script")]
    pub writer_script: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error (default: "info")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty. Unset means json in production and
    /// pretty otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_timeout() -> u64 {
    30
}

fn default_max_upload_bytes() -> usize {
    10 << 20
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_ssl_mode() -> String {
    "disable".to_string()
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("facerec.db")
}

fn default_max_connections() -> u32 {
    10
}

fn default_connection_timeout() -> u64 {
    5
}

fn default_staging_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_gallery_path() -> PathBuf {
    PathBuf::from("gallery_embeddings.npy")
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_extractor_script() -> String {
    "generate_biometric_id.py".to_string()
}

fn default_matcher_script() -> String {
    "find_match_in_gallery.py".to_string()
}

fn default_writer_script() -> String {
    "save_embeddings.py".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_timeout(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::default(),
            host: default_db_host(),
            port: default_db_port(),
            user: String::new(),
            password: String::new(),
            name: String::new(),
            ssl_mode: default_ssl_mode(),
            sqlite_path: default_sqlite_path(),
            max_connections: default_max_connections(),
            connect_timeout_seconds: default_connection_timeout(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            staging_root: default_staging_root(),
            gallery_path: default_gallery_path(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            python: default_python(),
            extractor_script: default_extractor_script(),
            matcher_script: default_matcher_script(),
            writer_script: default_writer_script(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

impl ServerConfig {
    /// The per-request deadline.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl GatewayConfig {
    #[must_use]
    pub fn extractor_command(&self) -> ScriptCommand {
        ScriptCommand::script(&self.python, &self.extractor_script)
    }

    #[must_use]
    pub fn matcher_command(&self) -> ScriptCommand {
        ScriptCommand::script(&self.python, &self.matcher_script)
    }

    #[must_use]
    pub fn writer_command(&self) -> ScriptCommand {
        ScriptCommand::script(&self.python, &self.writer_script)
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file doesn't exist or has invalid TOML syntax.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::TomlError { path, source: e })
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Reads the file named by `FACE_REC_SYSTEM_CONFIG`, else `config.toml`
    /// if it exists, else starts from defaults. Environment variables then
    /// override individual settings.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(format!("{ENV_PREFIX}CONFIG")) {
            Ok(path) => Self::from_file(path)?,
            Err(_) if std::path::Path::new("config.toml").exists() => {
                Self::from_file("config.toml")?
            }
            Err(_) => Self::default(),
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source.
    ///
    /// `lookup` receives the full variable name (e.g.
    /// `FACE_REC_SYSTEM_DB_HOST`). Numeric values that fail to parse are
    /// ignored and the previous value is kept.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(env) = var("ENVIRONMENT") {
            self.environment = match env.parse::<Environment>() {
                Ok(env) => env,
                Err(never) => match never {},
            };
        }

        if let Some(host) = var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("SERVER_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(secs) = var("REQUEST_TIMEOUT_SECONDS").and_then(|s| s.parse().ok()) {
            self.server.request_timeout_seconds = secs;
        }

        if let Some(backend) = var("DB_BACKEND").and_then(|b| b.parse().ok()) {
            self.database.backend = backend;
        }
        if let Some(host) = var("DB_HOST") {
            self.database.host = host;
        }
        if let Some(port) = var("DB_PORT").and_then(|p| p.parse().ok()) {
            self.database.port = port;
        }
        if let Some(user) = var("DB_USER") {
            self.database.user = user;
        }
        if let Some(password) = var("DB_PASSWORD") {
            self.database.password = password;
        }
        if let Some(name) = var("DB_NAME") {
            self.database.name = name;
        }
        if let Some(mode) = var("SSL_MODE") {
            self.database.ssl_mode = mode;
        }
        if let Some(path) = var("SQLITE_PATH") {
            self.database.sqlite_path = PathBuf::from(path);
        }

        if let Some(root) = var("STAGING_ROOT") {
            self.paths.staging_root = PathBuf::from(root);
        }
        if let Some(path) = var("GALLERY_PATH") {
            self.paths.gallery_path = PathBuf::from(path);
        }

        if let Some(python) = var("PYTHON") {
            self.gateway.python = python;
        }

        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("LOG_FORMAT") {
            self.logging.format = Some(format);
        }
    }

    /// The log format in effect: explicit setting, else json in production.
    #[must_use]
    pub fn log_format(&self) -> &str {
        match (&self.logging.format, self.environment) {
            (Some(format), _) => format.as_str(),
            (None, Environment::Production) => "json",
            (None, Environment::Development) => "pretty",
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be non-zero".to_string(),
            ));
        }

        if self.server.request_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "server.request_timeout_seconds must be > 0".to_string(),
            ));
        }

        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "server.max_upload_bytes must be > 0".to_string(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be > 0".to_string(),
            ));
        }

        if self.database.connect_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "database.connect_timeout_seconds must be > 0".to_string(),
            ));
        }

        if self.database.backend == DatabaseBackend::Postgres {
            if self.database.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "database.name is required for the postgres backend (set {ENV_PREFIX}DB_NAME)"
                )));
            }

            if facerec_store::parse_ssl_mode(&self.database.ssl_mode).is_err() {
                return Err(ConfigError::ValidationError(format!(
                    "database.ssl_mode `{}` is not a valid sslmode",
                    self.database.ssl_mode
                )));
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.log_format()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be one of: {}",
                valid_formats.join(", ")
            )));
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading configuration file
    #[error("Failed to read config file {path:?}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("Failed to parse TOML in {path:?}: {source}")]
    TomlError {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Validation error
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
