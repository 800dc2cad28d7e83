//! Logging and optional OpenTelemetry tracing initialization.
//!
//! Plain logging writes through a `tracing-subscriber` fmt layer in json or
//! pretty form. With `ENABLE_TRACING=true` spans are additionally exported
//! to Jaeger.
//!
//! # Example
//! ```no_run
//! use facerec_rest::tracing_init;
//!
//! #[tokio::main]
//! async fn main() {
//!     if tracing_init::tracing_enabled() {
//!         tracing_init::init_from_env("info", false).expect("Failed to initialize tracing");
//!     } else {
//!         tracing_init::init_logging("info", false);
//!     }
//!
//!     // Your application code...
//!
//!     tracing_init::shutdown();
//! }
//! ```

use opentelemetry::trace::TraceError;
use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::trace::{self, Sampler};
use opentelemetry_sdk::Resource;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Default service name reported to Jaeger.
pub const SERVICE_NAME: &str = "facerec-rest";

/// Whether `ENABLE_TRACING=true` is set.
#[must_use]
pub fn tracing_enabled() -> bool {
    std::env::var("ENABLE_TRACING").map_or(false, |v| v == "true")
}

/// `RUST_LOG` wins over the configured level.
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initializes console logging only.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
pub fn init_logging(level: &str, json: bool) {
    let registry = Registry::default().with(env_filter(level));
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().pretty().with_line_number(true))
            .init();
    }
}

/// Initializes console logging plus a Jaeger exporter.
///
/// # Arguments
/// * `service_name` - Name reported to Jaeger (e.g. "facerec-rest")
/// * `jaeger_endpoint` - Jaeger agent endpoint (e.g. "localhost:6831")
pub fn init_tracing(
    service_name: &str,
    jaeger_endpoint: &str,
    level: &str,
    json: bool,
) -> Result<(), TraceError> {
    let tracer = opentelemetry_jaeger::new_agent_pipeline()
        .with_service_name(service_name)
        .with_endpoint(jaeger_endpoint)
        .with_trace_config(
            trace::config()
                .with_sampler(Sampler::AlwaysOn)
                .with_resource(Resource::new(vec![
                    KeyValue::new("service.name", service_name.to_string()),
                    KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                ])),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)?;

    let registry = Registry::default().with(env_filter(level));
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().pretty().with_line_number(true))
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .init();
    }

    Ok(())
}

/// Initializes tracing from the environment.
///
/// - `JAEGER_ENDPOINT`: Jaeger agent endpoint (default: jaeger:6831)
/// - `SERVICE_NAME`: service name (default: facerec-rest)
pub fn init_from_env(level: &str, json: bool) -> Result<(), TraceError> {
    let jaeger_endpoint =
        std::env::var("JAEGER_ENDPOINT").unwrap_or_else(|_| "jaeger:6831".to_string());
    let service_name = std::env::var("SERVICE_NAME").unwrap_or_else(|_| SERVICE_NAME.to_string());

    init_tracing(&service_name, &jaeger_endpoint, level, json)
}

/// Flushes pending spans and shuts the tracer provider down.
pub fn shutdown() {
    global::shutdown_tracer_provider();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_is_used_without_rust_log() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        assert_eq!(env_filter("debug").to_string(), "debug");
    }
}
