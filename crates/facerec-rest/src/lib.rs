//! HTTP front end for the face registration service.

pub mod handlers;
pub mod rest;
pub mod tracing_init;

use std::sync::Arc;

use facerec_service::FaceService;

pub use rest::{build_app, build_router};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<FaceService>,
}

impl AppState {
    pub fn new(service: Arc<FaceService>) -> Self {
        Self { service }
    }
}
