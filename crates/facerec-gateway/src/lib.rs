//! Gateways to the external face-processing programs.
//!
//! Feature extraction, gallery matching and gallery conversion are owned by
//! external programs. This crate defines the trait boundary the service
//! talks to, subprocess implementations of it, and deterministic mocks for
//! tests.

mod command;
mod error;
mod mock;
pub mod parse;
mod process;
mod provider;

pub use command::{ProcessOutput, ScriptCommand};
pub use error::{GatewayError, GatewayResult};
pub use mock::{read_json_gallery, MockExtractor, MockGalleryWriter, MockMatcher};
pub use process::{ProcessExtractor, ProcessGalleryWriter, ProcessMatcher};
pub use provider::{FeatureExtractor, GalleryMatcher, GalleryWriter};
