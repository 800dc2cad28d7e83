//! Subprocess-backed gateways.
//!
//! Each gateway runs its program once per call with the paths appended as
//! positional arguments. Nothing is retried: a failure is returned as-is.

use std::path::Path;

use async_trait::async_trait;
use facerec_core::{BiometricVector, UserId};

use crate::command::ScriptCommand;
use crate::error::GatewayResult;
use crate::parse::{parse_match_output, parse_vector_output};
use crate::provider::{FeatureExtractor, GalleryMatcher, GalleryWriter};

/// Runs the feature extraction program: `<command> <image>`.
#[derive(Debug, Clone)]
pub struct ProcessExtractor {
    command: ScriptCommand,
}

impl ProcessExtractor {
    #[must_use]
    pub const fn new(command: ScriptCommand) -> Self {
        Self { command }
    }
}

#[async_trait]
impl FeatureExtractor for ProcessExtractor {
    #[tracing::instrument(skip(self), fields(program = %self.command))]
    async fn extract(&self, image: &Path) -> GatewayResult<BiometricVector> {
        let output = self.command.run_checked(&[image]).await?;
        let vector = parse_vector_output(&self.command.to_string(), &output.stdout)?;
        tracing::debug!(dimension = vector.dimension(), "extracted biometric vector");
        Ok(vector)
    }
}

/// Runs the matching program: `<command> <probe> <gallery>`.
#[derive(Debug, Clone)]
pub struct ProcessMatcher {
    command: ScriptCommand,
}

impl ProcessMatcher {
    #[must_use]
    pub const fn new(command: ScriptCommand) -> Self {
        Self { command }
    }
}

#[async_trait]
impl GalleryMatcher for ProcessMatcher {
    #[tracing::instrument(skip(self), fields(program = %self.command))]
    async fn find_match(&self, probe: &Path, gallery: &Path) -> GatewayResult<Option<UserId>> {
        let output = self.command.run_checked(&[probe, gallery]).await?;
        parse_match_output(&self.command.to_string(), &output.stdout)
    }
}

/// Runs the gallery conversion program: `<command> <records.json> <destination>`.
#[derive(Debug, Clone)]
pub struct ProcessGalleryWriter {
    command: ScriptCommand,
}

impl ProcessGalleryWriter {
    #[must_use]
    pub const fn new(command: ScriptCommand) -> Self {
        Self { command }
    }
}

#[async_trait]
impl GalleryWriter for ProcessGalleryWriter {
    #[tracing::instrument(skip(self), fields(program = %self.command))]
    async fn write_gallery(&self, records: &Path, destination: &Path) -> GatewayResult<()> {
        self.command.run_checked(&[records, destination]).await?;
        Ok(())
    }
}
