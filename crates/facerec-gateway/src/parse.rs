//! Parsers for the stdout contracts of the external programs.

use facerec_core::{BiometricVector, UserId};

use crate::error::{GatewayError, GatewayResult};

/// Sentinel the reference matcher prints when it finds no candidate.
pub const NO_MATCH_SENTINEL: &str = "None";

/// Parses extractor output: a JSON array of finite floats.
///
/// # Errors
///
/// Returns `GatewayError::MalformedOutput` for empty output, invalid JSON,
/// or an empty/non-finite vector.
pub fn parse_vector_output(program: &str, stdout: &str) -> GatewayResult<BiometricVector> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(GatewayError::malformed(
            program,
            "empty output, no face detected?",
            stdout,
        ));
    }

    let values: Vec<f64> = serde_json::from_str(trimmed)
        .map_err(|e| GatewayError::malformed(program, e.to_string(), stdout))?;

    BiometricVector::new(values).map_err(|e| GatewayError::malformed(program, e.to_string(), stdout))
}

/// Parses matcher output: empty or [`NO_MATCH_SENTINEL`] for no match,
/// otherwise a decimal user id.
///
/// # Errors
///
/// Returns `GatewayError::MalformedOutput` when the output is neither.
pub fn parse_match_output(program: &str, stdout: &str) -> GatewayResult<Option<UserId>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() || trimmed == NO_MATCH_SENTINEL {
        return Ok(None);
    }

    trimmed
        .parse::<UserId>()
        .map(Some)
        .map_err(|e| GatewayError::malformed(program, format!("not a user id: {e}"), stdout))
}
