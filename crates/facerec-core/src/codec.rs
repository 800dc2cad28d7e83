//! Textual array encoding used to persist biometric vectors.
//!
//! Vectors are stored as array literals of the form `{0.123456,-1.500000}`,
//! which PostgreSQL accepts for `NUMERIC[]` columns and SQLite stores
//! verbatim in a `TEXT` column. Every component is written with
//! [`VECTOR_TEXT_PRECISION`] fractional digits.

use std::fmt::Write;

use crate::error::{CoreError, CoreResult};
use crate::user::BiometricVector;

/// Fractional digits kept for each stored component.
pub const VECTOR_TEXT_PRECISION: usize = 6;

/// Encodes a vector as a fixed-precision array literal.
#[must_use]
pub fn encode_vector(vector: &BiometricVector) -> String {
    let mut out = String::with_capacity(vector.dimension() * 12 + 2);
    out.push('{');
    for (i, value) in vector.as_slice().iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        // Writing into a String cannot fail.
        let _ = write!(out, "{value:.prec$}", prec = VECTOR_TEXT_PRECISION);
    }
    out.push('}');
    out
}

/// Decodes an array literal produced by [`encode_vector`] or by the
/// database's own array output.
///
/// # Errors
///
/// Returns `CoreError::DeserializationError` when the literal is not a
/// brace-delimited list of finite numbers.
pub fn decode_vector(literal: &str) -> CoreResult<BiometricVector> {
    let inner = literal
        .trim()
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .ok_or_else(|| {
            CoreError::DeserializationError(format!("not an array literal: {literal:?}"))
        })?;

    let values = inner
        .split(',')
        .map(|part| {
            let part = part.trim().trim_matches('"');
            part.parse::<f64>().map_err(|e| {
                CoreError::DeserializationError(format!("invalid vector component {part:?}: {e}"))
            })
        })
        .collect::<CoreResult<Vec<f64>>>()?;

    BiometricVector::new(values).map_err(|e| CoreError::DeserializationError(e.to_string()))
}
