use thiserror::Error;

/// Error type for calls into the external face-processing programs.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The program could not be started at all.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran but exited unsuccessfully.
    #[error("`{program}` exited with {status}: {output}")]
    ExternalProcess {
        program: String,
        /// Exit status as reported by the OS.
        status: String,
        /// Captured standard output followed by standard error.
        output: String,
    },

    /// The program succeeded but its output does not follow the contract.
    #[error("`{program}` produced malformed output ({reason}): {output:?}")]
    MalformedOutput {
        program: String,
        reason: String,
        output: String,
    },

    /// Local I/O failure while preparing or reading gateway files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Creates a `MalformedOutput` variant.
    #[must_use]
    pub fn malformed(
        program: impl Into<String>,
        reason: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self::MalformedOutput {
            program: program.into(),
            reason: reason.into(),
            output: output.into(),
        }
    }

    /// Returns `true` when the external program misbehaved (failed to
    /// start or exited non-zero), as opposed to producing bad output.
    #[must_use]
    pub const fn is_process_failure(&self) -> bool {
        matches!(self, Self::Spawn { .. } | Self::ExternalProcess { .. })
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
