use std::fmt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::error::{GatewayError, GatewayResult};

/// An external program invocation prefix, e.g. `python3 generate_biometric_id.py`.
///
/// Per-call operands (image and gallery paths) are appended after `args`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Captured result of one program run.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Standard output followed by standard error, for diagnostics.
    #[must_use]
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (_, true) => self.stdout.trim().to_string(),
            (true, false) => self.stderr.trim().to_string(),
            (false, false) => format!("{}\n{}", self.stdout.trim(), self.stderr.trim()),
        }
    }
}

impl ScriptCommand {
    /// Creates a command with no fixed arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Runs `program` through an interpreter, e.g. `python3 script.py`.
    #[must_use]
    pub fn script(interpreter: impl Into<String>, script: impl Into<String>) -> Self {
        Self::new(interpreter).arg(script)
    }

    /// Appends a fixed argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Runs the command with `operands` appended and waits for it to exit.
    ///
    /// A non-zero exit is not an error here; callers decide how to treat
    /// it. The child is not killed if the returned future is dropped, so an
    /// abandoned request lets the program run to completion.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Spawn` when the program cannot be started.
    pub async fn run(&self, operands: &[&Path]) -> GatewayResult<ProcessOutput> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .args(operands)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| GatewayError::Spawn {
                program: self.to_string(),
                source,
            })?;

        Ok(ProcessOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Runs the command and fails unless it exits successfully.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::ExternalProcess` with the captured output on a
    /// non-zero exit, or `GatewayError::Spawn`.
    pub async fn run_checked(&self, operands: &[&Path]) -> GatewayResult<ProcessOutput> {
        let output = self.run(operands).await?;
        if !output.status.success() {
            return Err(GatewayError::ExternalProcess {
                program: self.to_string(),
                status: output.status.to_string(),
                output: output.combined(),
            });
        }
        Ok(output)
    }
}

impl fmt::Display for ScriptCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        // The interpreter's script is the useful part of the name.
        if let Some(first) = self.args.first() {
            write!(f, " {first}")?;
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> ScriptCommand {
        ScriptCommand::new("sh").arg("-c").arg(script).arg("gateway-test")
    }

    #[tokio::test]
    async fn appends_operands_after_fixed_args() {
        let output = sh("echo \"$1|$2\"")
            .run(&[Path::new("/tmp/a.jpeg"), Path::new("/tmp/g.npy")])
            .await
            .unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout.trim(), "/tmp/a.jpeg|/tmp/g.npy");
    }

    #[tokio::test]
    async fn non_zero_exit_carries_captured_output() {
        let err = sh("echo partial; echo boom >&2; exit 3")
            .run_checked(&[])
            .await
            .unwrap_err();
        match err {
            GatewayError::ExternalProcess { output, status, .. } => {
                assert_eq!(output, "partial\nboom");
                assert!(status.contains('3'));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let err = ScriptCommand::new("/nonexistent/facerec-helper")
            .run(&[])
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Spawn { .. }));
        assert!(err.is_process_failure());
    }

    #[test]
    fn display_names_interpreter_and_script() {
        let cmd = ScriptCommand::script("python3", "generate_biometric_id.py");
        assert_eq!(cmd.to_string(), "python3 generate_biometric_id.py");
    }
}
