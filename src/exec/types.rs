//! Captured process output and the seam tests replace with scripted runners.

use std::ffi::OsString;
use std::process::{Command, Stdio};

use super::ExecError;

/// Environment overrides applied to every spawned tool. The cloud CLI would
/// otherwise pipe long responses through an interactive pager.
const NON_INTERACTIVE_ENV: [(&str, &str); 1] = [("AWS_PAGER", "")];

/// Exit status and captured streams of one tool invocation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandOutput {
    /// Exit code, absent when the process was killed by a signal.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error; matched against error signatures.
    pub stderr: String,
}

impl CommandOutput {
    /// Builds output from raw process streams.
    ///
    /// Both streams are decoded lossily: cluster and cloud CLIs emit UTF-8,
    /// and a stray invalid byte becomes U+FFFD rather than discarding the
    /// stderr text that error classification depends on.
    #[must_use]
    pub fn from_streams(code: Option<i32>, stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            code,
            stdout: String::from_utf8_lossy(stdout).into_owned(),
            stderr: String::from_utf8_lossy(stderr).into_owned(),
        }
    }

    /// Returns `true` when the exit code equals zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.code, Some(0))
    }

    /// Exit status rendered for error messages.
    #[must_use]
    pub fn status_text(&self) -> String {
        self.code
            .map_or_else(|| String::from("unknown"), |code| code.to_string())
    }

    /// Converts an unsuccessful run of `program` into an execution error.
    #[must_use]
    pub fn into_execution_error(self, program: &str) -> ExecError {
        let status_text = self.status_text();
        ExecError::Execution {
            program: program.to_owned(),
            status: self.code,
            status_text,
            stderr: self.stderr,
        }
    }
}

/// Runs one external program. Implemented by the real process runner and
/// by scripted runners in tests.
pub trait CommandRunner {
    /// Runs `program` with the given arguments, capturing stdout and stderr.
    ///
    /// A non-zero exit is not an error at this level; callers inspect
    /// [`CommandOutput::code`].
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Spawn`] if the command cannot be started.
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, ExecError>;
}

/// Spawns host processes directly, without a shell, with stdin closed so no
/// tool can stop to prompt.
#[derive(Clone, Debug, Default)]
pub struct ProcessCommandRunner;

impl CommandRunner for ProcessCommandRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, ExecError> {
        let output = Command::new(program)
            .args(args)
            .envs(NON_INTERACTIVE_ENV)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| ExecError::Spawn {
                program: program.to_owned(),
                message: err.to_string(),
            })?;

        Ok(CommandOutput::from_streams(
            output.status.code(),
            &output.stdout,
            &output.stderr,
        ))
    }
}
