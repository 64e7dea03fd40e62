//! Errors raised by the command executor.

use thiserror::Error;

const ALREADY_EXISTS_SIGNATURES: [&str; 3] =
    ["EntityAlreadyExists", "AlreadyExists", "already exists"];
const NOT_FOUND_SIGNATURES: [&str; 4] = ["NotFound", "NoSuchEntity", "NoSuchBucket", "not found"];

/// Failure to run an external program or a non-zero exit from it.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ExecError {
    /// Raised when the program cannot be started at all.
    #[error("failed to start {program}: {message}")]
    Spawn {
        /// Program that could not be started.
        program: String,
        /// Operating system error message.
        message: String,
    },
    /// Raised when the program exits unsuccessfully.
    #[error("{program} exited with status {status_text}: {stderr}")]
    Execution {
        /// Program that failed.
        program: String,
        /// Exit status reported by the OS, if any.
        status: Option<i32>,
        /// Human readable representation of the exit status.
        status_text: String,
        /// Stderr captured from the program.
        stderr: String,
    },
}

impl ExecError {
    /// Returns the captured stderr for execution failures.
    #[must_use]
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Execution { stderr, .. } => Some(stderr.as_str()),
            Self::Spawn { .. } => None,
        }
    }

    /// Returns `true` when stderr carries an idempotent-conflict signature,
    /// meaning the resource being created is already present.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        self.stderr_contains_any(&ALREADY_EXISTS_SIGNATURES)
    }

    /// Returns `true` when stderr reports that the addressed resource does
    /// not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.stderr_contains_any(&NOT_FOUND_SIGNATURES)
    }

    fn stderr_contains_any(&self, needles: &[&str]) -> bool {
        self.stderr()
            .is_some_and(|stderr| needles.iter().any(|needle| stderr.contains(needle)))
    }
}
