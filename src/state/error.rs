//! Errors raised while reading external state.

use thiserror::Error;

use crate::exec::ExecError;

/// Failure to obtain a usable value from a cluster or cloud API.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum StateError {
    /// Raised when the extracted value is empty after trimming. The tools
    /// report "not found" as success with empty output, so this is the
    /// uniform not-found signal.
    #[error("no {what} was returned")]
    EmptyResult {
        /// Description of the expected value.
        what: String,
    },
    /// Raised when a structured response lacks the expected field.
    #[error("malformed {what} response: {message}")]
    MalformedResponse {
        /// Description of the response being parsed.
        what: String,
        /// Parser error message.
        message: String,
    },
    /// Raised when the underlying command fails.
    #[error(transparent)]
    Exec(#[from] ExecError),
}

impl StateError {
    /// Returns `true` when the underlying command reported a missing
    /// resource.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Exec(err) if err.is_not_found())
    }

    pub(crate) fn empty(what: &str) -> Self {
        Self::EmptyResult {
            what: what.to_owned(),
        }
    }

    pub(crate) fn malformed(what: &str, message: impl ToString) -> Self {
        Self::MalformedResponse {
            what: what.to_owned(),
            message: message.to_string(),
        }
    }
}
