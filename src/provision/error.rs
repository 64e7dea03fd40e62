//! Errors raised by the provisioning pipeline.

use thiserror::Error;

use crate::report::Report;
use crate::state::StateError;

use super::ProvisionStep;

/// Raised when a step with [`crate::report::FailurePolicy::Abort`] fails.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// A fatal step failed; later steps did not run.
    #[error("provisioning aborted at {step}: {source}")]
    Aborted {
        /// Step that failed.
        step: ProvisionStep,
        /// Underlying failure.
        #[source]
        source: StateError,
        /// Outcomes of the steps that ran before the failure.
        completed: Box<Report>,
    },
}

impl ProvisionError {
    /// Step at which provisioning stopped.
    #[must_use]
    pub const fn step(&self) -> ProvisionStep {
        match self {
            Self::Aborted { step, .. } => *step,
        }
    }

    /// Outcomes recorded before the abort.
    #[must_use]
    pub fn completed(&self) -> &Report {
        match self {
            Self::Aborted { completed, .. } => completed,
        }
    }
}
