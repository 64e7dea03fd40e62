//! Per-step outcomes shared by both pipelines.

use std::fmt;

/// What a pipeline does when a step fails.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailurePolicy {
    /// Stop the pipeline and return an error.
    Abort,
    /// Record the failure and carry on with the next step.
    Continue,
}

/// Result of a single step.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StepStatus {
    /// The step completed.
    Done,
    /// The resource was already present and was reused.
    AlreadyExisted,
    /// The step completed with an advisory finding.
    Warned(String),
    /// The step failed and the pipeline continued.
    Failed(String),
}

impl StepStatus {
    /// Returns `true` for [`StepStatus::Failed`].
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// A named step and its status.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StepOutcome {
    /// Human-readable step name.
    pub step: String,
    /// How the step ended.
    pub status: StepStatus,
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            StepStatus::Done => write!(formatter, "[ok]      {}", self.step),
            StepStatus::AlreadyExisted => write!(formatter, "[exists]  {}", self.step),
            StepStatus::Warned(message) => write!(formatter, "[warn]    {}: {message}", self.step),
            StepStatus::Failed(message) => write!(formatter, "[failed]  {}: {message}", self.step),
        }
    }
}

/// Ordered record of step outcomes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Report {
    outcomes: Vec<StepOutcome>,
}

impl Report {
    /// Creates an empty report.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            outcomes: Vec::new(),
        }
    }

    /// Appends an outcome.
    pub fn record(&mut self, step: impl Into<String>, status: StepStatus) {
        self.outcomes.push(StepOutcome {
            step: step.into(),
            status,
        });
    }

    /// Outcomes in the order the steps ran.
    #[must_use]
    pub fn outcomes(&self) -> &[StepOutcome] {
        &self.outcomes
    }

    /// Returns `true` when any step failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|outcome| outcome.status.is_failure())
    }

    /// Returns the outcome of the first step with the given name.
    #[must_use]
    pub fn find(&self, step: &str) -> Option<&StepOutcome> {
        self.outcomes.iter().find(|outcome| outcome.step == step)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            writeln!(formatter, "{outcome}")?;
        }
        Ok(())
    }
}
