//! Shared fixtures and helpers for teardown BDD scenarios.

use oadp_dr::test_support::{CommandInvocation, ScriptedRunner};
use oadp_dr::{CommandExecutor, Report, TeardownPipeline, TeardownRequest, Tools};
use rstest::fixture;

pub const NAMESPACE: &str = "openshift-adp";
pub const BASELINE_ARN: &str = "arn:aws:iam::aws:policy/AmazonS3FullAccess";
pub const COMPANION_ARN: &str = "arn:aws:iam::123456789012:policy/AllowSSEKMSBackupKey-abc123";

#[derive(Clone, Debug)]
pub enum TeardownOutcome {
    Completed(Report),
    Failed(String),
}

#[derive(Clone, Debug)]
pub struct TeardownContext {
    pub runner: ScriptedRunner,
    pub request: Option<TeardownRequest>,
    pub live_cluster_id: Option<String>,
    pub outcome: Option<TeardownOutcome>,
}

#[fixture]
pub fn teardown_context() -> TeardownContext {
    TeardownContext {
        runner: ScriptedRunner::new(),
        request: None,
        live_cluster_id: None,
        outcome: None,
    }
}

pub fn build_pipeline(runner: &ScriptedRunner) -> TeardownPipeline<ScriptedRunner> {
    TeardownPipeline::new(
        CommandExecutor::new(runner.clone(), Tools::default()),
        String::from(NAMESPACE),
    )
}

/// Position of the first invocation whose rendered command contains each
/// needle.
pub fn positions(runner: &ScriptedRunner, needles: &[&str]) -> Vec<Option<usize>> {
    let commands = runner
        .invocations()
        .iter()
        .map(CommandInvocation::command_string)
        .collect::<Vec<_>>();
    needles
        .iter()
        .map(|needle| commands.iter().position(|command| command.contains(needle)))
        .collect()
}
