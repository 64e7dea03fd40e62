//! Shared fixtures and helpers for provisioning BDD scenarios.

use oadp_dr::test_support::{CommandInvocation, ScriptedRunner};
use oadp_dr::{
    ClusterContext, CommandExecutor, ProvisionReport, ProvisionSettings, ProvisioningPipeline,
    Tools,
};
use rstest::fixture;
use serde_json::Value;

pub const BUCKET: &str = "rosa-hcp-backup-oadp-scenario";
pub const ROLE_ARN: &str = "arn:aws:iam::123456789012:role/rosa-hcp-bkp-hs-mc-1-abc123";
pub const KEY_ARN: &str = "arn:aws:kms:us-west-2:123456789012:key/5d9a";
pub const COMPANION_ARN: &str = "arn:aws:iam::123456789012:policy/AllowSSEKMSBackupKey-abc123";
pub const ISSUER_URL: &str = "https://oidc.example/2juqamhd";
pub const PROVIDER_ARN: &str = "arn:aws:iam::123456789012:oidc-provider/oidc.example/2juqamhd";
pub const ADMIN_ARN: &str = "arn:aws:iam::123456789012:role/dr-key-admin";

#[derive(Clone, Debug)]
pub enum ProvisionOutcome {
    Completed(ProvisionReport),
    Aborted { step: String, completed_steps: usize },
}

#[derive(Clone, Debug)]
pub struct ProvisionContext {
    pub runner: ScriptedRunner,
    pub cluster: Option<ClusterContext>,
    pub outcome: Option<ProvisionOutcome>,
}

#[fixture]
pub fn provision_context() -> ProvisionContext {
    ProvisionContext {
        runner: ScriptedRunner::new(),
        cluster: None,
        outcome: None,
    }
}

fn scenario_bucket() -> String {
    String::from(BUCKET)
}

pub fn build_pipeline(runner: &ScriptedRunner) -> ProvisioningPipeline<ScriptedRunner> {
    ProvisioningPipeline::new(
        CommandExecutor::new(runner.clone(), Tools::default()),
        ProvisionSettings::new(ADMIN_ARN),
    )
    .with_bucket_namer(scenario_bucket)
}

/// Value following `flag` in the first `aws` invocation starting with
/// `leading`.
pub fn aws_flag_value(runner: &ScriptedRunner, leading: &[&str], flag: &str) -> Option<String> {
    let calls = runner.invocations();
    let call = calls.iter().find(|call| call.is("aws", leading))?;
    flag_value(call, flag)
}

fn flag_value(call: &CommandInvocation, flag: &str) -> Option<String> {
    let mut args = call.args.iter().map(|arg| arg.to_string_lossy());
    args.by_ref().find(|arg| arg == flag)?;
    args.next().map(std::borrow::Cow::into_owned)
}

/// Parses a JSON policy document passed on the command line.
pub fn policy_document(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}
