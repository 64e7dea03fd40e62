//! BDD step definitions for teardown behaviour.

use oadp_dr::test_support::{
    json_attached_policies, json_resource, json_resource_list, json_storage_location,
};
use oadp_dr::{StepStatus, TeardownRequest};
use rstest_bdd_macros::{given, then, when};

use super::test_helpers::{
    BASELINE_ARN, COMPANION_ARN, TeardownContext, TeardownOutcome, build_pipeline, positions,
};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("a live teardown for cluster \"{cluster_id}\" on management cluster \"{mc_name}\"")]
fn live_teardown(
    mut teardown_context: TeardownContext,
    cluster_id: String,
    mc_name: String,
) -> TeardownContext {
    let request = TeardownRequest::live(&cluster_id, &mc_name, Some("dr"))
        .unwrap_or_else(|err| panic!("live request should be valid: {err}"));
    teardown_context.request = Some(request);
    teardown_context.live_cluster_id = Some(cluster_id.trim().to_owned());
    teardown_context
}

#[given("a manifest teardown for role \"{role}\" and bucket \"{bucket}\"")]
fn manifest_teardown(
    mut teardown_context: TeardownContext,
    role: String,
    bucket: String,
) -> TeardownContext {
    let request = TeardownRequest::manifest(&role, &bucket, None)
        .unwrap_or_else(|err| panic!("manifest request should be valid: {err}"));
    teardown_context.request = Some(request);
    teardown_context
}

#[given("the storage location records bucket \"{bucket}\"")]
fn storage_location_records_bucket(
    teardown_context: TeardownContext,
    bucket: String,
) -> TeardownContext {
    teardown_context
        .runner
        .push_stdout(json_storage_location("abc123-hourly", bucket.trim()));
    teardown_context
}

#[given("the storage location is missing")]
fn storage_location_missing(teardown_context: TeardownContext) -> TeardownContext {
    teardown_context.runner.push_failure(
        1,
        "Error from server (NotFound): backupstoragelocations.velero.io \"abc123-hourly\" not found",
    );
    teardown_context
}

#[given("the role has two attached policies that detach cleanly")]
fn role_detaches_cleanly(teardown_context: TeardownContext) -> TeardownContext {
    let runner = &teardown_context.runner;
    runner.push_stdout(json_attached_policies(&[BASELINE_ARN, COMPANION_ARN]));
    runner.push_success(); // detach baseline
    runner.push_success(); // detach companion
    runner.push_success(); // delete role
    teardown_context
}

#[given("the role has two attached policies and the first detach is denied")]
fn first_detach_denied(teardown_context: TeardownContext) -> TeardownContext {
    let runner = &teardown_context.runner;
    runner.push_stdout(json_attached_policies(&[BASELINE_ARN, COMPANION_ARN]));
    runner.push_failure(254, "An error occurred (AccessDenied) when calling DetachRolePolicy");
    runner.push_success();
    teardown_context
}

#[given("the bucket deletion succeeds")]
fn bucket_deletion_succeeds(teardown_context: TeardownContext) -> TeardownContext {
    teardown_context.runner.push_success();
    teardown_context
}

#[given("every cluster resource exists")]
fn cluster_resources_exist(teardown_context: TeardownContext) -> TeardownContext {
    let runner = &teardown_context.runner;
    runner.push_stdout(json_resource("BackupStorageLocation", "abc123-hourly"));
    runner.push_success();
    runner.push_stdout(json_resource("Schedule", "abc123-hourly"));
    runner.push_success();
    runner.push_stdout(json_resource_list("Backup", &["abc123-hourly-20240101"]));
    runner.push_success();
    runner.push_stdout(json_resource_list("Secret", &["abc123-cloud-credentials"]));
    runner.push_success();
    runner.push_stdout(json_resource_list(
        "BackupRepository",
        &["abc123-default-kopia"],
    ));
    runner.push_success();
    teardown_context
}

#[when("I run the teardown")]
fn run_teardown(mut teardown_context: TeardownContext) -> TeardownContext {
    let request = teardown_context
        .request
        .clone()
        .unwrap_or_else(|| panic!("test setup requires a teardown request"));
    let pipeline = build_pipeline(&teardown_context.runner);
    let manifest = oadp_dr::ManifestResolver::default();
    let result = match teardown_context.live_cluster_id.as_deref() {
        Some(cluster_id) => pipeline.run(&request, &pipeline.live_resolver(cluster_id)),
        None => pipeline.run(&request, &pipeline.verified_manifest(&manifest)),
    };
    teardown_context.outcome = Some(match result {
        Ok(report) => TeardownOutcome::Completed(report),
        Err(err) => TeardownOutcome::Failed(err.to_string()),
    });
    teardown_context
}

#[then("the policies are detached before the role is deleted")]
fn detached_before_delete(teardown_context: &TeardownContext) -> Result<(), StepError> {
    let found = positions(
        &teardown_context.runner,
        &[
            &format!("detach-role-policy --role-name rosa-hcp-bkp-hs-mc-1-abc123 --policy-arn {BASELINE_ARN}"),
            &format!("--policy-arn {COMPANION_ARN}"),
            "iam delete-role",
        ],
    );
    match found.as_slice() {
        [Some(first), Some(second), Some(delete)] if first < delete && second < delete => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected both detaches before delete-role, got positions {other:?}"
        ))),
    }
}

#[then("the bucket \"{bucket}\" is force deleted")]
fn bucket_force_deleted(teardown_context: &TeardownContext, bucket: String) -> Result<(), StepError> {
    let expected = format!("aws s3 rb s3://{} --force", bucket.trim());
    let invocations = teardown_context.runner.invocations();
    if invocations
        .iter()
        .any(|call| call.command_string().starts_with(&expected))
    {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "missing `{expected}` in {invocations:?}"
        )))
    }
}

#[then("the teardown reports no failures")]
fn reports_no_failures(teardown_context: &TeardownContext) -> Result<(), StepError> {
    match teardown_context.outcome.as_ref() {
        Some(TeardownOutcome::Completed(report)) if !report.has_failures() => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected a clean teardown, got {other:?}"
        ))),
    }
}

#[then("the teardown reports failures")]
fn reports_failures(teardown_context: &TeardownContext) -> Result<(), StepError> {
    match teardown_context.outcome.as_ref() {
        Some(TeardownOutcome::Completed(report)) if report.has_failures() => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected a partial failure, got {other:?}"
        ))),
    }
}

#[then("the teardown fails before deleting anything")]
fn fails_before_deleting(teardown_context: &TeardownContext) -> Result<(), StepError> {
    let Some(TeardownOutcome::Failed(message)) = teardown_context.outcome.as_ref() else {
        return Err(StepError::Assertion(String::from(
            "expected teardown to fail",
        )));
    };
    if !message.contains("abc123-hourly") {
        return Err(StepError::Assertion(format!(
            "error should name the storage location: {message}"
        )));
    }
    let invocations = teardown_context.runner.invocations();
    if invocations.len() == 1 {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected only the discovery call, got {invocations:?}"
        )))
    }
}

#[then("the role is not deleted")]
fn role_not_deleted(teardown_context: &TeardownContext) -> Result<(), StepError> {
    let invocations = teardown_context.runner.invocations();
    if invocations
        .iter()
        .any(|call| call.is("aws", &["iam", "delete-role"]))
    {
        return Err(StepError::Assertion(String::from(
            "delete-role must not run while policies remain attached",
        )));
    }
    let Some(TeardownOutcome::Completed(report)) = teardown_context.outcome.as_ref() else {
        return Err(StepError::Assertion(String::from("missing report")));
    };
    match report
        .find("delete role rosa-hcp-bkp-hs-mc-1-abc123")
        .map(|outcome| &outcome.status)
    {
        Some(StepStatus::Failed(_)) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected the role step to be recorded as failed, got {other:?}"
        ))),
    }
}
