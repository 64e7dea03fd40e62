//! BDD step definitions for provisioning behaviour.

use oadp_dr::test_support::{ENTITY_EXISTS_STDERR, json_attached_policies};
use oadp_dr::{ClusterContext, ProvisionStep, StepStatus};
use rstest_bdd_macros::{given, then, when};

use super::test_helpers::{
    ADMIN_ARN, COMPANION_ARN, ISSUER_URL, KEY_ARN, PROVIDER_ARN, ProvisionContext, ProvisionOutcome,
    ROLE_ARN, aws_flag_value, build_pipeline, policy_document,
};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given(
    "a cluster \"{cluster_id}\" named \"{cluster_name}\" on management cluster \"{mc_name}\" in \"{region}\""
)]
fn cluster_identity(
    mut provision_context: ProvisionContext,
    cluster_id: String,
    cluster_name: String,
    mc_name: String,
    region: String,
) -> ProvisionContext {
    let cluster = ClusterContext::new(
        &cluster_id,
        &cluster_name,
        "staging",
        &mc_name,
        "dr",
        &region,
    )
    .unwrap_or_else(|err| panic!("cluster identity should be valid: {err}"));
    provision_context.cluster = Some(cluster);
    provision_context
}

#[given("the cluster reports ready")]
fn cluster_ready(provision_context: ProvisionContext) -> ProvisionContext {
    provision_context
        .runner
        .push_stdout("ID: 2b1c\nName: demo\nState: ready\n");
    provision_context
}

#[given("the bucket can be created")]
fn bucket_created(provision_context: ProvisionContext) -> ProvisionContext {
    provision_context.runner.push_success();
    provision_context
}

#[given("the management cluster trust can be discovered")]
fn trust_discovered(provision_context: ProvisionContext) -> ProvisionContext {
    let runner = &provision_context.runner;
    runner.push_stdout("/api/clusters_mgmt/v1/clusters/2b1c\n");
    runner.push_stdout(format!("{ISSUER_URL}\n"));
    runner.push_stdout(format!(
        "arn:aws:iam::123456789012:oidc-provider/other.example/x\n{PROVIDER_ARN}\n"
    ));
    provision_context
}

#[given("the management cluster is not registered")]
fn management_cluster_unregistered(provision_context: ProvisionContext) -> ProvisionContext {
    provision_context.runner.push_stdout("");
    provision_context
}

fn script_key_and_attachments(provision_context: &ProvisionContext) {
    let runner = &provision_context.runner;
    runner.push_stdout(format!("{KEY_ARN}\n")); // create key
    runner.push_success(); // key policy
}

#[given("the role and policy do not exist yet")]
fn fresh_identity(provision_context: ProvisionContext) -> ProvisionContext {
    let runner = &provision_context.runner;
    runner.push_success(); // create role
    runner.push_stdout(format!("{ROLE_ARN}\n"));
    runner.push_success(); // attach baseline
    script_key_and_attachments(&provision_context);
    runner.push_success(); // create policy
    runner.push_stdout(format!("{COMPANION_ARN}\n"));
    runner.push_success(); // attach companion
    runner.push_stdout(json_attached_policies(&[
        "arn:aws:iam::aws:policy/AmazonS3FullAccess",
        COMPANION_ARN,
    ]));
    provision_context
}

#[given("the role and policy already exist")]
fn existing_identity(provision_context: ProvisionContext) -> ProvisionContext {
    let runner = &provision_context.runner;
    runner.push_failure(254, ENTITY_EXISTS_STDERR);
    runner.push_stdout(format!("{ROLE_ARN}\n"));
    runner.push_success();
    script_key_and_attachments(&provision_context);
    runner.push_failure(
        254,
        "An error occurred (EntityAlreadyExists) when calling the CreatePolicy operation",
    );
    runner.push_stdout(format!("{COMPANION_ARN}\n"));
    runner.push_success();
    runner.push_stdout(json_attached_policies(&[
        "arn:aws:iam::aws:policy/AmazonS3FullAccess",
        COMPANION_ARN,
    ]));
    provision_context
}

#[when("I provision the cluster")]
fn provision_cluster(mut provision_context: ProvisionContext) -> ProvisionContext {
    let cluster = provision_context
        .cluster
        .clone()
        .unwrap_or_else(|| panic!("test setup requires a cluster identity"));
    let result = build_pipeline(&provision_context.runner).run(&cluster);
    provision_context.outcome = Some(match result {
        Ok(report) => ProvisionOutcome::Completed(report),
        Err(err) => ProvisionOutcome::Aborted {
            step: err.step().name().to_owned(),
            completed_steps: err.completed().outcomes().len(),
        },
    });
    provision_context
}

#[then("provisioning succeeds without failures")]
fn succeeds_without_failures(provision_context: &ProvisionContext) -> Result<(), StepError> {
    match provision_context.outcome.as_ref() {
        Some(ProvisionOutcome::Completed(outcome))
            if !outcome.report.has_failures()
                && outcome.role_arn == ROLE_ARN
                && outcome.key_arn == KEY_ARN
                && outcome.companion_policy_arn == COMPANION_ARN =>
        {
            Ok(())
        }
        other => Err(StepError::Assertion(format!(
            "expected a clean provisioning run, got {other:?}"
        ))),
    }
}

#[then("the role trusts the management cluster issuer")]
fn role_trusts_issuer(provision_context: &ProvisionContext) -> Result<(), StepError> {
    let document = aws_flag_value(
        &provision_context.runner,
        &["iam", "create-role"],
        "--assume-role-policy-document",
    )
    .and_then(|text| policy_document(&text))
    .ok_or_else(|| StepError::Assertion(String::from("create-role carried no trust policy")))?;
    let statement = document
        .get("Statement")
        .and_then(|statements| statements.get(0))
        .ok_or_else(|| StepError::Assertion(format!("no statement in {document}")))?;
    let federated = statement
        .pointer("/Principal/Federated")
        .and_then(serde_json::Value::as_str);
    let subject = statement
        .pointer("/Condition/StringEquals")
        .and_then(|conditions| conditions.get("oidc.example/2juqamhd:sub"))
        .and_then(serde_json::Value::as_str);
    if federated == Some(PROVIDER_ARN)
        && subject == Some("system:serviceaccount:openshift-adp:velero")
    {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "unexpected trust statement: {statement}"
        )))
    }
}

#[then("the encryption key is granted to the role")]
fn key_granted_to_role(provision_context: &ProvisionContext) -> Result<(), StepError> {
    let key_id = aws_flag_value(
        &provision_context.runner,
        &["kms", "put-key-policy"],
        "--key-id",
    );
    let document = aws_flag_value(
        &provision_context.runner,
        &["kms", "put-key-policy"],
        "--policy",
    )
    .and_then(|text| policy_document(&text))
    .ok_or_else(|| StepError::Assertion(String::from("put-key-policy carried no policy")))?;
    let principal = document
        .pointer("/Statement/0/Principal/AWS")
        .and_then(serde_json::Value::as_str);
    let admin = document
        .pointer("/Statement/1/Condition/StringEquals")
        .and_then(|conditions| conditions.get("aws:PrincipalArn"))
        .and_then(serde_json::Value::as_str);
    if key_id.as_deref() == Some(KEY_ARN) && principal == Some(ROLE_ARN) && admin == Some(ADMIN_ARN)
    {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "key {key_id:?} has unexpected policy {document}"
        )))
    }
}

#[then("the role creation is reported as already existing")]
fn role_already_existed(provision_context: &ProvisionContext) -> Result<(), StepError> {
    let Some(ProvisionOutcome::Completed(outcome)) = provision_context.outcome.as_ref() else {
        return Err(StepError::Assertion(String::from(
            "expected provisioning to complete",
        )));
    };
    match outcome
        .report
        .find(ProvisionStep::CreateRole.name())
        .map(|entry| &entry.status)
    {
        Some(StepStatus::AlreadyExisted) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected the role to be reused, got {other:?}"
        ))),
    }
}

#[then("provisioning aborts at OIDC discovery")]
fn aborts_at_oidc_discovery(provision_context: &ProvisionContext) -> Result<(), StepError> {
    match provision_context.outcome.as_ref() {
        Some(ProvisionOutcome::Aborted {
            step,
            completed_steps,
        }) if step == ProvisionStep::DiscoverOidc.name() && *completed_steps == 2 => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected an abort at OIDC discovery, got {other:?}"
        ))),
    }
}

#[then("no role is created")]
fn no_role_created(provision_context: &ProvisionContext) -> Result<(), StepError> {
    let invocations = provision_context.runner.invocations();
    if invocations
        .iter()
        .any(|call| call.is("aws", &["iam", "create-role"]))
    {
        Err(StepError::Assertion(format!(
            "create-role ran despite the abort: {invocations:?}"
        )))
    } else {
        Ok(())
    }
}
