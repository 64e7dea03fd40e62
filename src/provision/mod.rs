//! Provisioning pipeline for a hosted cluster's disaster recovery resources.
//!
//! The pipeline runs a fixed sequence of cloud calls: bucket, identity trust,
//! role, baseline policy, encryption key, key policy and companion policy.
//! Each [`ProvisionStep`] declares a [`FailurePolicy`]; aborting steps stop
//! the run with a [`ProvisionError`] carrying the outcomes recorded so far.

mod error;
mod step;

use std::ffi::OsString;

use tracing::{error, info, warn};

use crate::context::ClusterContext;
use crate::exec::{CommandExecutor, CommandRunner, ProcessCommandRunner, Tools, aws_argv};
use crate::naming::generate_bucket_name;
use crate::policy::{companion_policy, key_policy, trust_policy};
use crate::report::{FailurePolicy, Report, StepStatus};
use crate::state::{Extraction, ExternalStateReader, StateError, extract_scalar};

pub use error::ProvisionError;
pub use step::ProvisionStep;

/// Region whose storage API rejects an explicit location constraint.
const DEFAULT_STORAGE_REGION: &str = "us-east-1";

/// Service account subject trusted by the backup role unless configured.
pub const DEFAULT_SERVICE_ACCOUNT_SUBJECT: &str = "system:serviceaccount:openshift-adp:velero";

/// Managed policy granting the role storage access unless configured.
pub const DEFAULT_BASELINE_POLICY_ARN: &str = "arn:aws:iam::aws:policy/AmazonS3FullAccess";

/// Security-relevant choices applied while provisioning.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProvisionSettings {
    /// Service account subject trusted by the role.
    pub service_account_subject: String,
    /// Managed policy attached to the role for storage access.
    pub baseline_policy_arn: String,
    /// Principal granted full control of every key. It has no default: the
    /// operator names it explicitly.
    pub kms_admin_principal: String,
    /// Substring selecting the identity provider ARN. When unset the provider
    /// whose ARN ends with the issuer host path is used.
    pub oidc_provider_match: Option<String>,
}

impl ProvisionSettings {
    /// Creates settings with the default subject and baseline policy.
    #[must_use]
    pub fn new(kms_admin_principal: impl Into<String>) -> Self {
        Self {
            service_account_subject: DEFAULT_SERVICE_ACCOUNT_SUBJECT.to_owned(),
            baseline_policy_arn: DEFAULT_BASELINE_POLICY_ARN.to_owned(),
            kms_admin_principal: kms_admin_principal.into(),
            oidc_provider_match: None,
        }
    }
}

/// Identifiers created or reused by a completed run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProvisionReport {
    /// Per-step outcomes in execution order.
    pub report: Report,
    /// Bucket name, absent when bucket creation failed.
    pub bucket_name: Option<String>,
    /// Backup role name.
    pub role_name: String,
    /// Backup role ARN.
    pub role_arn: String,
    /// Encryption key ARN.
    pub key_arn: String,
    /// Companion policy name.
    pub companion_policy_name: String,
    /// Companion policy ARN.
    pub companion_policy_arn: String,
    /// Policies attached to the role at the end of the run, empty when the
    /// read-back failed.
    pub attached_policy_arns: Vec<String>,
}

/// Advisory classification of a cluster description.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClusterHealth {
    /// The description reports a ready or installing cluster.
    Healthy,
    /// Neither state was reported.
    Unknown,
}

/// Classifies the free-text cluster description.
#[must_use]
pub fn classify_health(description: &str) -> ClusterHealth {
    if description.contains("ready") || description.contains("installing") {
        ClusterHealth::Healthy
    } else {
        ClusterHealth::Unknown
    }
}

/// Runs the provisioning steps against a [`CommandExecutor`].
#[derive(Debug)]
pub struct ProvisioningPipeline<R: CommandRunner> {
    exec: CommandExecutor<R>,
    settings: ProvisionSettings,
    bucket_namer: fn() -> String,
}

impl ProvisioningPipeline<ProcessCommandRunner> {
    /// Creates a pipeline that runs real processes.
    #[must_use]
    pub const fn with_process_runner(tools: Tools, settings: ProvisionSettings) -> Self {
        Self::new(CommandExecutor::with_process_runner(tools), settings)
    }
}

impl<R: CommandRunner> ProvisioningPipeline<R> {
    /// Creates a pipeline over an existing executor.
    #[must_use]
    pub const fn new(exec: CommandExecutor<R>, settings: ProvisionSettings) -> Self {
        Self {
            exec,
            settings,
            bucket_namer: generate_bucket_name,
        }
    }

    /// Overrides bucket name generation.
    #[must_use]
    pub const fn with_bucket_namer(mut self, namer: fn() -> String) -> Self {
        self.bucket_namer = namer;
        self
    }

    /// Runs every step for `context`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Aborted`] when a step whose policy is
    /// [`FailurePolicy::Abort`] fails.
    pub fn run(&self, context: &ClusterContext) -> Result<ProvisionReport, ProvisionError> {
        let reader = ExternalStateReader::new(&self.exec);
        let profile = Some(context.aws_profile());
        let region = context.aws_region();
        let mut report = Report::new();

        info!(
            cluster_id = context.cluster_id(),
            management_cluster = context.management_cluster_name(),
            region,
            "starting provisioning"
        );

        self.check_health(&reader, context, &mut report)?;
        let bucket_name = self.create_bucket(context, &mut report);

        announce(ProvisionStep::DiscoverOidc);
        let trust = required(
            &mut report,
            ProvisionStep::DiscoverOidc,
            reader.oidc_trust(
                context.management_cluster_name(),
                region,
                profile,
                self.settings.oidc_provider_match.as_deref(),
            ),
        )?;

        let role_name = context.role_name();
        let trust_document = trust_policy(
            trust.provider_arn(),
            trust.issuer_host_path(),
            &self.settings.service_account_subject,
        )
        .to_string();
        let description = format!("backup-role for cluster {}", context.cluster_id());
        self.create_idempotent(
            &mut report,
            ProvisionStep::CreateRole,
            &aws_argv(
                &[
                    "iam",
                    "create-role",
                    "--role-name",
                    &role_name,
                    "--assume-role-policy-document",
                    &trust_document,
                    "--description",
                    &description,
                ],
                profile,
            ),
        )?;

        announce(ProvisionStep::ResolveRoleArn);
        let role_arn = required(
            &mut report,
            ProvisionStep::ResolveRoleArn,
            reader.role_arn(&role_name, profile),
        )?;

        self.attach_policy(
            &mut report,
            ProvisionStep::AttachBaselinePolicy,
            &role_name,
            &self.settings.baseline_policy_arn,
            profile,
        )?;

        let key_arn = self.create_key(context, &mut report)?;

        let key_document = key_policy(&role_arn, &self.settings.kms_admin_principal).to_string();
        self.run_required(
            &mut report,
            ProvisionStep::PutKeyPolicy,
            &aws_argv(
                &[
                    "kms",
                    "put-key-policy",
                    "--key-id",
                    &key_arn,
                    "--policy-name",
                    "default",
                    "--region",
                    region,
                    "--policy",
                    &key_document,
                ],
                profile,
            ),
        )?;

        let companion_policy_name = context.kms_policy_name();
        let companion_document = companion_policy(&key_arn).to_string();
        self.create_idempotent(
            &mut report,
            ProvisionStep::CreateCompanionPolicy,
            &aws_argv(
                &[
                    "iam",
                    "create-policy",
                    "--policy-name",
                    &companion_policy_name,
                    "--policy-document",
                    &companion_document,
                ],
                profile,
            ),
        )?;

        announce(ProvisionStep::ResolveCompanionPolicyArn);
        let companion_policy_arn = required(
            &mut report,
            ProvisionStep::ResolveCompanionPolicyArn,
            reader.policy_arn(&companion_policy_name, profile),
        )?;

        self.attach_policy(
            &mut report,
            ProvisionStep::AttachCompanionPolicy,
            &role_name,
            &companion_policy_arn,
            profile,
        )?;

        announce(ProvisionStep::VerifyAttachments);
        let attached_policy_arns = best_effort(
            &mut report,
            ProvisionStep::VerifyAttachments,
            reader.attached_policy_arns(&role_name, profile),
        )
        .unwrap_or_default();
        info!(role = %role_name, attached = ?attached_policy_arns, "attached role policies");

        Ok(ProvisionReport {
            report,
            bucket_name,
            role_name,
            role_arn,
            key_arn,
            companion_policy_name,
            companion_policy_arn,
            attached_policy_arns,
        })
    }

    fn check_health(
        &self,
        reader: &ExternalStateReader<'_, R>,
        context: &ClusterContext,
        report: &mut Report,
    ) -> Result<(), ProvisionError> {
        let step = ProvisionStep::HealthCheck;
        info!(step = step.name(), cluster = context.cluster_name(), "running step");
        let description = reader
            .cluster_description(context.cluster_name())
            .map_err(|err| abort(step, err, report))?;
        match classify_health(&description) {
            ClusterHealth::Healthy => report.record(step.name(), StepStatus::Done),
            ClusterHealth::Unknown => {
                warn!(
                    cluster = context.cluster_name(),
                    "cluster reports neither ready nor installing; continuing"
                );
                report.record(
                    step.name(),
                    StepStatus::Warned(String::from(
                        "cluster reports neither ready nor installing",
                    )),
                );
            }
        }
        Ok(())
    }

    fn create_bucket(&self, context: &ClusterContext, report: &mut Report) -> Option<String> {
        let step = ProvisionStep::CreateBucket;
        let bucket_name = (self.bucket_namer)();
        let region = context.aws_region();
        let constraint = format!("LocationConstraint={region}");
        let mut parts = vec![
            "s3api",
            "create-bucket",
            "--bucket",
            bucket_name.as_str(),
            "--region",
            region,
        ];
        if region != DEFAULT_STORAGE_REGION {
            parts.extend(["--create-bucket-configuration", constraint.as_str()]);
        }
        let args = aws_argv(&parts, Some(context.aws_profile()));
        let created = best_effort(report, step, self.invoke(step, &args));
        created.map(|()| bucket_name)
    }

    fn create_key(
        &self,
        context: &ClusterContext,
        report: &mut Report,
    ) -> Result<String, ProvisionError> {
        let step = ProvisionStep::CreateKey;
        let description = format!("SSE-KMS backup key: {}", context.cluster_id());
        let owner_tag = format!("TagKey=Owner,TagValue={}", context.cluster_env());
        let cluster_tag = format!("TagKey=cluster,TagValue={}", context.cluster_id());
        let args = aws_argv(
            &[
                "kms",
                "create-key",
                "--description",
                &description,
                "--key-usage",
                "ENCRYPT_DECRYPT",
                "--key-spec",
                "SYMMETRIC_DEFAULT",
                "--tags",
                &owner_tag,
                &cluster_tag,
                "--region",
                context.aws_region(),
                "--query",
                "KeyMetadata.Arn",
                "--output",
                "text",
            ],
            Some(context.aws_profile()),
        );
        announce(step);
        let key_arn = self
            .exec
            .aws(&args)
            .map_err(StateError::from)
            .and_then(|output| extract_scalar(&output.stdout, Extraction::Trim, "key ARN"));
        required(report, step, key_arn)
    }

    fn attach_policy(
        &self,
        report: &mut Report,
        step: ProvisionStep,
        role_name: &str,
        policy_arn: &str,
        profile: Option<&str>,
    ) -> Result<(), ProvisionError> {
        let args = aws_argv(
            &[
                "iam",
                "attach-role-policy",
                "--role-name",
                role_name,
                "--policy-arn",
                policy_arn,
            ],
            profile,
        );
        self.run_required(report, step, &args)
    }

    fn invoke(&self, step: ProvisionStep, args: &[OsString]) -> Result<(), StateError> {
        announce(step);
        self.exec.aws(args)?;
        Ok(())
    }

    fn run_required(
        &self,
        report: &mut Report,
        step: ProvisionStep,
        args: &[OsString],
    ) -> Result<(), ProvisionError> {
        required(report, step, self.invoke(step, args))
    }

    fn create_idempotent(
        &self,
        report: &mut Report,
        step: ProvisionStep,
        args: &[OsString],
    ) -> Result<(), ProvisionError> {
        announce(step);
        match self.exec.aws(args) {
            Err(err) if err.is_already_exists() => {
                warn!(step = step.name(), "resource already exists; reusing it");
                report.record(step.name(), StepStatus::AlreadyExisted);
                Ok(())
            }
            result => required(report, step, result.map(drop).map_err(StateError::from)),
        }
    }
}

fn announce(step: ProvisionStep) {
    info!(step = step.name(), "running step");
}

/// Records a successful step or aborts the run.
fn required<T>(
    report: &mut Report,
    step: ProvisionStep,
    result: Result<T, StateError>,
) -> Result<T, ProvisionError> {
    debug_assert_eq!(step.failure_policy(), FailurePolicy::Abort);
    match result {
        Ok(value) => {
            report.record(step.name(), StepStatus::Done);
            Ok(value)
        }
        Err(err) => Err(abort(step, err, report)),
    }
}

/// Records the outcome of a step whose failure does not stop the run.
fn best_effort<T>(
    report: &mut Report,
    step: ProvisionStep,
    result: Result<T, StateError>,
) -> Option<T> {
    debug_assert_eq!(step.failure_policy(), FailurePolicy::Continue);
    match result {
        Ok(value) => {
            report.record(step.name(), StepStatus::Done);
            Some(value)
        }
        Err(err) => {
            error!(step = step.name(), error = %err, "step failed; continuing");
            report.record(step.name(), StepStatus::Failed(err.to_string()));
            None
        }
    }
}

fn abort(step: ProvisionStep, source: StateError, report: &Report) -> ProvisionError {
    error!(step = step.name(), error = %source, "step failed; aborting provisioning");
    ProvisionError::Aborted {
        step,
        source,
        completed: Box::new(report.clone()),
    }
}
