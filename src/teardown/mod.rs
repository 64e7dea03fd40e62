//! Teardown pipeline removing a cluster's disaster recovery resources.
//!
//! The bucket is located first; failing that, nothing is deleted. Cloud
//! cleanup then runs (policies detached before the role is deleted, then
//! the bucket), followed by cluster resources in
//! [`ResourceKind::TEARDOWN_ORDER`]. Every deletion is best effort: a failure
//! is recorded in the [`Report`] and the next deletion still runs.

mod error;
mod request;
mod resolver;

use tracing::{error, info, warn};

use crate::exec::{
    CommandExecutor, CommandRunner, ExecError, ProcessCommandRunner, Tools, argv, aws_argv,
};
use crate::report::{Report, StepStatus};
use crate::resource::ResourceKind;
use crate::state::ExternalStateReader;

pub use error::TeardownError;
pub use request::{BucketSource, TeardownRequest};
pub use resolver::{LiveResolver, ManifestResolver, NameResolver, VerifiedManifest};

/// Runs teardown against a [`CommandExecutor`].
#[derive(Debug)]
pub struct TeardownPipeline<R: CommandRunner> {
    exec: CommandExecutor<R>,
    namespace: String,
}

impl TeardownPipeline<ProcessCommandRunner> {
    /// Creates a pipeline that runs real processes.
    #[must_use]
    pub const fn with_process_runner(tools: Tools, namespace: String) -> Self {
        Self::new(CommandExecutor::with_process_runner(tools), namespace)
    }
}

impl<R: CommandRunner> TeardownPipeline<R> {
    /// Creates a pipeline over an existing executor.
    #[must_use]
    pub const fn new(exec: CommandExecutor<R>, namespace: String) -> Self {
        Self { exec, namespace }
    }

    /// Namespace holding the backup custom resources.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Resolver reading names from the live cluster through this pipeline's
    /// executor.
    #[must_use]
    pub fn live_resolver(&self, cluster_id: &str) -> LiveResolver<'_, R> {
        LiveResolver::new(
            ExternalStateReader::new(&self.exec),
            cluster_id.to_owned(),
            self.namespace.clone(),
        )
    }

    /// Resolver that confirms each name in `manifest` against the live
    /// cluster before it is deleted.
    #[must_use]
    pub fn verified_manifest<'a>(
        &'a self,
        manifest: &'a ManifestResolver,
    ) -> VerifiedManifest<'a, R> {
        VerifiedManifest::new(
            ExternalStateReader::new(&self.exec),
            manifest,
            self.namespace.clone(),
        )
    }

    /// Removes the resources named by `request` and `resolver`.
    ///
    /// Returns the per-step report; check [`Report::has_failures`] for
    /// deletions that did not succeed.
    ///
    /// # Errors
    ///
    /// Returns [`TeardownError::BucketDiscovery`] when the bucket cannot be
    /// located. No resource has been touched in that case.
    pub fn run(
        &self,
        request: &TeardownRequest,
        resolver: &impl NameResolver,
    ) -> Result<Report, TeardownError> {
        let mut report = Report::new();
        let bucket = self.locate_bucket(request, &mut report)?;

        info!(role = request.role_name(), bucket = %bucket, "starting teardown");
        self.remove_role(request, &mut report);
        self.remove_bucket(&bucket, request.aws_profile(), &mut report);
        for kind in ResourceKind::TEARDOWN_ORDER {
            self.remove_cluster_resources(kind, resolver, &mut report);
        }

        if report.has_failures() {
            warn!("teardown finished with failures");
        } else {
            info!("teardown finished");
        }
        Ok(report)
    }

    fn locate_bucket(
        &self,
        request: &TeardownRequest,
        report: &mut Report,
    ) -> Result<String, TeardownError> {
        match request.bucket() {
            BucketSource::Named(name) => Ok(name.clone()),
            BucketSource::StorageLocation(location) => {
                let reader = ExternalStateReader::new(&self.exec);
                let bucket = reader
                    .storage_location_bucket(&self.namespace, location)
                    .map_err(|source| {
                        error!(
                            storage_location = %location,
                            error = %source,
                            "bucket discovery failed"
                        );
                        TeardownError::BucketDiscovery {
                            storage_location: location.clone(),
                            source,
                        }
                    })?;
                report.record("discover bucket", StepStatus::Done);
                Ok(bucket)
            }
        }
    }

    fn remove_role(&self, request: &TeardownRequest, report: &mut Report) {
        let role = request.role_name();
        let profile = request.aws_profile();
        let delete_step = format!("delete role {role}");
        let reader = ExternalStateReader::new(&self.exec);

        let attached = match reader.attached_policy_arns(role, profile) {
            Ok(arns) => {
                report.record("list attached policies", StepStatus::Done);
                arns
            }
            Err(err) if err.is_not_found() => {
                warn!(role, "role not found; skipping role cleanup");
                report.record(delete_step, StepStatus::Warned(String::from("role not found")));
                return;
            }
            Err(err) => {
                error!(role, error = %err, "failed to list attached policies");
                report.record("list attached policies", StepStatus::Failed(err.to_string()));
                report.record(
                    delete_step,
                    StepStatus::Failed(String::from("skipped: attached policies unknown")),
                );
                return;
            }
        };

        let mut all_detached = true;
        for arn in &attached {
            let args = aws_argv(
                &[
                    "iam",
                    "detach-role-policy",
                    "--role-name",
                    role,
                    "--policy-arn",
                    arn,
                ],
                profile,
            );
            let result = self.exec.aws(&args).map(drop);
            all_detached &= record_deletion(report, format!("detach policy {arn}"), result);
        }

        if !all_detached {
            report.record(
                delete_step,
                StepStatus::Failed(String::from("skipped: policies still attached")),
            );
            return;
        }
        let args = aws_argv(&["iam", "delete-role", "--role-name", role], profile);
        let result = self.exec.aws(&args).map(drop);
        record_deletion(report, delete_step, result);
    }

    fn remove_bucket(&self, bucket: &str, profile: Option<&str>, report: &mut Report) {
        let target = format!("s3://{bucket}");
        let args = aws_argv(&["s3", "rb", &target, "--force"], profile);
        let result = self.exec.aws(&args).map(drop);
        record_deletion(report, format!("delete bucket {bucket}"), result);
    }

    fn remove_cluster_resources(
        &self,
        kind: ResourceKind,
        resolver: &impl NameResolver,
        report: &mut Report,
    ) {
        let names = match resolver.resolve(kind) {
            Ok(names) => names,
            Err(err) => {
                error!(%kind, error = %err, "failed to resolve resource names");
                report.record(format!("resolve {kind}"), StepStatus::Failed(err.to_string()));
                return;
            }
        };
        if names.is_empty() {
            info!(%kind, "no resources to delete");
        }
        for name in names {
            let args = argv(&["delete", kind.cli_name(), &name, "-n", &self.namespace]);
            let result = self.exec.oc(&args).map(drop);
            record_deletion(report, format!("delete {kind} {name}"), result);
        }
    }
}

/// Records a best-effort deletion. A resource that is already gone counts as
/// removed. Returns `true` unless the deletion failed.
fn record_deletion(report: &mut Report, step: String, result: Result<(), ExecError>) -> bool {
    match result {
        Ok(()) => {
            report.record(step, StepStatus::Done);
            true
        }
        Err(err) if err.is_not_found() => {
            warn!(step = %step, "already removed");
            report.record(step, StepStatus::Warned(String::from("already removed")));
            true
        }
        Err(err) => {
            error!(step = %step, error = %err, "deletion failed; continuing");
            report.record(step, StepStatus::Failed(err.to_string()));
            false
        }
    }
}
