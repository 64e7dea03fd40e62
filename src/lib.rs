//! Disaster recovery provisioning and teardown for hosted clusters.
//!
//! Two pipelines drive the cloud and cluster CLIs through a single
//! [`exec::CommandExecutor`]. [`provision::ProvisioningPipeline`] creates the
//! backup bucket, the workload identity role, an encryption key and the
//! policies tying them together. [`teardown::TeardownPipeline`] removes them
//! again, recomputing deterministic names and discovering the bucket from the
//! live backup storage location (or reading names from a manifest).

pub mod config;
pub mod context;
pub mod exec;
pub mod naming;
pub mod policy;
pub mod provision;
pub mod report;
pub mod resource;
pub mod state;
pub mod teardown;
pub mod test_support;

pub use config::{ConfigError, DrConfig};
pub use context::{ClusterContext, ContextError};
pub use exec::{
    CommandExecutor, CommandOutput, CommandRunner, ExecError, ProcessCommandRunner, ShellQuery,
    Tools,
};
pub use provision::{
    ProvisionError, ProvisionReport, ProvisionSettings, ProvisionStep, ProvisioningPipeline,
};
pub use report::{FailurePolicy, Report, StepOutcome, StepStatus};
pub use resource::ResourceKind;
pub use state::{ExternalStateReader, OidcTrust, ProviderMatch, StateError};
pub use teardown::{
    BucketSource, LiveResolver, ManifestResolver, NameResolver, TeardownError, TeardownPipeline,
    TeardownRequest, VerifiedManifest,
};
