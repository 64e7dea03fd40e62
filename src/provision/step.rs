//! Provisioning steps and their failure policies.

use std::fmt;

use crate::report::FailurePolicy;

/// A step of the provisioning pipeline, in execution order.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ProvisionStep {
    /// Advisory read of the cluster state.
    HealthCheck,
    /// Creation of the backup bucket.
    CreateBucket,
    /// Resolution of the management cluster's identity trust.
    DiscoverOidc,
    /// Creation of the backup role.
    CreateRole,
    /// Lookup of the role ARN.
    ResolveRoleArn,
    /// Attachment of the baseline storage access policy.
    AttachBaselinePolicy,
    /// Creation of the encryption key.
    CreateKey,
    /// Replacement of the key policy.
    PutKeyPolicy,
    /// Creation of the companion identity policy.
    CreateCompanionPolicy,
    /// Lookup of the companion policy ARN.
    ResolveCompanionPolicyArn,
    /// Attachment of the companion policy to the role.
    AttachCompanionPolicy,
    /// Read-back of attached policies for operator visibility.
    VerifyAttachments,
}

impl ProvisionStep {
    /// Every step in execution order.
    pub const ALL: [Self; 12] = [
        Self::HealthCheck,
        Self::CreateBucket,
        Self::DiscoverOidc,
        Self::CreateRole,
        Self::ResolveRoleArn,
        Self::AttachBaselinePolicy,
        Self::CreateKey,
        Self::PutKeyPolicy,
        Self::CreateCompanionPolicy,
        Self::ResolveCompanionPolicyArn,
        Self::AttachCompanionPolicy,
        Self::VerifyAttachments,
    ];

    /// Human-readable step name used in logs and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HealthCheck => "health check",
            Self::CreateBucket => "create bucket",
            Self::DiscoverOidc => "discover OIDC trust",
            Self::CreateRole => "create role",
            Self::ResolveRoleArn => "resolve role ARN",
            Self::AttachBaselinePolicy => "attach baseline policy",
            Self::CreateKey => "create encryption key",
            Self::PutKeyPolicy => "put key policy",
            Self::CreateCompanionPolicy => "create companion policy",
            Self::ResolveCompanionPolicyArn => "resolve companion policy ARN",
            Self::AttachCompanionPolicy => "attach companion policy",
            Self::VerifyAttachments => "verify attached policies",
        }
    }

    /// What the pipeline does when this step fails.
    ///
    /// The bucket has no dependants later in the run and the read-back only
    /// informs the operator; every other step feeds the next one.
    #[must_use]
    pub const fn failure_policy(self) -> FailurePolicy {
        match self {
            Self::CreateBucket | Self::VerifyAttachments => FailurePolicy::Continue,
            Self::HealthCheck
            | Self::DiscoverOidc
            | Self::CreateRole
            | Self::ResolveRoleArn
            | Self::AttachBaselinePolicy
            | Self::CreateKey
            | Self::PutKeyPolicy
            | Self::CreateCompanionPolicy
            | Self::ResolveCompanionPolicyArn
            | Self::AttachCompanionPolicy => FailurePolicy::Abort,
        }
    }
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_bucket_and_verification_continue_on_failure() {
        let continuing = ProvisionStep::ALL
            .iter()
            .filter(|step| step.failure_policy() == FailurePolicy::Continue)
            .copied()
            .collect::<Vec<_>>();
        assert_eq!(
            continuing,
            vec![ProvisionStep::CreateBucket, ProvisionStep::VerifyAttachments]
        );
    }
}
