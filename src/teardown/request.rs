//! Inputs identifying what a teardown removes.

use crate::context::{ContextError, validate_identifier};
use crate::naming;

/// Where the bucket name comes from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BucketSource {
    /// Read from the live backup storage location of that name.
    StorageLocation(String),
    /// Supplied by the caller.
    Named(String),
}

/// Cloud resources to remove, alongside the cluster resources supplied by a
/// [`super::NameResolver`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TeardownRequest {
    role_name: String,
    bucket: BucketSource,
    aws_profile: Option<String>,
}

impl TeardownRequest {
    /// Request derived from a live cluster: the role name is recomputed and the
    /// bucket is discovered from the cluster's storage location.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] for blank or unsafe identifiers.
    pub fn live(
        cluster_id: &str,
        management_cluster_name: &str,
        aws_profile: Option<&str>,
    ) -> Result<Self, ContextError> {
        let id = validate_identifier("cluster_id", cluster_id)?;
        let mc_name = validate_identifier("management_cluster_name", management_cluster_name)?;
        Ok(Self {
            role_name: naming::role_name(&mc_name, &id),
            bucket: BucketSource::StorageLocation(naming::schedule_resource_name(&id)),
            aws_profile: validate_profile(aws_profile)?,
        })
    }

    /// Request naming the role and bucket explicitly.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] for blank or unsafe identifiers.
    pub fn manifest(
        role_name: &str,
        bucket_name: &str,
        aws_profile: Option<&str>,
    ) -> Result<Self, ContextError> {
        Ok(Self {
            role_name: validate_identifier("role_name", role_name)?,
            bucket: BucketSource::Named(validate_identifier("bucket_name", bucket_name)?),
            aws_profile: validate_profile(aws_profile)?,
        })
    }

    /// Backup role to detach and delete.
    #[must_use]
    pub fn role_name(&self) -> &str {
        &self.role_name
    }

    /// Bucket source.
    #[must_use]
    pub const fn bucket(&self) -> &BucketSource {
        &self.bucket
    }

    /// Named cloud profile, if any.
    #[must_use]
    pub fn aws_profile(&self) -> Option<&str> {
        self.aws_profile.as_deref()
    }
}

fn validate_profile(profile: Option<&str>) -> Result<Option<String>, ContextError> {
    profile
        .map(|name| validate_identifier("aws_profile", name))
        .transpose()
}
