//! Identity of the cluster a pipeline run acts on.

use thiserror::Error;

use crate::naming;

/// Errors raised when an identifier is unusable.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ContextError {
    /// Raised when a required identifier is blank.
    #[error("missing {field}")]
    Missing {
        /// Name of the blank field.
        field: &'static str,
    },
    /// Raised when an identifier contains characters outside the safe set.
    #[error("invalid {field} '{value}': only ASCII letters, digits, '-', '_' and '.' are allowed")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Value as supplied.
        value: String,
    },
}

/// Trims `value` and checks it is a non-empty, shell- and query-safe
/// identifier.
///
/// # Errors
///
/// Returns [`ContextError`] when the value is blank or contains other
/// characters than ASCII alphanumerics, `-`, `_` and `.`.
pub fn validate_identifier(field: &'static str, value: &str) -> Result<String, ContextError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ContextError::Missing { field });
    }
    if !trimmed
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
    {
        return Err(ContextError::Invalid {
            field,
            value: trimmed.to_owned(),
        });
    }
    Ok(trimmed.to_owned())
}

/// Target of a provisioning run. Immutable once built.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClusterContext {
    cluster_id: String,
    cluster_name: String,
    cluster_env: String,
    management_cluster_name: String,
    aws_profile: String,
    aws_region: String,
}

impl ClusterContext {
    /// Builds a context, trimming and validating every identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] for the first blank or unsafe field.
    pub fn new(
        cluster_id: &str,
        cluster_name: &str,
        cluster_env: &str,
        management_cluster_name: &str,
        aws_profile: &str,
        aws_region: &str,
    ) -> Result<Self, ContextError> {
        Ok(Self {
            cluster_id: validate_identifier("cluster_id", cluster_id)?,
            cluster_name: validate_identifier("cluster_name", cluster_name)?,
            cluster_env: validate_identifier("cluster_env", cluster_env)?,
            management_cluster_name: validate_identifier(
                "management_cluster_name",
                management_cluster_name,
            )?,
            aws_profile: validate_identifier("aws_profile", aws_profile)?,
            aws_region: validate_identifier("aws_region", aws_region)?,
        })
    }

    /// Cluster identifier.
    #[must_use]
    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }

    /// Human-facing cluster name.
    #[must_use]
    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    /// Environment or owner tag applied to created resources.
    #[must_use]
    pub fn cluster_env(&self) -> &str {
        &self.cluster_env
    }

    /// Name of the management cluster hosting the control plane.
    #[must_use]
    pub fn management_cluster_name(&self) -> &str {
        &self.management_cluster_name
    }

    /// Named cloud profile passed to every cloud call.
    #[must_use]
    pub fn aws_profile(&self) -> &str {
        &self.aws_profile
    }

    /// Cloud region for the bucket and key.
    #[must_use]
    pub fn aws_region(&self) -> &str {
        &self.aws_region
    }

    /// Backup role name derived from this context.
    #[must_use]
    pub fn role_name(&self) -> String {
        naming::role_name(&self.management_cluster_name, &self.cluster_id)
    }

    /// Companion key policy name derived from this context.
    #[must_use]
    pub fn kms_policy_name(&self) -> String {
        naming::kms_policy_name(&self.cluster_id)
    }
}
