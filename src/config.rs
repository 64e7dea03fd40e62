//! Configuration loading via `ortho-config`.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::exec::Tools;
use crate::provision::{
    DEFAULT_BASELINE_POLICY_ARN, DEFAULT_SERVICE_ACCOUNT_SUBJECT, ProvisionSettings,
};

/// Application name used for configuration discovery.
pub const APP_NAME: &str = "oadp-dr";

/// Default namespace of the backup custom resources.
pub const DEFAULT_NAMESPACE: &str = "openshift-adp";

/// Tool wiring and security-sensitive choices shared by both pipelines.
///
/// Cluster identifiers are not configuration; they arrive as positional
/// arguments on each invocation.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "OADP_DR",
    discovery(
        app_name = "oadp-dr",
        env_var = "OADP_DR_CONFIG_PATH",
        config_file_name = "oadp-dr.toml",
        dotfile_name = ".oadp-dr.toml",
        project_file_name = "oadp-dr.toml"
    )
)]
pub struct DrConfig {
    /// Path to the cloud provider CLI.
    #[ortho_config(default = "aws".to_owned())]
    pub aws_bin: String,
    /// Path to the cluster CLI.
    #[ortho_config(default = "oc".to_owned())]
    pub oc_bin: String,
    /// Path to the managed cluster CLI used for the health check.
    #[ortho_config(default = "rosa".to_owned())]
    pub rosa_bin: String,
    /// Path to the fleet registry CLI.
    #[ortho_config(default = "ocm".to_owned())]
    pub ocm_bin: String,
    /// Path to the JSON filter used by shell queries.
    #[ortho_config(default = "jq".to_owned())]
    pub jq_bin: String,
    /// Interpreter for shell queries.
    #[ortho_config(default = "bash".to_owned())]
    pub shell_bin: String,
    /// Namespace of the backup custom resources.
    #[ortho_config(default = DEFAULT_NAMESPACE.to_owned())]
    pub namespace: String,
    /// Service account subject trusted by the backup role.
    #[ortho_config(default = DEFAULT_SERVICE_ACCOUNT_SUBJECT.to_owned())]
    pub service_account_subject: String,
    /// Managed policy granting the role storage access.
    #[ortho_config(default = DEFAULT_BASELINE_POLICY_ARN.to_owned())]
    pub baseline_policy_arn: String,
    /// Principal granted full control of each encryption key. Required for
    /// provisioning; teardown never reads it.
    #[ortho_config(default = String::new())]
    pub kms_admin_principal: String,
    /// Substring identifying the management cluster's identity provider ARN.
    /// Defaults to the issuer host path.
    pub oidc_provider_match: Option<String>,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl Default for DrConfig {
    fn default() -> Self {
        let tools = Tools::default();
        Self {
            aws_bin: tools.aws,
            oc_bin: tools.oc,
            rosa_bin: tools.rosa,
            ocm_bin: tools.ocm,
            jq_bin: tools.jq,
            shell_bin: tools.shell,
            namespace: DEFAULT_NAMESPACE.to_owned(),
            service_account_subject: DEFAULT_SERVICE_ACCOUNT_SUBJECT.to_owned(),
            baseline_policy_arn: DEFAULT_BASELINE_POLICY_ARN.to_owned(),
            kms_admin_principal: String::new(),
            oidc_provider_match: None,
        }
    }
}

impl DrConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to {APP_NAME}.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    fn reject_blank(value: Option<&str>, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        value.map_or(Ok(()), |text| Self::require_field(text, metadata))
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from(APP_NAME)])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation. Error messages name the environment
    /// variable and configuration key that supply each value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a value is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            (&self.aws_bin, FieldMetadata::new("cloud CLI", "OADP_DR_AWS_BIN", "aws_bin")),
            (&self.oc_bin, FieldMetadata::new("cluster CLI", "OADP_DR_OC_BIN", "oc_bin")),
            (
                &self.rosa_bin,
                FieldMetadata::new("managed cluster CLI", "OADP_DR_ROSA_BIN", "rosa_bin"),
            ),
            (
                &self.ocm_bin,
                FieldMetadata::new("fleet registry CLI", "OADP_DR_OCM_BIN", "ocm_bin"),
            ),
            (&self.jq_bin, FieldMetadata::new("JSON filter", "OADP_DR_JQ_BIN", "jq_bin")),
            (
                &self.shell_bin,
                FieldMetadata::new("shell interpreter", "OADP_DR_SHELL_BIN", "shell_bin"),
            ),
            (
                &self.namespace,
                FieldMetadata::new("backup namespace", "OADP_DR_NAMESPACE", "namespace"),
            ),
            (
                &self.service_account_subject,
                FieldMetadata::new(
                    "service account subject",
                    "OADP_DR_SERVICE_ACCOUNT_SUBJECT",
                    "service_account_subject",
                ),
            ),
            (
                &self.baseline_policy_arn,
                FieldMetadata::new(
                    "baseline policy ARN",
                    "OADP_DR_BASELINE_POLICY_ARN",
                    "baseline_policy_arn",
                ),
            ),
        ];
        for (value, metadata) in &required {
            Self::require_field(value, metadata)?;
        }

        Self::reject_blank(
            self.oidc_provider_match.as_deref(),
            &FieldMetadata::new(
                "identity provider match",
                "OADP_DR_OIDC_PROVIDER_MATCH",
                "oidc_provider_match",
            ),
        )
    }

    /// Validates everything provisioning needs, including the key
    /// administrator principal that has no default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a value is blank or the
    /// principal is unset.
    pub fn validate_for_provisioning(&self) -> Result<(), ConfigError> {
        self.validate()?;
        Self::require_field(
            &self.kms_admin_principal,
            &FieldMetadata::new(
                "key administrator principal",
                "OADP_DR_KMS_ADMIN_PRINCIPAL",
                "kms_admin_principal",
            ),
        )
    }

    /// Binaries the pipelines invoke.
    #[must_use]
    pub fn tools(&self) -> Tools {
        Tools {
            aws: self.aws_bin.clone(),
            oc: self.oc_bin.clone(),
            rosa: self.rosa_bin.clone(),
            ocm: self.ocm_bin.clone(),
            jq: self.jq_bin.clone(),
            shell: self.shell_bin.clone(),
        }
    }

    /// Settings applied by the provisioning pipeline.
    #[must_use]
    pub fn provision_settings(&self) -> ProvisionSettings {
        ProvisionSettings {
            service_account_subject: self.service_account_subject.clone(),
            baseline_policy_arn: self.baseline_policy_arn.clone(),
            kms_admin_principal: self.kms_admin_principal.clone(),
            oidc_provider_match: self.oidc_provider_match.clone(),
        }
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a configuration value is empty.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
