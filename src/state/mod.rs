//! Typed reads of cluster and cloud state.
//!
//! Every read goes through the [`CommandExecutor`] and ends in one of three
//! shapes: a scalar (ARN, URL, href) extracted under an [`Extraction`] rule, a
//! structured document parsed with `serde`, or a list of names. Empty scalars
//! surface as [`StateError::EmptyResult`]; missing structured fields surface
//! as [`StateError::MalformedResponse`]. Whether either is fatal is the
//! caller's decision.

use serde::Deserialize;

use crate::exec::{CommandExecutor, CommandRunner, ShellQuery, argv, aws_argv};
use crate::resource::ResourceKind;

mod error;
mod extract;

pub use error::StateError;
pub use extract::{Extraction, extract_scalar, strip_scheme};

/// JSON pointer to the bucket recorded by a backup storage location.
pub const BSL_BUCKET_POINTER: &str = "/spec/objectStorage/bucket";

/// Rule selecting one identity provider ARN from the account's list.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProviderMatch<'a> {
    /// The provider registered for exactly this issuer host path.
    Issuer(&'a str),
    /// The first provider whose ARN contains the operator-supplied text.
    Substring(&'a str),
}

impl ProviderMatch<'_> {
    /// Reports whether `arn` satisfies the rule.
    #[must_use]
    pub fn matches(self, arn: &str) -> bool {
        match self {
            Self::Issuer(host_path) => arn
                .strip_suffix(host_path)
                .is_some_and(|prefix| prefix.ends_with(":oidc-provider/")),
            Self::Substring(text) => arn.contains(text),
        }
    }
}

/// Workload identity trust of a management cluster.
///
/// All three fields are populated together; a partially valid trust is never
/// constructed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OidcTrust {
    issuer_url: String,
    issuer_host_path: String,
    provider_arn: String,
}

impl OidcTrust {
    /// Builds a trust from its issuer URL and provider ARN, deriving the
    /// issuer host path.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::EmptyResult`] when any field ends up empty.
    pub fn new(issuer_url: &str, provider_arn: &str) -> Result<Self, StateError> {
        let url = extract_scalar(issuer_url, Extraction::Trim, "OIDC issuer URL")?;
        let host_path =
            extract_scalar(strip_scheme(&url), Extraction::Trim, "OIDC issuer host path")?;
        let arn = extract_scalar(provider_arn, Extraction::Trim, "OIDC provider ARN")?;
        Ok(Self {
            issuer_url: url,
            issuer_host_path: host_path,
            provider_arn: arn,
        })
    }

    /// Full issuer URL.
    #[must_use]
    pub fn issuer_url(&self) -> &str {
        &self.issuer_url
    }

    /// Issuer URL without its scheme.
    #[must_use]
    pub fn issuer_host_path(&self) -> &str {
        &self.issuer_host_path
    }

    /// ARN of the identity provider registered in the cloud account.
    #[must_use]
    pub fn provider_arn(&self) -> &str {
        &self.provider_arn
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AttachedPolicies {
    attached_policies: Vec<AttachedPolicy>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AttachedPolicy {
    policy_arn: String,
}

#[derive(Debug, Deserialize)]
struct ResourceList {
    #[serde(default)]
    items: Vec<NamedResource>,
}

#[derive(Debug, Deserialize)]
struct NamedResource {
    metadata: Metadata,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    name: String,
}

/// Reads cluster and cloud state through a borrowed executor.
#[derive(Debug)]
pub struct ExternalStateReader<'exec, R: CommandRunner> {
    exec: &'exec CommandExecutor<R>,
}

impl<'exec, R: CommandRunner> ExternalStateReader<'exec, R> {
    /// Creates a reader over `exec`.
    #[must_use]
    pub const fn new(exec: &'exec CommandExecutor<R>) -> Self {
        Self { exec }
    }

    /// Returns the cluster description text.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Exec`] when the describe call fails.
    pub fn cluster_description(&self, cluster_name: &str) -> Result<String, StateError> {
        let cluster_flag = format!("--cluster={cluster_name}");
        let output = self
            .exec
            .rosa(&argv(&["describe", "cluster", &cluster_flag]))?;
        Ok(output.stdout)
    }

    /// Resolves the workload identity trust of a management cluster.
    ///
    /// The management cluster is found by region and name in the fleet
    /// registry and its reference link yields the issuer URL. Without
    /// `provider_match` the provider ARN must end in
    /// `:oidc-provider/<issuer host path>`; with it, the first ARN containing
    /// that text wins.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when any lookup fails or comes back empty.
    pub fn oidc_trust(
        &self,
        mc_name: &str,
        region: &str,
        profile: Option<&str>,
        provider_match: Option<&str>,
    ) -> Result<OidcTrust, StateError> {
        let href = self.scalar_from_shell(
            &ShellQuery::ManagementClusterHref {
                region: region.to_owned(),
                name: mc_name.to_owned(),
            },
            Extraction::FirstToken,
            "management cluster href",
        )?;
        let issuer_url = self.scalar_from_shell(
            &ShellQuery::OidcEndpointUrl { href },
            Extraction::Trim,
            "OIDC endpoint URL",
        )?;
        let host_path = strip_scheme(issuer_url.as_str()).to_owned();
        let rule = provider_match.map_or(
            ProviderMatch::Issuer(host_path.as_str()),
            ProviderMatch::Substring,
        );
        let provider_arn = self.oidc_provider_arn(profile, rule)?;
        OidcTrust::new(&issuer_url, &provider_arn)
    }

    /// Finds the first identity provider ARN accepted by `rule`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::EmptyResult`] when no provider matches.
    pub fn oidc_provider_arn(
        &self,
        profile: Option<&str>,
        rule: ProviderMatch<'_>,
    ) -> Result<String, StateError> {
        let output = self.exec.shell(&ShellQuery::OidcProviderArns {
            profile: profile.map(str::to_owned),
        })?;
        output
            .stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && rule.matches(line))
            .map(str::to_owned)
            .ok_or_else(|| StateError::empty("OIDC provider ARN"))
    }

    /// Looks up the ARN of an existing role.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when the lookup fails or is empty.
    pub fn role_arn(&self, role_name: &str, profile: Option<&str>) -> Result<String, StateError> {
        let args = aws_argv(
            &[
                "iam",
                "get-role",
                "--role-name",
                role_name,
                "--query",
                "Role.Arn",
                "--output",
                "text",
            ],
            profile,
        );
        let output = self.exec.aws(&args)?;
        extract_scalar(&output.stdout, Extraction::Trim, "role ARN")
    }

    /// Looks up the ARN of a customer managed policy by name.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when the lookup fails or is empty.
    pub fn policy_arn(
        &self,
        policy_name: &str,
        profile: Option<&str>,
    ) -> Result<String, StateError> {
        let query = format!("Policies[?PolicyName=='{policy_name}'].Arn");
        let args = aws_argv(
            &[
                "iam",
                "list-policies",
                "--query",
                &query,
                "--output",
                "text",
            ],
            profile,
        );
        let output = self.exec.aws(&args)?;
        extract_scalar(&output.stdout, Extraction::FirstToken, "policy ARN")
    }

    /// Lists the ARNs of every policy attached to a role.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when the call fails or its JSON is malformed.
    pub fn attached_policy_arns(
        &self,
        role_name: &str,
        profile: Option<&str>,
    ) -> Result<Vec<String>, StateError> {
        let args = aws_argv(
            &[
                "iam",
                "list-attached-role-policies",
                "--role-name",
                role_name,
                "--output",
                "json",
            ],
            profile,
        );
        let output = self.exec.aws(&args)?;
        let parsed: AttachedPolicies = serde_json::from_str(&output.stdout)
            .map_err(|err| StateError::malformed("attached role policies", err))?;
        Ok(parsed
            .attached_policies
            .into_iter()
            .map(|policy| policy.policy_arn)
            .collect())
    }

    /// Reads the bucket name recorded by a live backup storage location.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::MalformedResponse`] when the resource lacks
    /// `spec.objectStorage.bucket`, [`StateError::EmptyResult`] when it is
    /// blank, and [`StateError::Exec`] when the resource cannot be read.
    pub fn storage_location_bucket(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<String, StateError> {
        let output = self.exec.oc(&argv(&[
            "get",
            ResourceKind::BackupStorageLocation.cli_name(),
            name,
            "-n",
            namespace,
            "-o",
            "json",
        ]))?;
        extract_scalar(
            &output.stdout,
            Extraction::JsonPointer(BSL_BUCKET_POINTER),
            "backup storage location bucket",
        )
    }

    /// Requests a single named resource, returning its name when present.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] for failures other than "not found".
    pub fn resource_name(
        &self,
        kind: ResourceKind,
        name: &str,
        namespace: &str,
    ) -> Result<Option<String>, StateError> {
        let args = argv(&["get", kind.cli_name(), name, "-n", namespace, "-o", "json"]);
        match self.exec.oc(&args) {
            Ok(output) => {
                let parsed: NamedResource = serde_json::from_str(&output.stdout)
                    .map_err(|err| StateError::malformed(kind.manifest_kind(), err))?;
                Ok(Some(parsed.metadata.name))
            }
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Lists the names of every resource of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when the call fails or its JSON is malformed.
    pub fn list_resource_names(
        &self,
        kind: ResourceKind,
        namespace: &str,
    ) -> Result<Vec<String>, StateError> {
        let output = self
            .exec
            .oc(&argv(&["get", kind.cli_name(), "-n", namespace, "-o", "json"]))?;
        let parsed: ResourceList = serde_json::from_str(&output.stdout)
            .map_err(|err| StateError::malformed(kind.manifest_kind(), err))?;
        Ok(parsed
            .items
            .into_iter()
            .map(|item| item.metadata.name)
            .collect())
    }

    fn scalar_from_shell(
        &self,
        query: &ShellQuery,
        rule: Extraction<'_>,
        what: &str,
    ) -> Result<String, StateError> {
        let output = self.exec.shell(query)?;
        let value = extract_scalar(&output.stdout, rule, what)?;
        if value == "null" {
            return Err(StateError::empty(what));
        }
        Ok(value)
    }
}
