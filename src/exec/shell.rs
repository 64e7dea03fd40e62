//! Fixed shell pipelines for calls that need a JSON filter.
//!
//! Only the templates below are ever handed to the interpreter. Every
//! parameter is shell-escaped before substitution, so externally sourced
//! values (hrefs, names, profiles) cannot change the shape of the pipeline.

use std::borrow::Cow;

use shell_escape::unix::escape;

use super::Tools;

/// Registry path listing management clusters.
pub const MANAGEMENT_CLUSTERS_PATH: &str = "/api/osd_fleet_mgmt/v1/management_clusters";

const HREF_FILTER: &str = ".items[].cluster_management_reference.href";
const OIDC_URL_FILTER: &str = ".aws.sts.oidc_endpoint_url";
const PROVIDER_ARN_FILTER: &str = ".OpenIDConnectProviderList[].Arn";

/// A reviewed shell pipeline with parameterised inputs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ShellQuery {
    /// Management cluster reference link found by a region and name search.
    ManagementClusterHref {
        /// Cloud region of the management cluster.
        region: String,
        /// Management cluster name.
        name: String,
    },
    /// Trust issuer URL read from a management cluster reference link.
    OidcEndpointUrl {
        /// Reference link returned by the search.
        href: String,
    },
    /// Every identity provider ARN registered in the cloud account.
    OidcProviderArns {
        /// Named cloud profile, when one is in use.
        profile: Option<String>,
    },
}

impl ShellQuery {
    /// Renders the pipeline as a script for `interpreter -c`.
    #[must_use]
    pub fn render(&self, tools: &Tools) -> String {
        let jq = quote(&tools.jq);
        let body = match self {
            Self::ManagementClusterHref { region, name } => {
                let search = format!("region='{region}' and name='{name}'");
                format!(
                    "{} get {MANAGEMENT_CLUSTERS_PATH} -p {} | {jq} -r {}",
                    quote(&tools.ocm),
                    quote(&format!("search={search}")),
                    quote(HREF_FILTER),
                )
            }
            Self::OidcEndpointUrl { href } => format!(
                "{} get {} | {jq} -r {}",
                quote(&tools.ocm),
                quote(href),
                quote(OIDC_URL_FILTER),
            ),
            Self::OidcProviderArns { profile } => {
                let profile_flag = profile
                    .as_deref()
                    .map(|name| format!(" --profile {}", quote(name)))
                    .unwrap_or_default();
                format!(
                    "{} iam list-open-id-connect-providers{profile_flag} --output json | {jq} -r {}",
                    quote(&tools.aws),
                    quote(PROVIDER_ARN_FILTER),
                )
            }
        };
        format!("set -o pipefail; {body}")
    }
}

fn quote(value: &str) -> String {
    escape(Cow::Borrowed(value)).into_owned()
}
