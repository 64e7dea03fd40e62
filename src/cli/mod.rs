//! Command-line interface definitions for the `oadp-dr` binary.
//!
//! The clap structures live here so both the binary and the build script can
//! use them; the build script renders the manual page from them.

use clap::{Args, Parser, Subcommand};

/// Top-level CLI for the `oadp-dr` binary.
#[derive(Debug, Parser)]
#[command(
    name = "oadp-dr",
    about = "Provision and tear down disaster recovery resources for hosted clusters",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Create the bucket, role, key and policies backing cluster backups.
    #[command(
        name = "provision",
        about = "Create the bucket, role, key and policies backing cluster backups"
    )]
    Provision(ProvisionCommand),
    /// Remove backup resources for a cluster.
    #[command(name = "teardown", about = "Remove backup resources for a cluster")]
    Teardown(TeardownCommand),
}

/// Arguments for `oadp-dr provision`.
#[derive(Debug, Args)]
pub(crate) struct ProvisionCommand {
    /// Hosted cluster identifier.
    pub(crate) cluster_id: String,
    /// Hosted cluster name, used for the health check.
    pub(crate) cluster_name: String,
    /// Environment label recorded on the encryption key.
    pub(crate) cluster_env: String,
    /// Management cluster hosting the cluster.
    pub(crate) mc_name: String,
    /// Named cloud profile.
    pub(crate) aws_profile: String,
    /// Cloud region.
    pub(crate) aws_region: String,
}

/// Arguments for `oadp-dr teardown`.
#[derive(Debug, Args)]
pub(crate) struct TeardownCommand {
    /// Where the resource names come from.
    #[command(subcommand)]
    pub(crate) source: TeardownSource,
}

/// Sources of the names removed by a teardown.
#[derive(Debug, Subcommand)]
pub(crate) enum TeardownSource {
    /// Discover resources from the live cluster.
    #[command(name = "live", about = "Discover resources from the live cluster")]
    Live(LiveTeardown),
    /// Remove resources listed in an exported manifest.
    #[command(name = "manifest", about = "Remove resources listed in an exported manifest")]
    Manifest(ManifestTeardown),
}

/// Arguments for `oadp-dr teardown live`.
#[derive(Debug, Args)]
pub(crate) struct LiveTeardown {
    /// Hosted cluster identifier.
    pub(crate) cluster_id: String,
    /// Management cluster hosting the cluster.
    pub(crate) mc_name: String,
    /// Named cloud profile; the ambient credentials are used when omitted.
    #[arg(long, value_name = "PROFILE")]
    pub(crate) aws_profile: Option<String>,
}

/// Arguments for `oadp-dr teardown manifest`.
#[derive(Debug, Args)]
pub(crate) struct ManifestTeardown {
    /// YAML manifest holding the backup resources.
    pub(crate) manifest_path: String,
    /// Backup role to detach and delete.
    pub(crate) role_name: String,
    /// Bucket to empty and delete.
    pub(crate) bucket_name: String,
    /// Named cloud profile; the ambient credentials are used when omitted.
    #[arg(long, value_name = "PROFILE")]
    pub(crate) aws_profile: Option<String>,
}
