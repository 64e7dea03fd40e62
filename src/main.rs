//! Binary entry point for the `oadp-dr` CLI.

mod cli;

use std::io::{self, Write};
use std::process;

use camino::Utf8Path;
use clap::Parser;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use oadp_dr::{
    ClusterContext, ConfigError, ContextError, DrConfig, ManifestResolver, ProvisionError,
    ProvisionReport, ProvisioningPipeline, Report, TeardownError, TeardownPipeline,
    TeardownRequest,
};

use cli::{Cli, LiveTeardown, ManifestTeardown, ProvisionCommand, TeardownSource};

/// Exit code for a teardown that ran to completion with failed steps.
const PARTIAL_FAILURE_EXIT_CODE: i32 = 2;

#[derive(Debug, Error)]
enum CliError {
    #[error("invalid argument: {0}")]
    Argument(#[from] ContextError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Provision(#[from] ProvisionError),
    #[error("teardown failed: {0}")]
    Teardown(#[from] TeardownError),
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli) {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .try_init()
        .ok();
}

fn dispatch(cli: Cli) -> Result<i32, CliError> {
    match cli {
        Cli::Provision(command) => provision(&command),
        Cli::Teardown(command) => match command.source {
            TeardownSource::Live(args) => teardown_live(&args),
            TeardownSource::Manifest(args) => teardown_manifest(&args),
        },
    }
}

fn load_config() -> Result<DrConfig, CliError> {
    let config = DrConfig::load_without_cli_args()?;
    config.validate()?;
    Ok(config)
}

fn load_provision_config() -> Result<DrConfig, CliError> {
    let config = DrConfig::load_without_cli_args()?;
    config.validate_for_provisioning()?;
    Ok(config)
}

fn provision(args: &ProvisionCommand) -> Result<i32, CliError> {
    let context = ClusterContext::new(
        &args.cluster_id,
        &args.cluster_name,
        &args.cluster_env,
        &args.mc_name,
        &args.aws_profile,
        &args.aws_region,
    )?;
    let config = load_provision_config()?;
    let pipeline =
        ProvisioningPipeline::with_process_runner(config.tools(), config.provision_settings());

    match pipeline.run(&context) {
        Ok(outcome) => {
            write_provision_summary(io::stdout(), &outcome);
            Ok(exit_code_for(&outcome.report))
        }
        Err(err) => {
            write_report(io::stdout(), err.completed());
            Err(err.into())
        }
    }
}

fn teardown_live(args: &LiveTeardown) -> Result<i32, CliError> {
    let request =
        TeardownRequest::live(&args.cluster_id, &args.mc_name, args.aws_profile.as_deref())?;
    let config = load_config()?;
    let pipeline = TeardownPipeline::with_process_runner(config.tools(), config.namespace.clone());
    let resolver = pipeline.live_resolver(args.cluster_id.trim());
    let report = pipeline.run(&request, &resolver)?;
    write_report(io::stdout(), &report);
    Ok(exit_code_for(&report))
}

fn teardown_manifest(args: &ManifestTeardown) -> Result<i32, CliError> {
    let request = TeardownRequest::manifest(
        &args.role_name,
        &args.bucket_name,
        args.aws_profile.as_deref(),
    )?;
    let manifest = ManifestResolver::load(Utf8Path::new(&args.manifest_path))?;
    let config = load_config()?;
    let pipeline = TeardownPipeline::with_process_runner(config.tools(), config.namespace.clone());
    let resolver = pipeline.verified_manifest(&manifest);
    let report = pipeline.run(&request, &resolver)?;
    write_report(io::stdout(), &report);
    Ok(exit_code_for(&report))
}

fn exit_code_for(report: &Report) -> i32 {
    if report.has_failures() {
        PARTIAL_FAILURE_EXIT_CODE
    } else {
        0
    }
}

fn write_report(mut target: impl Write, report: &Report) {
    write!(target, "{report}").ok();
}

fn write_provision_summary(mut target: impl Write, outcome: &ProvisionReport) {
    write!(target, "{}", outcome.report).ok();
    let bucket = outcome.bucket_name.as_deref().unwrap_or("(not created)");
    writeln!(target, "bucket:           {bucket}").ok();
    writeln!(target, "role:             {}", outcome.role_arn).ok();
    writeln!(target, "key:              {}", outcome.key_arn).ok();
    writeln!(target, "companion policy: {}", outcome.companion_policy_arn).ok();
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
