//! External process execution.
//!
//! [`CommandExecutor`] is the single gateway to the cluster and cloud CLIs.
//! It logs every invocation before it happens, captures stdout and stderr
//! separately, and turns a non-zero exit into [`ExecError::Execution`]. Two
//! modes exist: direct argument vectors, which never pass through a shell,
//! and [`ShellQuery`] pipelines, which run under `interpreter -c`. No timeout
//! or retry is applied here.

use std::ffi::OsString;

use tracing::{debug, info};

mod error;
mod shell;
mod types;

pub use error::ExecError;
pub use shell::{MANAGEMENT_CLUSTERS_PATH, ShellQuery};
pub use types::{CommandOutput, CommandRunner, ProcessCommandRunner};

/// Binaries invoked by the pipelines.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Tools {
    /// Cloud provider CLI.
    pub aws: String,
    /// Cluster CLI used for custom resources.
    pub oc: String,
    /// Managed cluster CLI used for the health check.
    pub rosa: String,
    /// Fleet registry CLI.
    pub ocm: String,
    /// JSON filter used inside shell queries.
    pub jq: String,
    /// Interpreter for shell queries.
    pub shell: String,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            aws: String::from("aws"),
            oc: String::from("oc"),
            rosa: String::from("rosa"),
            ocm: String::from("ocm"),
            jq: String::from("jq"),
            shell: String::from("bash"),
        }
    }
}

/// Builds an argument vector from string slices.
#[must_use]
pub fn argv(parts: &[&str]) -> Vec<OsString> {
    parts.iter().map(OsString::from).collect()
}

/// Builds a cloud CLI argument vector, appending `--profile` when a named
/// profile is in use.
#[must_use]
pub fn aws_argv(parts: &[&str], profile: Option<&str>) -> Vec<OsString> {
    let mut args = argv(parts);
    if let Some(name) = profile {
        args.push(OsString::from("--profile"));
        args.push(OsString::from(name));
    }
    args
}

/// Logs, runs, and status-checks external commands.
#[derive(Clone, Debug)]
pub struct CommandExecutor<R: CommandRunner> {
    runner: R,
    tools: Tools,
}

impl CommandExecutor<ProcessCommandRunner> {
    /// Creates an executor wired to the real process runner.
    #[must_use]
    pub const fn with_process_runner(tools: Tools) -> Self {
        Self::new(ProcessCommandRunner, tools)
    }
}

impl<R: CommandRunner> CommandExecutor<R> {
    /// Creates an executor over the given runner.
    #[must_use]
    pub const fn new(runner: R, tools: Tools) -> Self {
        Self { runner, tools }
    }

    /// Returns the configured binaries.
    #[must_use]
    pub const fn tools(&self) -> &Tools {
        &self.tools
    }

    /// Runs `program` with `args`, without shell interpretation.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Spawn`] when the program cannot start and
    /// [`ExecError::Execution`] when it exits unsuccessfully.
    pub fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, ExecError> {
        info!(program, args = %render_args(args), "executing command");
        let output = self.runner.run(program, args)?;
        debug!(
            program,
            code = ?output.code,
            stdout = %output.stdout.trim_end(),
            stderr = %output.stderr.trim_end(),
            "command finished"
        );
        if output.is_success() {
            Ok(output)
        } else {
            Err(output.into_execution_error(program))
        }
    }

    /// Runs the cloud provider CLI.
    ///
    /// # Errors
    ///
    /// See [`CommandExecutor::run`].
    pub fn aws(&self, args: &[OsString]) -> Result<CommandOutput, ExecError> {
        self.run(&self.tools.aws, args)
    }

    /// Runs the cluster CLI.
    ///
    /// # Errors
    ///
    /// See [`CommandExecutor::run`].
    pub fn oc(&self, args: &[OsString]) -> Result<CommandOutput, ExecError> {
        self.run(&self.tools.oc, args)
    }

    /// Runs the managed cluster CLI.
    ///
    /// # Errors
    ///
    /// See [`CommandExecutor::run`].
    pub fn rosa(&self, args: &[OsString]) -> Result<CommandOutput, ExecError> {
        self.run(&self.tools.rosa, args)
    }

    /// Runs a fixed shell pipeline under the configured interpreter.
    ///
    /// # Errors
    ///
    /// See [`CommandExecutor::run`]. With `pipefail` set, a failure anywhere
    /// in the pipeline surfaces as [`ExecError::Execution`].
    pub fn shell(&self, query: &ShellQuery) -> Result<CommandOutput, ExecError> {
        let script = query.render(&self.tools);
        let args = vec![OsString::from("-c"), OsString::from(script)];
        self.run(&self.tools.shell, &args)
    }
}

fn render_args(args: &[OsString]) -> String {
    args.iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
