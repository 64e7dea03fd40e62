//! Test support utilities shared across unit and integration tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::rc::Rc;

use serde_json::json;

use crate::exec::{CommandOutput, CommandRunner, ExecError};

/// Scripted command runner that returns pre-seeded outputs in FIFO order.
///
/// Used to drive deterministic command outcomes without spawning processes.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRunner {
    responses: Rc<RefCell<VecDeque<CommandOutput>>>,
    invocations: Rc<RefCell<Vec<CommandInvocation>>>,
}

/// Records a single invocation made through [`ScriptedRunner`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandInvocation {
    /// Program name as passed to the runner.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<OsString>,
}

impl CommandInvocation {
    /// Returns a shell-like command string for assertions.
    #[must_use]
    pub fn command_string(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        parts.extend(
            self.args
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }

    /// Returns `true` when the arguments contain `needle` verbatim.
    #[must_use]
    pub fn has_arg(&self, needle: &str) -> bool {
        self.args.iter().any(|arg| arg.to_string_lossy() == needle)
    }

    /// Returns `true` when the command starts with `program` followed by the
    /// given leading arguments.
    #[must_use]
    pub fn is(&self, program: &str, leading: &[&str]) -> bool {
        self.program == program
            && self.args.len() >= leading.len()
            && self
                .args
                .iter()
                .zip(leading)
                .all(|(arg, expected)| arg.to_string_lossy() == *expected)
    }
}

impl ScriptedRunner {
    /// Creates a new runner with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all invocations recorded so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<CommandInvocation> {
        self.invocations.borrow().clone()
    }

    /// Returns how many queued responses have not been consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.responses.borrow().len()
    }

    /// Pushes a successful exit status with empty output.
    pub fn push_success(&self) {
        self.push_output(Some(0), "", "");
    }

    /// Pushes a successful exit status with the given stdout.
    pub fn push_stdout(&self, stdout: impl Into<String>) {
        self.push_output(Some(0), stdout, "");
    }

    /// Pushes a failing exit code with stderr text.
    pub fn push_failure(&self, code: i32, stderr: impl Into<String>) {
        self.push_output(Some(code), "", stderr);
    }

    /// Pushes a response with no exit code to simulate abnormal termination.
    pub fn push_missing_exit_code(&self) {
        self.push_output(None, "", "");
    }

    /// Pushes an explicit command output response.
    pub fn push_output(
        &self,
        code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) {
        self.responses.borrow_mut().push_back(CommandOutput {
            code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        });
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, ExecError> {
        self.invocations.borrow_mut().push(CommandInvocation {
            program: program.to_owned(),
            args: args.to_vec(),
        });
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| ExecError::Spawn {
                program: program.to_owned(),
                message: String::from("no scripted response available"),
            })
    }
}

/// Stderr emitted by the cloud CLI when an IAM entity already exists.
pub const ENTITY_EXISTS_STDERR: &str = "An error occurred (EntityAlreadyExists) when calling \
    the CreateRole operation: Role with name already exists.";

/// Produces a backup storage location document recording `bucket`.
#[must_use]
pub fn json_storage_location(name: &str, bucket: &str) -> String {
    json!({
        "apiVersion": "velero.io/v1",
        "kind": "BackupStorageLocation",
        "metadata": { "name": name },
        "spec": {
            "provider": "aws",
            "objectStorage": { "bucket": bucket, "prefix": "velero" }
        }
    })
    .to_string()
}

/// Produces a single named resource document.
#[must_use]
pub fn json_resource(kind: &str, name: &str) -> String {
    json!({ "kind": kind, "metadata": { "name": name } }).to_string()
}

/// Produces a resource list document with the given item names.
#[must_use]
pub fn json_resource_list(kind: &str, names: &[&str]) -> String {
    let items = names
        .iter()
        .map(|name| json!({ "kind": kind, "metadata": { "name": name } }))
        .collect::<Vec<_>>();
    json!({ "kind": "List", "items": items }).to_string()
}

/// Produces the payload of `iam list-attached-role-policies --output json`.
#[must_use]
pub fn json_attached_policies(arns: &[&str]) -> String {
    let policies = arns
        .iter()
        .map(|arn| {
            let name = arn.rsplit('/').next().unwrap_or_default();
            json!({ "PolicyName": name, "PolicyArn": arn })
        })
        .collect::<Vec<_>>();
    json!({ "AttachedPolicies": policies }).to_string()
}
