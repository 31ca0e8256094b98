//! External process invocation.
//!
//! Every shell tool the kernel relies on (`file`, `attr`, `grep`, `zip`,
//! `shuf`, `diff`) is reached through [`ProcessRunner`]. The runner never
//! decides what a nonzero exit means; callers either accept specific codes
//! (grep and diff use 1 as a normal answer) or call
//! [`ToolOutput::require_success`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

/// A single external command: operation name, program, argv, working dir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    op: &'static str,
    program: PathBuf,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
}

impl Invocation {
    /// Create an invocation. `op` names the operation for error reports.
    pub fn new(op: &'static str, program: impl Into<PathBuf>) -> Self {
        Self {
            op,
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run the command from `dir` instead of inheriting the process cwd.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn op(&self) -> &'static str {
        self.op
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn argv(&self) -> &[OsString] {
        &self.args
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Argument `i` as a lossy string (test and log helper).
    pub fn arg_str(&self, i: usize) -> Option<String> {
        self.args.get(i).map(|a| a.to_string_lossy().into_owned())
    }

    /// Failure for this invocation with the given exit code.
    pub fn failed(&self, code: i32, stderr: impl Into<String>) -> ToolFailure {
        ToolFailure::exited(self.op, &self.program, code, stderr)
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolOutput {
    /// Exit code. 0 means success; -1 if terminated by a signal.
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// True if the process exited 0.
    pub fn ok(&self) -> bool {
        self.code == 0
    }

    /// Turn a nonzero exit into a [`ToolFailure`] for `invocation`.
    pub fn require_success(self, invocation: &Invocation) -> Result<Self, ToolFailure> {
        if self.ok() {
            Ok(self)
        } else {
            Err(invocation.failed(self.code, self.stderr.trim()))
        }
    }
}

/// An external tool failed to start or exited unsuccessfully.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{op}: {} {}", .program.display(), describe(.code, .stderr))]
pub struct ToolFailure {
    op: String,
    program: PathBuf,
    code: Option<i32>,
    stderr: String,
}

fn describe(code: &Option<i32>, stderr: &str) -> String {
    match (code, stderr.is_empty()) {
        (Some(code), true) => format!("exited with status {code}"),
        (Some(code), false) => format!("exited with status {code}: {stderr}"),
        (None, _) => stderr.to_string(),
    }
}

impl ToolFailure {
    /// The process ran and exited with `code`.
    pub fn exited(
        op: impl Into<String>,
        program: impl Into<PathBuf>,
        code: i32,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            op: op.into(),
            program: program.into(),
            code: Some(code),
            stderr: stderr.into(),
        }
    }

    /// The process could not be spawned at all.
    pub fn spawn(op: impl Into<String>, program: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self {
            op: op.into(),
            program: program.into(),
            code: None,
            stderr: format!("could not be started: {err}"),
        }
    }

    /// A collaborator without an exit status (native attribute calls) failed.
    pub fn native(op: impl Into<String>, target: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self {
            op: op.into(),
            program: target.into(),
            code: None,
            stderr: err.to_string(),
        }
    }

    pub fn op(&self) -> &str {
        &self.op
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Exit code, `None` if the process never started.
    pub fn code(&self) -> Option<i32> {
        self.code
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }
}

/// Runs external commands synchronously.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessRunner: Send + Sync {
    /// Run to completion and capture output. A nonzero exit is still `Ok`;
    /// only failure to spawn or wait is `Err`.
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolFailure>;
}

/// [`ProcessRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolFailure> {
        tracing::debug!(
            op = invocation.op(),
            program = %invocation.program().display(),
            args = ?invocation.argv(),
            cwd = ?invocation.cwd(),
            "running external tool"
        );

        let mut cmd = Command::new(invocation.program());
        cmd.args(invocation.argv())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = invocation.cwd() {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .map_err(|e| ToolFailure::spawn(invocation.op(), invocation.program(), &e))?;

        let code = output.status.code().unwrap_or(-1);
        if code != 0 {
            tracing::debug!(op = invocation.op(), code, "external tool exited nonzero");
        }

        Ok(ToolOutput {
            code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
