//! External process invocation.
//!
//! All child processes go through a [`ProcessRunner`]. The runner only reports
//! exit statuses; turning a nonzero status into a build failure is the
//! caller's job (see [`run_checked`]).
//!
//! - [`SystemRunner`] spawns real processes and blocks until they exit.
//! - [`DryRunRunner`] records command lines and reports a fixed status.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use extbuild_types::{BuildError, BuildResult};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// A fully described child process invocation.
///
/// `env` is an overlay applied on top of the inherited environment of this
/// process; it is never written into this process's own environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<Utf8PathBuf>,
    pub env: BTreeMap<String, String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn envs(mut self, vars: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Short tool name for diagnostics: the program's file stem.
    pub fn tool_name(&self) -> &str {
        Utf8Path::new(&self.program)
            .file_stem()
            .unwrap_or(&self.program)
    }

    /// The command line as a single display string.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd.envs(&self.env);
        cmd
    }
}

/// Output of a captured invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Synchronous process execution.
pub trait ProcessRunner {
    /// Run with inherited standard output/error and return the exit status.
    fn run(&self, cmd: &CommandSpec) -> anyhow::Result<i32>;

    /// Run with captured standard output/error.
    fn run_captured(&self, cmd: &CommandSpec) -> anyhow::Result<CapturedOutput>;
}

/// Run `cmd` and turn a nonzero exit status into [`BuildError::ToolFailed`].
pub fn run_checked(runner: &dyn ProcessRunner, cmd: &CommandSpec) -> BuildResult<()> {
    let status = runner.run(cmd)?;
    if status != 0 {
        return Err(BuildError::tool_failed(cmd.tool_name(), status));
    }
    Ok(())
}

/// Spawns real OS processes.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, cmd: &CommandSpec) -> anyhow::Result<i32> {
        debug!(command = %cmd.display(), cwd = ?cmd.cwd, env = ?cmd.env, "spawning");
        let mut command = cmd.to_command();

        let status = if cfg!(windows) {
            // Children do not reliably inherit stdin here; hand them a pipe
            // and close it straight away since nothing is ever sent.
            let mut child = command
                .stdin(Stdio::piped())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .spawn()
                .with_context(|| format!("spawn {}", cmd.program))?;
            drop(child.stdin.take());
            child
                .wait()
                .with_context(|| format!("wait for {}", cmd.program))?
        } else {
            command
                .status()
                .with_context(|| format!("spawn {}", cmd.program))?
        };

        // A child killed by a signal has no code.
        let code = status.code().unwrap_or(-1);
        debug!(command = %cmd.program, status = code, "process exited");
        Ok(code)
    }

    fn run_captured(&self, cmd: &CommandSpec) -> anyhow::Result<CapturedOutput> {
        debug!(command = %cmd.display(), "spawning (captured)");
        let output = cmd
            .to_command()
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("spawn {}", cmd.program))?;
        Ok(CapturedOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Logs and records commands instead of spawning them.
///
/// Reports `status` for every invocation and `stdout` for captured ones.
#[derive(Debug, Default)]
pub struct DryRunRunner {
    recorded: RefCell<Vec<CommandSpec>>,
    status: i32,
    stdout: String,
}

impl DryRunRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `status` for every invocation.
    pub fn with_status(status: i32) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Report `stdout` from captured invocations.
    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn recorded(&self) -> Vec<CommandSpec> {
        self.recorded.borrow().clone()
    }
}

impl ProcessRunner for DryRunRunner {
    fn run(&self, cmd: &CommandSpec) -> anyhow::Result<i32> {
        info!(command = %cmd.display(), "dry-run: not executed");
        self.recorded.borrow_mut().push(cmd.clone());
        Ok(self.status)
    }

    fn run_captured(&self, cmd: &CommandSpec) -> anyhow::Result<CapturedOutput> {
        self.recorded.borrow_mut().push(cmd.clone());
        Ok(CapturedOutput {
            status: self.status,
            stdout: self.stdout.clone(),
            stderr: String::new(),
        })
    }
}
