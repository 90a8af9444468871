//! External command execution.
//!
//! Tasks describe the programs they need as [`CommandSpec`] values and hand
//! them to a [`CommandRunner`]. [`SystemRunner`] spawns real processes with
//! inherited stdio; tests substitute a runner that records the calls.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::env::EnvOverlay;
use crate::error::TaskError;

/// A program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
  pub program: OsString,
  pub args: Vec<OsString>,
  /// Working directory. Inherited when `None`.
  pub cwd: Option<PathBuf>,
  /// Complete child environment. Inherited when `None`.
  pub env: Option<BTreeMap<OsString, OsString>>,
}

impl CommandSpec {
  pub fn new(program: impl Into<OsString>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: None,
      env: None,
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

  pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
    self.cwd = Some(dir.as_ref().to_path_buf());
    self
  }

  /// Replace the child's environment with the overlay's variables.
  pub fn env_overlay(mut self, overlay: &EnvOverlay) -> Self {
    self.env = Some(overlay.vars().clone());
    self
  }

  /// File name of the program, without directories.
  pub fn program_name(&self) -> String {
    Path::new(&self.program)
      .file_name()
      .unwrap_or(self.program.as_os_str())
      .to_string_lossy()
      .into_owned()
  }

  /// Command line for logs and error messages.
  pub fn display(&self) -> String {
    std::iter::once(self.program.as_os_str())
      .chain(self.args.iter().map(OsString::as_os_str))
      .map(OsStr::to_string_lossy)
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// How a finished process exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
  /// Exit code, or `None` if the process was killed by a signal.
  pub code: Option<i32>,
}

impl CommandStatus {
  pub fn success(&self) -> bool {
    self.code == Some(0)
  }
}

/// Executes commands on behalf of tasks.
pub trait CommandRunner {
  /// Run `command` to completion and report how it exited.
  ///
  /// # Errors
  ///
  /// Returns `Spawn` if the program could not be started at all.
  fn status(&mut self, command: &CommandSpec) -> Result<CommandStatus, TaskError>;
}

/// Runs commands as real child processes, blocking until they exit.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
  fn status(&mut self, spec: &CommandSpec) -> Result<CommandStatus, TaskError> {
    let mut command = Command::new(&spec.program);
    command.args(&spec.args);

    if let Some(cwd) = &spec.cwd {
      command.current_dir(cwd);
    }

    if let Some(env) = &spec.env {
      command.env_clear().envs(env);
    }

    debug!(cmd = %spec.display(), cwd = ?spec.cwd, "spawning process");

    let status = command.status().map_err(|source| TaskError::Spawn {
      program: spec.program.to_string_lossy().into_owned(),
      source,
    })?;

    Ok(CommandStatus { code: status.code() })
  }
}

/// Run `command` and turn an unsuccessful exit into `CmdFailed`.
pub fn run_checked(runner: &mut dyn CommandRunner, command: &CommandSpec) -> Result<(), TaskError> {
  info!(cmd = %command.display(), "running command");

  let status = runner.status(command)?;
  if !status.success() {
    return Err(TaskError::CmdFailed {
      cmd: command.display(),
      code: status.code,
    });
  }
  Ok(())
}
