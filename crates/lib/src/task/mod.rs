//! Task registry and execution.
//!
//! A [`Task`] is a named provisioning step with a list of prerequisites.
//! [`TaskGraph`] validates the registry once at startup and [`Dispatcher`]
//! runs requested tasks after their prerequisites, each at most once per
//! invocation.

pub mod dispatch;
pub mod graph;

use std::fmt;
use std::io::Write;

use serde::Serialize;

use crate::config::BuildConfig;
use crate::error::TaskError;
use crate::process::{CommandRunner, CommandSpec, run_checked};
use crate::{clean, docs, extension, fetch, native, testing};

pub use dispatch::{Dispatcher, TaskState};
pub use graph::TaskGraph;

/// Task run when no task names are given.
pub const HELP_TASK: &str = "help";

/// Everything a task body gets to work with.
pub struct TaskContext<'a> {
  pub config: &'a BuildConfig,
  pub runner: &'a mut dyn CommandRunner,
  /// Human-readable progress output.
  pub status: &'a mut dyn Write,
}

impl<'a> TaskContext<'a> {
  pub fn new(config: &'a BuildConfig, runner: &'a mut dyn CommandRunner, status: &'a mut dyn Write) -> Self {
    Self { config, runner, status }
  }

  /// Run a command, failing on a non-zero exit.
  pub fn run(&mut self, command: &CommandSpec) -> Result<(), TaskError> {
    run_checked(&mut *self.runner, command)
  }

  /// Print a status line.
  pub fn say(&mut self, message: &str) -> Result<(), TaskError> {
    writeln!(self.status, "{}", message)?;
    Ok(())
  }
}

pub type TaskAction = fn(&mut TaskContext<'_>) -> Result<(), TaskError>;

/// What running a task does.
#[derive(Clone, Copy)]
pub enum TaskBody {
  /// List the registered tasks.
  Help,
  Action(TaskAction),
}

impl fmt::Debug for TaskBody {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TaskBody::Help => write!(f, "Help"),
      TaskBody::Action(_) => write!(f, "Action"),
    }
  }
}

/// A named step and the tasks that must run before it.
#[derive(Debug, Clone, Copy)]
pub struct Task {
  pub name: &'static str,
  pub description: &'static str,
  pub needs: &'static [&'static str],
  pub body: TaskBody,
}

impl Task {
  pub const fn new(name: &'static str, description: &'static str, action: TaskAction) -> Self {
    Self {
      name,
      description,
      needs: &[],
      body: TaskBody::Action(action),
    }
  }

  pub const fn needs(mut self, needs: &'static [&'static str]) -> Self {
    self.needs = needs;
    self
  }
}

/// Timing for one executed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRecord {
  pub name: String,
  pub elapsed_ms: u64,
}

/// Tasks executed by one dispatcher run, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
  pub tasks: Vec<TaskRecord>,
}

impl RunSummary {
  pub fn names(&self) -> Vec<&str> {
    self.tasks.iter().map(|t| t.name.as_str()).collect()
  }
}

/// The tasks `pave` knows about.
pub fn standard_tasks() -> Vec<Task> {
  vec![
    Task {
      name: HELP_TASK,
      description: "Show the available tasks.",
      needs: &[],
      body: TaskBody::Help,
    },
    Task::new("docs", "Open the Pymonkey documentation in your web browser.", docs::open_docs),
    Task::new("build_spidermonkey", "Fetch and build SpiderMonkey.", build_spidermonkey),
    Task::new("build", "Builds the pymonkey extension.", extension::build_extension).needs(&["build_spidermonkey"]),
    Task::new(
      "build_docs",
      "Build the Pymonkey documentation (requires Sphinx).",
      docs::build_docs,
    ),
    Task::new("test", "Test the Pymonkey Python C extension.", testing::run_tests).needs(&["build"]),
    Task::new(
      "clean",
      "Remove the build directory, forcing SpiderMonkey to be re-configured.",
      clean::clean_build_dir,
    ),
  ]
}

fn build_spidermonkey(ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
  fetch::ensure_source(ctx)?;
  native::build_native(ctx)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::{ScriptedRunner, static_config};
  use tempfile::TempDir;

  #[test]
  fn standard_registry_is_valid() {
    let graph = TaskGraph::new(standard_tasks()).unwrap();
    let names: Vec<_> = graph.tasks().map(|t| t.name).collect();
    assert_eq!(
      names,
      vec!["help", "docs", "build_spidermonkey", "build", "build_docs", "test", "clean"]
    );
  }

  #[test]
  fn test_requires_build_requires_spidermonkey() {
    let graph = TaskGraph::new(standard_tasks()).unwrap();
    let plan: Vec<_> = graph.plan("test").unwrap().iter().map(|t| t.name).collect();
    assert_eq!(plan, vec!["build_spidermonkey", "build", "test"]);
  }

  #[test]
  fn independent_tasks_have_no_prerequisites() {
    let graph = TaskGraph::new(standard_tasks()).unwrap();
    for name in ["docs", "build_docs", "clean", "help"] {
      let plan: Vec<_> = graph.plan(name).unwrap().iter().map(|t| t.name).collect();
      assert_eq!(plan, vec![name]);
    }
  }

  /// Project root whose sources are already fetched, so no network is needed.
  fn fetched_project() -> (TempDir, BuildConfig) {
    let temp = TempDir::new().unwrap();
    let config = static_config(temp.path());
    std::fs::create_dir_all(config.configure_script().parent().unwrap()).unwrap();
    (temp, config)
  }

  #[test]
  fn test_from_cold_build_root_runs_every_phase_in_order() {
    let (_temp, config) = fetched_project();
    let graph = TaskGraph::new(standard_tasks()).unwrap();
    let mut runner = ScriptedRunner::new();
    let mut status = Vec::new();
    let mut ctx = TaskContext::new(&config, &mut runner, &mut status);

    let summary = Dispatcher::new(&graph).run(&["test"], &mut ctx).unwrap();

    assert_eq!(summary.names(), vec!["build_spidermonkey", "build", "test"]);
    let commands: Vec<String> = runner.calls.iter().map(|c| c.display()).collect();
    assert_eq!(commands.len(), 5);
    assert!(commands[0].ends_with("configure --enable-static --disable-tests"));
    assert_eq!(commands[1], "make");
    assert!(commands[2].starts_with("python3 "));
    assert!(commands[2].contains("setup_pymonkey.py build_ext"));
    assert_eq!(commands[3], "python3 test_pymonkey.py");
    assert!(commands[4].starts_with("sphinx-build -b doctest"));
  }

  #[test]
  fn configure_failure_ends_the_whole_run_with_its_code() {
    let (_temp, config) = fetched_project();
    let graph = TaskGraph::new(standard_tasks()).unwrap();
    let mut runner = ScriptedRunner::new().fail_on("configure", 2);
    let mut status = Vec::new();
    let mut ctx = TaskContext::new(&config, &mut runner, &mut status);

    let mut dispatcher = Dispatcher::new(&graph);
    let result = dispatcher.run(&["test"], &mut ctx);

    assert_eq!(result.unwrap_err().exit_code(), 2);
    assert_eq!(runner.programs(), vec!["configure"]);
    assert_eq!(dispatcher.failed_task(), Some("build_spidermonkey"));
  }

  #[test]
  fn build_then_test_builds_once() {
    let (_temp, config) = fetched_project();
    let graph = TaskGraph::new(standard_tasks()).unwrap();
    let mut runner = ScriptedRunner::new().creates("configure", &config.makefile);
    let mut status = Vec::new();
    let mut ctx = TaskContext::new(&config, &mut runner, &mut status);

    let summary = Dispatcher::new(&graph).run(&["build", "test"], &mut ctx).unwrap();

    assert_eq!(summary.names(), vec!["build_spidermonkey", "build", "test"]);
    assert_eq!(runner.calls_matching("make").len(), 1);
    assert_eq!(runner.calls_matching("build_ext").len(), 1);
  }

  #[test]
  fn context_run_propagates_failure() {
    let temp = TempDir::new().unwrap();
    let config = static_config(temp.path());
    let mut runner = ScriptedRunner::new().fail_on("make", 4);
    let mut status = Vec::new();
    let mut ctx = TaskContext::new(&config, &mut runner, &mut status);

    let result = ctx.run(&CommandSpec::new("make"));

    assert!(matches!(result, Err(TaskError::CmdFailed { code: Some(4), .. })));
  }
}
