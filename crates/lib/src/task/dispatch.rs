//! Task dispatch.
//!
//! The dispatcher resolves requested names against a [`TaskGraph`] and runs
//! each task after its prerequisites. Satisfaction is tracked per dispatcher,
//! so a task needed by several requested tasks runs once per invocation and
//! nothing carries over between invocations.

use std::collections::HashMap;
use std::io::Write;
use std::time::Instant;

use tracing::{debug, error, info};

use super::{HELP_TASK, RunSummary, Task, TaskBody, TaskContext, TaskGraph, TaskRecord};
use crate::error::TaskError;

/// Lifecycle of a task within one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
  /// Not run yet, or the last attempt failed.
  Registered,
  /// Body is running.
  Invoked,
  /// Body completed; will not run again.
  Satisfied,
}

/// Runs tasks from a graph in dependency order.
pub struct Dispatcher<'g> {
  graph: &'g TaskGraph,
  states: HashMap<&'static str, TaskState>,
  failed: Option<&'static str>,
}

impl<'g> Dispatcher<'g> {
  pub fn new(graph: &'g TaskGraph) -> Self {
    Self {
      graph,
      states: graph.tasks().map(|t| (t.name, TaskState::Registered)).collect(),
      failed: None,
    }
  }

  pub fn state(&self, name: &str) -> Option<TaskState> {
    self.states.get(name).copied()
  }

  /// Name of the task whose failure ended the last run.
  pub fn failed_task(&self) -> Option<&'static str> {
    self.failed
  }

  /// Run the named tasks in order, each after its prerequisites.
  ///
  /// With no names, runs `help`. Every name is resolved before anything
  /// runs, so a typo never leaves a half-finished build behind.
  ///
  /// # Errors
  ///
  /// Returns `UnknownTask` for an unregistered name, otherwise the error of
  /// the first task that fails. Later tasks do not run.
  pub fn run<S: AsRef<str>>(&mut self, names: &[S], ctx: &mut TaskContext<'_>) -> Result<RunSummary, TaskError> {
    let requested: Vec<&str> = if names.is_empty() {
      vec![HELP_TASK]
    } else {
      names.iter().map(AsRef::as_ref).collect()
    };

    let graph = self.graph;
    let plans = requested
      .iter()
      .map(|name| graph.plan(name))
      .collect::<Result<Vec<_>, _>>()?;

    let mut summary = RunSummary::default();
    for task in plans.into_iter().flatten() {
      self.invoke(task, ctx, &mut summary)?;
    }

    info!(tasks = summary.tasks.len(), "run complete");
    Ok(summary)
  }

  fn invoke(&mut self, task: &Task, ctx: &mut TaskContext<'_>, summary: &mut RunSummary) -> Result<(), TaskError> {
    match self.state(task.name) {
      Some(TaskState::Satisfied) => {
        debug!(task = task.name, "already satisfied");
        return Ok(());
      }
      Some(TaskState::Invoked) => return Err(TaskError::CycleDetected),
      Some(TaskState::Registered) | None => {}
    }

    self.states.insert(task.name, TaskState::Invoked);
    info!(task = task.name, "running task");
    let start = Instant::now();

    let result = match task.body {
      TaskBody::Help => write_help(self.graph, &mut *ctx.status),
      TaskBody::Action(action) => action(ctx),
    };

    if let Err(e) = result {
      error!(task = task.name, error = %e, "task failed");
      self.states.insert(task.name, TaskState::Registered);
      self.failed = Some(task.name);
      return Err(e);
    }

    let elapsed = start.elapsed();
    debug!(task = task.name, elapsed_ms = elapsed.as_millis() as u64, "task satisfied");
    self.states.insert(task.name, TaskState::Satisfied);
    summary.tasks.push(TaskRecord {
      name: task.name.to_string(),
      elapsed_ms: elapsed.as_millis() as u64,
    });
    Ok(())
  }
}

/// Print every registered task with its description and prerequisites.
pub fn write_help(graph: &TaskGraph, out: &mut dyn Write) -> Result<(), TaskError> {
  writeln!(out, "Tasks:")?;
  for task in graph.tasks() {
    if task.needs.is_empty() {
      writeln!(out, "  {:<20}{}", task.name, task.description)?;
    } else {
      writeln!(
        out,
        "  {:<20}{} (needs {})",
        task.name,
        task.description,
        task.needs.join(", ")
      )?;
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::process::CommandSpec;
  use crate::task::standard_tasks;
  use crate::util::testutil::{ScriptedRunner, static_config};
  use tempfile::TempDir;

  fn record(ctx: &mut TaskContext<'_>, name: &str) -> Result<(), TaskError> {
    ctx.run(&CommandSpec::new(name))
  }

  fn fetch(ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
    record(ctx, "fetch")
  }

  fn compile(ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
    record(ctx, "compile")
  }

  fn check(ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
    record(ctx, "check")
  }

  fn lint(ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
    record(ctx, "lint")
  }

  fn graph() -> TaskGraph {
    TaskGraph::new([
      Task {
        name: HELP_TASK,
        description: "Show tasks.",
        needs: &[],
        body: TaskBody::Help,
      },
      Task::new("fetch", "Fetch sources.", fetch),
      Task::new("compile", "Compile.", compile).needs(&["fetch"]),
      Task::new("check", "Run checks.", check).needs(&["compile"]),
      Task::new("lint", "Lint.", lint).needs(&["fetch"]),
    ])
    .unwrap()
  }

  #[test]
  fn no_arguments_runs_help_only() {
    let temp = TempDir::new().unwrap();
    let config = static_config(temp.path());
    let graph = graph();
    let mut runner = ScriptedRunner::new();
    let mut status = Vec::new();
    let mut ctx = TaskContext::new(&config, &mut runner, &mut status);

    let summary = Dispatcher::new(&graph).run::<&str>(&[], &mut ctx).unwrap();

    assert_eq!(summary.names(), vec!["help"]);
    assert!(runner.calls.is_empty());
    let help = String::from_utf8(status).unwrap();
    assert!(help.contains("compile"));
    assert!(help.contains("(needs fetch)"));
  }

  #[test]
  fn prerequisites_run_first() {
    let temp = TempDir::new().unwrap();
    let config = static_config(temp.path());
    let graph = graph();
    let mut runner = ScriptedRunner::new();
    let mut status = Vec::new();
    let mut ctx = TaskContext::new(&config, &mut runner, &mut status);

    let summary = Dispatcher::new(&graph).run(&["check"], &mut ctx).unwrap();

    assert_eq!(summary.names(), vec!["fetch", "compile", "check"]);
    assert_eq!(runner.programs(), vec!["fetch", "compile", "check"]);
  }

  #[test]
  fn shared_prerequisite_runs_once() {
    let temp = TempDir::new().unwrap();
    let config = static_config(temp.path());
    let graph = graph();
    let mut runner = ScriptedRunner::new();
    let mut status = Vec::new();
    let mut ctx = TaskContext::new(&config, &mut runner, &mut status);

    let mut dispatcher = Dispatcher::new(&graph);
    dispatcher.run(&["check", "lint", "compile"], &mut ctx).unwrap();

    assert_eq!(runner.programs(), vec!["fetch", "compile", "check", "lint"]);
    assert_eq!(dispatcher.state("lint"), Some(TaskState::Satisfied));
    assert_eq!(dispatcher.state("help"), Some(TaskState::Registered));
  }

  #[test]
  fn unknown_task_fails_before_anything_runs() {
    let temp = TempDir::new().unwrap();
    let config = static_config(temp.path());
    let graph = graph();
    let mut runner = ScriptedRunner::new();
    let mut status = Vec::new();
    let mut ctx = TaskContext::new(&config, &mut runner, &mut status);

    let result = Dispatcher::new(&graph).run(&["compile", "deploy"], &mut ctx);

    assert!(matches!(result, Err(TaskError::UnknownTask(name)) if name == "deploy"));
    assert!(runner.calls.is_empty());
  }

  #[test]
  fn failure_stops_the_run() {
    let temp = TempDir::new().unwrap();
    let config = static_config(temp.path());
    let graph = graph();
    let mut runner = ScriptedRunner::new().fail_on("compile", 2);
    let mut status = Vec::new();
    let mut ctx = TaskContext::new(&config, &mut runner, &mut status);

    let mut dispatcher = Dispatcher::new(&graph);
    let result = dispatcher.run(&["check", "lint"], &mut ctx);

    assert_eq!(result.unwrap_err().exit_code(), 2);
    assert_eq!(runner.programs(), vec!["fetch", "compile"]);
    assert_eq!(dispatcher.failed_task(), Some("compile"));
    assert_eq!(dispatcher.state("compile"), Some(TaskState::Registered));
    assert_eq!(dispatcher.state("check"), Some(TaskState::Registered));
  }

  #[test]
  fn failed_task_is_retried_on_the_same_dispatcher() {
    let temp = TempDir::new().unwrap();
    let config = static_config(temp.path());
    let graph = graph();
    let mut runner = ScriptedRunner::new().fail_on("compile", 2);
    let mut status = Vec::new();
    let mut ctx = TaskContext::new(&config, &mut runner, &mut status);

    let mut dispatcher = Dispatcher::new(&graph);
    dispatcher.run(&["compile"], &mut ctx).unwrap_err();
    let retry = dispatcher.run(&["compile"], &mut ctx);

    assert!(matches!(retry, Err(TaskError::CmdFailed { code: Some(2), .. })));
    assert_eq!(runner.programs(), vec!["fetch", "compile", "compile"]);
  }

  #[test]
  fn fresh_dispatcher_starts_cold() {
    let temp = TempDir::new().unwrap();
    let config = static_config(temp.path());
    let graph = graph();
    let mut runner = ScriptedRunner::new();
    let mut status = Vec::new();
    let mut ctx = TaskContext::new(&config, &mut runner, &mut status);

    Dispatcher::new(&graph).run(&["fetch"], &mut ctx).unwrap();
    Dispatcher::new(&graph).run(&["fetch"], &mut ctx).unwrap();

    assert_eq!(runner.programs(), vec!["fetch", "fetch"]);
  }

  #[test]
  fn help_lists_standard_tasks() {
    let graph = TaskGraph::new(standard_tasks()).unwrap();
    let mut out = Vec::new();
    write_help(&graph, &mut out).unwrap();
    let help = String::from_utf8(out).unwrap();

    for name in ["docs", "build_spidermonkey", "build", "build_docs", "test", "clean"] {
      assert!(help.contains(name), "help is missing {}", name);
    }
    assert!(help.contains("(needs build_spidermonkey)"));
  }
}
