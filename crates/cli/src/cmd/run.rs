//! Task run command implementation.
//!
//! Resolves the build configuration, runs the requested tasks through the
//! dispatcher and reports what ran.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use pavement_lib::process::SystemRunner;
use pavement_lib::task::{HELP_TASK, standard_tasks};
use pavement_lib::{BuildConfig, ConfigOverrides, Dispatcher, RunSummary, TaskContext, TaskGraph};

use crate::output::{OutputFormat, format_duration, print_info, print_json, print_success};

pub fn cmd_run(tasks: &[String], overrides: ConfigOverrides, format: OutputFormat) -> Result<()> {
  let config = BuildConfig::from_overrides(overrides).context("Failed to resolve build configuration")?;
  debug!(
    root = %config.project_root.display(),
    python = %config.python,
    library = config.link_policy.library(),
    "resolved configuration"
  );

  let graph = TaskGraph::new(standard_tasks()).context("Invalid task registry")?;

  // JSON mode keeps stdout for the summary document.
  let mut status: Box<dyn Write> = if format.is_json() {
    Box::new(io::stderr())
  } else {
    Box::new(io::stdout())
  };

  let mut runner = SystemRunner;
  let mut ctx = TaskContext::new(&config, &mut runner, &mut *status);
  let mut dispatcher = Dispatcher::new(&graph);

  let summary = match dispatcher.run(tasks, &mut ctx) {
    Ok(summary) => summary,
    Err(err) => {
      let err = anyhow::Error::new(err);
      return Err(match dispatcher.failed_task() {
        Some(task) => err.context(format!("Task {} failed", task)),
        None => err,
      });
    }
  };

  if format.is_json() {
    print_json(&summary)?;
  } else {
    print_summary(&summary);
  }

  Ok(())
}

fn print_summary(summary: &RunSummary) {
  let ran: Vec<_> = summary.tasks.iter().filter(|t| t.name != HELP_TASK).collect();
  if ran.is_empty() {
    return;
  }

  for record in &ran {
    let elapsed = format_duration(Duration::from_millis(record.elapsed_ms));
    print_success(&format!("{} ({})", record.name, elapsed));
  }

  let total: u64 = ran.iter().map(|t| t.elapsed_ms).sum();
  print_info(&format!(
    "{} task(s) finished in {}",
    ran.len(),
    format_duration(Duration::from_millis(total))
  ));
}
