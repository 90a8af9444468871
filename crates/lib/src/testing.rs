//! Extension test runner.
//!
//! Runs the primary test suite, then the documentation doctests, both with
//! the freshly built extension importable from the build directory. The
//! doctests only run once the primary suite passes.

use tracing::debug;

use crate::config::BuildConfig;
use crate::consts::{PYTHON_PATH_VAR, TEST_SCRIPT};
use crate::env::EnvOverlay;
use crate::error::TaskError;
use crate::process::CommandSpec;
use crate::task::TaskContext;

/// Extend `base` so test processes can load the built extension.
///
/// The extension build directory goes on `PYTHONPATH`. Under the dynamic
/// link policy the object directory also goes on the loader search path so
/// the SpiderMonkey DLL resolves.
pub fn test_environment(config: &BuildConfig, mut base: EnvOverlay) -> Result<EnvOverlay, TaskError> {
  base.append_path(PYTHON_PATH_VAR, &config.ext_build_dir)?;

  if config.link_policy.is_dynamic() {
    base.append_path(config.os.loader_path_var(), &config.objdir)?;
  }

  Ok(base)
}

/// Run the test suite and then the doctests.
///
/// # Errors
///
/// Returns `MissingArtifact` if the extension has not been built and
/// `CmdFailed` with the child's exit code for the first failing phase.
pub fn run_tests(ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
  let config = ctx.config;

  if !config.ext_build_dir.is_dir() {
    return Err(TaskError::MissingArtifact {
      what: "extension build directory",
      path: config.ext_build_dir.clone(),
    });
  }

  let env = test_environment(config, EnvOverlay::from_ambient())?;
  debug!(pythonpath = ?env.get(PYTHON_PATH_VAR), "prepared test environment");

  ctx.say("Running test suite.")?;
  let suite = CommandSpec::new(&config.python)
    .arg(TEST_SCRIPT)
    .current_dir(&config.project_root)
    .env_overlay(&env);
  ctx.run(&suite)?;

  ctx.say("Running doctests.")?;
  let doctests = CommandSpec::new("sphinx-build")
    .args(["-b", "doctest"])
    .arg(&config.docs_source_dir)
    .arg(&config.doctest_output_dir)
    .current_dir(&config.project_root)
    .env_overlay(&env);
  ctx.run(&doctests)
}
