//! Build directory removal.

use std::fs;

use tracing::info;

use crate::error::TaskError;
use crate::task::TaskContext;

/// Remove the build directory.
///
/// The fetched sources are left alone, so the next build re-configures and
/// recompiles without downloading again.
pub fn clean_build_dir(ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
  let config = ctx.config;
  let build_dir = &config.build_dir;

  if !build_dir.exists() {
    info!(path = %build_dir.display(), "nothing to clean");
    return Ok(());
  }

  ctx.say(&format!("Removing {}.", build_dir.display()))?;
  fs::remove_dir_all(build_dir)?;
  Ok(())
}
