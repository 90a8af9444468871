//! SpiderMonkey native library build.
//!
//! The library is built out of tree in the object directory. Configure only
//! runs while the generated Makefile is missing; make runs every time and
//! does its own incremental work.

use std::fs;

use tracing::info;

use crate::error::TaskError;
use crate::process::CommandSpec;
use crate::task::TaskContext;

/// Flags passed to SpiderMonkey's configure script.
pub const CONFIGURE_FLAGS: &[&str] = &["--enable-static", "--disable-tests"];

/// Configure (once) and make SpiderMonkey in the object directory.
///
/// # Errors
///
/// Returns `CmdFailed` carrying the child's exit code if configure or make
/// fails. A failed configure means make is never run.
pub fn build_native(ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
  let config = ctx.config;
  fs::create_dir_all(&config.objdir)?;

  if config.makefile.exists() {
    info!(makefile = %config.relative(&config.makefile).display(), "already configured");
  } else {
    ctx.say("Running configure.")?;
    let configure = CommandSpec::new(config.configure_script())
      .args(CONFIGURE_FLAGS)
      .current_dir(&config.objdir);
    ctx.run(&configure)?;
  }

  ctx.say("Running make.")?;
  let make = CommandSpec::new(&config.make).current_dir(&config.objdir);
  ctx.run(&make)
}
