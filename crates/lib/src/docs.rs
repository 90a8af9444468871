//! Documentation tasks.
//!
//! Rendering is delegated to Sphinx. Neither task depends on a build.

use tracing::info;

use crate::error::TaskError;
use crate::process::CommandSpec;
use crate::task::TaskContext;

/// Render the HTML documentation with `sphinx-build`.
pub fn build_docs(ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
  let config = ctx.config;
  let command = CommandSpec::new("sphinx-build")
    .args(["-b", "html"])
    .arg(&config.docs_source_dir)
    .arg(&config.docs_output_dir)
    .current_dir(&config.project_root);
  ctx.run(&command)
}

/// Open the rendered documentation in the desktop's browser.
///
/// # Errors
///
/// Returns `MissingArtifact` if the documentation has not been rendered yet.
pub fn open_docs(ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
  let config = ctx.config;
  let index = config.docs_index();
  if !index.is_file() {
    return Err(TaskError::MissingArtifact {
      what: "rendered documentation (run build_docs first)",
      path: index,
    });
  }

  let (program, args) = config.os.opener();
  info!(path = %index.display(), opener = program, "opening documentation");
  ctx.run(&CommandSpec::new(program).args(args).arg(&index))
}
