//! pymonkey extension module build.
//!
//! The extension is declared by a setup script generated into the build
//! directory: module name, sources, package metadata, and the include paths,
//! library paths, libraries and macros of the link policy. The host Python's
//! `build_ext` command then compiles it. Under the dynamic link policy the
//! SpiderMonkey DLL is copied next to the built module so the interpreter can
//! load it.

use std::fmt::Write as _;
use std::fs;

use tracing::info;

use crate::config::{BuildConfig, LinkPolicy};
use crate::consts::{
  EXTENSION_NAME, EXTENSION_SOURCES, PACKAGE_AUTHOR, PACKAGE_AUTHOR_EMAIL, PACKAGE_DESCRIPTION, PACKAGE_URL,
  PACKAGE_VERSION,
};
use crate::error::TaskError;
use crate::process::CommandSpec;
use crate::task::TaskContext;

/// Single-quoted Python string literal.
fn py_str(value: &str) -> String {
  format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn py_list<I, S>(items: I) -> String
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let items: Vec<String> = items.into_iter().map(|item| py_str(item.as_ref())).collect();
  format!("[{}]", items.join(", "))
}

/// Contents of the setup script declaring the extension.
///
/// Sources stay relative; the script is run from the project root.
pub fn setup_script(config: &BuildConfig) -> String {
  let policy = &config.link_policy;
  let mut script = String::new();

  // Writing into a String cannot fail.
  let _ = writeln!(script, "# Generated by pave; rewritten on every build.");
  let _ = writeln!(script, "from setuptools import setup, Extension");
  let _ = writeln!(script);
  let _ = writeln!(script, "setup(");
  let _ = writeln!(script, "    name={},", py_str(EXTENSION_NAME));
  let _ = writeln!(script, "    version={},", py_str(PACKAGE_VERSION));
  let _ = writeln!(script, "    description={},", py_str(PACKAGE_DESCRIPTION));
  let _ = writeln!(script, "    author={},", py_str(PACKAGE_AUTHOR));
  let _ = writeln!(script, "    author_email={},", py_str(PACKAGE_AUTHOR_EMAIL));
  let _ = writeln!(script, "    url={},", py_str(PACKAGE_URL));
  let _ = writeln!(script, "    ext_modules=[");
  let _ = writeln!(script, "        Extension(");
  let _ = writeln!(script, "            {},", py_str(EXTENSION_NAME));
  let _ = writeln!(script, "            {},", py_list(EXTENSION_SOURCES));
  let _ = writeln!(
    script,
    "            include_dirs={},",
    py_list([config.include_dir().to_string_lossy()])
  );
  let _ = writeln!(
    script,
    "            library_dirs={},",
    py_list([config.objdir.to_string_lossy()])
  );
  let _ = writeln!(script, "            libraries={},", py_list([policy.library()]));

  let defines = policy.defines();
  if !defines.is_empty() {
    let macros: Vec<String> = defines
      .iter()
      .map(|(name, value)| format!("({}, {})", py_str(name), py_str(value)))
      .collect();
    let _ = writeln!(script, "            define_macros=[{}],", macros.join(", "));
  }

  let _ = writeln!(script, "        ),");
  let _ = writeln!(script, "    ],");
  let _ = writeln!(script, ")");
  script
}

/// `build_ext` invocation of the generated setup script.
pub fn build_ext_command(config: &BuildConfig) -> CommandSpec {
  CommandSpec::new(&config.python)
    .arg(&config.setup_script)
    .arg("build_ext")
    .arg("--build-lib")
    .arg(&config.ext_build_dir)
    .arg("--build-temp")
    .arg(&config.ext_temp_dir)
    .current_dir(&config.project_root)
}

/// Compile the extension against the built SpiderMonkey.
///
/// # Errors
///
/// Returns `CmdFailed` if the toolchain fails and `MissingArtifact` if the
/// DLL to stage was not produced by the native build.
pub fn build_extension(ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
  let config = ctx.config;
  fs::create_dir_all(&config.ext_build_dir)?;
  fs::write(&config.setup_script, setup_script(config))?;
  info!(script = %config.relative(&config.setup_script).display(), "wrote setup script");

  ctx.say(&format!("Building the {} extension.", EXTENSION_NAME))?;
  ctx.run(&build_ext_command(config))?;

  if let LinkPolicy::Dynamic { shared_library, .. } = &config.link_policy {
    stage_shared_library(config, shared_library)?;
  }

  Ok(())
}

/// Copy the shared library from the object directory next to the extension.
fn stage_shared_library(config: &BuildConfig, name: &str) -> Result<(), TaskError> {
  let source = config.objdir.join(name);
  if !source.is_file() {
    return Err(TaskError::MissingArtifact {
      what: "SpiderMonkey shared library",
      path: source,
    });
  }

  let dest = config.ext_build_dir.join(name);
  fs::copy(&source, &dest)?;
  info!(from = %source.display(), to = %dest.display(), "staged shared library");
  Ok(())
}
