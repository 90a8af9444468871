//! Test utilities for pavement-lib.
//!
//! This module provides a scripted [`CommandRunner`] that records every
//! command instead of spawning it, fixture archive builders, and
//! cross-platform helpers for tests that do need a real shell.

use std::io::Write;
use std::path::{Path, PathBuf};

use bzip2::write::BzEncoder;
use flate2::write::GzEncoder;

use crate::config::BuildConfig;
use crate::error::TaskError;
use crate::platform::Os;
use crate::process::{CommandRunner, CommandSpec, CommandStatus};

/// Records commands and answers with canned exit codes.
///
/// Every command succeeds unless it matches a `fail_on` rule. Matching is a
/// substring test against the displayed command line.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
  pub calls: Vec<CommandSpec>,
  failures: Vec<(String, i32)>,
  creates: Vec<(String, PathBuf)>,
}

impl ScriptedRunner {
  pub fn new() -> Self {
    Self::default()
  }

  /// Exit with `code` for commands containing `needle`.
  pub fn fail_on(mut self, needle: &str, code: i32) -> Self {
    self.failures.push((needle.to_string(), code));
    self
  }

  /// Create an empty file at `path` whenever a command containing `needle` succeeds.
  pub fn creates(mut self, needle: &str, path: impl Into<PathBuf>) -> Self {
    self.creates.push((needle.to_string(), path.into()));
    self
  }

  /// Program file names of the recorded commands, in order.
  pub fn programs(&self) -> Vec<String> {
    self.calls.iter().map(CommandSpec::program_name).collect()
  }

  /// Recorded commands containing `needle`.
  pub fn calls_matching(&self, needle: &str) -> Vec<&CommandSpec> {
    self.calls.iter().filter(|c| c.display().contains(needle)).collect()
  }
}

impl CommandRunner for ScriptedRunner {
  fn status(&mut self, command: &CommandSpec) -> Result<CommandStatus, TaskError> {
    self.calls.push(command.clone());
    let line = command.display();

    if let Some((_, code)) = self.failures.iter().find(|(needle, _)| line.contains(needle.as_str())) {
      return Ok(CommandStatus { code: Some(*code) });
    }

    for (needle, path) in &self.creates {
      if line.contains(needle.as_str()) {
        if let Some(parent) = path.parent() {
          std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, b"")?;
      }
    }

    Ok(CommandStatus { code: Some(0) })
  }
}

/// Configuration rooted at `root` that builds the way Linux does.
pub fn static_config(root: &Path) -> BuildConfig {
  BuildConfig::for_os(root, Os::Linux).with_python("python3")
}

/// Configuration rooted at `root` that builds the way Windows does.
pub fn dynamic_config(root: &Path) -> BuildConfig {
  BuildConfig::for_os(root, Os::Windows).with_python("python3")
}

/// Uncompressed tarball containing the given files.
fn tarball(files: &[(&str, &[u8])]) -> Vec<u8> {
  let mut builder = tar::Builder::new(Vec::new());

  for (path, data) in files {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o755);
    builder.append_data(&mut header, path, *data).unwrap();
  }

  builder.into_inner().unwrap()
}

/// Gzip-compressed tarball containing the given files.
pub fn tar_gz(files: &[(&str, &[u8])]) -> Vec<u8> {
  let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
  encoder.write_all(&tarball(files)).unwrap();
  encoder.finish().unwrap()
}

/// Bzip2-compressed tarball containing the given files.
pub fn tar_bz2(files: &[(&str, &[u8])]) -> Vec<u8> {
  let mut encoder = BzEncoder::new(Vec::new(), bzip2::Compression::default());
  encoder.write_all(&tarball(files)).unwrap();
  encoder.finish().unwrap()
}

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), script.to_string()])
}

/// Returns the command and args to create a marker file in the current directory.
#[cfg(unix)]
pub fn touch_file(filename: &str) -> (&'static str, Vec<String>) {
  ("/usr/bin/touch", vec![filename.to_string()])
}

#[cfg(windows)]
pub fn touch_file(filename: &str) -> (&'static str, Vec<String>) {
  (
    "powershell.exe",
    vec![
      "-NoProfile".to_string(),
      "-Command".to_string(),
      format!("New-Item -ItemType File -Path '{}' -Force | Out-Null", filename),
    ],
  )
}
