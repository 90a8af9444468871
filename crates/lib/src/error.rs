//! Error types for task execution.
//!
//! Every provisioning step reports failures through [`TaskError`]. The
//! dispatcher stops at the first error and the CLI turns it into a process
//! exit code with [`TaskError::exit_code`].

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while resolving or running tasks.
#[derive(Debug, Error)]
pub enum TaskError {
  /// A task name given on the command line is not registered.
  #[error("unknown task: {0}")]
  UnknownTask(String),

  /// Two tasks were registered under the same name.
  #[error("task registered twice: {0}")]
  DuplicateTask(String),

  /// A task lists a prerequisite that is not registered.
  #[error("task {task} needs unknown task {dependency}")]
  UnknownDependency { task: String, dependency: String },

  /// The prerequisite relation contains a cycle.
  #[error("cycle detected in task dependencies")]
  CycleDetected,

  /// HTTP request failed while downloading the source archive.
  #[error("fetch failed for {url}: {message}")]
  FetchFailed { url: String, message: String },

  /// SHA256 hash mismatch after download.
  #[error("hash mismatch for {url}: expected {expected}, got {actual}")]
  HashMismatch {
    url: String,
    expected: String,
    actual: String,
  },

  /// The archive URL does not name a format that can be unpacked.
  #[error("unsupported archive format: {0}")]
  UnsupportedArchive(String),

  /// The downloaded archive could not be unpacked.
  #[error("failed to extract {url}: {source}")]
  Extract {
    url: String,
    #[source]
    source: std::io::Error,
  },

  /// A file or directory an earlier step should have produced is missing.
  #[error("{what} not found at {}", path.display())]
  MissingArtifact { what: &'static str, path: PathBuf },

  /// An external program could not be started.
  #[error("failed to run {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// An external program exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {cmd}")]
  CmdFailed { cmd: String, code: Option<i32> },

  /// A path could not be added to a search path variable.
  #[error("cannot append {} to {var}: {source}", path.display())]
  EnvPath {
    var: String,
    path: PathBuf,
    #[source]
    source: std::env::JoinPathsError,
  },

  /// I/O error.
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
}

impl TaskError {
  /// Process exit code to report for this error.
  ///
  /// A failing child process hands its own exit code through unchanged.
  /// Everything else, including a child killed by a signal, exits with 1.
  pub fn exit_code(&self) -> i32 {
    match self {
      TaskError::CmdFailed { code: Some(code), .. } if *code != 0 => *code,
      _ => 1,
    }
  }
}
