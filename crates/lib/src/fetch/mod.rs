//! Source archive fetching.
//!
//! [`ensure_source`] makes sure the tagged SpiderMonkey sources are unpacked
//! under the project root. When the source directory already exists it does
//! nothing at all, so repeated builds never touch the network.

pub mod archive;

use std::io::{Read, Write};

use tracing::{info, warn};

use crate::config::BuildConfig;
use crate::consts::DOWNLOAD_CHUNK_SIZE;
use crate::error::TaskError;
use crate::task::TaskContext;
use crate::util::hash::hash_bytes;

use archive::ArchiveKind;

/// Fetch and unpack the SpiderMonkey sources unless they are already present.
///
/// Download progress is written to the context's status stream, one `.` per
/// chunk. Nothing is cleaned up on failure.
///
/// # Errors
///
/// Returns `FetchFailed` on network errors or a non-success HTTP status,
/// `HashMismatch` if a pinned checksum does not match, `Extract` if the archive
/// is corrupt and `MissingArtifact` if it did not contain the expected
/// top-level directory.
pub fn ensure_source(ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
  let config = ctx.config;

  if config.source_dir.exists() {
    info!(path = %config.source_dir.display(), "source directory present, skipping fetch");
    return Ok(());
  }

  let kind = ArchiveKind::detect(&config.source_url)
    .ok_or_else(|| TaskError::UnsupportedArchive(config.source_url.clone()))?;

  writeln!(
    ctx.status,
    "SpiderMonkey source directory not found, fetching from {}.",
    config.source_url
  )?;

  let data = download(&config.source_url, &mut *ctx.status)?;
  verify(config, &data)?;

  writeln!(ctx.status, "Extracting files.")?;
  archive::unpack(kind, &data, &config.project_root).map_err(|source| TaskError::Extract {
    url: config.source_url.clone(),
    source,
  })?;

  if !config.source_dir.is_dir() {
    return Err(TaskError::MissingArtifact {
      what: "extracted source directory",
      path: config.source_dir.clone(),
    });
  }

  info!(path = %config.source_dir.display(), "source unpacked");
  Ok(())
}

/// Download `url` fully into memory, reporting progress per chunk.
pub fn download(url: &str, progress: &mut dyn Write) -> Result<Vec<u8>, TaskError> {
  info!(url = %url, "fetching source archive");

  let mut response = reqwest::blocking::get(url).map_err(|e| fetch_failed(url, e))?;

  if !response.status().is_success() {
    return Err(fetch_failed(url, format!("HTTP {}", response.status())));
  }

  let mut data = Vec::new();
  let mut chunk = vec![0u8; DOWNLOAD_CHUNK_SIZE];
  loop {
    let read = response.read(&mut chunk).map_err(|e| fetch_failed(url, e))?;
    if read == 0 {
      break;
    }
    data.extend_from_slice(&chunk[..read]);
    progress.write_all(b".")?;
    progress.flush()?;
  }
  writeln!(progress)?;

  info!(url = %url, size = data.len(), "download complete");
  Ok(data)
}

/// Check the archive against the pinned checksum, if there is one.
fn verify(config: &BuildConfig, data: &[u8]) -> Result<(), TaskError> {
  let actual = hash_bytes(data);

  match &config.source_sha256 {
    Some(expected) if !actual.matches(expected) => Err(TaskError::HashMismatch {
      url: config.source_url.clone(),
      expected: expected.clone(),
      actual: actual.0,
    }),
    Some(_) => {
      info!(sha256 = %actual, "archive checksum verified");
      Ok(())
    }
    None => {
      warn!(sha256 = %actual, "no checksum pinned, archive is unverified");
      Ok(())
    }
  }
}

fn fetch_failed(url: &str, message: impl ToString) -> TaskError {
  TaskError::FetchFailed {
    url: url.to_string(),
    message: message.to_string(),
  }
}
