//! Source archive unpacking.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use tar::Archive;
use tracing::debug;

/// Archive formats the fetcher can unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
  TarBz2,
  TarGz,
}

impl ArchiveKind {
  /// Detect the format from the file name at the end of a URL or path.
  ///
  /// Supports:
  /// - `.tar.bz2` / `.tbz2` (what the archive endpoint serves)
  /// - `.tar.gz` / `.tgz`
  pub fn detect(url: &str) -> Option<Self> {
    let name = url.split(['?', '#']).next().unwrap_or(url);
    if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") {
      Some(Self::TarBz2)
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
      Some(Self::TarGz)
    } else {
      None
    }
  }
}

/// Unpack every entry of an in-memory archive into `dest`.
///
/// Entries keep their paths, so the archive's top-level directory ends up
/// directly under `dest`.
pub fn unpack(kind: ArchiveKind, data: &[u8], dest: &Path) -> io::Result<()> {
  fs::create_dir_all(dest)?;
  debug!(kind = ?kind, dest = %dest.display(), "unpacking archive");

  match kind {
    ArchiveKind::TarBz2 => unpack_tar(BzDecoder::new(data), dest),
    ArchiveKind::TarGz => unpack_tar(GzDecoder::new(data), dest),
  }
}

fn unpack_tar<R: Read>(reader: R, dest: &Path) -> io::Result<()> {
  let mut archive = Archive::new(reader);
  archive.set_preserve_permissions(true);
  archive.unpack(dest)
}
