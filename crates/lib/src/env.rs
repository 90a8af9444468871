//! Process environment overlays for child processes.
//!
//! An [`EnvOverlay`] is a copy of an environment that search-path entries can
//! be appended to. Existing entries are always kept and new ones go last, so
//! whatever the caller already had on `PYTHONPATH` still wins.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::TaskError;

/// A full environment for a child process, seeded from an existing one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverlay {
  vars: BTreeMap<OsString, OsString>,
}

impl EnvOverlay {
  /// Seed the overlay from the current process environment.
  pub fn from_ambient() -> Self {
    Self::from_vars(std::env::vars_os())
  }

  /// Seed the overlay from explicit variables.
  pub fn from_vars<I, K, V>(vars: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<OsString>,
    V: Into<OsString>,
  {
    Self {
      vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
    }
  }

  /// Current value of a variable.
  pub fn get(&self, name: &str) -> Option<&OsStr> {
    self.key_for(name).and_then(|key| self.vars.get(&key)).map(OsString::as_os_str)
  }

  /// Entries of a search path variable, in order. Empty entries are skipped.
  pub fn paths(&self, name: &str) -> Vec<PathBuf> {
    self
      .get(name)
      .map(|value| std::env::split_paths(value).filter(|p| !p.as_os_str().is_empty()).collect())
      .unwrap_or_default()
  }

  /// Append `path` as the last entry of the search path variable `name`.
  ///
  /// # Errors
  ///
  /// Returns `EnvPath` if `path` contains the platform's path separator.
  pub fn append_path(&mut self, name: &str, path: &Path) -> Result<(), TaskError> {
    let mut paths = self.paths(name);
    paths.push(path.to_path_buf());

    let joined = std::env::join_paths(&paths).map_err(|source| TaskError::EnvPath {
      var: name.to_string(),
      path: path.to_path_buf(),
      source,
    })?;

    debug!(var = name, value = ?joined, "extended search path");

    let key = self.key_for(name).unwrap_or_else(|| OsString::from(name));
    self.vars.insert(key, joined);
    Ok(())
  }

  /// All variables, for handing to a child process.
  pub fn vars(&self) -> &BTreeMap<OsString, OsString> {
    &self.vars
  }

  pub fn into_vars(self) -> BTreeMap<OsString, OsString> {
    self.vars
  }

  /// Existing key matching `name`. Windows variable names are case-insensitive.
  fn key_for(&self, name: &str) -> Option<OsString> {
    if cfg!(windows) {
      self
        .vars
        .keys()
        .find(|key| key.to_string_lossy().eq_ignore_ascii_case(name))
        .cloned()
    } else {
      let key = OsString::from(name);
      self.vars.contains_key(&key).then_some(key)
    }
  }
}
