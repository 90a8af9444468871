//! Build configuration.
//!
//! [`BuildConfig`] is computed once at startup and handed to every task by
//! reference. All paths derive from a single project root and the archive URL
//! derives from the tag, so two tasks never disagree about where things live.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::{
  ENV_MAKE, ENV_PYTHON, ENV_ROOT, ENV_SOURCE_SHA256, ENV_SOURCE_URL, EXTENSION_NAME, SPIDERMONKEY_ARCHIVE_BASE,
  SPIDERMONKEY_TAG,
};
use crate::error::TaskError;
use crate::platform::Os;

/// How the extension links against SpiderMonkey.
///
/// Chosen once from the host OS. MSVC cannot find the static archive, so
/// Windows links against the DLL and ships it alongside the extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkPolicy {
  /// Link the static archive into the extension.
  Static { library: &'static str },
  /// Link the import library and stage the DLL for runtime loading.
  Dynamic {
    library: &'static str,
    shared_library: &'static str,
    defines: &'static [(&'static str, &'static str)],
  },
}

impl LinkPolicy {
  pub fn for_os(os: Os) -> Self {
    match os {
      Os::Windows => LinkPolicy::Dynamic {
        library: "js3250",
        shared_library: "js3250.dll",
        defines: &[("XP_WIN", "1")],
      },
      Os::Linux | Os::MacOs | Os::OtherUnix => LinkPolicy::Static { library: "js_static" },
    }
  }

  /// Library name passed to the linker.
  pub fn library(&self) -> &'static str {
    match self {
      LinkPolicy::Static { library } | LinkPolicy::Dynamic { library, .. } => library,
    }
  }

  /// File name of the shared library to stage, if any.
  pub fn shared_library(&self) -> Option<&'static str> {
    match self {
      LinkPolicy::Static { .. } => None,
      LinkPolicy::Dynamic { shared_library, .. } => Some(shared_library),
    }
  }

  /// Preprocessor macros the extension sources need under this policy.
  pub fn defines(&self) -> &'static [(&'static str, &'static str)] {
    match self {
      LinkPolicy::Static { .. } => &[],
      LinkPolicy::Dynamic { defines, .. } => defines,
    }
  }

  pub fn is_dynamic(&self) -> bool {
    matches!(self, LinkPolicy::Dynamic { .. })
  }
}

/// User-supplied settings layered over the defaults.
///
/// Command-line flags are merged over [`ConfigOverrides::from_env`] with
/// [`ConfigOverrides::or`], so a flag beats its environment variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
  pub project_root: Option<PathBuf>,
  pub python: Option<String>,
  pub source_url: Option<String>,
  pub source_sha256: Option<String>,
  pub make: Option<String>,
}

impl ConfigOverrides {
  /// Read overrides from the process environment. Empty values are ignored.
  pub fn from_env() -> Self {
    fn var(name: &str) -> Option<String> {
      std::env::var(name).ok().filter(|v| !v.is_empty())
    }

    Self {
      project_root: var(ENV_ROOT).map(PathBuf::from),
      python: var(ENV_PYTHON),
      source_url: var(ENV_SOURCE_URL),
      source_sha256: var(ENV_SOURCE_SHA256),
      make: var(ENV_MAKE),
    }
  }

  /// Fill every unset field from `fallback`.
  pub fn or(self, fallback: ConfigOverrides) -> Self {
    Self {
      project_root: self.project_root.or(fallback.project_root),
      python: self.python.or(fallback.python),
      source_url: self.source_url.or(fallback.source_url),
      source_sha256: self.source_sha256.or(fallback.source_sha256),
      make: self.make.or(fallback.make),
    }
  }
}

/// Immutable description of where everything is fetched from and built to.
#[derive(Debug, Clone)]
pub struct BuildConfig {
  /// Upstream snapshot tag.
  pub tag: String,
  /// Archive URL for `tag`.
  pub source_url: String,
  /// Expected SHA256 of the archive (lowercase hex). Unverified when `None`.
  pub source_sha256: Option<String>,
  pub project_root: PathBuf,
  /// Extracted SpiderMonkey sources, named after the tag.
  pub source_dir: PathBuf,
  pub build_dir: PathBuf,
  /// Out-of-tree configure/make directory.
  pub objdir: PathBuf,
  /// Descriptor written by configure; its presence means configure already ran.
  pub makefile: PathBuf,
  /// Setup script generated for the extension build.
  pub setup_script: PathBuf,
  /// Where the importable extension module ends up.
  pub ext_build_dir: PathBuf,
  pub ext_temp_dir: PathBuf,
  pub doctest_output_dir: PathBuf,
  pub docs_source_dir: PathBuf,
  pub docs_output_dir: PathBuf,
  pub python: String,
  pub make: String,
  pub os: Os,
  pub link_policy: LinkPolicy,
}

impl BuildConfig {
  /// Default configuration rooted at `project_root` for the current OS.
  pub fn new(project_root: impl Into<PathBuf>) -> Self {
    Self::for_os(project_root, Os::current())
  }

  /// Default configuration rooted at `project_root` for the given OS.
  pub fn for_os(project_root: impl Into<PathBuf>, os: Os) -> Self {
    let project_root = project_root.into();
    let tag = SPIDERMONKEY_TAG.to_string();
    let build_dir = project_root.join("build");
    let objdir = build_dir.join("spidermonkey");

    Self {
      source_url: Self::source_url_for(&tag),
      source_sha256: None,
      source_dir: project_root.join(format!("spidermonkey-{}", tag)),
      makefile: objdir.join("Makefile"),
      setup_script: build_dir.join(format!("setup_{}.py", EXTENSION_NAME)),
      ext_build_dir: build_dir.join("lib"),
      ext_temp_dir: build_dir.join("temp"),
      doctest_output_dir: build_dir.join("doctest_output"),
      docs_source_dir: project_root.join("docs").join("src"),
      docs_output_dir: project_root.join("docs").join("rendered"),
      python: os.default_python().to_string(),
      make: "make".to_string(),
      link_policy: LinkPolicy::for_os(os),
      tag,
      build_dir,
      objdir,
      project_root,
      os,
    }
  }

  /// Build the configuration from overrides, defaulting the root to the
  /// current directory.
  ///
  /// # Errors
  ///
  /// Returns an IO error if the current directory cannot be read or the
  /// project root does not exist.
  pub fn from_overrides(overrides: ConfigOverrides) -> Result<Self, TaskError> {
    let root = match overrides.project_root {
      Some(root) => root,
      None => std::env::current_dir()?,
    };
    let root = dunce::canonicalize(&root)?;

    let mut config = Self::new(root);
    if let Some(url) = overrides.source_url {
      config.source_url = url;
    }
    if let Some(sha256) = overrides.source_sha256 {
      config.source_sha256 = Some(sha256.to_lowercase());
    }
    if let Some(python) = overrides.python {
      config.python = python;
    }
    if let Some(make) = overrides.make {
      config.make = make;
    }

    debug!(root = %config.project_root.display(), os = %config.os, "resolved build configuration");
    Ok(config)
  }

  /// Archive URL for a tag.
  pub fn source_url_for(tag: &str) -> String {
    format!("{}/{}.tar.bz2", SPIDERMONKEY_ARCHIVE_BASE, tag)
  }

  pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
    self.source_url = url.into();
    self
  }

  pub fn with_source_sha256(mut self, sha256: impl Into<String>) -> Self {
    self.source_sha256 = Some(sha256.into());
    self
  }

  pub fn with_python(mut self, python: impl Into<String>) -> Self {
    self.python = python.into();
    self
  }

  /// SpiderMonkey's configure script inside the extracted sources.
  pub fn configure_script(&self) -> PathBuf {
    self.source_dir.join("js").join("src").join("configure")
  }

  /// Public headers installed by the SpiderMonkey build.
  pub fn include_dir(&self) -> PathBuf {
    self.objdir.join("dist").join("include")
  }

  /// Entry page of the rendered HTML documentation.
  pub fn docs_index(&self) -> PathBuf {
    self.docs_output_dir.join("index.html")
  }

  /// Path of `path` relative to the project root, for display.
  pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
    path.strip_prefix(&self.project_root).unwrap_or(path)
  }
}
