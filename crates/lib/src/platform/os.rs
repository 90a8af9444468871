use std::fmt;

/// Operating system families the build distinguishes between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  MacOs,
  Windows,
  /// Any other Unix-like system; built the same way as Linux.
  OtherUnix,
}

impl Os {
  /// Detect the current operating system at runtime
  pub fn current() -> Self {
    match std::env::consts::OS {
      "linux" => Self::Linux,
      "macos" => Self::MacOs,
      "windows" => Self::Windows,
      _ => Self::OtherUnix,
    }
  }

  /// Returns the lowercase string identifier for this OS
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "darwin",
      Self::Windows => "windows",
      Self::OtherUnix => std::env::consts::OS,
    }
  }

  /// Environment variable the dynamic loader searches for shared libraries
  pub fn loader_path_var(&self) -> &'static str {
    match self {
      Self::Windows => "PATH",
      Self::MacOs => "DYLD_LIBRARY_PATH",
      Self::Linux | Self::OtherUnix => "LD_LIBRARY_PATH",
    }
  }

  /// Python interpreter name to use when none is configured
  pub fn default_python(&self) -> &'static str {
    match self {
      Self::Windows => "python",
      _ => "python3",
    }
  }

  /// Program and leading arguments that open a file with the desktop's default handler
  pub fn opener(&self) -> (&'static str, &'static [&'static str]) {
    match self {
      Self::Windows => ("cmd", &["/C", "start", ""]),
      Self::MacOs => ("open", &[]),
      Self::Linux | Self::OtherUnix => ("xdg-open", &[]),
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
