//! Host platform detection.
//!
//! The build only cares about the operating system family: it decides the
//! link policy, the loader search variable and a few program names.

pub mod os;

pub use os::Os;
