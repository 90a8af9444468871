//! pavement-lib: task orchestration for building pymonkey
//!
//! This crate provides everything `pave` needs to provision and test the extension:
//! - `BuildConfig`: the fixed tag, URL and directory layout every task works from
//! - `fetch`, `native`, `extension`, `docs`, `testing`: the provisioning steps
//! - `task`: the task registry and the dispatcher that runs it in dependency order
//! - `process`: the seam through which every external command is executed

pub mod clean;
pub mod config;
pub mod consts;
pub mod docs;
pub mod env;
pub mod error;
pub mod extension;
pub mod fetch;
pub mod native;
pub mod platform;
pub mod process;
pub mod task;
pub mod testing;
pub mod util;

pub use config::{BuildConfig, ConfigOverrides, LinkPolicy};
pub use error::TaskError;
pub use task::{Dispatcher, RunSummary, TaskContext, TaskGraph};
