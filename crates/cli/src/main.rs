mod cmd;
mod output;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pavement_lib::{ConfigOverrides, TaskError};

use crate::output::{OutputFormat, print_error};

/// pave - fetch, build and test the pymonkey extension
#[derive(Parser)]
#[command(name = "pave")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Tasks to run, in order (runs `help` when empty)
  #[arg(value_name = "TASK")]
  tasks: Vec<String>,

  /// Project directory holding the extension sources and docs/ (default: current directory)
  #[arg(long, value_name = "DIR")]
  project_root: Option<PathBuf>,

  /// Python interpreter used to build and test the extension
  #[arg(long, value_name = "PROGRAM")]
  python: Option<String>,

  /// URL of the SpiderMonkey source archive
  #[arg(long, value_name = "URL")]
  source_url: Option<String>,

  /// Expected SHA-256 of the source archive, in hex
  #[arg(long, value_name = "HEX")]
  source_sha256: Option<String>,

  /// Output format for the run summary
  #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,

  /// Increase log verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,
}

fn main() {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let overrides = ConfigOverrides {
    project_root: cli.project_root,
    python: cli.python,
    source_url: cli.source_url,
    source_sha256: cli.source_sha256,
    make: None,
  }
  .or(ConfigOverrides::from_env());

  if let Err(err) = cmd::cmd_run(&cli.tasks, overrides, cli.output) {
    print_error(&format!("{:#}", err));
    let code = err.downcast_ref::<TaskError>().map_or(1, TaskError::exit_code);
    std::process::exit(code);
  }
}

/// `RUST_LOG` takes precedence over `-v`.
fn init_tracing(verbose: u8) {
  let default = match verbose {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}
