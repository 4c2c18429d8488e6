//! # specforge-cli
//!
//! The `specforge` command line tool:
//!
//! - `specforge generate` compiles the route manifests of a directory and writes an
//!   OpenAPI 3.1 document.
//! - `specforge combine` merges the OpenAPI documents of several services.

pub mod cli;
pub mod commands;
pub mod manifest;

use tracing_subscriber::EnvFilter;

pub use self::cli::{Cli, Command};

/// Filter used when `RUST_LOG` is not set.
pub fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "specforge=debug"
    } else {
        "specforge=info"
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` takes precedence over `verbose`.
pub fn init_tracing(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_filter(verbose))),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Runs the parsed command.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Generate(args) => commands::generate::run(args),
        Command::Combine(args) => commands::combine::run(args),
    }
}
