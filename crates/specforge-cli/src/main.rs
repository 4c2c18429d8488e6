use std::process::ExitCode;

use clap::Parser;
use specforge_cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    specforge_cli::init_tracing(cli.verbose());

    match specforge_cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
