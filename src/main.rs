// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, set up logging, hand off to `ui`.
// - Any error is printed in red and turns into a non-zero exit code.

use apotek_tools::{cli::Cli, init_tracing, ui};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match ui::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::error(&format!("Error: {:#}", e));
            ExitCode::FAILURE
        }
    }
}
