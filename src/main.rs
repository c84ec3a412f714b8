//! pugcheck CLI entry point
//!
//! Parses arguments, runs the command, and turns failures into a readable
//! error with a suggestion. Template errors are not failures here: `check`
//! reports them and exits with status 1 on its own.

use std::process::ExitCode;

use clap::Parser;
use pugcheck_cli::cli;
use pugcheck_cli::core::user_friendly_error;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute() {
        Ok(code) => code,
        Err(e) => {
            user_friendly_error(e).display();
            ExitCode::FAILURE
        }
    }
}
