//! Command-line interface for pugcheck.
//!
//! # Commands
//!
//! - `check [PATH]...` - check templates and report errors in template coordinates
//! - `generate <FILE>` - print the synthetic program and its line map
//! - `deps <FILE>` - show dependencies, dependents and cycles of a template
//! - `cache clear|info` - manage the persisted parse result cache
//!
//! # Global options
//!
//! - `-v, --verbose` - debug logging
//! - `-q, --quiet` - errors only
//! - `-c, --config <PATH>` - explicit `pugcheck.toml`
//!
//! `RUST_LOG` takes precedence over all of them.

mod cache;
mod check;
mod deps;
mod generate;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::constants::CONFIG_FILE_NAME;
use crate::utils::fs::{absolutize, find_upwards};

#[derive(Parser, Debug)]
#[command(
    name = "pugcheck",
    about = "Type-check Pug template contracts",
    version,
    long_about = "pugcheck reads the `//@ expect` contract of each Pug template, resolves extends and include, \
                  and type-checks every expression against the contract with the TypeScript compiler."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to pugcheck.toml (searched upwards from the working directory by default)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

/// Output format for commands that report results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, colored output
    #[default]
    Text,
    /// JSON on stdout
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check templates against their contracts
    Check(check::CheckCommand),

    /// Print the synthetic program generated for a template
    Generate(generate::GenerateCommand),

    /// Show what a template depends on and what depends on it
    Deps(deps::DepsCommand),

    /// Manage the parse result cache
    Cache(cache::CacheCommand),
}

impl Cli {
    /// Load configuration, set up logging and run the command.
    pub fn execute(self) -> Result<ExitCode> {
        let cwd = std::env::current_dir().context("Failed to determine the working directory")?;
        let found = match &self.config {
            Some(path) => Some(absolutize(path, &cwd)),
            None => find_upwards(&cwd, CONFIG_FILE_NAME),
        };
        let config = match &found {
            Some(path) => Config::load_file(path)?,
            None => Config::default().resolved(&cwd),
        };

        init_logging(self.log_level(&config));
        if found.is_none() {
            warn!("No {CONFIG_FILE_NAME} found from {}; using defaults", cwd.display());
        }

        match self.command {
            Commands::Check(cmd) => cmd.execute(config, &cwd),
            Commands::Generate(cmd) => cmd.execute(config, &cwd),
            Commands::Deps(cmd) => cmd.execute(config, &cwd),
            Commands::Cache(cmd) => cmd.execute(config),
        }
    }

    fn log_level(&self, config: &Config) -> String {
        if self.verbose {
            "debug".to_string()
        } else if self.quiet {
            "error".to_string()
        } else {
            config.log_level.clone()
        }
    }
}

fn init_logging(level: String) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("pugcheck_cli={level},engine={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_check_flags() {
        let cli = Cli::try_parse_from(["pugcheck", "-v", "check", "views/a.pug", "--no-typecheck", "--no-cache"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Check(_)));
        assert_eq!(cli.log_level(&Config::default()), "debug");
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["pugcheck", "-v", "-q", "check"]).is_err());
    }

    #[test]
    fn test_config_log_level_is_default() {
        let cli = Cli::try_parse_from(["pugcheck", "cache", "clear"]).unwrap();
        let config = Config {
            log_level: "warn".to_string(),
            ..Config::default()
        };
        assert_eq!(cli.log_level(&config), "warn");
    }
}
