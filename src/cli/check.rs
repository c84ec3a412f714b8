//! Check templates against their contracts.
//!
//! ```bash
//! pugcheck check                       # every template under template_paths
//! pugcheck check src/views/admin       # one directory
//! pugcheck check --no-typecheck        # structural errors only
//! pugcheck check --format json
//! ```
//!
//! Exits with status 1 when any template has errors.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tracing::warn;

use super::OutputFormat;
use crate::checker::{CheckReport, Checker};
use crate::config::Config;
use crate::diagnostics::{TemplateError, format_error, format_summary};
use crate::engine::{NoopEngine, TscEngine, TypeCheckEngine};
use crate::utils::fs::absolutize;

#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Templates, directories or glob patterns (defaults to template_paths)
    paths: Vec<PathBuf>,

    /// Skip the TypeScript compiler; report structural errors only
    #[arg(long)]
    no_typecheck: bool,

    /// Ignore and do not update the parse result cache
    #[arg(long)]
    no_cache: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    templates: usize,
    errors: usize,
    failed: usize,
    reprocessed: usize,
    results: Vec<JsonTemplate<'a>>,
}

#[derive(Serialize)]
struct JsonTemplate<'a> {
    template: &'a Path,
    errors: &'a [TemplateError],
}

impl CheckCommand {
    pub fn execute(self, mut config: Config, cwd: &Path) -> Result<ExitCode> {
        if !self.paths.is_empty() {
            config.template_paths = self.paths.iter().map(|path| absolutize(path, cwd)).collect();
        }
        config.validate()?;

        let engine: Box<dyn TypeCheckEngine> = if self.no_typecheck {
            Box::new(NoopEngine)
        } else {
            let tsconfig = config.effective_tsconfig();
            Box::new(TscEngine::discover(&config.project_path, &config.tmp_dir, tsconfig.as_deref())?)
        };

        let mut checker = Checker::new(config, engine)?;
        if self.no_cache {
            checker = checker.without_cache();
        } else {
            checker.load_cache();
        }

        let report = checker.scan_all(&[])?;
        self.print(&report, cwd)?;

        if !self.no_cache
            && let Err(e) = checker.save_cache()
        {
            warn!("Failed to save cache: {e:#}");
        }

        Ok(if report.has_errors() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        })
    }

    fn print(&self, report: &CheckReport, cwd: &Path) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                let json = JsonReport {
                    templates: report.template_count(),
                    errors: report.error_count(),
                    failed: report.failed_count(),
                    reprocessed: report.processed.len(),
                    results: report
                        .results
                        .iter()
                        .map(|(template, errors)| JsonTemplate {
                            template,
                            errors,
                        })
                        .collect(),
                };
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            OutputFormat::Text => {
                for error in report.results.values().flatten() {
                    println!("{}", format_error(error, cwd));
                }
                println!("{}", format_summary(report.template_count(), report.error_count(), report.failed_count()));
            }
        }
        Ok(())
    }
}
