//! Show the dependency picture of one template.
//!
//! ```text
//! pages/home.pug
//! ├── layouts/base.pug
//! │   └── partials/nav.pug
//! └── src/types/user.ts
//!
//! Dependents:
//!   pages/home-admin.pug
//! ```
//!
//! Every template under `template_paths` is scanned (without type checking) so
//! that dependents are complete. Cycles anywhere in the project are listed.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tracing::debug;

use super::OutputFormat;
use crate::checker::Checker;
use crate::config::Config;
use crate::contract::is_template_path;
use crate::core::PugcheckError;
use crate::engine::NoopEngine;
use crate::utils::fs::{absolutize, display_relative, normalize_path};

#[derive(Args, Debug)]
pub struct DepsCommand {
    /// Template to inspect
    file: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Serialize)]
struct JsonDeps {
    template: PathBuf,
    dependencies: BTreeSet<PathBuf>,
    dependents: BTreeSet<PathBuf>,
    cycles: Vec<Vec<PathBuf>>,
}

impl DepsCommand {
    pub fn execute(self, config: Config, cwd: &Path) -> Result<ExitCode> {
        let file = normalize_path(&absolutize(&self.file, cwd));
        if !is_template_path(&file) {
            return Err(PugcheckError::NotATemplate {
                path: file,
            }
            .into());
        }

        let mut checker = Checker::new(config, Box::new(NoopEngine))?.without_cache();
        match checker.scan_all(&[]) {
            Ok(report) => debug!("Scanned {} template(s) for dependents", report.template_count()),
            Err(e) => debug!("Project scan skipped: {e:#}"),
        }
        if checker.cache().get(&file).is_none() {
            checker.scan_file(&file);
        }

        let graph = checker.graph();
        let dependencies = graph.dependencies_of(&file);
        let dependents = graph.dependents_of(&file);
        let cycles = graph.cycles();

        match self.format {
            OutputFormat::Json => {
                let json = JsonDeps {
                    template: file,
                    dependencies,
                    dependents,
                    cycles,
                };
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            OutputFormat::Text => {
                print!("{}", graph.to_tree_string(&file, cwd));
                if !dependents.is_empty() {
                    println!("\n{}", "Dependents:".bold());
                    for dependent in &dependents {
                        println!("  {}", display_relative(dependent, cwd));
                    }
                }
                for cycle in &cycles {
                    let members: Vec<String> = cycle.iter().map(|path| display_relative(path, cwd)).collect();
                    println!("\n{} {}", "cycle:".yellow().bold(), members.join(" -> "));
                }
            }
        }

        Ok(ExitCode::SUCCESS)
    }
}
