//! Print the synthetic program for one template.
//!
//! By default every generated line is annotated with the template location it
//! maps back to. `--raw` prints exactly what the engine would see.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::checker::Checker;
use crate::config::Config;
use crate::diagnostics::format_error;
use crate::engine::NoopEngine;
use crate::template::render_tree;
use crate::utils::fs::absolutize;

#[derive(Args, Debug)]
pub struct GenerateCommand {
    /// Template to generate
    file: PathBuf,

    /// Also print the resolved template tree
    #[arg(long)]
    tree: bool,

    /// Print the program without line annotations
    #[arg(long, conflicts_with = "tree")]
    raw: bool,
}

impl GenerateCommand {
    pub fn execute(self, config: Config, cwd: &Path) -> Result<ExitCode> {
        let file = absolutize(&self.file, cwd);
        let mut checker = Checker::new(config, Box::new(NoopEngine))?.without_cache();
        let generated = checker.generate(&file)?;

        for error in &generated.errors {
            eprintln!("{}", format_error(error, cwd));
        }

        if self.tree
            && let Some(tree) = &generated.tree
        {
            println!("{}", "Resolved tree:".bold());
            println!("{}", render_tree(tree));
        }

        match &generated.program {
            Some(program) if self.raw => print!("{}", program.source),
            Some(program) => {
                if self.tree {
                    println!("{}", "Program:".bold());
                }
                print!("{}", program.annotated(cwd));
            }
            None => eprintln!("{} no program generated for {}", "✗".red(), self.file.display()),
        }

        Ok(if generated.errors.is_empty() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }
}
