//! Manage the persisted parse result cache.
//!
//! ```bash
//! pugcheck cache info    # what is cached and how much of it is stale
//! pugcheck cache clear   # delete the cache file
//! ```

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use tracing::info;

use crate::cache::persist;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct CacheCommand {
    #[command(subcommand)]
    command: CacheSubcommand,
}

#[derive(Subcommand, Debug)]
enum CacheSubcommand {
    /// Delete the cache file
    Clear,

    /// Show cache statistics
    Info,
}

impl CacheCommand {
    pub fn execute(self, config: Config) -> Result<ExitCode> {
        let path = &config.cache_path;
        match self.command {
            CacheSubcommand::Clear => {
                if path.exists() {
                    std::fs::remove_file(path)
                        .with_context(|| format!("Failed to remove cache file: {}", path.display()))?;
                    info!("Removed {}", path.display());
                    println!("{} Cleared cache at {}", "✓".green(), path.display());
                } else {
                    println!("No cache at {}", path.display());
                }
            }
            CacheSubcommand::Info => match persist::load(path)? {
                Some((mut cache, mut graph)) => {
                    let evicted = cache.mark_stale_files(&mut graph);
                    println!("{}", "Parse result cache".bold());
                    println!("  Location:   {}", path.display());
                    println!("  Templates:  {}", cache.len());
                    println!("  Stale:      {}", cache.stale_files().len());
                    println!("  Deleted:    {}", evicted.len());
                    println!("  Errors:     {}", cache.error_count());
                    println!("  Edges:      {}", graph.edge_count());
                }
                None => println!("No cache at {}", path.display()),
            },
        }
        Ok(ExitCode::SUCCESS)
    }
}
