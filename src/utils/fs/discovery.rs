//! Template discovery.
//!
//! Each configured template path is either a file (used as-is), a directory
//! (walked recursively for `*.pug` files), or a glob pattern.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::paths::normalize_path;
use crate::constants::TEMPLATE_EXTENSION;

/// Finds every template under `roots`, sorted and deduplicated.
///
/// # Examples
///
/// ```rust,no_run
/// use pugcheck_cli::utils::fs::find_templates;
/// use std::path::PathBuf;
///
/// # fn example() -> anyhow::Result<()> {
/// let templates = find_templates(&[PathBuf::from("src/views")])?;
/// println!("{} templates", templates.len());
/// # Ok(())
/// # }
/// ```
pub fn find_templates(roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut found = BTreeSet::new();

    for root in roots {
        let text = root.to_string_lossy();
        if text.contains(['*', '?', '[']) {
            let entries =
                glob::glob(&text).with_context(|| format!("Invalid template pattern: {text}"))?;
            for entry in entries {
                match entry {
                    Ok(path) if is_template(&path) => {
                        found.insert(normalize_path(&path));
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Skipping unreadable path while expanding {text}: {e}"),
                }
            }
            continue;
        }

        if root.is_file() {
            found.insert(normalize_path(root));
            continue;
        }
        if !root.is_dir() {
            warn!("Template path does not exist: {}", root.display());
            continue;
        }

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {e}", root.display());
                    continue;
                }
            };
            if entry.file_type().is_file() && is_template(entry.path()) {
                found.insert(normalize_path(entry.path()));
            }
        }
    }

    debug!("Discovered {} template(s)", found.len());
    Ok(found.into_iter().collect())
}

fn is_template(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == TEMPLATE_EXTENSION)
}
