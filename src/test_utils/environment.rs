//! Temporary template projects.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

use crate::checker::Checker;
use crate::config::Config;
use crate::engine::TypeCheckEngine;

/// A project directory with `src/views`, removed on drop.
pub struct TemplateProject {
    pub temp_dir: TempDir,
    /// Canonical project root.
    pub root: PathBuf,
    pub views: PathBuf,
}

impl TemplateProject {
    pub fn new() -> Result<Self> {
        super::init_test_logging(None);

        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().canonicalize()?;
        let views = root.join("src").join("views");
        fs::create_dir_all(&views)?;

        Ok(Self {
            temp_dir,
            root,
            views,
        })
    }

    /// Write a file relative to the project root.
    pub fn write(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Write a template relative to the views directory.
    pub fn view(&self, relative: &str, content: &str) -> Result<PathBuf> {
        self.write(&format!("src/views/{relative}"), content)
    }

    pub fn view_path(&self, relative: &str) -> PathBuf {
        self.views.join(relative)
    }

    /// Set a file's modification time to `millis` after the epoch.
    pub fn touch(&self, path: &Path, millis: u64) -> Result<()> {
        let stamp = SystemTime::UNIX_EPOCH + Duration::from_millis(millis);
        fs::File::options().write(true).open(path)?.set_modified(stamp)?;
        Ok(())
    }

    /// Default configuration resolved against the project root.
    pub fn config(&self) -> Config {
        Config::default().resolved(&self.root)
    }

    /// A checker over [`Self::config`].
    pub fn checker(&self, engine: impl TypeCheckEngine + 'static) -> Result<Checker> {
        self.checker_with(self.config(), engine)
    }

    pub fn checker_with(&self, config: Config, engine: impl TypeCheckEngine + 'static) -> Result<Checker> {
        Checker::new(config, Box::new(engine))
    }
}
