//! Configuration for pugcheck.
//!
//! Settings live in `pugcheck.toml`, looked up from the working directory
//! upwards. Every field is optional:
//!
//! ```toml
//! project_path = "."
//! template_paths = ["./src/views"]
//! views_root = "./src/views"
//! tmp_dir = ".tmp"
//! cache_path = ".tmp/pug.parseResults.json"
//! tsconfig = "./tsconfig.json"
//! log_level = "info"
//!
//! [shared_locals]
//! import_path = "./src/types/viewSharedLocals.d.ts"
//! type_name = "SharedLocals"
//! ```
//!
//! Relative paths are resolved against the directory containing the config
//! file (or the working directory when there is none). Command-line flags
//! override the loaded values.

pub mod parser;

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use parser::parse_config;

use crate::constants::{
    CONFIG_FILE_NAME, DEFAULT_CACHE_FILE, DEFAULT_SHARED_LOCALS_PATH, DEFAULT_SHARED_LOCALS_TYPE, DEFAULT_TMP_DIR,
    DEFAULT_VIEWS_ROOT,
};
use crate::core::PugcheckError;
use crate::utils::fs::{absolutize, find_upwards};

/// Project configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Root of the TypeScript project; the engine runs here.
    pub project_path: PathBuf,
    /// Directories, files or glob patterns to check.
    pub template_paths: Vec<PathBuf>,
    /// Base for `/`-prefixed `extends` / `include` targets.
    pub views_root: PathBuf,
    /// Where generated programs are written.
    pub tmp_dir: PathBuf,
    pub cache_path: PathBuf,
    /// Project tsconfig the generated config extends. Defaults to
    /// `tsconfig.json` in the project when present.
    pub tsconfig: Option<PathBuf>,
    pub log_level: String,
    pub shared_locals: Option<SharedLocalsConfig>,
}

/// `[shared_locals]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SharedLocalsConfig {
    pub import_path: PathBuf,
    pub type_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_path: PathBuf::from("."),
            template_paths: vec![PathBuf::from(DEFAULT_VIEWS_ROOT)],
            views_root: PathBuf::from(DEFAULT_VIEWS_ROOT),
            tmp_dir: PathBuf::from(DEFAULT_TMP_DIR),
            cache_path: PathBuf::from(DEFAULT_CACHE_FILE),
            tsconfig: None,
            log_level: "info".to_string(),
            shared_locals: None,
        }
    }
}

impl Default for SharedLocalsConfig {
    fn default() -> Self {
        Self {
            import_path: PathBuf::from(DEFAULT_SHARED_LOCALS_PATH),
            type_name: DEFAULT_SHARED_LOCALS_TYPE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Otherwise `pugcheck.toml` is searched
    /// from `cwd` upwards; when none is found the defaults are used,
    /// resolved against `cwd`.
    pub fn load(path: Option<&Path>, cwd: &Path) -> Result<Self> {
        let path = match path {
            Some(path) => Some(absolutize(path, cwd)),
            None => find_upwards(cwd, CONFIG_FILE_NAME),
        };

        match path {
            Some(path) => Self::load_file(&path),
            None => {
                warn!("No {CONFIG_FILE_NAME} found from {}; using defaults", cwd.display());
                Ok(Config::default().resolved(cwd))
            }
        }
    }

    /// Load `path` and resolve its relative paths against its directory.
    pub fn load_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let config: Config = parse_config(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(config.resolved(base))
    }

    /// Make every relative path absolute against `base`.
    pub fn resolved(mut self, base: &Path) -> Self {
        self.project_path = absolutize(&self.project_path, base);
        self.template_paths = self.template_paths.iter().map(|path| absolutize(path, base)).collect();
        self.views_root = absolutize(&self.views_root, base);
        self.tmp_dir = absolutize(&self.tmp_dir, base);
        self.cache_path = absolutize(&self.cache_path, base);
        self.tsconfig = self.tsconfig.map(|path| absolutize(&path, base));
        if let Some(shared) = &mut self.shared_locals {
            shared.import_path = absolutize(&shared.import_path, base);
        }
        self
    }

    /// The tsconfig generated programs extend, if any.
    pub fn effective_tsconfig(&self) -> Option<PathBuf> {
        match &self.tsconfig {
            Some(path) => Some(path.clone()),
            None => {
                let default = self.project_path.join("tsconfig.json");
                default.is_file().then_some(default)
            }
        }
    }

    /// Check that configured inputs exist.
    ///
    /// Template paths containing glob characters are not checked here; an
    /// empty match is reported when templates are discovered.
    pub fn validate(&self) -> Result<()> {
        require(self.project_path.is_dir(), "project_path", &self.project_path)?;
        require(self.views_root.is_dir(), "views_root", &self.views_root)?;
        for path in &self.template_paths {
            let pattern = path.to_string_lossy();
            if !pattern.contains(['*', '?', '[']) {
                require(path.exists(), "template_paths", path)?;
            }
        }
        if let Some(tsconfig) = &self.tsconfig {
            require(tsconfig.is_file(), "tsconfig", tsconfig)?;
        }
        if let Some(shared) = &self.shared_locals {
            require(shared.import_path.is_file(), "shared_locals.import_path", &shared.import_path)?;
        }
        Ok(())
    }
}

fn require(ok: bool, field: &str, path: &Path) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(PugcheckError::ConfigPathMissing {
            field: field.to_string(),
            path: path.to_path_buf(),
        }
        .into())
    }
}
