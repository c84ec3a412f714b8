//! Template contracts.
//!
//! A contract is what a template declares about its inputs through `//@`
//! directives:
//!
//! ```pug
//! //@ import type { User } from "../types/user"
//! //@ expect { user: User; title: string }
//! extends /layouts/base
//! ```
//!
//! The [`extractor`] builds a fresh [`Contract`] on every scan; the cache stores
//! the latest one per template so staleness can cascade through dependents.

pub mod extractor;
pub mod import;
pub mod shape;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use extractor::extract;
pub use import::ImportRecord;
pub use shape::{ExpectShape, ShapeField};

use crate::constants::{EMPTY_SHAPE, TEMPLATE_EXTENSION};
use crate::utils::fs::normalize_path;

/// Everything a template declares about its inputs and structural references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub template_path: PathBuf,
    /// Shape text as written; `{}` when the template has no `expect`.
    pub raw_expects: String,
    /// Line of the `expect` directive.
    #[serde(default)]
    pub expects_line: Option<usize>,
    #[serde(default)]
    pub shape: ExpectShape,
    #[serde(default)]
    pub imports: Vec<ImportRecord>,
    #[serde(default)]
    pub raw_extends: Vec<String>,
    #[serde(default)]
    pub extends: Vec<PathBuf>,
    #[serde(default)]
    pub raw_includes: Vec<String>,
    #[serde(default)]
    pub includes: Vec<PathBuf>,
}

impl Contract {
    pub fn new(template_path: &Path) -> Self {
        Self {
            template_path: template_path.to_path_buf(),
            raw_expects: EMPTY_SHAPE.to_string(),
            expects_line: None,
            shape: ExpectShape {
                fields: Vec::new(),
                object_literal: true,
            },
            imports: Vec::new(),
            raw_extends: Vec::new(),
            extends: Vec::new(),
            raw_includes: Vec::new(),
            includes: Vec::new(),
        }
    }
}

/// Resolve an `extends` / `include` target to an absolute path.
///
/// A target starting with `/` is relative to `views_root`; anything else is
/// relative to the directory of `from_file`. A target without an extension
/// gets `.pug`.
pub fn resolve_target(target: &str, from_file: &Path, views_root: &Path) -> PathBuf {
    let target = target.trim().trim_matches(['"', '\'']);
    let joined = match target.strip_prefix('/') {
        Some(rooted) => views_root.join(rooted),
        None => from_file.parent().unwrap_or_else(|| Path::new("")).join(target),
    };
    let mut resolved = normalize_path(&joined);
    if resolved.extension().is_none() {
        resolved.set_extension(TEMPLATE_EXTENSION);
    }
    resolved
}

/// Whether `path` is a Pug template (as opposed to a raw include such as `.md`).
pub fn is_template_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == TEMPLATE_EXTENSION)
}
