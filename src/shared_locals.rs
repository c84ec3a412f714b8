//! Locals shared by every template.
//!
//! Projects usually pass a few values to every view (the current user, CSRF
//! token, flash messages). Those are declared once as a type in a declaration
//! file and configured under `[shared_locals]`. The generator intersects the
//! type into every `render` signature and destructures its fields.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::contract::ExpectShape;
use crate::core::PugcheckError;
use crate::utils::scan::find_matching;

/// A loaded shared-locals type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedLocals {
    /// Declaration file the type lives in.
    pub import_path: PathBuf,
    pub type_name: String,
    /// Field names usable as destructuring targets.
    pub fields: Vec<String>,
}

impl SharedLocals {
    /// Read `type_name` from `import_path`.
    ///
    /// Both `type Name = { ... }` and `interface Name { ... }` forms are
    /// recognized, with or without `export` / `declare`.
    pub fn load(import_path: &Path, type_name: &str) -> Result<Self> {
        let text = std::fs::read_to_string(import_path)
            .with_context(|| format!("Failed to read shared locals file: {}", import_path.display()))?;
        let fields = extract_fields(&text, type_name).ok_or_else(|| PugcheckError::SharedLocalsNotFound {
            type_name: type_name.to_string(),
            path: import_path.to_path_buf(),
        })?;

        debug!("Loaded shared locals {type_name} with {} field(s) from {}", fields.len(), import_path.display());
        Ok(Self {
            import_path: import_path.to_path_buf(),
            type_name: type_name.to_string(),
            fields,
        })
    }

    /// `import type { Name } from "<absolute module path>";`
    pub fn import_statement(&self) -> String {
        let path = self.import_path.to_string_lossy().replace('\\', "/");
        let module = path
            .strip_suffix(".d.ts")
            .or_else(|| path.strip_suffix(".ts"))
            .unwrap_or(&path);
        format!("import type {{ {} }} from \"{module}\";", self.type_name)
    }
}

/// Top-level field names of the declaration of `type_name`, if found.
fn extract_fields(text: &str, type_name: &str) -> Option<Vec<String>> {
    let name = regex::escape(type_name);
    let pattern = format!(
        r"(?m)^\s*(?:export\s+)?(?:declare\s+)?(?:type\s+{name}\s*(?:<[^>]*>)?\s*=\s*|interface\s+{name}\s*(?:<[^>]*>)?\s*(?:extends\s+[^{{]+)?)\{{"
    );
    let declaration = Regex::new(&pattern).ok()?.find(text)?;
    let open = declaration.end() - 1;
    let close = find_matching(text, open)?;

    let shape = ExpectShape::parse(&text[open..=close]);
    Some(
        shape
            .fields
            .iter()
            .filter(|field| field.is_identifier())
            .map(|field| field.name.clone())
            .collect(),
    )
}
