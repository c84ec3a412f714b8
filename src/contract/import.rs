//! `//@ import` records.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::utils::fs::normalize_path;

/// Extensions tried, in order, when locating the file behind a module reference.
const MODULE_EXTENSIONS: &[&str] = &["ts", "d.ts", "tsx", "mts", "d.mts"];

/// A parsed `//@ import ... from "<module>"` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    /// The statement as written, without the directive marker.
    pub raw: String,
    /// Everything before `from`, e.g. `import type { User }`.
    pub clause: String,
    /// Local names the clause binds.
    pub symbols: Vec<String>,
    /// Module reference as written.
    pub module: String,
    pub type_only: bool,
    /// Template that declared the import.
    pub file: PathBuf,
    /// 1-based line of the directive.
    pub line: usize,
}

impl ImportRecord {
    /// Parse an import statement. The error is a human-readable reason.
    pub fn parse(statement: &str, file: &Path, line: usize) -> Result<Self, String> {
        let pattern = Regex::new(r#"^(import\s+.*?)\s+from\s+['"]([^'"]+)['"]\s*;?\s*$"#)
            .map_err(|e| format!("internal import pattern error: {e}"))?;
        let statement = statement.trim();
        let captures = pattern
            .captures(statement)
            .ok_or_else(|| format!("malformed import `{statement}`: expected `import ... from \"<module>\"`"))?;

        let clause = captures[1].trim().to_string();
        let module = captures[2].trim().to_string();
        let body = clause["import".len()..].trim();
        let type_only = body.starts_with("type ") || body.starts_with("type{");
        let body = if type_only { body["type".len()..].trim() } else { body };

        let symbols = parse_symbols(body);
        if symbols.is_empty() {
            return Err(format!("import `{statement}` does not bind any names"));
        }

        Ok(Self {
            raw: statement.to_string(),
            clause,
            symbols,
            module,
            type_only,
            file: file.to_path_buf(),
            line,
        })
    }

    /// Relative (`./`, `../`) or absolute module references point at files;
    /// anything else is a package specifier left to the engine.
    pub fn is_path_reference(&self) -> bool {
        self.module.starts_with("./") || self.module.starts_with("../") || self.module.starts_with('/')
    }

    /// Module path resolved against the declaring file's directory.
    pub fn absolute_module_path(&self) -> PathBuf {
        let base = self.file.parent().unwrap_or_else(|| Path::new(""));
        normalize_path(&base.join(&self.module))
    }

    /// The statement with its module rewritten to an absolute path, so the
    /// generated program can live anywhere.
    pub fn absolute_statement(&self) -> String {
        if !self.is_path_reference() {
            return format!("{} from \"{}\";", self.clause, self.module);
        }
        let absolute = self.absolute_module_path().to_string_lossy().replace('\\', "/");
        format!("{} from \"{absolute}\";", self.clause)
    }

    /// Locate the file behind the module reference, trying the usual
    /// TypeScript extensions and `index` files. A trailing `.js` is mapped
    /// back to its source file.
    pub fn resolve_module_file(&self) -> Option<PathBuf> {
        if !self.is_path_reference() {
            return None;
        }
        resolve_module_path(&self.absolute_module_path())
    }
}

/// Find an existing source file for a module path.
pub fn resolve_module_path(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }

    let text = path.to_string_lossy();
    let stem = text.strip_suffix(".js").unwrap_or(&text);
    MODULE_EXTENSIONS
        .iter()
        .map(|ext| PathBuf::from(format!("{stem}.{ext}")))
        .chain(MODULE_EXTENSIONS.iter().map(|ext| path.join(format!("index.{ext}"))))
        .find(|candidate| candidate.is_file())
}

/// Local names bound by an import clause body: default, namespace, and named.
fn parse_symbols(body: &str) -> Vec<String> {
    let mut symbols = Vec::new();
    let (outer, named) = match (body.find('{'), body.rfind('}')) {
        (Some(open), Some(close)) if open < close => {
            (format!("{}{}", &body[..open], &body[close + 1..]), Some(&body[open + 1..close]))
        }
        _ => (body.to_string(), None),
    };

    for part in outer.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.strip_prefix('*') {
            Some(namespace) => {
                if let Some(name) = namespace.trim().strip_prefix("as ") {
                    symbols.push(name.trim().to_string());
                }
            }
            None => symbols.push(part.to_string()),
        }
    }

    if let Some(named) = named {
        for spec in named.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let spec = spec.strip_prefix("type ").map(str::trim).unwrap_or(spec);
            let local = match spec.split_once(" as ") {
                Some((_, alias)) => alias.trim(),
                None => spec,
            };
            symbols.push(local.to_string());
        }
    }

    symbols
}
