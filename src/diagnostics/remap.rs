//! Mapping engine diagnostics back to template coordinates.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{ErrorKind, TemplateError};
use crate::codegen::SyntheticProgram;

/// Severity reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One diagnostic as reported by the engine, in generated coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineDiagnostic {
    pub file: PathBuf,
    /// 1-based line in `file`.
    pub line: usize,
    pub column: usize,
    pub code: Option<u32>,
    pub severity: Severity,
    pub message: String,
}

/// Remap `diagnostic` through `program`'s line map.
///
/// `program_file` is where the program was written for the engine.
/// Diagnostics in other files (imported modules) keep their own coordinates.
/// A line with a `contract` origin points at the template itself.
pub fn remap(diagnostic: &EngineDiagnostic, program: &SyntheticProgram, program_file: &Path) -> TemplateError {
    let mut error = if !same_file(&diagnostic.file, program_file) {
        TemplateError::new(ErrorKind::TypeCheck, &diagnostic.file, Some(diagnostic.line), &diagnostic.message)
    } else {
        match program.line_map.get(diagnostic.line) {
            Some(mapped) if mapped.is_contract() => {
                TemplateError::new(ErrorKind::TypeCheck, &program.template_path, None, &diagnostic.message)
            }
            Some(mapped) => {
                TemplateError::new(ErrorKind::TypeCheck, &mapped.file, Some(mapped.line), &diagnostic.message)
            }
            None => {
                debug!(
                    "No mapping for generated line {} of {} ({} mapped)",
                    diagnostic.line,
                    program.template_path.display(),
                    program.line_map.len()
                );
                TemplateError::new(
                    ErrorKind::TypeCheck,
                    &program.template_path,
                    None,
                    format!("No mapping found for generated line {}: {}", diagnostic.line, diagnostic.message),
                )
            }
        }
    };
    error.code = diagnostic.code;
    error
}

/// Remap every error-severity diagnostic.
pub fn remap_all(
    diagnostics: &[EngineDiagnostic],
    program: &SyntheticProgram,
    program_file: &Path,
) -> Vec<TemplateError> {
    diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.severity == Severity::Error)
        .map(|diagnostic| remap(diagnostic, program, program_file))
        .collect()
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
