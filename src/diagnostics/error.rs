//! Positioned per-file errors.
//!
//! A [`TemplateError`] is data, not control flow: every stage of the pipeline
//! collects them per template, the cache persists them, and the reporter
//! prints them. They are always expressed in template coordinates.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Category of a [`TemplateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// A referenced parent, include, or import target does not exist.
    MissingFile,
    /// A malformed or duplicated `//@` directive, or a misplaced `extends`.
    DirectiveShape,
    /// A template line the parser could not understand.
    Syntax,
    /// A node reached the rewrite without an origin.
    Invariant,
    /// The file closes an inheritance/inclusion cycle.
    Cycle,
    /// A type error reported by the engine, remapped to the template.
    TypeCheck,
    /// The engine could not be run or its output could not be read.
    Engine,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::MissingFile => "missing file",
            ErrorKind::DirectiveShape => "directive",
            ErrorKind::Syntax => "syntax",
            ErrorKind::Invariant => "internal",
            ErrorKind::Cycle => "cycle",
            ErrorKind::TypeCheck => "type",
            ErrorKind::Engine => "engine",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A positioned, serializable error attached to one template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateError {
    pub kind: ErrorKind,
    /// File the error points at. Usually the template itself; for errors in a
    /// parent or include, the file containing the offending line.
    pub file: PathBuf,
    /// 1-based line, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
    /// Engine error code (e.g. `2322` for TS2322).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u32>,
}

impl TemplateError {
    pub fn new(kind: ErrorKind, file: impl Into<PathBuf>, line: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            kind,
            file: file.into(),
            line,
            message: message.into(),
            code: None,
        }
    }

    pub fn at(kind: ErrorKind, file: &Path, line: usize, message: impl Into<String>) -> Self {
        Self::new(kind, file, Some(line), message)
    }

    pub fn with_code(mut self, code: u32) -> Self {
        self.code = Some(code);
        self
    }

    /// `file:line` location string.
    pub fn location(&self) -> String {
        match self.line {
            Some(line) => format!("{}:{line}", self.file.display()),
            None => self.file.display().to_string(),
        }
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{}: error TS{code}: {}", self.location(), self.message),
            None => write!(f, "{}: {} error: {}", self.location(), self.kind, self.message),
        }
    }
}

impl std::error::Error for TemplateError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_and_without_code() {
        let plain = TemplateError::at(ErrorKind::MissingFile, Path::new("/v/a.pug"), 3, "cannot find ./b.pug");
        assert_eq!(plain.to_string(), "/v/a.pug:3: missing file error: cannot find ./b.pug");

        let typed = TemplateError::at(ErrorKind::TypeCheck, Path::new("/v/a.pug"), 7, "bad").with_code(2322);
        assert_eq!(typed.to_string(), "/v/a.pug:7: error TS2322: bad");
    }

    #[test]
    fn test_serde_shape() {
        let err = TemplateError::new(ErrorKind::DirectiveShape, "/v/a.pug", None, "dup");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "directive-shape");
        assert!(json.get("line").is_none());
        let back: TemplateError = serde_json::from_value(json).unwrap();
        assert_eq!(back, err);
    }
}
