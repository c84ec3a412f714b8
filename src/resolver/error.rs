//! Resolver failures.
//!
//! These short-circuit the resolution of one template and are turned into a
//! single [`TemplateError`] at the file boundary.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::diagnostics::{ErrorKind, TemplateError};

/// Which directive caused a file to be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// The template being checked.
    Root,
    Inherits,
    Include,
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DirectiveKind::Root => "template",
            DirectiveKind::Inherits => "extends",
            DirectiveKind::Include => "include",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("cannot find {kind} target `{target}` (looked for {})", path.display())]
    MissingFile {
        /// File containing the directive.
        referrer: PathBuf,
        line: Option<usize>,
        kind: DirectiveKind,
        target: String,
        path: PathBuf,
    },

    #[error("circular {kind} detected:\n{}", format_chain(chain))]
    Cycle {
        /// File whose directive closes the loop.
        file: PathBuf,
        line: usize,
        kind: DirectiveKind,
        chain: Vec<PathBuf>,
    },

    #[error("{kind} node at line {line} has no origin after stamping")]
    MissingOrigin {
        file: PathBuf,
        line: usize,
        kind: &'static str,
    },

    #[error("failed to read {}: {source}", file.display())]
    Read {
        file: PathBuf,
        referrer: Option<(PathBuf, usize)>,
        #[source]
        source: std::io::Error,
    },
}

/// Render a cycle as one file per line joined by arrows.
fn format_chain(chain: &[PathBuf]) -> String {
    let mut msg = String::new();
    for (i, path) in chain.iter().enumerate() {
        if i > 0 {
            msg.push_str("  ↓\n");
        }
        msg.push_str(&format!("  {}", path.display()));
        if i + 1 == chain.len() {
            msg.push_str(" (circular reference)");
        }
        msg.push('\n');
    }
    msg.trim_end().to_string()
}

impl From<ResolveError> for TemplateError {
    fn from(err: ResolveError) -> Self {
        let message = err.to_string();
        match err {
            ResolveError::MissingFile {
                referrer,
                line,
                ..
            } => TemplateError::new(ErrorKind::MissingFile, referrer, line, message),
            ResolveError::Cycle {
                file,
                line,
                ..
            } => TemplateError::at(ErrorKind::Cycle, &file, line, message),
            ResolveError::MissingOrigin {
                file,
                line,
                ..
            } => TemplateError::at(ErrorKind::Invariant, &file, line, message),
            ResolveError::Read {
                file,
                referrer,
                ..
            } => match referrer {
                Some((referrer, line)) => TemplateError::at(ErrorKind::MissingFile, &referrer, line, message),
                None => TemplateError::new(ErrorKind::MissingFile, file, None, message),
            },
        }
    }
}

impl ResolveError {
    pub fn missing(
        referrer: &Path,
        line: Option<usize>,
        kind: DirectiveKind,
        target: &str,
        path: &Path,
    ) -> Self {
        ResolveError::MissingFile {
            referrer: referrer.to_path_buf(),
            line,
            kind,
            target: target.to_string(),
            path: path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_chain() {
        let err = ResolveError::Cycle {
            file: PathBuf::from("/v/b.pug"),
            line: 1,
            kind: DirectiveKind::Inherits,
            chain: vec![PathBuf::from("/v/a.pug"), PathBuf::from("/v/b.pug"), PathBuf::from("/v/a.pug")],
        };
        let template_error: TemplateError = err.into();
        assert_eq!(template_error.kind, ErrorKind::Cycle);
        assert_eq!(template_error.file, PathBuf::from("/v/b.pug"));
        assert_eq!(
            template_error.message,
            "circular extends detected:\n  /v/a.pug\n  ↓\n  /v/b.pug\n  ↓\n  /v/a.pug (circular reference)"
        );
    }

    #[test]
    fn test_missing_file_points_at_referrer() {
        let err = ResolveError::missing(
            Path::new("/v/a.pug"),
            Some(3),
            DirectiveKind::Include,
            "./nav",
            Path::new("/v/nav.pug"),
        );
        let template_error: TemplateError = err.into();
        assert_eq!(template_error.kind, ErrorKind::MissingFile);
        assert_eq!(template_error.line, Some(3));
        assert!(template_error.message.contains("cannot find include target `./nav`"));
    }
}
