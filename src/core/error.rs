//! Process-level error handling for pugcheck.
//!
//! Template problems are never errors in this sense: they are collected as
//! [`TemplateError`](crate::diagnostics::TemplateError) records and reported.
//! [`PugcheckError`] covers the failures that stop a run (bad configuration,
//! an unreadable cache, a missing engine), and [`ErrorContext`] wraps one with
//! a suggestion for the terminal.
//!
//! ```rust,no_run
//! use pugcheck_cli::core::{PugcheckError, user_friendly_error};
//!
//! let error = anyhow::Error::from(PugcheckError::EngineNotFound {
//!     name: "tsc".to_string(),
//! });
//! user_friendly_error(error).display();
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a pugcheck run.
#[derive(Error, Debug, Clone)]
pub enum PugcheckError {
    /// The configuration file exists but is not valid TOML for [`Config`](crate::config::Config)
    #[error("Invalid configuration in {}: {reason}", file.display())]
    ConfigParseError {
        file: PathBuf,
        reason: String,
    },

    /// A configured path does not exist
    #[error("Configured {field} does not exist: {}", path.display())]
    ConfigPathMissing {
        field: String,
        path: PathBuf,
    },

    /// The shared-locals declaration file does not declare the configured type
    #[error("Type `{type_name}` not found in {}", path.display())]
    SharedLocalsNotFound {
        type_name: String,
        path: PathBuf,
    },

    /// No template matched the requested paths
    #[error("No templates found under {}", paths.join(", "))]
    NoTemplates {
        paths: Vec<String>,
    },

    /// A path given on the command line is not a template
    #[error("Not a template file: {}", path.display())]
    NotATemplate {
        path: PathBuf,
    },

    /// The type-checking engine executable could not be located
    #[error("Type-checking engine `{name}` not found")]
    EngineNotFound {
        name: String,
    },

    /// The engine ran but its output could not be interpreted
    #[error("Type-checking engine failed (exit code {code:?}): {output}")]
    EngineFailed {
        code: Option<i32>,
        output: String,
    },

    /// The persisted cache could not be read
    #[error("Failed to read cache {}: {reason}", path.display())]
    CacheReadError {
        path: PathBuf,
        reason: String,
    },

    /// The persisted cache was written by an incompatible version
    #[error("Cache format version {found} is not supported (expected {expected})")]
    CacheVersionMismatch {
        found: u32,
        expected: u32,
    },

    /// Any other failure, carried as its message
    #[error("{message}")]
    Other {
        message: String,
    },
}

/// A [`PugcheckError`] with optional details and a suggestion.
#[derive(Debug)]
pub struct ErrorContext {
    pub error: PugcheckError,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: PugcheckError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print to stderr: error in red, details in yellow, suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error from a run into an [`ErrorContext`] for display.
///
/// Known [`PugcheckError`]s anywhere in the chain get tailored suggestions;
/// anything else is shown with its full context chain as details.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(pugcheck_error) = error.chain().find_map(|cause| cause.downcast_ref::<PugcheckError>()) {
        return create_error_context(pugcheck_error.clone());
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(PugcheckError::ConfigParseError {
            file: PathBuf::from(crate::constants::CONFIG_FILE_NAME),
            reason: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax in your pugcheck.toml file");
    }

    let details = error.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>().join("\n  caused by: ");
    let context = ErrorContext::new(PugcheckError::Other {
        message: error.to_string(),
    });
    if details.is_empty() {
        context
    } else {
        context.with_details(details)
    }
}

fn create_error_context(error: PugcheckError) -> ErrorContext {
    match &error {
        PugcheckError::ConfigParseError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check the TOML syntax and field names in pugcheck.toml")
            .with_details("Every field is optional; remove unknown keys or fix their types"),
        PugcheckError::ConfigPathMissing {
            field,
            ..
        } => {
            let suggestion = format!("Update `{field}` in pugcheck.toml or pass the path on the command line");
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("Relative paths are resolved against the directory containing pugcheck.toml")
        }
        PugcheckError::SharedLocalsNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Declare it as `export type Name = { ... }` or `export interface Name { ... }`"),
        PugcheckError::NoTemplates {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check `template_paths` in pugcheck.toml or pass a directory to `pugcheck check`"),
        PugcheckError::NotATemplate {
            ..
        } => ErrorContext::new(error).with_suggestion("Pass a .pug file"),
        PugcheckError::EngineNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Install TypeScript with `npm install --save-dev typescript`, or run with --no-typecheck")
            .with_details("pugcheck looks in node_modules/.bin and then on PATH"),
        PugcheckError::EngineFailed {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Run with --verbose to see the generated program and the engine invocation"),
        PugcheckError::CacheReadError {
            ..
        }
        | PugcheckError::CacheVersionMismatch {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Run `pugcheck cache clear` or use --no-cache")
            .with_details("The cache is rebuilt from scratch on the next run"),
        PugcheckError::Other {
            ..
        } => ErrorContext::new(error),
    }
}
