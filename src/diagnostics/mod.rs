//! Per-template diagnostics.
//!
//! - [`error`]: the [`TemplateError`] record every stage produces
//! - [`remap`]: engine diagnostics translated to template coordinates
//! - [`report`]: terminal output

pub mod error;
pub mod remap;
pub mod report;

pub use error::{ErrorKind, TemplateError};
pub use remap::{EngineDiagnostic, Severity, remap, remap_all};
pub use report::{describe_code, format_error, format_summary};
