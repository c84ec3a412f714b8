//! Test utilities for pugcheck
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration suite:
//! - [`TemplateProject`]: a temporary project with a views directory
//! - [`ScriptedEngine`]: a type-checking engine with canned diagnostics
//! - [`init_test_logging`]: one-time tracing setup honoring `RUST_LOG`
//!
//! # Example
//!
//! ```rust,no_run
//! use pugcheck_cli::test_utils::{ScriptedEngine, TemplateProject};
//!
//! let project = TemplateProject::new().unwrap();
//! project.view("page.pug", "//@ expect { title: string }\nh1= title").unwrap();
//! let mut checker = project.checker(ScriptedEngine::new()).unwrap();
//! let report = checker.scan_all(&[]).unwrap();
//! assert!(!report.has_errors());
//! ```

pub mod engine;
pub mod environment;

pub use engine::ScriptedEngine;
pub use environment::TemplateProject;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Guards one-time subscriber installation across test threads.
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`; does nothing when neither
/// is set. Safe to call from every test.
///
/// ```bash
/// RUST_LOG=pugcheck_cli=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
