//! Core error types.
//!
//! [`PugcheckError`] enumerates the failures that abort a run; [`ErrorContext`]
//! and [`user_friendly_error`] turn them into colored terminal output with a
//! suggestion. Per-template problems live in [`crate::diagnostics`].

pub mod error;

pub use error::{ErrorContext, PugcheckError, user_friendly_error};
