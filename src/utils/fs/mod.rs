//! File system utilities.
//!
//! - [`atomic`] - temp-and-rename writes for the cache and generated programs
//! - [`discovery`] - finding templates under configured paths
//! - [`metadata`] - modification times in milliseconds
//! - [`paths`] - lexical normalization and lookup helpers

pub mod atomic;
pub mod discovery;
pub mod metadata;
pub mod paths;

pub use atomic::atomic_write;
pub use discovery::find_templates;
pub use metadata::modified_ms;
pub use paths::{absolutize, display_relative, find_upwards, normalize_path};
