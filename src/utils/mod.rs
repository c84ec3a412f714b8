//! Utilities shared across the pipeline.
//!
//! - [`fs`] - atomic writes, path normalization, template discovery
//! - [`scan`] - bracket- and string-aware scanning of embedded expressions

pub mod fs;
pub mod scan;

pub use fs::{atomic_write, normalize_path};
