//! Code generation.
//!
//! [`generate`] turns a resolved template tree and its contract into a
//! [`SyntheticProgram`] the type-checking engine can consume. The program's
//! [`LineMap`] holds one entry per generated line so engine diagnostics can be
//! reported at template coordinates.

pub mod generator;
pub mod line_map;

pub use generator::{SyntheticProgram, generate};
pub use line_map::{LineMap, MappedLine, SourceBuilder};
