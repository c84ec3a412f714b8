//! Integration test suite for pugcheck
//!
//! End-to-end tests over real template trees in temporary directories. The
//! TypeScript compiler is never required: library tests use
//! [`ScriptedEngine`](pugcheck_cli::test_utils::ScriptedEngine) and CLI tests
//! run with `--no-typecheck`.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **resolution**: inheritance overrides, includes, cycles, origins
//! - **generation**: determinism and line-map totality of generated programs
//! - **incremental**: change notification and dependent propagation
//! - **persistence**: saving and reloading the parse result cache
//! - **remapping**: engine diagnostics reported at template lines
//! - **cli**: the `pugcheck` binary

mod cli;
mod generation;
mod incremental;
mod persistence;
mod remapping;
mod resolution;
