//! pugcheck - type-checked contracts for Pug templates
//!
//! Each template declares the locals it needs in `//@` directive comments:
//!
//! ```pug
//! //@ import type { User } from "../types/user"
//! //@ expect { user: User; items: string[] }
//! extends /layouts/base
//!
//! block content
//!   h1= user.name
//!   each item in items
//!     li= item.toUpperCase()
//! ```
//!
//! pugcheck never renders a template. It resolves `extends` and `include`
//! into one tree, generates a TypeScript program whose every line is mapped
//! back to a template line, runs the compiler over it, and reports the
//! compiler's diagnostics at the template lines that caused them.
//!
//! # Pipeline
//!
//! ```text
//! contract::extract -> resolver::TemplateResolver -> codegen::generate
//!        -> engine::TypeCheckEngine -> diagnostics::remap
//! ```
//!
//! # Modules
//!
//! ## Templates
//! - [`template`] - Pug lexer, parser and node model
//! - [`contract`] - `//@ import` / `//@ expect` directive extraction
//! - [`resolver`] - inheritance and inclusion, origins, the dependency graph
//!
//! ## Checking
//! - [`codegen`] - synthetic program generation and the line map
//! - [`engine`] - the TypeScript compiler and other engines
//! - [`diagnostics`] - template errors, remapping and terminal output
//! - [`checker`] - the per-template pipeline
//! - [`shared_locals`] - a project-wide locals type merged into every contract
//!
//! ## Infrastructure
//! - [`cache`] - parse results with staleness tracking and persistence
//! - [`config`] - `pugcheck.toml`
//! - [`core`] - process-level errors and user-facing error context
//! - [`cli`] - the `pugcheck` command
//! - [`utils`] - file system and text scanning helpers
//!
//! # Library use
//!
//! ```rust,no_run
//! use pugcheck_cli::checker::Checker;
//! use pugcheck_cli::config::Config;
//! use pugcheck_cli::engine::NoopEngine;
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::load(None, Path::new("."))?;
//! let mut checker = Checker::new(config, Box::new(NoopEngine))?;
//! let report = checker.scan_all(&[])?;
//! println!("{} error(s)", report.error_count());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod checker;
pub mod cli;
pub mod codegen;
pub mod config;
pub mod constants;
pub mod contract;
pub mod core;
pub mod diagnostics;
pub mod engine;
pub mod resolver;
pub mod shared_locals;
pub mod template;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
