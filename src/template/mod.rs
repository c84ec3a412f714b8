//! Pug template model and parser.
//!
//! This module turns template text into a tree of [`TemplateNode`]s. It knows
//! nothing about files on disk or inheritance; the [`crate::resolver`] drives it
//! and stamps origins onto the nodes it returns.
//!
//! # Supported syntax
//!
//! - Elements with `.class` / `#id` shorthands, attribute lists (including
//!   multi-line lists), `&attributes(...)`, inline text, `tag= expr`,
//!   `tag.` text blocks and `tag: nested` block expansion
//! - Piped text (`| ...`), literal HTML lines, and `#{}` / `!{}` interpolation
//! - Code: `- stmt`, multi-line `-` blocks, `= expr`, `!= expr`
//! - Control flow: `if` / `else if` / `else` / `unless`, `each` / `for`
//!   (with an optional `else`), `while`
//! - `extends`, `include`, `include:filter`, `block` / `append` / `prepend`
//! - `mixin` definitions and `+mixin` calls, comments, `doctype`, `:filters`

pub mod lexer;
pub mod node;
pub mod parser;

pub use node::{
    Attribute, NodeKind, Origin, RegionMode, TemplateNode, render_tree, stamp_origin, walk_all,
};
pub use parser::{ParsedTemplate, SyntaxError, parse};
