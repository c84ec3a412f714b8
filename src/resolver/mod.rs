//! Template resolution.
//!
//! The resolver turns one root template into a single flat node tree with no
//! `extends` or `include` left in it. Every node in the result carries the
//! file and line it came from, so the code generator can map each generated
//! line back to a template location.
//!
//! # Algorithm
//!
//! 1. Parse the file and stamp every node with its origin.
//! 2. If the file has a top-level `extends`, resolve the parent (recursively,
//!    memoized for the duration of one root resolution), apply the child's
//!    region overrides to it, and place the child's other top-level content
//!    ahead of the merged parent.
//! 3. Walk the result depth-first. An `include` is resolved relative to the
//!    file that declared it and its resolved nodes are spliced in its place.
//!
//! Every `extends` and `include` records an edge in the [`DependencyGraph`]
//! before the target is resolved, so dependents are known even when the
//! target turns out to be missing or cyclic.
//!
//! # Errors
//!
//! Structural failures (missing files, cycles, missing origins) short-circuit
//! the root and are reported once, as a [`TemplateError`]; the root then has
//! no tree. Syntax errors and misplaced directives are collected and
//! resolution continues.
//!
//! Cycles are caught with an explicit stack of files currently being
//! resolved. The file whose directive points back into the stack reports the
//! cycle.

pub mod dependency_graph;
pub mod error;
pub mod inherit;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

pub use dependency_graph::DependencyGraph;
pub use error::{DirectiveKind, ResolveError};

use crate::contract::{is_template_path, resolve_target};
use crate::diagnostics::{ErrorKind, TemplateError};
use crate::template::{self, NodeKind, TemplateNode, stamp_origin};
use crate::utils::fs::normalize_path;

/// Result of resolving one root template.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// The flattened tree; `None` when a structural error stopped resolution.
    pub tree: Option<Vec<TemplateNode>>,
    pub errors: Vec<TemplateError>,
}

/// A file currently being resolved, and why.
#[derive(Debug, Clone)]
struct ActiveResolution {
    path: PathBuf,
    kind: DirectiveKind,
}

/// Resolves templates against the views root, recording edges in a graph.
pub struct TemplateResolver<'g> {
    graph: &'g mut DependencyGraph,
    views_root: PathBuf,
    stack: Vec<ActiveResolution>,
    memo: HashMap<PathBuf, Vec<TemplateNode>>,
    errors: Vec<TemplateError>,
}

impl<'g> TemplateResolver<'g> {
    pub fn new(graph: &'g mut DependencyGraph, views_root: &Path) -> Self {
        Self {
            graph,
            views_root: normalize_path(views_root),
            stack: Vec::new(),
            memo: HashMap::new(),
            errors: Vec::new(),
        }
    }

    /// Resolve `path`. When `source` is given it is used instead of reading
    /// the file.
    pub fn resolve(mut self, path: &Path, source: Option<&str>) -> Resolution {
        let path = normalize_path(path);
        debug!("Resolving template {}", path.display());

        let result = match source {
            Some(text) => self.resolve_text(&path, text, DirectiveKind::Root),
            None => self.resolve_path(&path, DirectiveKind::Root, None, None),
        };
        self.finish(&path, result)
    }

    /// Fold the outcome of a resolution and the collected errors together.
    fn finish(mut self, path: &Path, result: Result<Vec<TemplateNode>, ResolveError>) -> Resolution {
        let mut errors = std::mem::take(&mut self.errors);
        let tree = match result {
            Ok(nodes) => Some(nodes),
            Err(err) => {
                debug!("Resolution of {} stopped: {err}", path.display());
                errors.push(err.into());
                None
            }
        };
        Resolution {
            tree,
            errors,
        }
    }

    /// Resolve a referenced file, with cycle detection and memoization.
    fn resolve_path(
        &mut self,
        path: &Path,
        kind: DirectiveKind,
        via: Option<(&Path, usize)>,
        target: Option<&str>,
    ) -> Result<Vec<TemplateNode>, ResolveError> {
        if let Some(start) = self.stack.iter().position(|active| active.path == path)
            && let Some((referrer, line)) = via
        {
            let mut chain: Vec<PathBuf> = self.stack[start..].iter().map(|a| a.path.clone()).collect();
            chain.push(path.to_path_buf());
            debug!(
                "Cycle closed by {}:{line} ({kind}, first entered as {})",
                referrer.display(),
                self.stack[start].kind
            );
            return Err(ResolveError::Cycle {
                file: referrer.to_path_buf(),
                line,
                kind,
                chain,
            });
        }

        if let Some(resolved) = self.memo.get(path) {
            debug!("Reusing resolved tree for {}", path.display());
            return Ok(resolved.clone());
        }

        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let referrer = via.map_or(path, |(referrer, _)| referrer);
                return Err(ResolveError::missing(
                    referrer,
                    via.map(|(_, line)| line),
                    kind,
                    target.unwrap_or(&path.to_string_lossy()),
                    path,
                ));
            }
            Err(source) => {
                return Err(ResolveError::Read {
                    file: path.to_path_buf(),
                    referrer: via.map(|(referrer, line)| (referrer.to_path_buf(), line)),
                    source,
                });
            }
        };

        let nodes = self.resolve_text(path, &text, kind)?;
        self.memo.insert(path.to_path_buf(), nodes.clone());
        Ok(nodes)
    }

    fn resolve_text(&mut self, path: &Path, text: &str, kind: DirectiveKind) -> Result<Vec<TemplateNode>, ResolveError> {
        self.stack.push(ActiveResolution {
            path: path.to_path_buf(),
            kind,
        });
        let result = self.resolve_parsed(path, text);
        self.stack.pop();
        result
    }

    fn resolve_parsed(&mut self, path: &Path, text: &str) -> Result<Vec<TemplateNode>, ResolveError> {
        let parsed = template::parse(text);
        for error in parsed.errors {
            self.errors.push(TemplateError::at(ErrorKind::Syntax, path, error.line, error.message));
        }

        let file: Arc<Path> = Arc::from(path);
        let nodes = stamp_origin(parsed.nodes, &file);

        let inherits: Vec<(usize, String)> = nodes
            .iter()
            .filter_map(|node| match &node.kind {
                NodeKind::Inherits {
                    target,
                } => Some((node.line, target.clone())),
                _ => None,
            })
            .collect();

        let nodes = match inherits.split_first() {
            Some(((line, target), extra)) => {
                for (extra_line, _) in extra {
                    self.errors.push(TemplateError::at(
                        ErrorKind::DirectiveShape,
                        path,
                        *extra_line,
                        format!("only one `extends` is allowed per template (first on line {line})"),
                    ));
                }
                self.inherit(path, &file, nodes, *line, target)?
            }
            None => nodes,
        };

        self.rewrite(nodes)
    }

    /// Merge the child `nodes` into the resolved parent named by `target`.
    fn inherit(
        &mut self,
        child: &Path,
        child_file: &Arc<Path>,
        nodes: Vec<TemplateNode>,
        line: usize,
        target: &str,
    ) -> Result<Vec<TemplateNode>, ResolveError> {
        let parent_path = resolve_target(target, child, &self.views_root);
        self.graph.add(child, &parent_path);
        debug!("{} extends {}", child.display(), parent_path.display());

        let parent = self.resolve_path(&parent_path, DirectiveKind::Inherits, Some((child, line)), Some(target))?;
        let parts = inherit::split_child(nodes, child_file);
        let merged = inherit::merge_into_parent(parent, &parts, child, &parent_path);

        let mut result = parts.loose;
        result.extend(merged);
        Ok(result)
    }

    /// Depth-first rewrite: splice includes, reject nested `extends`.
    fn rewrite(&mut self, nodes: Vec<TemplateNode>) -> Result<Vec<TemplateNode>, ResolveError> {
        let mut out = Vec::with_capacity(nodes.len());

        for node in nodes {
            let Some(origin) = node.file.clone() else {
                let file = self.stack.last().map(|a| a.path.clone()).unwrap_or_default();
                return Err(ResolveError::MissingOrigin {
                    file,
                    line: node.line,
                    kind: node.kind.name(),
                });
            };

            match &node.kind {
                NodeKind::Inherits {
                    ..
                } => {
                    self.errors.push(TemplateError::at(
                        ErrorKind::DirectiveShape,
                        &origin,
                        node.line,
                        "`extends` must appear at the top level of a template",
                    ));
                }
                NodeKind::Include {
                    target,
                    filter,
                } => {
                    let included = self.include(&origin, node.line, target, filter.as_deref())?;
                    out.extend(included);
                }
                _ => out.push(node.try_map_lists(|list| self.rewrite(list))?),
            }
        }

        Ok(out)
    }

    fn include(
        &mut self,
        declarer: &Path,
        line: usize,
        target: &str,
        filter: Option<&str>,
    ) -> Result<Vec<TemplateNode>, ResolveError> {
        let path = resolve_target(target, declarer, &self.views_root);
        self.graph.add(declarer, &path);

        if filter.is_some() || !is_template_path(&path) {
            debug!("{}:{line} raw include of {}", declarer.display(), path.display());
            if !path.is_file() {
                return Err(ResolveError::missing(declarer, Some(line), DirectiveKind::Include, target, &path));
            }
            return Ok(Vec::new());
        }

        debug!("{}:{line} includes {}", declarer.display(), path.display());
        self.resolve_path(&path, DirectiveKind::Include, Some((declarer, line)), Some(target))
    }
}
