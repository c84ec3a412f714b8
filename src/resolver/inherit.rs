//! Merging a child template into its resolved parent.
//!
//! Every named region anywhere in the parent is a candidate; the child
//! contributes its top-level regions. Each override either replaces, appends
//! to, or prepends to the parent's region body. The rest of the child's
//! top-level content is returned separately so the caller can place it ahead
//! of the merged parent.

use std::collections::{BTreeSet, HashMap};
use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;

use strsim::levenshtein;
use tracing::debug;

use crate::template::{NodeKind, RegionMode, TemplateNode, stamp_origin, walk_all};

/// One child override of a named region.
#[derive(Debug, Clone)]
pub struct RegionOverride {
    pub mode: RegionMode,
    pub nodes: Vec<TemplateNode>,
}

/// A child template split into region overrides and loose content.
#[derive(Debug, Default)]
pub struct ChildParts {
    pub overrides: HashMap<String, Vec<RegionOverride>>,
    /// Declaration order of override names, for deterministic logging.
    pub order: Vec<String>,
    pub loose: Vec<TemplateNode>,
}

/// Split the child's top-level nodes. `extends` nodes are dropped here.
pub fn split_child(nodes: Vec<TemplateNode>, child_file: &Arc<Path>) -> ChildParts {
    let mut parts = ChildParts::default();

    for node in nodes {
        let region = match &node.kind {
            NodeKind::Inherits {
                ..
            } => continue,
            NodeKind::Region {
                name,
                mode,
            } if !name.is_empty() => Some((name.clone(), *mode)),
            _ => None,
        };

        match region {
            Some((name, mode)) => {
                if !parts.overrides.contains_key(&name) {
                    parts.order.push(name.clone());
                }
                parts.overrides.entry(name).or_default().push(RegionOverride {
                    mode,
                    nodes: stamp_origin(node.children, child_file),
                });
            }
            None => parts.loose.push(node),
        }
    }

    parts
}

/// Names of every named region anywhere in `nodes`.
pub fn collect_regions(nodes: &[TemplateNode]) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    walk_all(nodes, &mut |node| {
        if let Some(name) = node.region_name() {
            names.insert(name.to_string());
        }
    });
    names
}

/// Apply the child's overrides to a resolved parent tree.
///
/// Overrides whose name does not occur in the parent are dropped with a debug
/// log naming the closest parent region.
pub fn merge_into_parent(parent: Vec<TemplateNode>, parts: &ChildParts, child: &Path, parent_path: &Path) -> Vec<TemplateNode> {
    let available = collect_regions(&parent);
    for name in &parts.order {
        if !available.contains(name) {
            match closest_region(name, &available) {
                Some(suggestion) => debug!(
                    "{}: block `{name}` does not exist in {} and is ignored (did you mean `{suggestion}`?)",
                    child.display(),
                    parent_path.display()
                ),
                None => debug!(
                    "{}: block `{name}` does not exist in {} and is ignored",
                    child.display(),
                    parent_path.display()
                ),
            }
        }
    }

    apply_overrides(parent, &parts.overrides)
}

fn apply_overrides(nodes: Vec<TemplateNode>, overrides: &HashMap<String, Vec<RegionOverride>>) -> Vec<TemplateNode> {
    nodes.into_iter().map(|node| apply_node(node, overrides)).collect()
}

fn apply_node(node: TemplateNode, overrides: &HashMap<String, Vec<RegionOverride>>) -> TemplateNode {
    let replacement = node.region_name().and_then(|name| overrides.get(name));
    let rebuilt = node.try_map_lists::<Infallible, _>(|list| Ok(apply_overrides(list, overrides)));
    let mut node = match rebuilt {
        Ok(node) => node,
        Err(never) => match never {},
    };

    if let Some(chain) = replacement {
        for RegionOverride {
            mode,
            nodes,
        } in chain
        {
            match mode {
                RegionMode::Replace => node.children = nodes.clone(),
                RegionMode::Append => node.children.extend(nodes.iter().cloned()),
                RegionMode::Prepend => {
                    let mut merged = nodes.clone();
                    merged.append(&mut node.children);
                    node.children = merged;
                }
            }
        }
    }
    node
}

/// Closest region name by edit distance, if reasonably close.
fn closest_region<'a>(name: &str, available: &'a BTreeSet<String>) -> Option<&'a str> {
    available
        .iter()
        .map(|candidate| (candidate, levenshtein(name, candidate)))
        .filter(|(_, distance)| *distance <= name.len().max(3) / 2)
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::parse;

    fn stamped(source: &str, file: &str) -> (Vec<TemplateNode>, Arc<Path>) {
        let file: Arc<Path> = Arc::from(Path::new(file));
        (stamp_origin(parse(source).nodes, &file), file)
    }

    fn texts(nodes: &[TemplateNode]) -> Vec<String> {
        let mut out = Vec::new();
        walk_all(nodes, &mut |node| {
            if let NodeKind::Text {
                value,
            } = &node.kind
            {
                out.push(value.clone());
            }
        });
        out
    }

    #[test]
    fn test_replace_append_prepend() {
        let (parent, _) = stamped(
            "html\n  body\n    block content\n      | parent body\n    block scripts\n      | base.js\n    block meta\n      | base meta",
            "/v/layout.pug",
        );
        let (child, child_file) = stamped(
            "extends layout\nblock content\n  | child body\nappend scripts\n  | page.js\nblock prepend meta\n  | page meta",
            "/v/page.pug",
        );

        let parts = split_child(child, &child_file);
        let merged = merge_into_parent(parent, &parts, Path::new("/v/page.pug"), Path::new("/v/layout.pug"));
        assert_eq!(texts(&merged), vec!["child body", "base.js", "page.js", "page meta", "base meta"]);
    }

    #[test]
    fn test_overrides_keep_child_origin() {
        let (parent, _) = stamped("div\n  block content", "/v/layout.pug");
        let (child, child_file) = stamped("extends layout\nblock content\n  p= title", "/v/page.pug");
        let parts = split_child(child, &child_file);
        let merged = merge_into_parent(parent, &parts, Path::new("/v/page.pug"), Path::new("/v/layout.pug"));

        let region = &merged[0].children[0];
        assert_eq!(region.file.as_deref(), Some(Path::new("/v/layout.pug")));
        let p = &region.children[0];
        assert_eq!(p.file.as_deref(), Some(Path::new("/v/page.pug")));
        assert_eq!(p.line, 3);
    }

    #[test]
    fn test_unknown_region_dropped_and_loose_content_kept() {
        let (parent, _) = stamped("block content", "/v/layout.pug");
        let (child, child_file) = stamped(
            "extends layout\nmixin greet(name)\n  p= name\nblock contnet\n  | typo",
            "/v/page.pug",
        );
        let parts = split_child(child, &child_file);
        assert_eq!(parts.loose.len(), 1);
        let merged = merge_into_parent(parent, &parts, Path::new("/v/page.pug"), Path::new("/v/layout.pug"));
        assert!(texts(&merged).is_empty());
        assert_eq!(closest_region("contnet", &collect_regions(&merged)), Some("content"));
    }

    #[test]
    fn test_nested_regions_collected() {
        let (parent, _) = stamped("if x\n  block a\nelse\n  div\n    block b", "/v/l.pug");
        assert_eq!(collect_regions(&parent), BTreeSet::from(["a".to_string(), "b".to_string()]));
    }
}
