//! Structural dependency graph between templates and their inputs.
//!
//! An edge `a → b` means "`a` depends on `b`": `a` extends or includes `b`, or
//! imports a type module `b`. When `b` changes, every file with a path to `b`
//! must be re-checked; [`DependencyGraph::dependents_of`] answers that with a
//! reverse breadth-first traversal, which is safe in the presence of cycles.
//!
//! All paths are normalized before they are used as keys.

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, Reversed};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::utils::fs::{display_relative, normalize_path};

/// Dependency graph keyed by normalized absolute paths.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// The underlying directed graph.
    graph: DiGraph<PathBuf, ()>,
    /// Map from paths to their graph indices.
    node_map: HashMap<PathBuf, NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node if it doesn't already exist and return its index.
    fn ensure_node(&mut self, path: PathBuf) -> NodeIndex {
        if let Some(&index) = self.node_map.get(&path) {
            index
        } else {
            let index = self.graph.add_node(path.clone());
            self.node_map.insert(path, index);
            index
        }
    }

    fn index_of(&self, path: &Path) -> Option<NodeIndex> {
        self.node_map.get(&normalize_path(path)).copied()
    }

    /// Record that `file` depends on `dependency`.
    pub fn add(&mut self, file: &Path, dependency: &Path) {
        let from = self.ensure_node(normalize_path(file));
        let to = self.ensure_node(normalize_path(dependency));

        if !self.graph.contains_edge(from, to) {
            self.graph.add_edge(from, to, ());
        }
    }

    /// Drop every outgoing edge of `file`. Incoming edges are untouched.
    pub fn clear(&mut self, file: &Path) {
        let Some(index) = self.index_of(file) else {
            return;
        };
        while let Some(edge) = self.graph.first_edge(index, Direction::Outgoing) {
            self.graph.remove_edge(edge);
        }
    }

    /// Direct dependencies of `file`.
    pub fn get(&self, file: &Path) -> BTreeSet<PathBuf> {
        self.index_of(file)
            .map(|index| self.graph.neighbors(index).map(|n| self.graph[n].clone()).collect())
            .unwrap_or_default()
    }

    /// Every file with a path to `file`, excluding `file` itself.
    pub fn dependents_of(&self, file: &Path) -> BTreeSet<PathBuf> {
        let Some(start) = self.index_of(file) else {
            return BTreeSet::new();
        };

        let reversed = Reversed(&self.graph);
        let mut bfs = Bfs::new(reversed, start);
        let mut dependents = BTreeSet::new();
        while let Some(node) = bfs.next(reversed) {
            if node != start {
                dependents.insert(self.graph[node].clone());
            }
        }
        dependents
    }

    /// Every file reachable from `file`, excluding `file` itself.
    pub fn dependencies_of(&self, file: &Path) -> BTreeSet<PathBuf> {
        let Some(start) = self.index_of(file) else {
            return BTreeSet::new();
        };

        let mut bfs = Bfs::new(&self.graph, start);
        let mut dependencies = BTreeSet::new();
        while let Some(node) = bfs.next(&self.graph) {
            if node != start {
                dependencies.insert(self.graph[node].clone());
            }
        }
        dependencies
    }

    /// Strongly connected components of more than one file, plus self-loops.
    /// Each cycle is sorted; the list is sorted by its first path.
    pub fn cycles(&self) -> Vec<Vec<PathBuf>> {
        let mut cycles: Vec<Vec<PathBuf>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component.first().is_some_and(|&n| self.graph.contains_edge(n, n))
            })
            .map(|component| {
                let mut paths: Vec<PathBuf> =
                    component.into_iter().map(|n| self.graph[n].clone()).collect();
                paths.sort();
                paths
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// All files that have outgoing edges, with their dependencies, sorted.
    pub fn edges(&self) -> Vec<(PathBuf, Vec<PathBuf>)> {
        let mut edges: Vec<(PathBuf, Vec<PathBuf>)> = self
            .graph
            .node_indices()
            .filter_map(|index| {
                let deps: BTreeSet<PathBuf> =
                    self.graph.neighbors(index).map(|n| self.graph[n].clone()).collect();
                (!deps.is_empty()).then(|| (self.graph[index].clone(), deps.into_iter().collect()))
            })
            .collect();
        edges.sort();
        edges
    }

    /// Rebuild a graph from `(file, dependencies)` pairs.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (PathBuf, Vec<PathBuf>)>,
    {
        let mut graph = Self::new();
        for (file, deps) in edges {
            for dep in deps {
                graph.add(&file, &dep);
            }
        }
        graph
    }

    /// Check if the graph has no edges.
    pub fn is_empty(&self) -> bool {
        self.graph.edge_count() == 0
    }

    /// Get the total number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Build a human-readable forward dependency tree rooted at `root`.
    ///
    /// Paths are shown relative to `base` when possible.
    pub fn to_tree_string(&self, root: &Path, base: &Path) -> String {
        let mut result = format!("{}\n", display_relative(&normalize_path(root), base));
        let mut visited = HashSet::new();
        visited.insert(normalize_path(root));

        let deps: Vec<PathBuf> = self.get(root).into_iter().collect();
        for (i, dep) in deps.iter().enumerate() {
            self.build_tree_string(dep, base, &mut result, "", i == deps.len() - 1, &mut visited);
        }
        result
    }

    fn build_tree_string(
        &self,
        node: &Path,
        base: &Path,
        result: &mut String,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<PathBuf>,
    ) {
        let connector = if is_last {
            "└── "
        } else {
            "├── "
        };
        result.push_str(&format!("{prefix}{connector}{}\n", display_relative(node, base)));

        let child_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };

        if !visited.insert(node.to_path_buf()) {
            result.push_str(&format!("{child_prefix}└── (circular reference)\n"));
            return;
        }

        let deps: Vec<PathBuf> = self.get(node).into_iter().collect();
        for (i, dep) in deps.iter().enumerate() {
            self.build_tree_string(dep, base, result, &child_prefix, i == deps.len() - 1, visited);
        }
        visited.remove(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(path: &str) -> PathBuf {
        PathBuf::from(path)
    }

    #[test]
    fn test_add_get_and_normalization() {
        let mut graph = DependencyGraph::new();
        graph.add(Path::new("/v/pages/../a.pug"), Path::new("/v/./layout.pug"));
        graph.add(Path::new("/v/a.pug"), Path::new("/v/layout.pug"));

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.get(Path::new("/v/a.pug")), BTreeSet::from([p("/v/layout.pug")]));
        assert!(graph.get(Path::new("/v/unknown.pug")).is_empty());
    }

    #[test]
    fn test_clear_replaces_outgoing_only() {
        let mut graph = DependencyGraph::new();
        graph.add(&p("/v/a.pug"), &p("/v/b.pug"));
        graph.add(&p("/v/a.pug"), &p("/v/c.pug"));
        graph.add(&p("/v/b.pug"), &p("/v/c.pug"));

        graph.clear(&p("/v/a.pug"));
        assert!(graph.get(&p("/v/a.pug")).is_empty());
        assert_eq!(graph.get(&p("/v/b.pug")).len(), 1);

        graph.add(&p("/v/a.pug"), &p("/v/d.pug"));
        assert_eq!(graph.get(&p("/v/a.pug")), BTreeSet::from([p("/v/d.pug")]));
    }

    #[test]
    fn test_dependents_of_is_transitive() {
        // A -> B -> C, D -> C
        let mut graph = DependencyGraph::new();
        graph.add(&p("/v/a.pug"), &p("/v/b.pug"));
        graph.add(&p("/v/b.pug"), &p("/v/c.pug"));
        graph.add(&p("/v/d.pug"), &p("/v/c.pug"));

        assert_eq!(
            graph.dependents_of(&p("/v/c.pug")),
            BTreeSet::from([p("/v/a.pug"), p("/v/b.pug"), p("/v/d.pug")])
        );
        assert_eq!(graph.dependents_of(&p("/v/b.pug")), BTreeSet::from([p("/v/a.pug")]));
        assert!(graph.dependents_of(&p("/v/a.pug")).is_empty());
        assert_eq!(
            graph.dependencies_of(&p("/v/a.pug")),
            BTreeSet::from([p("/v/b.pug"), p("/v/c.pug")])
        );
    }

    #[test]
    fn test_dependents_of_terminates_on_cycles() {
        let mut graph = DependencyGraph::new();
        graph.add(&p("/v/a.pug"), &p("/v/b.pug"));
        graph.add(&p("/v/b.pug"), &p("/v/a.pug"));
        graph.add(&p("/v/c.pug"), &p("/v/a.pug"));

        assert_eq!(
            graph.dependents_of(&p("/v/a.pug")),
            BTreeSet::from([p("/v/b.pug"), p("/v/c.pug")])
        );
        assert_eq!(graph.cycles(), vec![vec![p("/v/a.pug"), p("/v/b.pug")]]);
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let mut graph = DependencyGraph::new();
        graph.add(&p("/v/a.pug"), &p("/v/a.pug"));
        assert_eq!(graph.cycles(), vec![vec![p("/v/a.pug")]]);
        assert!(graph.dependents_of(&p("/v/a.pug")).is_empty());
    }

    #[test]
    fn test_edges_round_trip() {
        let mut graph = DependencyGraph::new();
        graph.add(&p("/v/b.pug"), &p("/v/c.pug"));
        graph.add(&p("/v/a.pug"), &p("/v/c.pug"));
        graph.add(&p("/v/a.pug"), &p("/v/b.pug"));

        let edges = graph.edges();
        assert_eq!(
            edges,
            vec![
                (p("/v/a.pug"), vec![p("/v/b.pug"), p("/v/c.pug")]),
                (p("/v/b.pug"), vec![p("/v/c.pug")]),
            ]
        );
        let rebuilt = DependencyGraph::from_edges(edges.clone());
        assert_eq!(rebuilt.edges(), edges);
    }

    #[test]
    fn test_tree_string() {
        let mut graph = DependencyGraph::new();
        graph.add(&p("/v/a.pug"), &p("/v/b.pug"));
        graph.add(&p("/v/a.pug"), &p("/v/c.pug"));
        graph.add(&p("/v/b.pug"), &p("/v/a.pug"));

        let tree = graph.to_tree_string(&p("/v/a.pug"), &p("/v"));
        assert_eq!(
            tree,
            "a.pug\n├── b.pug\n│   └── a.pug\n│       └── (circular reference)\n└── c.pug\n"
        );
    }
}
