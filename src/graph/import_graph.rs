//! File-level import graph using petgraph.
//!
//! Nodes are absolute file paths; an edge `a -> b` means `a` imports `b`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;

/// A directed graph of internal imports between source files.
#[derive(Debug, Clone, Default)]
pub struct ImportGraph {
    /// The underlying directed graph
    graph: DiGraph<PathBuf, ()>,
    /// Maps file paths to their node indices for O(1) lookup
    node_indices: HashMap<PathBuf, NodeIndex>,
}

impl ImportGraph {
    /// Creates a new empty import graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file to the graph, returning its index. Existing files are not duplicated.
    pub fn add_file(&mut self, path: &Path) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(path) {
            return idx;
        }
        let idx = self.graph.add_node(path.to_path_buf());
        self.node_indices.insert(path.to_path_buf(), idx);
        idx
    }

    /// Records that `from` imports `to`. Returns false if the edge already existed.
    pub fn add_import(&mut self, from: &Path, to: &Path) -> bool {
        let a = self.add_file(from);
        let b = self.add_file(to);
        if self.graph.contains_edge(a, b) {
            return false;
        }
        self.graph.add_edge(a, b, ());
        true
    }

    /// Every file reachable from `roots`, roots included, sorted.
    pub fn reachable_from(&self, roots: &[PathBuf]) -> Vec<PathBuf> {
        let mut seen = vec![false; self.graph.node_count()];
        let mut files = Vec::new();

        for root in roots {
            let Some(&start) = self.node_indices.get(root) else {
                continue;
            };
            let mut bfs = Bfs::new(&self.graph, start);
            while let Some(idx) = bfs.next(&self.graph) {
                if !seen[idx.index()] {
                    seen[idx.index()] = true;
                    files.push(self.graph[idx].clone());
                }
            }
        }

        files.sort();
        files
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}
