//! Graph module for file import relationships.
//!
//! This module provides the [`ImportGraph`] struct used to expand the scan
//! set from the API directory to everything it transitively imports.
//!
//! # Example
//!
//! ```rust
//! use std::path::{Path, PathBuf};
//! use apiscope::graph::ImportGraph;
//!
//! let mut graph = ImportGraph::new();
//! graph.add_import(Path::new("/repo/api/route.ts"), Path::new("/repo/lib/db.ts"));
//!
//! let files = graph.reachable_from(&[PathBuf::from("/repo/api/route.ts")]);
//! assert_eq!(files.len(), 2);
//! ```

mod import_graph;

pub use import_graph::ImportGraph;
