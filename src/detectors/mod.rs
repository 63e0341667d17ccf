//! Pluggable call detectors.
//!
//! A [`Detector`] inspects single syntax nodes and reports outbound HTTP
//! calls as [`RawCall`]s. Detectors live in a [`DetectorRegistry`] keyed by
//! id and are driven over each file by a [`DetectionVisitor`].
//!
//! # Example
//!
//! ```ignore
//! use apiscope::config::ScanConfig;
//! use apiscope::detectors::{create_default_registry, DetectionVisitor, FileContext};
//!
//! let config = ScanConfig::new("/repo");
//! let mut registry = create_default_registry(&config);
//! let model = project.load(path)?;
//! let calls = DetectionVisitor::new(&mut registry, &config).visit(&FileContext::new(&model));
//! ```

pub mod axios;
pub mod cache;
pub mod fetch;
pub mod registry;
pub mod url;
pub mod visitor;

pub use axios::AxiosDetector;
pub use cache::FileCache;
pub use fetch::FetchDetector;
pub use registry::{create_default_registry, DetectorRegistry};
pub use visitor::DetectionVisitor;

use std::path::Path;

use tree_sitter::Node;

use crate::config::ScanConfig;
use crate::error::DetectError;
use crate::source::{ImportInfo, SourceModel};
use crate::types::RawCall;

/// Per-file view handed to detectors.
#[derive(Debug, Clone, Copy)]
pub struct FileContext<'a> {
    model: &'a SourceModel,
}

impl<'a> FileContext<'a> {
    pub fn new(model: &'a SourceModel) -> Self {
        Self { model }
    }

    /// Absolute path of the file being scanned.
    pub fn path(&self) -> &'a Path {
        self.model.path()
    }

    pub fn text(&self) -> &'a str {
        self.model.text()
    }

    pub fn imports(&self) -> &'a [ImportInfo] {
        self.model.imports()
    }

    pub fn model(&self) -> &'a SourceModel {
        self.model
    }

    /// Source text of a node in this file.
    pub fn node_text(&self, node: &Node) -> &'a str {
        crate::source::syntax::node_text(node, self.model.text())
    }
}

/// A call detector.
pub trait Detector {
    /// Unique id; matched against `apiClients[].type`.
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// Cheap node-kind filter run before `detect`.
    fn should_detect(&self, _node: &Node) -> bool {
        true
    }

    /// Inspect a node. `Ok(None)` means the node is not a call this detector handles.
    fn detect(
        &mut self,
        node: &Node,
        ctx: &FileContext,
        config: &ScanConfig,
    ) -> Result<Option<RawCall>, DetectError>;

    /// Drop any per-file state.
    fn clear_cache(&mut self) {}
}
