//! Source model for JavaScript/TypeScript files.
//!
//! This module turns files into queryable syntax trees and exposes the
//! import metadata the detectors and extractors rely on.
//!
//! # Features
//!
//! - Parse `.js/.jsx/.mjs/.cjs` with tree-sitter-javascript and
//!   `.ts/.tsx/.mts/.cts` with tree-sitter-typescript
//! - Extract ES6 imports, CommonJS `require()` and dynamic `import()`
//! - Resolve import specifiers (relative, alias prefixes, tsconfig `paths`)
//! - Cache parsed files project-wide by absolute path
//!
//! # Example
//!
//! ```ignore
//! use std::collections::BTreeMap;
//! use std::path::Path;
//! use apiscope::source::{ModuleResolver, Project};
//!
//! let resolver = ModuleResolver::new("/repo", &BTreeMap::new());
//! let mut project = Project::new(resolver)?;
//! let model = project.load(Path::new("/repo/src/api.ts"))?;
//!
//! for import in model.imports() {
//!     println!("{} (line {})", import.module_specifier, import.line);
//! }
//! ```

pub mod imports;
pub mod language;
pub mod model;
pub mod resolve;
pub mod syntax;

pub use imports::{extract_imports, ImportInfo, ImportKind, NamedImport};
pub use language::{is_supported_file, SourceLanguage, SUPPORTED_EXTENSIONS};
pub use model::{Project, SourceModel, SourceParser};
pub use resolve::{is_dependency_path, normalize_path, ModuleResolver, DEPENDENCY_DIRS};
