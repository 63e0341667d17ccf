//! Parsed source files and the project-wide parse cache.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

use super::imports::{extract_imports, ImportInfo};
use super::language::SourceLanguage;
use super::resolve::{normalize_path, ModuleResolver};
use super::syntax;
use crate::error::{AnalysisError, AnalysisResult};

/// A parsed file: its text, syntax tree and import metadata.
pub struct SourceModel {
    path: PathBuf,
    language: SourceLanguage,
    text: String,
    tree: Tree,
    imports: Vec<ImportInfo>,
}

impl std::fmt::Debug for SourceModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceModel")
            .field("path", &self.path)
            .field("language", &self.language)
            .field("imports", &self.imports.len())
            .finish()
    }
}

impl SourceModel {
    /// Absolute path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn language(&self) -> SourceLanguage {
        self.language
    }

    /// Full file text as parsed.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Root node of the syntax tree.
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// All imports in source order.
    pub fn imports(&self) -> &[ImportInfo] {
        &self.imports
    }

    /// Source text of a node from this file.
    pub fn node_text(&self, node: &Node) -> &str {
        syntax::node_text(node, &self.text)
    }

    /// The import that introduces the local binding `name`, if any.
    pub fn import_for_binding(&self, name: &str) -> Option<&ImportInfo> {
        self.imports.iter().find(|import| import.binds(name))
    }
}

/// Parsers for each supported grammar.
pub struct SourceParser {
    js_parser: Parser,
    ts_parser: Parser,
    tsx_parser: Parser,
}

impl SourceParser {
    /// Create a new SourceParser.
    pub fn new() -> AnalysisResult<Self> {
        let mut js_parser = Parser::new();
        js_parser
            .set_language(&SourceLanguage::JavaScript.tree_sitter_language())
            .map_err(|_| AnalysisError::LanguageInit)?;

        let mut ts_parser = Parser::new();
        ts_parser
            .set_language(&SourceLanguage::TypeScript.tree_sitter_language())
            .map_err(|_| AnalysisError::LanguageInit)?;

        let mut tsx_parser = Parser::new();
        tsx_parser
            .set_language(&SourceLanguage::Tsx.tree_sitter_language())
            .map_err(|_| AnalysisError::LanguageInit)?;

        Ok(Self {
            js_parser,
            ts_parser,
            tsx_parser,
        })
    }

    /// Read and parse a file.
    pub fn parse_file(&mut self, path: &Path) -> AnalysisResult<SourceModel> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let language = SourceLanguage::from_extension(ext)
            .ok_or_else(|| AnalysisError::UnsupportedFileType(path.display().to_string()))?;

        let text = fs::read_to_string(path)?;
        self.parse_source(text, language, path)
    }

    /// Parse source code directly.
    pub fn parse_source(
        &mut self,
        text: String,
        language: SourceLanguage,
        path: &Path,
    ) -> AnalysisResult<SourceModel> {
        let parser = match language {
            SourceLanguage::JavaScript | SourceLanguage::Jsx => &mut self.js_parser,
            SourceLanguage::TypeScript => &mut self.ts_parser,
            SourceLanguage::Tsx => &mut self.tsx_parser,
        };

        let tree = parser
            .parse(&text, None)
            .ok_or_else(|| AnalysisError::ParseError {
                path: path.display().to_string(),
            })?;

        if tree.root_node().has_error() {
            debug!(file = %path.display(), "syntax errors present, continuing with partial tree");
        }

        let imports = extract_imports(tree.root_node(), &text);

        Ok(SourceModel {
            path: path.to_path_buf(),
            language,
            text,
            tree,
            imports,
        })
    }
}

/// Project-wide parse cache keyed by absolute path, plus the module resolver.
///
/// Files are parsed lazily the first time any phase asks for them and shared
/// afterwards; entries are never replaced once populated.
pub struct Project {
    parser: SourceParser,
    resolver: ModuleResolver,
    cache: HashMap<PathBuf, Arc<SourceModel>>,
}

impl Project {
    pub fn new(resolver: ModuleResolver) -> AnalysisResult<Self> {
        Ok(Self {
            parser: SourceParser::new()?,
            resolver,
            cache: HashMap::new(),
        })
    }

    pub fn resolver(&self) -> &ModuleResolver {
        &self.resolver
    }

    /// Return the parsed file, parsing it on first use.
    pub fn load(&mut self, path: &Path) -> AnalysisResult<Arc<SourceModel>> {
        let key = normalize_path(path);
        if let Some(model) = self.cache.get(&key) {
            return Ok(Arc::clone(model));
        }

        let model = Arc::new(self.parser.parse_file(&key)?);
        self.cache.insert(key, Arc::clone(&model));
        Ok(model)
    }

    /// Resolve `specifier` from `from_file` and load the target, if it parses.
    pub fn load_import(&mut self, from_file: &Path, specifier: &str) -> Option<Arc<SourceModel>> {
        let target = self.resolver.resolve(from_file, specifier)?;
        match self.load(&target) {
            Ok(model) => Some(model),
            Err(e) => {
                debug!(file = %target.display(), error = %e, "resolved import did not parse");
                None
            }
        }
    }

    /// Number of files parsed so far.
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn test_parse_source_collects_imports() {
        let mut parser = SourceParser::new().unwrap();
        let model = parser
            .parse_source(
                "import axios from 'axios';\nimport { get } from './http';\n".to_string(),
                SourceLanguage::TypeScript,
                Path::new("/project/a.ts"),
            )
            .unwrap();

        assert_eq!(model.imports().len(), 2);
        assert_eq!(
            model.import_for_binding("axios").map(|i| i.module_specifier.as_str()),
            Some("axios")
        );
        assert_eq!(
            model.import_for_binding("get").map(|i| i.module_specifier.as_str()),
            Some("./http")
        );
    }

    #[test]
    fn test_unsupported_extension() {
        let mut parser = SourceParser::new().unwrap();
        let result = parser.parse_file(Path::new("/project/styles.css"));
        assert!(matches!(result, Err(AnalysisError::UnsupportedFileType(_))));
    }

    #[test]
    fn test_project_caches_by_path() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.js");
        fs::write(&file, "fetch('/x');\n").unwrap();

        let mut project =
            Project::new(ModuleResolver::new(dir.path(), &BTreeMap::new())).unwrap();
        let first = project.load(&file).unwrap();
        let second = project.load(&dir.path().join("./a.js")).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(project.cached_count(), 1);
    }

    #[test]
    fn test_load_import_follows_resolver() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("src/a.ts");
        fs::create_dir_all(dir.path().join("src/lib")).unwrap();
        fs::write(&from, "import { api } from './lib';\n").unwrap();
        fs::write(dir.path().join("src/lib/index.ts"), "export const api = 1;\n").unwrap();

        let mut project =
            Project::new(ModuleResolver::new(dir.path(), &BTreeMap::new())).unwrap();
        let target = project.load_import(&from, "./lib").unwrap();

        assert_eq!(target.path(), dir.path().join("src/lib/index.ts"));
        assert!(project.load_import(&from, "./nowhere").is_none());
        assert!(project.load_import(&from, "react").is_none());
        assert_eq!(project.cached_count(), 1);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let mut project =
            Project::new(ModuleResolver::new(dir.path(), &BTreeMap::new())).unwrap();
        assert!(matches!(
            project.load(&dir.path().join("missing.ts")),
            Err(AnalysisError::FileRead(_))
        ));
    }
}
