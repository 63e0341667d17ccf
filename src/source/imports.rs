//! Import extraction using tree-sitter for JavaScript/TypeScript.
//!
//! Every import form that introduces a binding is recorded as an
//! [`ImportInfo`]: ES6 `import` statements, CommonJS `require()` calls and
//! dynamic `import()` expressions.

use serde::Serialize;
use tree_sitter::Node;

use super::syntax::{for_each_node, node_text, position, string_value};

/// The kind of import statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    /// ES6 import statement: `import ... from 'module'`
    ES6,
    /// CommonJS require: `const x = require('module')`
    CommonJS,
    /// Dynamic import: `import('module')`
    DynamicImport,
}

/// A named binding: `import { foo }` or `import { foo as bar }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedImport {
    /// Name exported by the source module.
    pub imported: String,
    /// Name bound in the importing file.
    pub local: String,
    /// `import { type Foo }`
    pub is_type_only: bool,
}

/// One import statement in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportInfo {
    /// The source module (e.g., "axios", "./utils", "@/lib/api")
    pub module_specifier: String,
    /// Default binding: `import foo from 'module'`
    pub default_import: Option<String>,
    /// Named bindings, alias-resolved.
    pub named_imports: Vec<NamedImport>,
    /// Namespace binding: `import * as foo from 'module'`
    pub namespace_import: Option<String>,
    /// `import type ... from 'module'`
    pub is_type_only: bool,
    /// The kind of import
    pub kind: ImportKind,
    /// Line number in the source file (1-indexed)
    pub line: usize,
    /// Column in the source file (1-indexed)
    pub column: usize,
}

impl ImportInfo {
    fn new(module_specifier: String, kind: ImportKind, node: &Node) -> Self {
        let (line, column) = position(node);
        Self {
            module_specifier,
            default_import: None,
            named_imports: Vec::new(),
            namespace_import: None,
            is_type_only: false,
            kind,
            line,
            column,
        }
    }

    /// Returns true if `local` is a value binding introduced by this import.
    pub fn binds(&self, local: &str) -> bool {
        if self.is_type_only {
            return false;
        }
        self.default_import.as_deref() == Some(local)
            || self.namespace_import.as_deref() == Some(local)
            || self
                .named_imports
                .iter()
                .any(|n| !n.is_type_only && n.local == local)
    }

    /// The named binding with this local name, if any.
    pub fn named(&self, local: &str) -> Option<&NamedImport> {
        self.named_imports.iter().find(|n| n.local == local)
    }
}

/// Extract imports from a parsed tree.
pub fn extract_imports(root: Node, source: &str) -> Vec<ImportInfo> {
    let mut imports = Vec::new();

    for_each_node(root, |node| match node.kind() {
        "import_statement" => {
            if let Some(import) = parse_es6_import(&node, source) {
                imports.push(import);
            }
        }
        "call_expression" => {
            if let Some(import) = parse_require_or_dynamic_import(&node, source) {
                imports.push(import);
            }
        }
        _ => {}
    });

    imports
}

/// Parse an ES6 import statement.
fn parse_es6_import(node: &Node, source: &str) -> Option<ImportInfo> {
    let source_node = node.child_by_field_name("source")?;
    let module = string_value(&source_node, source)?;
    if module.is_empty() {
        return None;
    }

    let mut import = ImportInfo::new(module, ImportKind::ES6, node);

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "type" | "typeof" => import.is_type_only = true,
            "import_clause" => parse_import_clause(&child, source, &mut import),
            _ => {}
        }
    }

    Some(import)
}

/// Parse the import clause (everything between 'import' and 'from').
fn parse_import_clause(node: &Node, source: &str, import: &mut ImportInfo) {
    let mut cursor = node.walk();

    for child in node.children(&mut cursor) {
        match child.kind() {
            "identifier" => {
                import.default_import = Some(node_text(&child, source).to_string());
            }
            "namespace_import" => {
                let mut inner = child.walk();
                let name = child
                    .named_children(&mut inner)
                    .find(|n| n.kind() == "identifier")
                    .map(|n| node_text(&n, source).to_string());
                import.namespace_import = name;
            }
            "named_imports" => parse_named_imports(&child, source, import),
            _ => {}
        }
    }
}

/// Parse named imports: { foo, bar as baz, default as qux, type Foo }
fn parse_named_imports(node: &Node, source: &str, import: &mut ImportInfo) {
    let mut cursor = node.walk();

    for child in node.named_children(&mut cursor) {
        if child.kind() != "import_specifier" {
            continue;
        }
        let Some(name_node) = child.child_by_field_name("name") else {
            continue;
        };
        let imported = match name_node.kind() {
            "string" => string_value(&name_node, source).unwrap_or_default(),
            _ => node_text(&name_node, source).to_string(),
        };
        let local = child
            .child_by_field_name("alias")
            .map(|alias| node_text(&alias, source).to_string())
            .unwrap_or_else(|| imported.clone());

        let mut inner = child.walk();
        let is_type_only = child
            .children(&mut inner)
            .any(|c| matches!(c.kind(), "type" | "typeof"));

        if imported == "default" {
            import.default_import = Some(local);
            continue;
        }

        import.named_imports.push(NamedImport {
            imported,
            local,
            is_type_only,
        });
    }
}

/// Parse require() calls or dynamic import().
fn parse_require_or_dynamic_import(node: &Node, source: &str) -> Option<ImportInfo> {
    let func_node = node.child_by_field_name("function")?;
    let kind = match node_text(&func_node, source) {
        "require" => ImportKind::CommonJS,
        "import" => ImportKind::DynamicImport,
        _ => return None,
    };

    let args_node = node.child_by_field_name("arguments")?;
    let first = args_node.named_child(0)?;
    let module = string_value(&first, source)?;

    let mut import = ImportInfo::new(module, kind, node);
    if kind == ImportKind::CommonJS {
        bind_require_target(node, source, &mut import);
    }
    Some(import)
}

/// Fill bindings from `const x = require('...')` or `const { a, b: c } = require('...')`.
fn bind_require_target(call_node: &Node, source: &str, import: &mut ImportInfo) {
    let Some(parent) = call_node.parent() else {
        return;
    };
    if parent.kind() != "variable_declarator" {
        return;
    }
    let Some(name_node) = parent.child_by_field_name("name") else {
        return;
    };

    match name_node.kind() {
        "identifier" => {
            import.default_import = Some(node_text(&name_node, source).to_string());
        }
        "object_pattern" => {
            let mut cursor = name_node.walk();
            for prop in name_node.named_children(&mut cursor) {
                match prop.kind() {
                    "shorthand_property_identifier_pattern" => {
                        let name = node_text(&prop, source).to_string();
                        import.named_imports.push(NamedImport {
                            imported: name.clone(),
                            local: name,
                            is_type_only: false,
                        });
                    }
                    "pair_pattern" => {
                        let key = prop.child_by_field_name("key");
                        let value = prop.child_by_field_name("value");
                        if let (Some(key), Some(value)) = (key, value) {
                            if value.kind() == "identifier" {
                                import.named_imports.push(NamedImport {
                                    imported: node_text(&key, source).to_string(),
                                    local: node_text(&value, source).to_string(),
                                    is_type_only: false,
                                });
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }
}
