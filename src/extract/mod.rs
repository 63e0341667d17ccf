//! Function extraction for detected calls.
//!
//! Each call is resolved to the source of the function behind it, trying in
//! order:
//!
//! 1. the route handler its URL maps to (`high`),
//! 2. the function that syntactically contains the call (`high`),
//! 3. the definition of an imported `module.method(...)` callee (`medium`).
//!
//! Calls that match none of these keep no code and get `low`.

mod snippet;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};
use tree_sitter::Node;

pub use snippet::clip_source;

use crate::routes::{find_method_export, RouteLayout};
use crate::source::syntax::{
    declared_name, node_text, offset_of, statement_of, string_value, top_level_declarations,
    unwrap_expression, CLASS_DECLARATIONS, FUNCTION_DECLARATIONS, FUNCTION_EXPRESSIONS,
    VARIABLE_STATEMENTS,
};
use crate::source::{Project, SourceModel};
use crate::types::{Confidence, Extraction, RawCall};

/// Resolves calls to function source using the shared parse cache.
pub struct FunctionExtractor<'p> {
    project: &'p mut Project,
    layout: Option<&'p RouteLayout>,
    max_lines: usize,
}

impl<'p> FunctionExtractor<'p> {
    pub fn new(project: &'p mut Project, layout: Option<&'p RouteLayout>, max_lines: usize) -> Self {
        Self {
            project,
            layout,
            max_lines,
        }
    }

    /// Rebuild every call with its extraction results.
    ///
    /// Calls that already carry results are passed through untouched.
    pub fn extract_all(&mut self, calls: Vec<RawCall>) -> Vec<RawCall> {
        let mut counts = [0usize; 3];
        let extracted: Vec<RawCall> = calls
            .into_iter()
            .map(|call| {
                if call.is_extracted() {
                    return call;
                }
                let extraction = self.extract(&call);
                counts[extraction.confidence as usize] += 1;
                call.with_extraction(extraction)
            })
            .collect();

        info!(
            high = counts[Confidence::High as usize],
            medium = counts[Confidence::Medium as usize],
            low = counts[Confidence::Low as usize],
            "function extraction finished"
        );
        extracted
    }

    /// Resolve one call.
    pub fn extract(&mut self, call: &RawCall) -> Extraction {
        if let Some(extraction) = self.from_route_handler(call) {
            return extraction;
        }

        let model = match self.project.load(&call.file) {
            Ok(model) => model,
            Err(e) => {
                debug!(file = %call.file.display(), error = %e, "call file not loadable for extraction");
                return Extraction::unresolved();
            }
        };

        if let Some(extraction) = self.from_containment(&model, call) {
            return extraction;
        }
        if let Some(extraction) = self.from_imported_symbol(&model, call) {
            return extraction;
        }

        debug!(
            file = %call.file.display(),
            line = call.line,
            url = %call.url,
            "no function resolved for call"
        );
        Extraction::unresolved()
    }

    fn from_route_handler(&mut self, call: &RawCall) -> Option<Extraction> {
        let layout = self.layout?;
        let handler = layout.resolve_url(&call.url)?;
        let model = self.project.load(&handler).ok()?;
        let node = find_method_export(&model.root(), model.text(), &call.method)?;

        Some(Extraction {
            name: Some(call.method.clone()),
            file: Some(model.path().to_path_buf()),
            code: clip_source(model.node_text(&node), self.max_lines),
            confidence: Confidence::High,
        })
    }

    fn from_containment(&self, model: &SourceModel, call: &RawCall) -> Option<Extraction> {
        let call_node = locate_call(model, call)?;
        let (node, name) = enclosing_function(call_node, model.text())?;

        Some(Extraction {
            name,
            file: Some(model.path().to_path_buf()),
            code: clip_source(model.node_text(&node), self.max_lines),
            confidence: Confidence::High,
        })
    }

    fn from_imported_symbol(&mut self, model: &SourceModel, call: &RawCall) -> Option<Extraction> {
        let call_node = locate_call(model, call)?;
        let callee = unwrap_expression(call_node.child_by_field_name("function")?);
        if callee.kind() != "member_expression" {
            return None;
        }
        let object = callee.child_by_field_name("object")?;
        let property = callee.child_by_field_name("property")?;
        if object.kind() != "identifier" {
            return None;
        }

        let binding = model.node_text(&object);
        let symbol = model.node_text(&property).to_string();
        let import = model.import_for_binding(binding)?;

        let mut visited = HashSet::new();
        self.search_symbol(model.path(), &import.module_specifier, &symbol, &mut visited)
    }

    /// Look for `name` in the module `specifier` names from `from`, then in the
    /// modules it re-exports from.
    fn search_symbol(
        &mut self,
        from: &Path,
        specifier: &str,
        name: &str,
        visited: &mut HashSet<PathBuf>,
    ) -> Option<Extraction> {
        let model: Arc<SourceModel> = self.project.load_import(from, specifier)?;
        if !visited.insert(model.path().to_path_buf()) {
            return None;
        }

        if let Some((node, qualified)) = find_symbol(&model, name) {
            return Some(Extraction {
                name: Some(qualified),
                file: Some(model.path().to_path_buf()),
                code: clip_source(model.node_text(&node), self.max_lines),
                confidence: Confidence::Medium,
            });
        }

        for (next, imported) in reexport_sources(&model, name) {
            if let Some(found) = self.search_symbol(model.path(), &next, &imported, visited) {
                return Some(found);
            }
        }
        None
    }
}

/// The call expression a detector matched, found by its recorded start position.
fn locate_call<'t>(model: &'t SourceModel, call: &RawCall) -> Option<Node<'t>> {
    let offset = offset_of(model.text(), call.line, call.column)?;
    let mut node = model.root().descendant_for_byte_range(offset, offset)?;
    loop {
        if node.kind() == "call_expression" && node.start_byte() == offset {
            return Some(node);
        }
        node = node.parent()?;
    }
}

/// Nearest enclosing function and the name it is known by.
fn enclosing_function<'t>(call: Node<'t>, source: &str) -> Option<(Node<'t>, Option<String>)> {
    let mut current = call.parent();
    while let Some(node) = current {
        let kind = node.kind();

        if FUNCTION_DECLARATIONS.contains(&kind) {
            return Some((statement_of(node), declared_name(&node, source)));
        }

        if kind == "method_definition" {
            let method = declared_name(&node, source);
            let class = node
                .parent()
                .filter(|body| body.kind() == "class_body")
                .and_then(|body| body.parent())
                .and_then(|class| declared_name(&class, source));
            let name = match (class, method) {
                (Some(class), Some(method)) => Some(format!("{}.{}", class, method)),
                (None, method) => method,
                (Some(_), None) => None,
            };
            return Some((node, name));
        }

        if FUNCTION_EXPRESSIONS.contains(&kind) {
            if let Some((statement, name)) = binding_statement(node, source) {
                return Some((statement, Some(name)));
            }
            return Some((node, None));
        }

        current = node.parent();
    }
    None
}

/// `const name = <function>` statement owning a function value.
fn binding_statement<'t>(function: Node<'t>, source: &str) -> Option<(Node<'t>, String)> {
    let mut value = function;
    let mut parent = function.parent()?;
    while matches!(
        parent.kind(),
        "parenthesized_expression" | "as_expression" | "satisfies_expression"
    ) {
        value = parent;
        parent = parent.parent()?;
    }

    if parent.kind() != "variable_declarator" {
        return None;
    }
    if parent.child_by_field_name("value").map(|v| v.id()) != Some(value.id()) {
        return None;
    }
    let name = parent.child_by_field_name("name")?;
    if name.kind() != "identifier" {
        return None;
    }
    let statement = parent.parent()?;
    if !VARIABLE_STATEMENTS.contains(&statement.kind()) {
        return None;
    }
    Some((statement_of(statement), node_text(&name, source).to_string()))
}

/// Definition of `name` in a module: a class method, a function declaration,
/// or a variable bound to a function, tried in that order.
fn find_symbol<'t>(model: &'t SourceModel, name: &str) -> Option<(Node<'t>, String)> {
    let source = model.text();
    let root = model.root();
    let declarations = top_level_declarations(&root);

    for declaration in &declarations {
        if !CLASS_DECLARATIONS.contains(&declaration.kind()) {
            continue;
        }
        let Some(body) = declaration.child_by_field_name("body") else {
            continue;
        };
        let mut cursor = body.walk();
        let method = body.named_children(&mut cursor).find(|member| {
            member.kind() == "method_definition"
                && declared_name(member, source).as_deref() == Some(name)
        });
        if let Some(method) = method {
            let qualified = match declared_name(declaration, source) {
                Some(class) => format!("{}.{}", class, name),
                None => name.to_string(),
            };
            return Some((method, qualified));
        }
    }

    for declaration in &declarations {
        if FUNCTION_DECLARATIONS.contains(&declaration.kind())
            && declared_name(declaration, source).as_deref() == Some(name)
        {
            return Some((statement_of(*declaration), name.to_string()));
        }
    }

    for declaration in &declarations {
        if !VARIABLE_STATEMENTS.contains(&declaration.kind()) {
            continue;
        }
        let mut cursor = declaration.walk();
        let binds_function = declaration
            .named_children(&mut cursor)
            .filter(|child| child.kind() == "variable_declarator")
            .any(|declarator| {
                let named = declarator
                    .child_by_field_name("name")
                    .is_some_and(|n| n.kind() == "identifier" && node_text(&n, source) == name);
                let is_function = declarator
                    .child_by_field_name("value")
                    .map(unwrap_expression)
                    .is_some_and(|v| FUNCTION_EXPRESSIONS.contains(&v.kind()));
                named && is_function
            });
        if binds_function {
            return Some((statement_of(*declaration), name.to_string()));
        }
    }

    None
}

/// Modules that may provide `name` through `export * from` or
/// `export { name } from`, with the name to look for there.
fn reexport_sources(model: &SourceModel, name: &str) -> Vec<(String, String)> {
    let source = model.text();
    let root = model.root();
    let mut cursor = root.walk();
    let mut sources = Vec::new();

    for statement in root.named_children(&mut cursor) {
        if statement.kind() != "export_statement" {
            continue;
        }
        let Some(specifier) = statement
            .child_by_field_name("source")
            .and_then(|s| string_value(&s, source))
        else {
            continue;
        };

        let mut inner = statement.walk();
        let children: Vec<Node> = statement.named_children(&mut inner).collect();
        let clause = children.iter().find(|c| c.kind() == "export_clause");
        match clause {
            Some(clause) => {
                let mut spec_cursor = clause.walk();
                for export in clause.named_children(&mut spec_cursor) {
                    if export.kind() != "export_specifier" {
                        continue;
                    }
                    let Some(local) = export.child_by_field_name("name") else {
                        continue;
                    };
                    let exported = export.child_by_field_name("alias").unwrap_or(local);
                    if node_text(&exported, source) == name {
                        sources.push((specifier.clone(), node_text(&local, source).to_string()));
                    }
                }
            }
            None => {
                // `export * as ns from` does not expose `name` directly.
                if !children.iter().any(|c| c.kind() == "namespace_export") {
                    sources.push((specifier, name.to_string()));
                }
            }
        }
    }
    sources
}
