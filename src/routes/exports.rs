//! HTTP-method exports of a route handler file.

use tree_sitter::Node;

use crate::source::syntax::{
    declared_name, node_text, statement_of, top_level_declarations, FUNCTION_DECLARATIONS,
    VARIABLE_STATEMENTS,
};

/// Export names treated as HTTP method handlers, in output order.
pub const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];

/// Names bound by the identifier declarators of a `const`/`let`/`var` statement.
pub fn declarator_names(statement: &Node, source: &str) -> Vec<String> {
    let mut cursor = statement.walk();
    let names = statement
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "variable_declarator")
        .filter_map(|declarator| declarator.child_by_field_name("name"))
        .filter(|name| name.kind() == "identifier")
        .map(|name| node_text(&name, source).to_string())
        .collect();
    names
}

/// Node whose text represents the handler exported under `method`.
///
/// Matches `export function GET`, `export const GET = ...` and
/// `export { handler as GET }` where `handler` is declared in the same file.
pub fn find_method_export<'t>(root: &Node<'t>, source: &str, method: &str) -> Option<Node<'t>> {
    let mut cursor = root.walk();
    let statements: Vec<Node<'t>> = root
        .named_children(&mut cursor)
        .filter(|n| n.kind() == "export_statement")
        .collect();

    for statement in &statements {
        if let Some(declaration) = statement.child_by_field_name("declaration") {
            let kind = declaration.kind();
            let matches = if FUNCTION_DECLARATIONS.contains(&kind) {
                declared_name(&declaration, source).as_deref() == Some(method)
            } else if VARIABLE_STATEMENTS.contains(&kind) {
                declarator_names(&declaration, source)
                    .iter()
                    .any(|name| name == method)
            } else {
                false
            };
            if matches {
                return Some(*statement);
            }
        }
    }

    for statement in &statements {
        // `export { x as GET } from './y'` re-exports are not followed here.
        if statement.child_by_field_name("source").is_some() {
            continue;
        }
        let mut clause_cursor = statement.walk();
        let clauses: Vec<Node<'t>> = statement
            .named_children(&mut clause_cursor)
            .filter(|n| n.kind() == "export_clause")
            .collect();
        for clause in clauses {
            let mut spec_cursor = clause.walk();
            let specifiers: Vec<Node<'t>> = clause
                .named_children(&mut spec_cursor)
                .filter(|n| n.kind() == "export_specifier")
                .collect();
            for specifier in specifiers {
                let Some(local) = specifier.child_by_field_name("name") else {
                    continue;
                };
                let exported = specifier.child_by_field_name("alias").unwrap_or(local);
                if node_text(&exported, source) != method {
                    continue;
                }
                if let Some(found) = find_local_declaration(root, source, node_text(&local, source))
                {
                    return Some(found);
                }
            }
        }
    }

    None
}

/// Every recognised method export, in [`HTTP_METHODS`] order.
pub fn method_exports<'t>(root: &Node<'t>, source: &str) -> Vec<(&'static str, Node<'t>)> {
    HTTP_METHODS
        .iter()
        .filter_map(|method| find_method_export(root, source, method).map(|node| (*method, node)))
        .collect()
}

/// Top-level function or variable statement declaring `name`.
fn find_local_declaration<'t>(root: &Node<'t>, source: &str, name: &str) -> Option<Node<'t>> {
    top_level_declarations(root).into_iter().find_map(|declaration| {
        let kind = declaration.kind();
        let declares = if FUNCTION_DECLARATIONS.contains(&kind) {
            declared_name(&declaration, source).as_deref() == Some(name)
        } else if VARIABLE_STATEMENTS.contains(&kind) {
            declarator_names(&declaration, source)
                .iter()
                .any(|n| n == name)
        } else {
            false
        };
        declares.then(|| statement_of(declaration))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SourceLanguage, SourceModel, SourceParser};
    use std::path::Path;

    fn parse(source: &str) -> SourceModel {
        let mut parser = SourceParser::new().unwrap();
        parser
            .parse_source(
                source.to_string(),
                SourceLanguage::TypeScript,
                Path::new("/repo/api/x/route.ts"),
            )
            .unwrap()
    }

    fn export_text(model: &SourceModel, method: &str) -> Option<String> {
        find_method_export(&model.root(), model.text(), method)
            .map(|node| model.node_text(&node).to_string())
    }

    #[test]
    fn test_function_and_const_exports() {
        let model = parse(
            "export async function GET(req: Request) {\n  return Response.json([]);\n}\n\nexport const POST = async (req: Request) => new Response(null);\n",
        );

        assert_eq!(
            export_text(&model, "GET").as_deref(),
            Some("export async function GET(req: Request) {\n  return Response.json([]);\n}")
        );
        assert_eq!(
            export_text(&model, "POST").as_deref(),
            Some("export const POST = async (req: Request) => new Response(null);")
        );
        assert_eq!(export_text(&model, "DELETE"), None);
    }

    #[test]
    fn test_renamed_export_clause() {
        let model = parse(
            "async function handler() {\n  return new Response('ok');\n}\n\nexport { handler as GET, handler as HEAD };\n",
        );

        let text = export_text(&model, "HEAD").unwrap();
        assert!(text.starts_with("async function handler()"));

        let methods: Vec<&str> = method_exports(&model.root(), model.text())
            .into_iter()
            .map(|(method, _)| method)
            .collect();
        assert_eq!(methods, vec!["GET", "HEAD"]);
    }

    #[test]
    fn test_non_exported_and_reexported_names_ignored() {
        let model = parse(
            "function GET() {}\nexport { POST } from './shared';\nexport const config = { runtime: 'edge' };\n",
        );
        assert!(method_exports(&model.root(), model.text()).is_empty());
    }
}
