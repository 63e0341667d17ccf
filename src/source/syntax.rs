//! Small helpers over tree-sitter nodes shared by detectors and extractors.

use tree_sitter::Node;

/// Node kinds for named function declarations.
pub const FUNCTION_DECLARATIONS: &[&str] =
    &["function_declaration", "generator_function_declaration"];

/// Node kinds for anonymous function values (`() => {}`, `function () {}`).
pub const FUNCTION_EXPRESSIONS: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function",
    "generator_function",
];

/// Node kinds for class declarations.
pub const CLASS_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "abstract_class_declaration",
    "class",
];

/// Node kinds for `const`/`let` and `var` statements.
pub const VARIABLE_STATEMENTS: &[&str] = &["lexical_declaration", "variable_declaration"];

/// Extract the text content of a node.
pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

/// 1-based line and column of a node's start.
pub fn position(node: &Node) -> (usize, usize) {
    let point = node.start_position();
    (point.row + 1, point.column + 1)
}

/// Byte offset of a 1-based line/column pair in `source`.
///
/// Columns count bytes, matching the positions recorded from tree-sitter.
pub fn offset_of(source: &str, line: usize, column: usize) -> Option<usize> {
    if line == 0 || column == 0 {
        return None;
    }

    let mut line_start = 0;
    for _ in 1..line {
        let newline = source[line_start..].find('\n')?;
        line_start += newline + 1;
    }

    let line_end = source[line_start..]
        .find('\n')
        .map(|idx| line_start + idx)
        .unwrap_or(source.len());
    let offset = line_start + column - 1;
    (offset <= line_end).then_some(offset)
}

/// Value of a string literal with the quotes removed.
pub fn string_value(node: &Node, source: &str) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    let text = node_text(node, source);
    let trimmed = text
        .strip_prefix(['"', '\''])
        .and_then(|t| t.strip_suffix(['"', '\'']))
        .unwrap_or(text);
    Some(trimmed.to_string())
}

/// Body of a template literal without the surrounding backticks.
pub fn template_body(node: &Node, source: &str) -> Option<String> {
    if node.kind() != "template_string" {
        return None;
    }
    let text = node_text(node, source);
    let trimmed = text
        .strip_prefix('`')
        .and_then(|t| t.strip_suffix('`'))
        .unwrap_or(text);
    Some(trimmed.to_string())
}

/// Returns true if a template literal contains `${...}` substitutions.
pub fn has_substitution(node: &Node) -> bool {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .any(|child| child.kind() == "template_substitution");
    found
}

/// Name of an object property key (`method`, `"method"`, `'method'`).
pub fn property_key(node: &Node, source: &str) -> Option<String> {
    match node.kind() {
        "property_identifier" | "identifier" => Some(node_text(node, source).to_string()),
        "string" => string_value(node, source),
        _ => None,
    }
}

/// Find a property in an object literal by key.
///
/// Returns the value node for `key: value` pairs and the identifier itself
/// for shorthand properties (`{ method }`).
pub fn object_property<'t>(object: &Node<'t>, key: &str, source: &str) -> Option<Node<'t>> {
    let mut cursor = object.walk();
    let children: Vec<Node<'t>> = object.named_children(&mut cursor).collect();
    for child in children {
        match child.kind() {
            "pair" => {
                let Some(key_node) = child.child_by_field_name("key") else {
                    continue;
                };
                if property_key(&key_node, source).as_deref() == Some(key) {
                    return child.child_by_field_name("value");
                }
            }
            "shorthand_property_identifier" => {
                if node_text(&child, source) == key {
                    return Some(child);
                }
            }
            _ => {}
        }
    }
    None
}

/// The argument nodes of a call expression, skipping comments.
pub fn call_arguments<'t>(call: &Node<'t>) -> Vec<Node<'t>> {
    let Some(args) = call.child_by_field_name("arguments") else {
        return Vec::new();
    };
    if args.kind() != "arguments" {
        return Vec::new();
    }
    let mut cursor = args.walk();
    let nodes = args
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect();
    nodes
}

/// Strip wrappers that do not change the value (`(x)`, `x as T`, `x!`).
pub fn unwrap_expression<'t>(mut node: Node<'t>) -> Node<'t> {
    loop {
        let inner = match node.kind() {
            "parenthesized_expression" | "as_expression" | "satisfies_expression"
            | "non_null_expression" | "type_assertion" => node.named_child(0),
            _ => None,
        };
        match inner {
            Some(inner) if inner.kind() != "type_arguments" => node = inner,
            _ => return node,
        }
    }
}

/// Name declared by a function, class or method node.
pub fn declared_name(node: &Node, source: &str) -> Option<String> {
    node.child_by_field_name("name")
        .map(|name| node_text(&name, source).to_string())
}

/// Statement node that owns a declaration, including a wrapping `export`.
pub fn statement_of<'t>(declaration: Node<'t>) -> Node<'t> {
    match declaration.parent() {
        Some(parent) if parent.kind() == "export_statement" => parent,
        _ => declaration,
    }
}

/// Top-level declarations of a program, unwrapping `export` statements.
pub fn top_level_declarations<'t>(root: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = root.walk();
    let mut declarations = Vec::new();
    for child in root.named_children(&mut cursor) {
        if child.kind() == "export_statement" {
            if let Some(declaration) = child.child_by_field_name("declaration") {
                declarations.push(declaration);
            }
        } else {
            declarations.push(child);
        }
    }
    declarations
}

/// Visit every node under `root` in pre-order.
pub fn for_each_node<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        visit(cursor.node());

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}
