//! URL and method extraction shared by the built-in detectors.

use tree_sitter::Node;

use crate::source::syntax::{
    has_substitution, node_text, object_property, string_value, template_body, unwrap_expression,
};
use crate::types::Confidence;

/// Method used when a call does not state one.
pub const DEFAULT_METHOD: &str = "GET";

/// Read a URL argument and rate how literally it was written.
///
/// - string literal or template without `${}`: the literal value, `High`
/// - template with `${}`: the raw template body, `Medium`
/// - anything else: the expression's source text, `Low`
pub fn classify_url(node: &Node, source: &str) -> (String, Confidence) {
    let node = unwrap_expression(*node);
    if let Some(value) = string_value(&node, source) {
        return (value, Confidence::High);
    }
    if let Some(body) = template_body(&node, source) {
        let confidence = if has_substitution(&node) {
            Confidence::Medium
        } else {
            Confidence::High
        };
        return (body, confidence);
    }
    (node_text(&node, source).to_string(), Confidence::Low)
}

/// Uppercased method from a `method` value: the literal if it is a string,
/// otherwise the expression text.
pub fn method_value(node: &Node, source: &str) -> String {
    let node = unwrap_expression(*node);
    if let Some(value) = string_value(&node, source) {
        return value.to_uppercase();
    }
    if let Some(body) = template_body(&node, source) {
        if !has_substitution(&node) {
            return body.to_uppercase();
        }
    }
    node_text(&node, source).to_uppercase()
}

/// `method` property of an options object literal, if present.
pub fn method_from_options(options: &Node, source: &str) -> Option<String> {
    let options = unwrap_expression(*options);
    if options.kind() != "object" {
        return None;
    }
    object_property(&options, "method", source).map(|value| method_value(&value, source))
}
