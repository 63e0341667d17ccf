//! Detector for axios-style HTTP clients.
//!
//! Only calls reachable through a binding imported from an axios-like module
//! are reported, so `.get()`/`.post()` on unrelated objects never match.

use std::collections::{HashMap, HashSet};

use tree_sitter::Node;

use super::cache::FileCache;
use super::url::{classify_url, method_from_options, method_value, DEFAULT_METHOD};
use super::{Detector, FileContext};
use crate::config::ScanConfig;
use crate::error::DetectError;
use crate::source::syntax::{
    call_arguments, for_each_node, node_text, object_property, position, unwrap_expression,
};
use crate::types::{CallSource, Confidence, RawCall};

/// Request helpers exposed by axios instances.
pub const VERBS: &[&str] = &[
    "get", "post", "put", "patch", "delete", "head", "options", "request",
];

/// Module specifiers recognised as axios by default.
pub const DEFAULT_MODULES: &[&str] = &["axios"];

/// Names through which axios is reachable in one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AxiosBindings {
    /// Default/namespace imports, `require()` results and `.create()` instances.
    pub instances: HashSet<String>,
    /// Destructured verb functions: local name -> verb.
    pub verbs: HashMap<String, String>,
}

impl AxiosBindings {
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty() && self.verbs.is_empty()
    }

    /// Collect bindings from a file's imports and `instance = axios.create()` declarations.
    pub fn collect(ctx: &FileContext, modules: &[String]) -> Self {
        let mut bindings = Self::default();

        for import in ctx.imports() {
            if import.is_type_only || !modules.iter().any(|m| *m == import.module_specifier) {
                continue;
            }
            if let Some(default) = &import.default_import {
                bindings.instances.insert(default.clone());
            }
            if let Some(namespace) = &import.namespace_import {
                bindings.instances.insert(namespace.clone());
            }
            for named in &import.named_imports {
                if !named.is_type_only && VERBS.contains(&named.imported.as_str()) {
                    bindings
                        .verbs
                        .insert(named.local.clone(), named.imported.clone());
                }
            }
        }

        if bindings.instances.is_empty() {
            return bindings;
        }

        let source = ctx.text();
        let mut created = Vec::new();
        for_each_node(ctx.model().root(), |node| {
            if node.kind() != "variable_declarator" {
                return;
            }
            let (Some(name), Some(value)) = (
                node.child_by_field_name("name"),
                node.child_by_field_name("value"),
            ) else {
                return;
            };
            if name.kind() != "identifier" || value.kind() != "call_expression" {
                return;
            }
            let Some(callee) = value.child_by_field_name("function") else {
                return;
            };
            if let Some((object, property)) = member_parts(&callee, source) {
                if property == "create" && bindings.instances.contains(object) {
                    created.push(node_text(&name, source).to_string());
                }
            }
        });
        bindings.instances.extend(created);

        bindings
    }
}

/// `(object, property)` of an `identifier.property` member expression.
fn member_parts<'a>(node: &Node, source: &'a str) -> Option<(&'a str, &'a str)> {
    if node.kind() != "member_expression" {
        return None;
    }
    let object = node.child_by_field_name("object")?;
    let property = node.child_by_field_name("property")?;
    if object.kind() != "identifier" {
        return None;
    }
    Some((node_text(&object, source), node_text(&property, source)))
}

/// How a call reaches axios.
enum CallShape {
    /// `axios.get(url)` or a destructured `get(url)`.
    Verb(String),
    /// `axios(config)` or `axios(url, config)`.
    Direct,
}

/// Detects `axios.<verb>(url)`, destructured verbs, `request(config)` and
/// direct `axios(...)` calls.
#[derive(Debug)]
pub struct AxiosDetector {
    modules: Vec<String>,
    bindings: FileCache<AxiosBindings>,
}

impl Default for AxiosDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl AxiosDetector {
    pub fn new() -> Self {
        Self::with_modules(Vec::new())
    }

    /// Recognise additional module specifiers besides `axios`.
    pub fn with_modules(extra: Vec<String>) -> Self {
        let mut modules: Vec<String> = DEFAULT_MODULES.iter().map(|m| m.to_string()).collect();
        for module in extra {
            if !modules.contains(&module) {
                modules.push(module);
            }
        }
        Self {
            modules,
            bindings: FileCache::new(),
        }
    }

    fn shape(callee: &Node, bindings: &AxiosBindings, source: &str) -> Option<CallShape> {
        match callee.kind() {
            "member_expression" => {
                let (object, property) = member_parts(callee, source)?;
                if bindings.instances.contains(object) && VERBS.contains(&property) {
                    Some(CallShape::Verb(property.to_string()))
                } else {
                    None
                }
            }
            "identifier" => {
                let name = node_text(callee, source);
                if let Some(verb) = bindings.verbs.get(name) {
                    Some(CallShape::Verb(verb.clone()))
                } else if bindings.instances.contains(name) {
                    Some(CallShape::Direct)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

/// Read `url` and `method` from a request config object literal.
fn from_request_config(config: &Node, source: &str) -> Option<(String, String, Confidence)> {
    let config = unwrap_expression(*config);
    if config.kind() != "object" {
        return None;
    }
    let url_node = object_property(&config, "url", source)?;
    let (url, confidence) = classify_url(&url_node, source);
    let method = object_property(&config, "method", source)
        .map(|m| method_value(&m, source))
        .unwrap_or_else(|| DEFAULT_METHOD.to_string());
    Some((method, url, confidence))
}

impl Detector for AxiosDetector {
    fn id(&self) -> &str {
        "axios"
    }

    fn name(&self) -> &str {
        "Axios"
    }

    fn should_detect(&self, node: &Node) -> bool {
        node.kind() == "call_expression"
    }

    fn detect(
        &mut self,
        node: &Node,
        ctx: &FileContext,
        config: &ScanConfig,
    ) -> Result<Option<RawCall>, DetectError> {
        if self.bindings.get(ctx.path()).is_none() {
            let mut modules = self.modules.clone();
            modules.extend(config.client_modules(self.id()));
            let collected = AxiosBindings::collect(ctx, &modules);
            self.bindings.get_or_insert_with(ctx.path(), || collected);
        }
        let Some(bindings) = self.bindings.get(ctx.path()) else {
            return Ok(None);
        };
        if bindings.is_empty() {
            return Ok(None);
        }

        let source = ctx.text();
        let Some(callee) = node.child_by_field_name("function") else {
            return Ok(None);
        };
        let Some(shape) = Self::shape(&callee, bindings, source) else {
            return Ok(None);
        };

        let args = call_arguments(node);
        let Some(first) = args.first() else {
            return Ok(None);
        };

        let extracted = match shape {
            CallShape::Verb(verb) if verb == "request" => from_request_config(first, source),
            CallShape::Verb(verb) => {
                let (url, confidence) = classify_url(first, source);
                Some((verb.to_uppercase(), url, confidence))
            }
            CallShape::Direct => {
                if unwrap_expression(*first).kind() == "object" {
                    from_request_config(first, source)
                } else {
                    let (url, confidence) = classify_url(first, source);
                    let method = args
                        .get(1)
                        .and_then(|options| method_from_options(options, source))
                        .unwrap_or_else(|| DEFAULT_METHOD.to_string());
                    Some((method, url, confidence))
                }
            }
        };

        let Some((method, url, confidence)) = extracted else {
            return Ok(None);
        };

        let (line, column) = position(node);
        Ok(Some(RawCall::new(
            method,
            url,
            ctx.path(),
            line,
            column,
            CallSource::Axios,
            confidence,
        )))
    }

    fn clear_cache(&mut self) {
        self.bindings.clear();
    }
}
