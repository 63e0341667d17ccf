//! Detector for the global `fetch` primitive.

use tree_sitter::Node;

use super::url::{classify_url, method_from_options, DEFAULT_METHOD};
use super::{Detector, FileContext};
use crate::config::ScanConfig;
use crate::error::DetectError;
use crate::source::syntax::{call_arguments, position};
use crate::types::{CallSource, RawCall};

/// Global objects `fetch` may be reached through.
const GLOBAL_OBJECTS: &[&str] = &["window", "globalThis", "self", "global"];

/// Matches `fetch(url, init?)` and `window.fetch(url, init?)`.
#[derive(Debug, Default)]
pub struct FetchDetector;

impl FetchDetector {
    pub fn new() -> Self {
        Self
    }

    fn is_fetch_callee(callee: &Node, ctx: &FileContext) -> bool {
        match callee.kind() {
            "identifier" => ctx.node_text(callee) == "fetch",
            "member_expression" => {
                let object = callee.child_by_field_name("object");
                let property = callee.child_by_field_name("property");
                match (object, property) {
                    (Some(object), Some(property)) => {
                        object.kind() == "identifier"
                            && GLOBAL_OBJECTS.contains(&ctx.node_text(&object))
                            && ctx.node_text(&property) == "fetch"
                    }
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

impl Detector for FetchDetector {
    fn id(&self) -> &str {
        "fetch"
    }

    fn name(&self) -> &str {
        "Fetch API"
    }

    fn should_detect(&self, node: &Node) -> bool {
        node.kind() == "call_expression"
    }

    fn detect(
        &mut self,
        node: &Node,
        ctx: &FileContext,
        _config: &ScanConfig,
    ) -> Result<Option<RawCall>, DetectError> {
        let Some(callee) = node.child_by_field_name("function") else {
            return Ok(None);
        };
        if !Self::is_fetch_callee(&callee, ctx) {
            return Ok(None);
        }

        let args = call_arguments(node);
        let Some(url_node) = args.first() else {
            return Ok(None);
        };

        let (url, confidence) = classify_url(url_node, ctx.text());
        let method = args
            .get(1)
            .and_then(|options| method_from_options(options, ctx.text()))
            .unwrap_or_else(|| DEFAULT_METHOD.to_string());

        let (line, column) = position(node);
        Ok(Some(RawCall::new(
            method,
            url,
            ctx.path(),
            line,
            column,
            CallSource::Fetch,
            confidence,
        )))
    }
}
