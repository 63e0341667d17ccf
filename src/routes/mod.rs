//! File-based route handlers.
//!
//! [`RouteLayout`] maps URLs to handler files and back, [`exports`] finds the
//! HTTP-method exports inside a handler, and [`RouteDiscoverer`] turns every
//! handler it finds into a call record so endpoints nobody calls still show up.

pub mod exports;
pub mod layout;

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{debug, info, warn};

pub use exports::{find_method_export, method_exports, HTTP_METHODS};
pub use layout::{url_pathname, RouteLayout, HANDLER_FILE_NAMES};

use crate::extract::clip_source;
use crate::source::syntax::position;
use crate::source::Project;
use crate::types::{CallSource, Confidence, Extraction, RawCall};

/// Synthesizes call records for every method export under a [`RouteLayout`].
pub struct RouteDiscoverer<'a> {
    layout: &'a RouteLayout,
    max_function_lines: usize,
}

impl<'a> RouteDiscoverer<'a> {
    pub fn new(layout: &'a RouteLayout, max_function_lines: usize) -> Self {
        Self {
            layout,
            max_function_lines,
        }
    }

    /// One extracted record per method export of every handler file.
    ///
    /// Handler files that cannot be read or parsed are skipped.
    pub fn discover(&self, project: &mut Project) -> Vec<RawCall> {
        let mut calls = Vec::new();

        for file in self.layout.handler_files() {
            let Some(url) = self.layout.url_for_handler(&file) else {
                continue;
            };
            let model = match project.load(&file) {
                Ok(model) => model,
                Err(e) => {
                    warn!(file = %file.display(), error = %e, "skipping unreadable route handler");
                    continue;
                }
            };

            let root = model.root();
            for (method, node) in method_exports(&root, model.text()) {
                let (line, column) = position(&node);
                let extraction = Extraction {
                    name: Some(method.to_string()),
                    file: Some(model.path().to_path_buf()),
                    code: clip_source(model.node_text(&node), self.max_function_lines),
                    confidence: Confidence::High,
                };
                debug!(method, url = %url, file = %file.display(), "discovered route handler");
                calls.push(
                    RawCall::new(
                        method,
                        url.clone(),
                        model.path(),
                        line,
                        column,
                        CallSource::Custom,
                        Confidence::High,
                    )
                    .with_extraction(extraction),
                );
            }
        }

        info!(handlers = calls.len(), "route discovery finished");
        calls
    }
}

/// Append synthesized handler records that no detected call already covers.
///
/// A handler is covered when a detected call has the same method and URL, or
/// when a detected call from another file was resolved to that handler file
/// under the same method name.
pub fn merge_discovered(detected: Vec<RawCall>, synthesized: Vec<RawCall>) -> Vec<RawCall> {
    let mut keys: HashSet<(String, String)> = detected.iter().map(RawCall::endpoint_key).collect();
    let handled: HashSet<(PathBuf, String)> = detected
        .iter()
        .filter_map(|call| {
            let file = call.function_file.as_ref()?;
            if *file == call.file || call.function_name.as_deref() != Some(call.method.as_str()) {
                return None;
            }
            Some((file.clone(), call.method.clone()))
        })
        .collect();

    let mut merged = detected;
    for call in synthesized {
        if handled.contains(&(call.file.clone(), call.method.clone())) {
            debug!(method = %call.method, url = %call.url, "handler already reached from a call site");
            continue;
        }
        if keys.insert(call.endpoint_key()) {
            merged.push(call);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ModuleResolver;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn project(root: &Path) -> Project {
        Project::new(ModuleResolver::new(root, &BTreeMap::new())).unwrap()
    }

    #[test]
    fn test_discover_synthesizes_handlers() {
        let dir = tempdir().unwrap();
        let api = dir.path().join("api");
        fs::create_dir_all(api.join("widgets")).unwrap();
        fs::write(
            api.join("widgets/route.ts"),
            "export async function GET() {\n  return Response.json([]);\n}\n\nexport const POST = async () => new Response(null);\n",
        )
        .unwrap();

        let layout = RouteLayout::new(&api, "/api");
        let mut project = project(dir.path());
        let calls = RouteDiscoverer::new(&layout, 200).discover(&mut project);

        assert_eq!(calls.len(), 2);
        let get = &calls[0];
        assert_eq!(get.method, "GET");
        assert_eq!(get.url, "/api/widgets");
        assert_eq!(get.source, CallSource::Custom);
        assert_eq!(get.confidence, Confidence::High);
        assert_eq!(get.function_name.as_deref(), Some("GET"));
        assert_eq!(get.function_resolution_confidence, Some(Confidence::High));
        assert_eq!(get.line, 1);
        assert!(get
            .function_code
            .as_deref()
            .unwrap()
            .starts_with("export async function GET()"));
        assert_eq!(calls[1].method, "POST");
        assert_eq!(calls[1].line, 5);
    }

    #[test]
    fn test_merge_prefers_detected() {
        let handler = PathBuf::from("/repo/api/widgets/route.ts");
        let detected = RawCall::new(
            "get",
            "/api/widgets",
            Path::new("/repo/src/client.ts"),
            3,
            5,
            CallSource::Fetch,
            Confidence::High,
        );
        let synthesized = RawCall::new(
            "GET",
            "/api/widgets",
            &handler,
            1,
            1,
            CallSource::Custom,
            Confidence::High,
        );
        let other = RawCall::new(
            "POST",
            "/api/widgets",
            &handler,
            5,
            1,
            CallSource::Custom,
            Confidence::High,
        );

        let merged = merge_discovered(vec![detected.clone()], vec![synthesized, other]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], detected);
        assert_eq!(merged[1].method, "POST");
    }

    #[test]
    fn test_merge_skips_handler_resolved_from_template_url() {
        let handler = PathBuf::from("/repo/api/items/[id]/route.ts");
        let detected = RawCall::new(
            "GET",
            "/api/items/${id}",
            Path::new("/repo/src/items.ts"),
            8,
            3,
            CallSource::Fetch,
            Confidence::Medium,
        )
        .with_extraction(Extraction {
            name: Some("GET".to_string()),
            file: Some(handler.clone()),
            code: Some("export function GET() {}".to_string()),
            confidence: Confidence::High,
        });
        let synthesized = RawCall::new(
            "GET",
            "/api/items/[id]",
            &handler,
            1,
            1,
            CallSource::Custom,
            Confidence::High,
        );

        let merged = merge_discovered(vec![detected], vec![synthesized]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].url, "/api/items/${id}");
    }
}
