//! Scan pipeline: discovery, detection, extraction, route discovery and
//! normalization, run sequentially over one shared parse cache.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use tree_sitter::Node;

use crate::config::ScanConfig;
use crate::detectors::{create_default_registry, DetectionVisitor, DetectorRegistry, FileContext};
use crate::discovery::FileDiscoverer;
use crate::error::{AnalysisError, ScanSetupError};
use crate::extract::FunctionExtractor;
use crate::normalize::{normalize, EndpointStats, NormalizedEndpoint};
use crate::routes::{merge_discovered, RouteDiscoverer, RouteLayout};
use crate::source::{ModuleResolver, Project, SourceModel};
use crate::types::RawCall;

/// A non-fatal problem with one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanError {
    pub file: PathBuf,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl ScanError {
    fn from_analysis(file: &Path, error: &AnalysisError) -> Self {
        Self {
            file: file.to_path_buf(),
            message: error.to_string(),
            line: None,
        }
    }
}

/// Everything a scan produces.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub files_scanned: usize,
    /// Calls after extraction and route-discovery merge, in detection order.
    pub calls: Vec<RawCall>,
    pub endpoints: Vec<NormalizedEndpoint>,
    pub stats: EndpointStats,
    pub errors: Vec<ScanError>,
}

/// Runs scans for one configuration.
pub struct Scanner {
    config: ScanConfig,
    registry: DetectorRegistry,
}

impl Scanner {
    /// Scanner with the built-in detectors.
    pub fn new(config: ScanConfig) -> Self {
        let registry = create_default_registry(&config);
        Self { config, registry }
    }

    pub fn with_registry(config: ScanConfig, registry: DetectorRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    fn project(&self) -> Result<Project, AnalysisError> {
        let resolver =
            ModuleResolver::with_project_config(&self.config.root_dir, &self.config.path_aliases);
        Project::new(resolver)
    }

    /// Discover files under the configured root and scan them.
    pub fn scan(&mut self) -> Result<ScanResult, ScanSetupError> {
        let mut project = self.project()?;
        let discovered = FileDiscoverer::new(&self.config)?.discover(&mut project);
        Ok(self.run(&mut project, &discovered.files))
    }

    /// Scan an explicit list of absolute file paths.
    pub fn scan_files(&mut self, files: &[PathBuf]) -> Result<ScanResult, ScanSetupError> {
        let mut project = self.project()?;
        Ok(self.run(&mut project, files))
    }

    fn run(&mut self, project: &mut Project, files: &[PathBuf]) -> ScanResult {
        let mut result = ScanResult::default();
        let mut calls = Vec::new();

        self.registry.clear_caches();
        debug!(detectors = self.registry.count(), files = files.len(), "detection started");
        let mut visitor = DetectionVisitor::new(&mut self.registry, &self.config);
        for file in files {
            let model = match project.load(file) {
                Ok(model) => model,
                Err(e) => {
                    warn!(file = %file.display(), error = %e, "skipping file");
                    result.errors.push(ScanError::from_analysis(file, &e));
                    continue;
                }
            };
            if let Some(error) = syntax_error(&model) {
                result.errors.push(error);
            }

            let found = visitor.visit(&FileContext::new(&model));
            debug!(file = %file.display(), calls = found.len(), "file scanned");
            calls.extend(found);
            result.files_scanned += 1;
        }
        info!(
            files = result.files_scanned,
            calls = calls.len(),
            errors = result.errors.len(),
            "detection finished"
        );

        let max_lines = self.config.max_function_lines;
        let layout = RouteLayout::from_config(&self.config);
        let mut calls = FunctionExtractor::new(project, layout.as_ref(), max_lines).extract_all(calls);

        if let Some(layout) = &layout {
            let synthesized = RouteDiscoverer::new(layout, max_lines).discover(project);
            calls = merge_discovered(calls, synthesized);
        }

        let normalized = normalize(&calls);
        info!(
            endpoints = normalized.stats.total_endpoints,
            calls = normalized.stats.total_calls,
            parsed = project.cached_count(),
            "scan finished"
        );

        result.calls = calls;
        result.endpoints = normalized.endpoints;
        result.stats = normalized.stats;
        result
    }
}

/// First syntax error in a file that still parsed, reported without dropping the file.
fn syntax_error(model: &SourceModel) -> Option<ScanError> {
    let root = model.root();
    if !root.has_error() {
        return None;
    }

    let mut node = root;
    while !node.is_error() && !node.is_missing() {
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        let Some(next) = children
            .into_iter()
            .find(|child| child.is_error() || child.is_missing() || child.has_error())
        else {
            break;
        };
        node = next;
    }

    Some(ScanError {
        file: model.path().to_path_buf(),
        message: "syntax error, results from this file may be incomplete".to_string(),
        line: Some(node.start_position().row + 1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CallSource, Confidence};
    use std::fs;
    use tempfile::tempdir;

    fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_fetch_inside_named_function() {
        let dir = tempdir().unwrap();
        let source = "function getUsers() {\n  return fetch('/api/users').then((r) => r.json());\n}\n";
        write(dir.path(), "a.ts", source);

        let result = Scanner::new(ScanConfig::new(dir.path())).scan().unwrap();

        assert_eq!(result.files_scanned, 1);
        assert_eq!(result.calls.len(), 1);
        let call = &result.calls[0];
        assert_eq!(call.method, "GET");
        assert_eq!(call.url, "/api/users");
        assert_eq!(call.confidence, Confidence::High);
        assert_eq!(call.source, CallSource::Fetch);
        assert_eq!(call.function_name.as_deref(), Some("getUsers"));
        assert_eq!(call.function_resolution_confidence, Some(Confidence::High));
        assert_eq!(call.function_code.as_deref(), Some(source.trim()));
    }

    #[test]
    fn test_axios_interpolated_post() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "b.ts",
            "import axios from 'axios';\n\nexport async function save(id: string) {\n  return axios.post(`/api/items/${id}`, { id });\n}\n",
        );

        let result = Scanner::new(ScanConfig::new(dir.path())).scan().unwrap();

        assert_eq!(result.endpoints.len(), 1);
        let endpoint = &result.endpoints[0];
        assert_eq!(endpoint.method, "POST");
        assert_eq!(endpoint.url, "/api/items/${id}");
        assert_eq!(endpoint.confidence, Confidence::Medium);
        assert_eq!(endpoint.source, CallSource::Axios);
    }

    #[test]
    fn test_unreferenced_route_handler_is_discovered() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "api/widgets/route.ts",
            "export async function GET() {\n  return Response.json([]);\n}\n",
        );
        let mut config = ScanConfig::new(dir.path());
        config.api_routes_dir = Some(PathBuf::from("api"));

        let result = Scanner::new(config).scan().unwrap();

        assert_eq!(result.endpoints.len(), 1);
        let endpoint = &result.endpoints[0];
        assert_eq!(endpoint.method, "GET");
        assert_eq!(endpoint.url, "/api/widgets");
        assert_eq!(endpoint.confidence, Confidence::High);
        assert_eq!(endpoint.source, CallSource::Custom);
        assert_eq!(result.stats.by_source.get("custom"), Some(&1));
    }

    #[test]
    fn test_detected_call_wins_over_discovered_handler() {
        let dir = tempdir().unwrap();
        let handler = write(
            dir.path(),
            "api/widgets/route.ts",
            "export async function GET() {\n  return Response.json([]);\n}\n",
        );
        write(
            dir.path(),
            "web/widgets.ts",
            "export function loadWidgets() {\n  return fetch('/api/widgets');\n}\n",
        );
        let mut config = ScanConfig::new(dir.path());
        config.api_routes_dir = Some(PathBuf::from("api"));

        let result = Scanner::new(config).scan().unwrap();

        assert_eq!(result.calls.len(), 1);
        assert_eq!(result.endpoints.len(), 1);
        let call = &result.calls[0];
        assert_eq!(call.source, CallSource::Fetch);
        assert_eq!(call.function_name.as_deref(), Some("GET"));
        assert_eq!(call.function_file.as_deref(), Some(handler.as_path()));
        assert_eq!(result.endpoints[0].call_count, 1);
    }

    #[test]
    fn test_scans_are_deterministic() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "src/a.ts",
            "import axios from 'axios';\nexport const load = () => axios.get('/api/x');\nfetch('/api/y');\n",
        );
        write(
            dir.path(),
            "src/b.js",
            "fetch('/api/x');\nfetch(url, { method: 'post' });\n",
        );

        let first = Scanner::new(ScanConfig::new(dir.path())).scan().unwrap();
        let second = Scanner::new(ScanConfig::new(dir.path())).scan().unwrap();

        assert_eq!(first.endpoints, second.endpoints);
        assert_eq!(first.calls, second.calls);
        let keys: Vec<(String, String)> = first
            .endpoints
            .iter()
            .map(|e| (e.method.clone(), e.url.clone()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("GET".to_string(), "/api/x".to_string()),
                ("GET".to_string(), "/api/y".to_string()),
                ("POST".to_string(), "url".to_string()),
            ]
        );
        let x = &first.endpoints[0];
        assert_eq!(x.call_count, 2);
        assert_eq!(x.source, CallSource::Axios);
        assert!(x.call_sites[0].file.ends_with("src/a.ts"));
    }

    #[test]
    fn test_unreadable_file_is_reported_not_fatal() {
        let dir = tempdir().unwrap();
        let good = write(dir.path(), "good.ts", "fetch('/ok');\n");
        let missing = dir.path().join("missing.ts");

        let result = Scanner::new(ScanConfig::new(dir.path()))
            .scan_files(&[missing.clone(), good])
            .unwrap();

        assert_eq!(result.files_scanned, 1);
        assert_eq!(result.calls.len(), 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].file, missing);
    }

    #[test]
    fn test_syntax_error_keeps_partial_results() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "broken.ts",
            "fetch('/api/before');\nfunction oops( {\n",
        );

        let result = Scanner::new(ScanConfig::new(dir.path())).scan().unwrap();

        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].line.is_some());
        assert!(result.calls.iter().any(|c| c.url == "/api/before"));
    }

    #[test]
    fn test_allow_list_limits_sources() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "a.ts",
            "import axios from 'axios';\nfetch('/a');\naxios.delete('/b');\n",
        );
        let mut config = ScanConfig::new(dir.path());
        config.api_clients = vec![crate::config::ApiClientConfig::new("axios")];

        let result = Scanner::new(config).scan().unwrap();

        assert_eq!(result.calls.len(), 1);
        assert_eq!(result.calls[0].method, "DELETE");
    }

    #[test]
    fn test_custom_registry_with_disabled_detector() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "a.ts",
            "import axios from 'axios';\nfetch('/a');\naxios.put('/b');\n",
        );
        let config = ScanConfig::new(dir.path());
        let mut registry = create_default_registry(&config);
        registry.disable("axios");

        let result = Scanner::with_registry(config, registry).scan().unwrap();

        assert_eq!(result.calls.len(), 1);
        assert_eq!(result.calls[0].url, "/a");
        assert_eq!(result.calls[0].source, CallSource::Fetch);
    }

    #[test]
    fn test_call_reaching_dynamic_handler_suppresses_discovered_record() {
        let dir = tempdir().unwrap();
        let handler = write(
            dir.path(),
            "api/items/[id]/route.ts",
            "export async function GET() {\n  return Response.json({});\n}\n",
        );
        write(
            dir.path(),
            "web/items.ts",
            "export function loadItem() {\n  return fetch('/api/items/1');\n}\n",
        );
        let mut config = ScanConfig::new(dir.path());
        config.api_routes_dir = Some(PathBuf::from("api"));

        let result = Scanner::new(config).scan().unwrap();

        assert_eq!(result.calls.len(), 1);
        let call = &result.calls[0];
        assert_eq!(call.url, "/api/items/1");
        assert_eq!(call.function_file.as_deref(), Some(handler.as_path()));
        assert_eq!(result.endpoints.len(), 1);
        assert!(result.endpoints.iter().all(|e| e.url != "/api/items/[id]"));
        assert_eq!(result.stats.by_source.get("custom"), None);
    }
}
