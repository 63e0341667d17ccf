//! Scan configuration.
//!
//! The configuration is normally validated and defaulted by the caller; this
//! module only provides the data shape, JSON loading and path helpers.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default cap on the number of lines kept for an extracted function.
pub const DEFAULT_MAX_FUNCTION_LINES: usize = 200;

/// One entry of the `apiClients` allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiClientConfig {
    /// Detector id this entry enables (`fetch`, `axios`, ...).
    #[serde(rename = "type")]
    pub client_type: String,
    /// Module specifier providing the client, for axios-like libraries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

impl ApiClientConfig {
    pub fn new(client_type: impl Into<String>) -> Self {
        Self {
            client_type: client_type.into(),
            module: None,
        }
    }
}

/// Settings for a single scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanConfig {
    /// Directory being scanned. Every resolved path must stay inside it.
    pub root_dir: PathBuf,

    /// Glob patterns (relative to `root_dir`) a file must match. Empty means all.
    #[serde(default)]
    pub include: Vec<String>,

    /// Glob patterns (relative to `root_dir`) that remove files from the scan.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Detectors allowed to run. Empty means every enabled detector runs.
    #[serde(default)]
    pub api_clients: Vec<ApiClientConfig>,

    /// Line cap for extracted function code.
    #[serde(default = "default_max_function_lines")]
    pub max_function_lines: usize,

    /// Directory holding file-based route handlers, relative to `root_dir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_routes_dir: Option<PathBuf>,

    /// URL prefix served by `api_routes_dir`. Defaults to `/<last component>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_route_prefix: Option<String>,

    /// Import alias prefixes mapped to root-relative directories, tried in order.
    #[serde(default = "default_path_aliases")]
    pub path_aliases: BTreeMap<String, Vec<String>>,

    /// Extra files merged into the scan set.
    #[serde(default)]
    pub additional_include_files: Vec<PathBuf>,
}

fn default_max_function_lines() -> usize {
    DEFAULT_MAX_FUNCTION_LINES
}

fn default_path_aliases() -> BTreeMap<String, Vec<String>> {
    let mut aliases = BTreeMap::new();
    aliases.insert("@/".to_string(), vec![String::new(), "src".to_string()]);
    aliases
}

impl ScanConfig {
    /// Create a configuration with defaults for the given root.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            include: Vec::new(),
            exclude: Vec::new(),
            api_clients: Vec::new(),
            max_function_lines: DEFAULT_MAX_FUNCTION_LINES,
            api_routes_dir: None,
            api_route_prefix: None,
            path_aliases: default_path_aliases(),
            additional_include_files: Vec::new(),
        }
    }

    /// Load a JSON configuration file.
    ///
    /// A relative `rootDir` is resolved against the directory holding the file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: ScanConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Invalid {
                path: path.to_path_buf(),
                source,
            })?;

        if config.root_dir.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.root_dir = base.join(&config.root_dir);
        }
        Ok(config)
    }

    /// Check that the root exists and make it absolute.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if !self.root_dir.is_dir() {
            return Err(ConfigError::MissingRoot(self.root_dir));
        }
        if let Ok(canonical) = self.root_dir.canonicalize() {
            self.root_dir = canonical;
        }
        Ok(self)
    }

    /// Absolute path of the route-handler directory, if configured.
    pub fn api_routes_path(&self) -> Option<PathBuf> {
        self.api_routes_dir.as_ref().map(|dir| {
            if dir.is_absolute() {
                dir.clone()
            } else {
                self.root_dir.join(dir)
            }
        })
    }

    /// Returns true if the detector with this id may run under this config.
    pub fn allows_client(&self, detector_id: &str) -> bool {
        self.api_clients.is_empty()
            || self
                .api_clients
                .iter()
                .any(|client| client.client_type == detector_id)
    }

    /// Extra module specifiers declared for a client type.
    pub fn client_modules(&self, client_type: &str) -> Vec<String> {
        self.api_clients
            .iter()
            .filter(|client| client.client_type == client_type)
            .filter_map(|client| client.module.clone())
            .collect()
    }
}
