//! Environment variables read by extracted code.

use std::collections::BTreeMap;
use std::path::PathBuf;

use regex::Regex;
use serde::Serialize;

use crate::types::RawCall;

/// Longest snippet kept per parameter, in characters.
pub const MAX_SNIPPET_CHARS: usize = 160;

const PATTERNS: &[&str] = &[
    r"process\.env\.([A-Za-z_][A-Za-z0-9_]*)",
    r#"process\.env\[\s*["']([A-Za-z_][A-Za-z0-9_]*)["']\s*\]"#,
    r"import\.meta\.env\.([A-Za-z_][A-Za-z0-9_]*)",
];

/// A configuration parameter the extracted code depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvParameter {
    pub name: String,
    /// First line seen using the parameter, trimmed.
    pub snippet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// Finds `process.env.NAME`, `process.env["NAME"]` and `import.meta.env.NAME`.
#[derive(Debug, Clone)]
pub struct EnvExtractor {
    patterns: Vec<Regex>,
}

impl EnvExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        let patterns = PATTERNS
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Parameters used across all extracted code, sorted by name.
    pub fn extract(&self, calls: &[RawCall]) -> Vec<EnvParameter> {
        let mut found: BTreeMap<String, EnvParameter> = BTreeMap::new();

        for call in calls {
            let Some(code) = call.function_code.as_deref() else {
                continue;
            };
            for line in code.lines() {
                for pattern in &self.patterns {
                    for captures in pattern.captures_iter(line) {
                        let Some(name) = captures.get(1) else {
                            continue;
                        };
                        found
                            .entry(name.as_str().to_string())
                            .or_insert_with(|| EnvParameter {
                                name: name.as_str().to_string(),
                                snippet: snippet(line),
                                file: call.function_file.clone(),
                            });
                    }
                }
            }
        }

        found.into_values().collect()
    }
}

fn snippet(line: &str) -> String {
    line.trim().chars().take(MAX_SNIPPET_CHARS).collect()
}
