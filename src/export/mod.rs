//! Export functionality for scan results.
//!
//! This module provides exporters for writing a [`ScanResult`] as pretty or
//! compact JSON and as a terminal summary, plus the per-endpoint Markdown
//! splitter and the environment-variable extractor.

pub mod env;
pub mod json;
pub mod markdown;
pub mod summary;

use std::io::{self, Write};

use crate::scanner::ScanResult;

pub use env::{EnvExtractor, EnvParameter};
pub use markdown::split_endpoints;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Pretty-printed JSON
    Json,
    /// Single-line JSON
    CompactJson,
    /// Human-readable terminal summary
    Summary,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "json-compact" | "compact" => Ok(ExportFormat::CompactJson),
            "summary" | "text" => Ok(ExportFormat::Summary),
            _ => Err(format!(
                "Unknown export format: '{}'. Valid formats: json, json-compact, summary",
                s
            )),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::CompactJson => write!(f, "json-compact"),
            ExportFormat::Summary => write!(f, "summary"),
        }
    }
}

/// Data container for export operations.
#[derive(Debug, Clone)]
pub struct ExportData<'a> {
    pub result: &'a ScanResult,
    /// Configuration parameters read by extracted code, when requested.
    pub env_parameters: Vec<EnvParameter>,
}

impl<'a> ExportData<'a> {
    pub fn new(result: &'a ScanResult) -> Self {
        Self {
            result,
            env_parameters: Vec::new(),
        }
    }

    /// Attach the environment parameters used by the extracted code.
    pub fn with_env_parameters(mut self, extractor: &EnvExtractor) -> Self {
        self.env_parameters = extractor.extract(&self.result.calls);
        self
    }

    /// Number of calls whose function could not be resolved.
    pub fn unresolved_count(&self) -> usize {
        self.result
            .calls
            .iter()
            .filter(|c| c.function_code.is_none())
            .count()
    }
}

/// Trait for exporters.
pub trait Exporter {
    /// Export the data to the given writer.
    fn export<W: Write>(&self, data: &ExportData, writer: &mut W) -> io::Result<()>;
}

/// Export data in the specified format.
pub fn export<W: Write>(format: ExportFormat, data: &ExportData, writer: &mut W) -> io::Result<()> {
    match format {
        ExportFormat::Json => json::JsonExporter::pretty().export(data, writer),
        ExportFormat::CompactJson => json::JsonExporter::compact().export(data, writer),
        ExportFormat::Summary => summary::SummaryExporter.export(data, writer),
    }
}
