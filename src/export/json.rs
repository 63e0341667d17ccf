//! JSON export implementation.
//!
//! Writes `{ summary, endpoints, calls, errors }` for machine-readable output.

use super::{EnvParameter, ExportData, Exporter};
use crate::normalize::NormalizedEndpoint;
use crate::scanner::ScanError;
use crate::types::RawCall;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// JSON exporter implementation.
pub struct JsonExporter {
    pretty: bool,
}

impl JsonExporter {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

/// Summary statistics for JSON output.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSummary<'a> {
    files_scanned: usize,
    total_endpoints: usize,
    total_calls: usize,
    unresolved_calls: usize,
    errors: usize,
    by_method: &'a BTreeMap<String, usize>,
    by_source: &'a BTreeMap<String, usize>,
    by_confidence: &'a BTreeMap<String, usize>,
}

/// Root JSON export structure.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a> {
    summary: JsonSummary<'a>,
    endpoints: &'a [NormalizedEndpoint],
    calls: &'a [RawCall],
    errors: &'a [ScanError],
    #[serde(skip_serializing_if = "no_parameters")]
    env_parameters: &'a [EnvParameter],
}

fn no_parameters(parameters: &&[EnvParameter]) -> bool {
    parameters.is_empty()
}

impl Exporter for JsonExporter {
    fn export<W: Write>(&self, data: &ExportData, writer: &mut W) -> io::Result<()> {
        let result = data.result;
        let export = JsonExport {
            summary: JsonSummary {
                files_scanned: result.files_scanned,
                total_endpoints: result.stats.total_endpoints,
                total_calls: result.stats.total_calls,
                unresolved_calls: data.unresolved_count(),
                errors: result.errors.len(),
                by_method: &result.stats.by_method,
                by_source: &result.stats.by_source,
                by_confidence: &result.stats.by_confidence,
            },
            endpoints: &result.endpoints,
            calls: &result.calls,
            errors: &result.errors,
            env_parameters: &data.env_parameters,
        };

        let json = if self.pretty {
            serde_json::to_string_pretty(&export)
        } else {
            serde_json::to_string(&export)
        }
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        writeln!(writer, "{}", json)
    }
}
