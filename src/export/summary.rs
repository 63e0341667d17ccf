//! Terminal summary of a scan.

use super::{ExportData, Exporter};
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Plain-text summary exporter.
pub struct SummaryExporter;

fn format_counts(counts: &BTreeMap<String, usize>) -> String {
    if counts.is_empty() {
        return "-".to_string();
    }
    counts
        .iter()
        .map(|(key, count)| format!("{} {}", key, count))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Exporter for SummaryExporter {
    fn export<W: Write>(&self, data: &ExportData, writer: &mut W) -> io::Result<()> {
        let result = data.result;
        let stats = &result.stats;

        writeln!(
            writer,
            "Scanned {} files: {} endpoints from {} calls ({} unresolved, {} errors)",
            result.files_scanned,
            stats.total_endpoints,
            stats.total_calls,
            data.unresolved_count(),
            result.errors.len()
        )?;
        writeln!(writer)?;
        writeln!(writer, "By method:     {}", format_counts(&stats.by_method))?;
        writeln!(writer, "By source:     {}", format_counts(&stats.by_source))?;
        writeln!(writer, "By confidence: {}", format_counts(&stats.by_confidence))?;

        if !result.endpoints.is_empty() {
            let width = result
                .endpoints
                .iter()
                .map(|e| e.url.len())
                .max()
                .unwrap_or(0);
            writeln!(writer)?;
            for endpoint in &result.endpoints {
                writeln!(
                    writer,
                    "{:<7} {:<width$}  {:<6} {:<6} {} call site{}",
                    endpoint.method,
                    endpoint.url,
                    endpoint.source.as_str(),
                    endpoint.confidence.to_string(),
                    endpoint.call_count,
                    if endpoint.call_count == 1 { "" } else { "s" },
                    width = width
                )?;
            }
        }

        if !data.env_parameters.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "Environment parameters:")?;
            for param in &data.env_parameters {
                writeln!(writer, "  {:<24} {}", param.name, param.snippet)?;
            }
        }

        if !result.errors.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "Errors:")?;
            for error in &result.errors {
                match error.line {
                    Some(line) => {
                        writeln!(writer, "  {}:{} {}", error.file.display(), line, error.message)?
                    }
                    None => writeln!(writer, "  {} {}", error.file.display(), error.message)?,
                }
            }
        }

        Ok(())
    }
}
