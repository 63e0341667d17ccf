//! Per-endpoint Markdown files.
//!
//! Each endpoint gets `<METHOD>_<url-slug>.md` with its call sites and the
//! code extracted for them.

use super::ExportData;
use crate::normalize::NormalizedEndpoint;
use crate::types::RawCall;
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// File-name slug for a URL: alphanumerics kept, runs of anything else become `_`.
pub fn url_slug(url: &str) -> String {
    let mut slug = String::with_capacity(url.len());
    for c in url.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "root".to_string()
    } else {
        slug.to_string()
    }
}

/// Write one endpoint's report.
pub fn write_endpoint<W: Write>(
    endpoint: &NormalizedEndpoint,
    calls: &[&RawCall],
    writer: &mut W,
) -> io::Result<()> {
    writeln!(writer, "# {} {}", endpoint.method, endpoint.url)?;
    writeln!(writer)?;
    writeln!(writer, "| Field | Value |")?;
    writeln!(writer, "|-------|-------|")?;
    writeln!(writer, "| Source | {} |", endpoint.source)?;
    writeln!(writer, "| Confidence | {} |", endpoint.confidence)?;
    writeln!(writer, "| Call sites | {} |", endpoint.call_count)?;
    writeln!(writer)?;

    writeln!(writer, "## Call Sites")?;
    writeln!(writer)?;
    for site in &endpoint.call_sites {
        writeln!(
            writer,
            "- `{}:{}:{}` ({})",
            site.file.display(),
            site.line,
            site.column,
            site.confidence
        )?;
    }
    writeln!(writer)?;

    let mut seen: HashSet<(Option<&Path>, &str)> = HashSet::new();
    let mut wrote_heading = false;
    for call in calls {
        let Some(code) = call.function_code.as_deref() else {
            continue;
        };
        if !seen.insert((call.function_file.as_deref(), code)) {
            continue;
        }
        if !wrote_heading {
            writeln!(writer, "## Code")?;
            writeln!(writer)?;
            wrote_heading = true;
        }

        let name = call.function_name.as_deref().unwrap_or("(anonymous)");
        let confidence = call
            .function_resolution_confidence
            .map(|c| c.to_string())
            .unwrap_or_else(|| "low".to_string());
        match call.function_file.as_deref() {
            Some(file) => writeln!(writer, "### {} ({}, {})", name, file.display(), confidence)?,
            None => writeln!(writer, "### {} ({})", name, confidence)?,
        }
        writeln!(writer)?;
        let lang = call
            .function_file
            .as_deref()
            .and_then(|f| f.extension())
            .and_then(|e| e.to_str())
            .unwrap_or("");
        writeln!(writer, "```{}", lang)?;
        writeln!(writer, "{}", code)?;
        writeln!(writer, "```")?;
        writeln!(writer)?;
    }

    if !wrote_heading {
        writeln!(writer, "_No function code was resolved for this endpoint._")?;
    }
    Ok(())
}

/// Write one Markdown file per endpoint into `dir`, returning the paths written.
pub fn split_endpoints(data: &ExportData, dir: &Path) -> io::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut used: HashSet<String> = HashSet::new();
    let mut written = Vec::new();
    for endpoint in &data.result.endpoints {
        let base = format!("{}_{}", endpoint.method, url_slug(&endpoint.url));
        let mut name = base.clone();
        let mut n = 2;
        while !used.insert(name.clone()) {
            name = format!("{}_{}", base, n);
            n += 1;
        }

        let calls: Vec<&RawCall> = data
            .result
            .calls
            .iter()
            .filter(|c| c.method.eq_ignore_ascii_case(&endpoint.method) && c.url == endpoint.url)
            .collect();

        let path = dir.join(format!("{}.md", name));
        let mut file = io::BufWriter::new(fs::File::create(&path)?);
        write_endpoint(endpoint, &calls, &mut file)?;
        file.flush()?;
        written.push(path);
    }
    Ok(written)
}
