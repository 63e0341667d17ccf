//! Grouping of raw calls into unique endpoints.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::Serialize;

use crate::types::{CallSource, Confidence, RawCall};

/// One place an endpoint is called from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSite {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub confidence: Confidence,
}

impl From<&RawCall> for CallSite {
    fn from(call: &RawCall) -> Self {
        Self {
            file: call.file.clone(),
            line: call.line,
            column: call.column,
            confidence: call.confidence,
        }
    }
}

/// A unique (method, URL) pair and every call site targeting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEndpoint {
    pub method: String,
    pub url: String,
    /// Detector of the call site that comes first in (file, line, column) order.
    pub source: CallSource,
    pub call_sites: Vec<CallSite>,
    /// Highest confidence over all call sites.
    pub confidence: Confidence,
    pub call_count: usize,
}

impl NormalizedEndpoint {
    fn new(call: &RawCall) -> Self {
        Self {
            method: call.method.to_uppercase(),
            url: call.url.clone(),
            source: call.source.clone(),
            call_sites: vec![CallSite::from(call)],
            confidence: call.confidence,
            call_count: 1,
        }
    }

    /// Record another call site. Confidence only ever rises.
    pub fn add_site(&mut self, call: &RawCall) {
        let site = CallSite::from(call);
        let earliest = self
            .call_sites
            .iter()
            .map(|s| (&s.file, s.line, s.column))
            .min();
        if earliest.map_or(true, |first| (&site.file, site.line, site.column) < first) {
            self.source = call.source.clone();
        }

        self.confidence = self.confidence.max(site.confidence);
        self.call_sites.push(site);
        self.call_count += 1;
    }
}

/// Aggregate counts over a normalized result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointStats {
    pub total_endpoints: usize,
    pub total_calls: usize,
    pub by_method: BTreeMap<String, usize>,
    pub by_source: BTreeMap<String, usize>,
    pub by_confidence: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedResult {
    pub endpoints: Vec<NormalizedEndpoint>,
    pub stats: EndpointStats,
}

/// Group calls by uppercased method and URL.
///
/// Endpoints are sorted by method then URL; call sites keep input order.
pub fn normalize(calls: &[RawCall]) -> NormalizedResult {
    let mut endpoints: Vec<NormalizedEndpoint> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for call in calls {
        match index.get(&call.endpoint_key()) {
            Some(&i) => endpoints[i].add_site(call),
            None => {
                index.insert(call.endpoint_key(), endpoints.len());
                endpoints.push(NormalizedEndpoint::new(call));
            }
        }
    }

    endpoints.sort_by(|a, b| a.method.cmp(&b.method).then_with(|| a.url.cmp(&b.url)));

    let mut stats = EndpointStats {
        total_endpoints: endpoints.len(),
        total_calls: calls.len(),
        ..EndpointStats::default()
    };
    for endpoint in &endpoints {
        *stats.by_method.entry(endpoint.method.clone()).or_insert(0) += 1;
        *stats
            .by_source
            .entry(endpoint.source.to_string())
            .or_insert(0) += 1;
        *stats
            .by_confidence
            .entry(endpoint.confidence.to_string())
            .or_insert(0) += 1;
    }

    NormalizedResult { endpoints, stats }
}
