//! Shared types for detected calls.
//!
//! A [`RawCall`] is produced once per detector match and then rebuilt by the
//! extraction phase with the function it was resolved to.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Three-level quality estimate.
///
/// Variants are ordered so that `Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    #[default]
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Which detector produced a call.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallSource {
    Fetch,
    Axios,
    Custom,
}

impl CallSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Axios => "axios",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for CallSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of resolving the function behind a call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extraction {
    pub name: Option<String>,
    pub file: Option<PathBuf>,
    pub code: Option<String>,
    pub confidence: Confidence,
}

impl Extraction {
    /// Nothing could be resolved.
    pub fn unresolved() -> Self {
        Self::default()
    }
}

/// One detected invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCall {
    /// HTTP verb, uppercased.
    pub method: String,
    /// Literal URL or its best-effort textual form.
    pub url: String,
    /// 1-based line of the call expression.
    pub line: usize,
    /// 1-based byte column of the call expression.
    pub column: usize,
    /// Absolute path of the file containing the call.
    pub file: PathBuf,
    pub source: CallSource,
    /// Quality of the URL extraction.
    pub confidence: Confidence,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_resolution_confidence: Option<Confidence>,
}

impl RawCall {
    /// A freshly detected call with no extraction results.
    pub fn new(
        method: impl Into<String>,
        url: impl Into<String>,
        file: &Path,
        line: usize,
        column: usize,
        source: CallSource,
        confidence: Confidence,
    ) -> Self {
        Self {
            method: method.into().to_uppercase(),
            url: url.into(),
            line,
            column,
            file: file.to_path_buf(),
            source,
            confidence,
            function_name: None,
            function_file: None,
            function_code: None,
            function_resolution_confidence: None,
        }
    }

    /// Rebuild this call with extraction results, replacing any earlier ones.
    pub fn with_extraction(self, extraction: Extraction) -> Self {
        Self {
            function_name: extraction.name,
            function_file: extraction.file,
            function_code: extraction.code,
            function_resolution_confidence: Some(extraction.confidence),
            ..self
        }
    }

    /// Normalizer key: uppercased method and URL.
    pub fn endpoint_key(&self) -> (String, String) {
        (self.method.to_uppercase(), self.url.clone())
    }

    pub fn is_extracted(&self) -> bool {
        self.function_resolution_confidence.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_ordering() {
        assert!(Confidence::Low < Confidence::Medium);
        assert!(Confidence::Medium < Confidence::High);
        assert_eq!(Confidence::Low.max(Confidence::High), Confidence::High);
    }

    #[test]
    fn test_method_uppercased() {
        let call = RawCall::new(
            "post",
            "/api/items",
            Path::new("/p/a.ts"),
            1,
            1,
            CallSource::Axios,
            Confidence::High,
        );
        assert_eq!(call.method, "POST");
        assert!(!call.is_extracted());
    }

    #[test]
    fn test_with_extraction_replaces_fields() {
        let call = RawCall::new(
            "GET",
            "/api/users",
            Path::new("/p/a.ts"),
            3,
            5,
            CallSource::Fetch,
            Confidence::High,
        )
        .with_extraction(Extraction {
            name: Some("getUsers".to_string()),
            file: Some(PathBuf::from("/p/a.ts")),
            code: Some("function getUsers() {}".to_string()),
            confidence: Confidence::High,
        });
        assert_eq!(call.function_name.as_deref(), Some("getUsers"));

        let call = call.with_extraction(Extraction::unresolved());
        assert_eq!(call.function_name, None);
        assert_eq!(call.function_code, None);
        assert_eq!(call.function_resolution_confidence, Some(Confidence::Low));
    }

    #[test]
    fn test_serialized_field_names() {
        let call = RawCall::new(
            "GET",
            "/api/users",
            Path::new("/p/a.ts"),
            1,
            1,
            CallSource::Fetch,
            Confidence::Medium,
        );
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["source"], "fetch");
        assert_eq!(json["confidence"], "medium");
        assert!(json.get("functionCode").is_none());
    }
}
