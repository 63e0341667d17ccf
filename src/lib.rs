//! apiscope - static inventory of outbound HTTP calls in JavaScript/TypeScript projects
//!
//! This crate finds `fetch` and axios calls in a source tree, recovers the
//! code of the function behind each call (or the route handler serving its
//! URL), and groups the calls into unique endpoints.
//!
//! # Example
//!
//! ```no_run
//! use apiscope::{ScanConfig, Scanner};
//!
//! let config = ScanConfig::new("./my-app").validate()?;
//! let result = Scanner::new(config).scan()?;
//!
//! for endpoint in &result.endpoints {
//!     println!("{} {} ({} call sites)", endpoint.method, endpoint.url, endpoint.call_count);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod detectors;
pub mod discovery;
pub mod error;
pub mod export;
pub mod extract;
pub mod graph;
pub mod normalize;
pub mod routes;
pub mod scanner;
pub mod source;
pub mod types;

pub use config::{ApiClientConfig, ScanConfig};
pub use error::{AnalysisError, ConfigError, DetectError, ScanSetupError};
pub use normalize::{normalize, CallSite, EndpointStats, NormalizedEndpoint};
pub use scanner::{ScanError, ScanResult, Scanner};
pub use types::{CallSource, Confidence, Extraction, RawCall};
