//! Pre-order traversal that runs every selected detector on every node.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, error, warn};

use super::{DetectorRegistry, FileContext};
use crate::config::ScanConfig;
use crate::source::syntax::{for_each_node, position};
use crate::types::RawCall;

/// Drives the detectors selected by a config over one file at a time.
///
/// A detector that returns an error or panics loses only its result for
/// that node; traversal and the other detectors continue.
pub struct DetectionVisitor<'r> {
    registry: &'r mut DetectorRegistry,
    config: &'r ScanConfig,
    active: Vec<String>,
}

impl<'r> DetectionVisitor<'r> {
    pub fn new(registry: &'r mut DetectorRegistry, config: &'r ScanConfig) -> Self {
        let active = registry.filter_by_config(config);
        debug!(detectors = ?active, "active detectors");
        Self {
            registry,
            config,
            active,
        }
    }

    /// Ids of the detectors this visitor runs.
    pub fn active(&self) -> &[String] {
        &self.active
    }

    /// Collect every call the active detectors report in one file.
    pub fn visit(&mut self, ctx: &FileContext) -> Vec<RawCall> {
        let mut calls = Vec::new();
        let registry = &mut *self.registry;
        let active = &self.active;
        let config = self.config;

        for_each_node(ctx.model().root(), |node| {
            for id in active {
                let Some(detector) = registry.get_mut(id) else {
                    continue;
                };
                if !detector.should_detect(&node) {
                    continue;
                }

                let outcome =
                    catch_unwind(AssertUnwindSafe(|| detector.detect(&node, ctx, config)));
                match outcome {
                    Ok(Ok(Some(call))) => calls.push(call),
                    Ok(Ok(None)) => {}
                    Ok(Err(e)) => {
                        let (line, column) = position(&node);
                        warn!(
                            detector_id = %id,
                            file = %ctx.path().display(),
                            line,
                            column,
                            error = %e,
                            "detector failed"
                        );
                    }
                    Err(_) => {
                        let (line, column) = position(&node);
                        error!(
                            detector_id = %id,
                            file = %ctx.path().display(),
                            line,
                            column,
                            "detector panicked during detection"
                        );
                    }
                }
            }
        });

        calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiClientConfig;
    use crate::detectors::{create_default_registry, Detector};
    use crate::error::DetectError;
    use crate::source::{SourceLanguage, SourceModel, SourceParser};
    use crate::types::{CallSource, Confidence};
    use std::path::Path;
    use tree_sitter::Node;

    fn model(source: &str) -> SourceModel {
        let mut parser = SourceParser::new().unwrap();
        parser
            .parse_source(
                source.to_string(),
                SourceLanguage::TypeScript,
                Path::new("/project/a.ts"),
            )
            .unwrap()
    }

    struct FailingDetector {
        panic: bool,
    }

    impl Detector for FailingDetector {
        fn id(&self) -> &str {
            if self.panic {
                "panicky"
            } else {
                "broken"
            }
        }

        fn name(&self) -> &str {
            "Failing"
        }

        fn detect(
            &mut self,
            node: &Node,
            _ctx: &FileContext,
            _config: &ScanConfig,
        ) -> Result<Option<RawCall>, DetectError> {
            if node.kind() != "call_expression" {
                return Ok(None);
            }
            if self.panic {
                panic!("boom");
            }
            Err(DetectError::Other {
                detector: "broken".to_string(),
                message: "always fails".to_string(),
            })
        }
    }

    #[test]
    fn test_collects_from_all_detectors_in_order() {
        let source = "import axios from 'axios';\nfetch('/a');\naxios.get('/b');\n";
        let model = model(source);
        let config = ScanConfig::new("/project");
        let mut registry = create_default_registry(&config);

        let calls = DetectionVisitor::new(&mut registry, &config).visit(&FileContext::new(&model));

        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].source, CallSource::Fetch);
        assert_eq!(calls[0].line, 2);
        assert_eq!(calls[1].source, CallSource::Axios);
        assert_eq!(calls[1].line, 3);
    }

    #[test]
    fn test_allow_list_restricts_detectors() {
        let source = "import axios from 'axios';\nfetch('/a');\naxios.get('/b');\n";
        let model = model(source);
        let mut config = ScanConfig::new("/project");
        config.api_clients.push(ApiClientConfig::new("axios"));
        let mut registry = create_default_registry(&config);

        let calls = DetectionVisitor::new(&mut registry, &config).visit(&FileContext::new(&model));

        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].url, "/b");
    }

    #[test]
    fn test_failing_detectors_are_isolated() {
        let model = model("fetch('/a');\nfetch('/b');\n");
        let config = ScanConfig::new("/project");
        let mut registry = create_default_registry(&config);
        registry.register(Box::new(FailingDetector { panic: false }));
        registry.register(Box::new(FailingDetector { panic: true }));

        let calls = DetectionVisitor::new(&mut registry, &config).visit(&FileContext::new(&model));

        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.confidence == Confidence::High));
    }
}
