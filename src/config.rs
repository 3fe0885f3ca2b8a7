//! Service construction.
//!
//! Picks which extraction strategy backs the service: in-process browser
//! navigation, or an external helper process that prints JSON on stdout.
//! Both strategies serve the same two operations, so swapping one for the
//! other never changes the caller-facing contract.

use std::sync::Arc;

use crate::etka::{EtkaConfig, EtkaScraper};
use crate::helper::{HelperConfig, HelperScraper};
use crate::service::ScraperService;
use crate::traits::Extractor;

/// Extraction strategy the service runs on.
#[derive(Debug, Clone)]
pub enum Backend {
    /// Drive a headless browser inside this process.
    InProcess(EtkaConfig),
    /// Delegate to an external process and decode its stdout.
    Helper(HelperConfig),
}

/// Top-level configuration for one service instance.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub backend: Backend,
}

impl ServiceConfig {
    pub fn in_process(config: EtkaConfig) -> Self {
        Self {
            backend: Backend::InProcess(config),
        }
    }

    pub fn helper(config: HelperConfig) -> Self {
        Self {
            backend: Backend::Helper(config),
        }
    }

    /// Builds the service with the configured backend.
    pub fn build(self) -> ScraperService {
        let extractor: Arc<dyn Extractor> = match self.backend {
            Backend::InProcess(config) => Arc::new(EtkaScraper::new(config)),
            Backend::Helper(config) => Arc::new(HelperScraper::new(config)),
        };
        ScraperService::new(extractor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ScrapeRequest;

    #[tokio::test]
    async fn test_in_process_backend_builds() {
        let service =
            ServiceConfig::in_process(EtkaConfig::new("user", "pass").with_headless(true)).build();

        // No browser is launched until a request runs; validation still works.
        let err = service
            .handle(ScrapeRequest::vehicle_info(""))
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), "VIN is required.");
    }

    #[tokio::test]
    async fn test_helper_backend_builds_and_runs() {
        let helper = HelperConfig::new("sh").with_args([
            "-c",
            r#"printf '{"success": true, "part": "1K0820803"}'"#,
            "helper",
        ]);
        let service = ServiceConfig::helper(helper).build();

        let reply = service
            .handle(ScrapeRequest::find_part("WVW1", "compressor"))
            .await
            .unwrap();
        match reply.outcome {
            crate::service::Lookup::Part(Some(part)) => assert_eq!(part.num, "1K0820803"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
