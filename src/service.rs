//! Request orchestrator.
//!
//! Validates requests before any browser work starts, races every extraction
//! against a hard wall-clock budget, and turns backend outcomes into a stable
//! reply shape. The extraction backend is pluggable: in-process browser
//! navigation or an external helper process, chosen at construction.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use tokio::time::timeout;
use tower::Service;
use tracing::{info, warn};

use crate::error::ScrapeError;
use crate::etka::{PartRecord, VehicleInfo};
use crate::traits::Extractor;

/// Wall-clock budget for one request unless overridden.
pub const DEFAULT_BUDGET_SECS: u64 = 120;

/// What a request asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    FindPart { category: String },
    VehicleInfo,
}

/// One extraction request.
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub vin: String,
    pub operation: Operation,
    pub budget: Duration,
}

impl ScrapeRequest {
    pub fn find_part(vin: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            vin: vin.into(),
            operation: Operation::FindPart {
                category: category.into(),
            },
            budget: Duration::from_secs(DEFAULT_BUDGET_SECS),
        }
    }

    pub fn vehicle_info(vin: impl Into<String>) -> Self {
        Self {
            vin: vin.into(),
            operation: Operation::VehicleInfo,
            budget: Duration::from_secs(DEFAULT_BUDGET_SECS),
        }
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    fn validate(&self) -> Result<(), ScrapeError> {
        match &self.operation {
            Operation::FindPart { category } => {
                if self.vin.trim().is_empty() || category.trim().is_empty() {
                    return Err(ScrapeError::Validation(
                        "vin and part are required.".to_string(),
                    ));
                }
            }
            Operation::VehicleInfo => {
                if self.vin.trim().is_empty() {
                    return Err(ScrapeError::Validation("VIN is required.".to_string()));
                }
            }
        }
        Ok(())
    }
}

/// What an extraction produced. `Part(None)` and an empty `VehicleInfo` are
/// the success-shaped not-found outcomes.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Part(Option<PartRecord>),
    Vehicle(VehicleInfo),
}

/// Successful reply for one request.
#[derive(Debug, Clone)]
pub struct ScrapeReply {
    pub vin: String,
    pub outcome: Lookup,
    pub elapsed: Duration,
}

/// tower::Service fronting a pluggable extraction backend.
#[derive(Clone)]
pub struct ScraperService {
    extractor: Arc<dyn Extractor>,
}

impl ScraperService {
    pub fn new(extractor: Arc<dyn Extractor>) -> Self {
        Self { extractor }
    }

    /// Runs one request under its budget.
    ///
    /// When the budget elapses first, the in-flight extraction future is
    /// dropped (its page closes itself) and the caller gets a timeout error;
    /// the browser session stays up for later requests.
    pub async fn handle(&self, request: ScrapeRequest) -> Result<ScrapeReply, ScrapeError> {
        request.validate()?;

        let start = Instant::now();
        let vin = request.vin.clone();
        let budget = request.budget;
        let extractor = Arc::clone(&self.extractor);

        let work = async move {
            match request.operation {
                Operation::FindPart { category } => {
                    let category = category.trim().to_lowercase();
                    let part = extractor.find_part(&request.vin, &category).await?;
                    Ok::<_, ScrapeError>(Lookup::Part(part))
                }
                Operation::VehicleInfo => {
                    let details = extractor.vehicle_info(&request.vin).await?;
                    Ok(Lookup::Vehicle(details))
                }
            }
        };

        let outcome = match timeout(budget, work).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(vin = %vin, "request exceeded its {:?} budget", budget);
                return Err(ScrapeError::Timeout("Scraping Timeout".to_string()));
            }
        };

        let elapsed = start.elapsed();
        info!(vin = %vin, ?elapsed, "request completed");
        Ok(ScrapeReply {
            vin,
            outcome,
            elapsed,
        })
    }

    /// Closes the backend's long-lived resources.
    pub async fn shutdown(&self) {
        self.extractor.shutdown().await;
    }
}

impl Service<ScrapeRequest> for ScraperService {
    type Response = ScrapeReply;
    type Error = ScrapeError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: ScrapeRequest) -> Self::Future {
        info!(operation = ?request.operation, vin = %request.vin, "scrape request received");

        let service = self.clone();
        Box::pin(async move { service.handle(request).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::time::sleep;

    #[derive(Default)]
    struct MockExtractor {
        part: Option<PartRecord>,
        vehicle: Vec<(String, String)>,
        delay: Duration,
        fail_with: Option<String>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl MockExtractor {
        fn with_part(part: PartRecord) -> Self {
            Self {
                part: Some(part),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Extractor for MockExtractor {
        async fn find_part(
            &self,
            vin: &str,
            category: &str,
        ) -> Result<Option<PartRecord>, ScrapeError> {
            self.calls
                .lock()
                .unwrap()
                .push((vin.to_string(), category.to_string()));
            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            if let Some(message) = &self.fail_with {
                return Err(ScrapeError::Navigation(message.clone()));
            }
            Ok(self.part.clone())
        }

        async fn vehicle_info(&self, vin: &str) -> Result<VehicleInfo, ScrapeError> {
            self.calls
                .lock()
                .unwrap()
                .push((vin.to_string(), String::new()));
            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            Ok(VehicleInfo::from_pairs(self.vehicle.clone()))
        }

        async fn shutdown(&self) {}
    }

    fn sample_part() -> PartRecord {
        let mut part = PartRecord::from_number("64526956715");
        part.text = "A/C Compressor 64526956715".to_string();
        part
    }

    #[test]
    fn test_request_builders() {
        let req = ScrapeRequest::find_part("WVW1", "compressor")
            .with_budget(Duration::from_secs(30));
        assert_eq!(
            req.operation,
            Operation::FindPart {
                category: "compressor".to_string()
            }
        );
        assert_eq!(req.budget, Duration::from_secs(30));

        let req = ScrapeRequest::vehicle_info("WVW1");
        assert_eq!(req.operation, Operation::VehicleInfo);
        assert_eq!(req.budget, Duration::from_secs(DEFAULT_BUDGET_SECS));
    }

    #[tokio::test]
    async fn test_find_part_success_lowercases_category() {
        let extractor = Arc::new(MockExtractor::with_part(sample_part()));
        let service = ScraperService::new(extractor.clone());

        let reply = service
            .handle(ScrapeRequest::find_part("WVW1", "  Compressor "))
            .await
            .unwrap();

        match reply.outcome {
            Lookup::Part(Some(part)) => assert_eq!(part.num, "64526956715"),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(extractor.calls(), vec![("WVW1".to_string(), "compressor".to_string())]);
    }

    #[tokio::test]
    async fn test_find_part_not_found_is_success_shaped() {
        let service = ScraperService::new(Arc::new(MockExtractor::default()));

        let reply = service
            .handle(ScrapeRequest::find_part("WVW1", "compressor"))
            .await
            .unwrap();

        assert_eq!(reply.outcome, Lookup::Part(None));
    }

    #[tokio::test]
    async fn test_vehicle_info_success() {
        let extractor = Arc::new(MockExtractor {
            vehicle: vec![
                ("Model Year".to_string(), "2019".to_string()),
                ("Engine Code".to_string(), "CZPB".to_string()),
            ],
            ..MockExtractor::default()
        });
        let service = ScraperService::new(extractor);

        let reply = service
            .handle(ScrapeRequest::vehicle_info("WVW1"))
            .await
            .unwrap();

        match reply.outcome {
            Lookup::Vehicle(details) => {
                assert_eq!(details.get("model_year"), Some("2019"));
                assert_eq!(details.get("engine_code"), Some("CZPB"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_validation_rejects_before_any_extraction() {
        let extractor = Arc::new(MockExtractor::default());
        let service = ScraperService::new(extractor.clone());

        let err = service
            .handle(ScrapeRequest::find_part("", "compressor"))
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), "vin and part are required.");

        let err = service
            .handle(ScrapeRequest::find_part("WVW1", "   "))
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), "vin and part are required.");

        let err = service
            .handle(ScrapeRequest::vehicle_info(""))
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), "VIN is required.");

        assert!(extractor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_budget_timeout_yields_scraping_timeout() {
        let extractor = Arc::new(MockExtractor {
            part: Some(sample_part()),
            delay: Duration::from_secs(5),
            ..MockExtractor::default()
        });
        let service = ScraperService::new(extractor);

        let err = service
            .handle(
                ScrapeRequest::find_part("WVW1", "compressor")
                    .with_budget(Duration::from_millis(50)),
            )
            .await
            .unwrap_err();

        match err {
            ScrapeError::Timeout(message) => assert_eq!(message, "Scraping Timeout"),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_backend_errors_pass_through() {
        let extractor = Arc::new(MockExtractor {
            fail_with: Some("site unreachable".to_string()),
            ..MockExtractor::default()
        });
        let service = ScraperService::new(extractor);

        let err = service
            .handle(ScrapeRequest::find_part("WVW1", "compressor"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Navigation(_)));
    }

    #[tokio::test]
    async fn test_tower_service_call() {
        let extractor = Arc::new(MockExtractor::with_part(sample_part()));
        let mut service = ScraperService::new(extractor);

        futures::future::poll_fn(|cx| service.poll_ready(cx))
            .await
            .unwrap();
        let reply = service
            .call(ScrapeRequest::find_part("WVW1", "compressor"))
            .await
            .unwrap();

        assert!(matches!(reply.outcome, Lookup::Part(Some(_))));
    }
}
