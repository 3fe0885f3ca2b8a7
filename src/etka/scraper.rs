//! In-process extraction over shared Chromium sessions.

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::emulation::SetUserAgentOverrideParams;
use chromiumoxide::Page;
use tracing::{debug, info};

use crate::error::ScrapeError;
use crate::session::{ChromiumFactory, PageGuard, SessionManager};
use crate::traits::Extractor;

use super::matching;
use super::navigator::{NavState, Navigator};
use super::types::{EtkaConfig, PartRecord, VehicleInfo};

/// Session identities. Each keeps its own profile directory and cookies, so
/// part lookups and vehicle lookups never fight over one browser's state.
const PARTS_IDENTITY: &str = "superetka_parts";
const VEHICLE_IDENTITY: &str = "superetka_vehicle";

/// Catalogue scraper backed by long-lived browser sessions. Each request
/// opens a fresh tab; the browsers themselves survive across requests.
pub struct EtkaScraper {
    config: EtkaConfig,
    sessions: SessionManager<ChromiumFactory>,
}

impl EtkaScraper {
    pub fn new(config: EtkaConfig) -> Self {
        let sessions = SessionManager::new(ChromiumFactory::new(config.clone()));
        Self { config, sessions }
    }

    /// Launches both browser sessions ahead of the first request so the
    /// first caller does not pay the startup cost.
    pub async fn warm_up(&self) -> Result<(), ScrapeError> {
        self.sessions.acquire(PARTS_IDENTITY).await?;
        self.sessions.acquire(VEHICLE_IDENTITY).await?;
        Ok(())
    }

    async fn open_page(&self, identity: &str) -> Result<PageGuard, ScrapeError> {
        let session = self.sessions.acquire(identity).await?;
        let page = session.new_page().await?;
        self.prepare_page(&page).await;
        Ok(PageGuard::new(page))
    }

    async fn prepare_page(&self, page: &Page) {
        let params = SetUserAgentOverrideParams::builder()
            .user_agent(&self.config.user_agent)
            .build();
        match params {
            Ok(params) => {
                if let Err(e) = page.execute(params).await {
                    debug!("user agent override failed: {}", e);
                }
            }
            Err(e) => debug!("user agent params invalid: {}", e),
        }
    }

    async fn resolve_part(
        &self,
        vin: &str,
        category: &str,
    ) -> Result<Option<PartRecord>, ScrapeError> {
        let guard = self.open_page(PARTS_IDENTITY).await?;

        let part = {
            let mut nav = Navigator::new(guard.page(), &self.config, vin).with_category(category);
            nav.run_until(NavState::DetailsReady).await?;

            let cells = nav.collect_detail_cells().await?;
            debug!("inspecting {} detail cells", cells.len());
            let part = matching::find_part(&cells, category);
            nav.complete();
            part
        };
        guard.close().await;

        match &part {
            Some(record) => info!(vin, category, num = %record.num, "part resolved"),
            None => info!(vin, category, "part not found"),
        }
        Ok(part)
    }

    async fn resolve_vehicle(&self, vin: &str) -> Result<VehicleInfo, ScrapeError> {
        let guard = self.open_page(VEHICLE_IDENTITY).await?;

        let details = {
            let mut nav = Navigator::new(guard.page(), &self.config, vin);
            nav.run_until(NavState::ModalClosed).await?;

            let pairs = nav.collect_vehicle_pairs().await?;
            nav.complete();
            VehicleInfo::from_pairs(pairs)
        };
        guard.close().await;

        if details.is_empty() {
            info!(vin, "no vehicle details found");
        } else {
            info!(vin, fields = details.len(), "vehicle details extracted");
        }
        Ok(details)
    }
}

#[async_trait]
impl Extractor for EtkaScraper {
    async fn find_part(&self, vin: &str, category: &str) -> Result<Option<PartRecord>, ScrapeError> {
        self.resolve_part(vin, category).await
    }

    async fn vehicle_info(&self, vin: &str) -> Result<VehicleInfo, ScrapeError> {
        self.resolve_vehicle(vin).await
    }

    async fn shutdown(&self) {
        self.sessions.shutdown().await;
    }
}
