use async_trait::async_trait;

use crate::error::ScrapeError;
use crate::etka::{PartRecord, VehicleInfo};

/// Extraction backend driven by the orchestrator.
///
/// The in-process implementation is [`crate::etka::EtkaScraper`]; helper
/// processes are fronted by [`crate::helper::HelperScraper`]. Both resolve a
/// part number for a VIN or read the vehicle summary, and both report "no
/// such part/vehicle" as `Ok(None)` rather than an error.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Looks up the part number for `category` on the vehicle `vin`.
    async fn find_part(&self, vin: &str, category: &str) -> Result<Option<PartRecord>, ScrapeError>;

    /// Reads the vehicle summary for `vin`. An empty result means the
    /// catalogue had no details for that VIN.
    async fn vehicle_info(&self, vin: &str) -> Result<VehicleInfo, ScrapeError>;

    /// Releases any long-lived resources. Called once at shutdown.
    async fn shutdown(&self);
}
