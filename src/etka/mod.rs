//! SuperETKA catalogue extraction.
//!
//! Drives the four-step part lookup (login, VIN search, category menu,
//! listing row) and the vehicle identification table read over a shared
//! browser session.

mod matching;
mod navigator;
mod scraper;
mod types;

pub use scraper::EtkaScraper;
pub use types::{CandidateRow, DetailCell, EtkaConfig, PartRecord, VehicleInfo};
