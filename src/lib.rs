//! VIN-driven extraction service for the SuperETKA parts catalogue.
//!
//! - Look up an air-conditioning part number (compressor, condenser,
//!   evaporator, expansion valve) for a VIN
//! - Read the vehicle identification table for a VIN
//!
//! Extraction runs either in-process over a shared headless browser, or
//! through an external helper process that prints JSON on stdout. Both
//! backends sit behind the same `tower::Service`.
//!
//! # Part lookup
//!
//! ```rust,ignore
//! use epc_scraper_service::{ScrapeRequest, ServiceConfig};
//! use epc_scraper_service::etka::EtkaConfig;
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = EtkaConfig::from_env();
//!     let mut service = ServiceConfig::in_process(config).build();
//!
//!     let request = ScrapeRequest::find_part("WVWZZZ1KZAW123456", "compressor");
//!     let reply = service.call(request).await.unwrap();
//!     println!("outcome: {:?}", reply.outcome);
//! }
//! ```
//!
//! # Helper-process backend
//!
//! ```rust,ignore
//! use epc_scraper_service::{HelperConfig, ScrapeRequest, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let helper = HelperConfig::new("node").with_arg("scraper.js");
//!     let service = ServiceConfig::helper(helper).build();
//!
//!     let reply = service
//!         .handle(ScrapeRequest::vehicle_info("WVWZZZ1KZAW123456"))
//!         .await
//!         .unwrap();
//!     println!("outcome: {:?}", reply.outcome);
//! }
//! ```

pub mod config;
pub mod error;
pub mod etka;
pub mod helper;
pub mod response;
pub mod service;
pub mod session;
pub mod traits;

// Re-export the main types.
pub use config::{Backend, ServiceConfig};
pub use error::ScrapeError;
pub use etka::{EtkaConfig, EtkaScraper, PartRecord, VehicleInfo};
pub use helper::{HelperConfig, HelperScraper};
pub use response::{render, render_error, render_reply, HttpReply};
pub use service::{Lookup, Operation, ScrapeReply, ScrapeRequest, ScraperService};
pub use session::{BrowserSession, ChromiumFactory, PageGuard, SessionFactory, SessionManager};
pub use traits::Extractor;
