//! Service fronting an external helper process.
//!
//! The helper gets the VIN (and category, for part lookups) as positional
//! arguments and must print one JSON document on stdout. The demo renders
//! the outcome the way the HTTP layer would.
//!
//! Run with:
//! ```
//! cargo run --example helper_backend -- ./scraper.js <VIN> [category]
//! ```

use epc_scraper_service::{response, HelperConfig, ScrapeRequest, ServiceConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let usage = "usage: helper_backend <script> <VIN> [category]";
    let script = args.next().expect(usage);
    let vin = args.next().expect(usage);
    let category = args.next();

    let helper = HelperConfig::new("node").with_arg(script);
    let service = ServiceConfig::helper(helper).build();

    let request = match &category {
        Some(part) => ScrapeRequest::find_part(&vin, part),
        None => ScrapeRequest::vehicle_info(&vin),
    };

    let outcome = service.handle(request).await;
    let rendered = response::render(&outcome);

    println!("HTTP {}", rendered.status);
    println!(
        "{}",
        serde_json::to_string_pretty(&rendered.body).unwrap_or_default()
    );
}
