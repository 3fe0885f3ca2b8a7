//! Part lookup against the live catalogue.
//!
//! Warms the browser session up front and shuts down on Ctrl-C, the way a
//! long-running deployment would.
//!
//! Run with:
//! ```
//! ETKA_USER=... ETKA_PASS=... cargo run --example find_part -- <VIN> [category]
//! ```

use std::sync::Arc;

use epc_scraper_service::{EtkaConfig, EtkaScraper, Lookup, ScrapeRequest, ScraperService};
use tower::Service;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let username = std::env::var("ETKA_USER").expect("ETKA_USER not set");
    let password = std::env::var("ETKA_PASS").expect("ETKA_PASS not set");

    let mut args = std::env::args().skip(1);
    let vin = args
        .next()
        .unwrap_or_else(|| "WVWZZZ1KZAW123456".to_string());
    let category = args.next().unwrap_or_else(|| "compressor".to_string());

    println!("=== SuperETKA Part Lookup ===");
    println!("VIN: {}", vin);
    println!("Category: {}", category);
    println!();

    let scraper = EtkaScraper::new(EtkaConfig::new(username, password));
    println!("Warming up browser session...");
    if let Err(e) = scraper.warm_up().await {
        eprintln!("Warm-up failed: {}", e);
        return;
    }
    let mut service = ScraperService::new(Arc::new(scraper));

    tokio::select! {
        result = service.call(ScrapeRequest::find_part(&vin, &category)) => match result {
            Ok(reply) => match reply.outcome {
                Lookup::Part(Some(part)) => {
                    println!("Part number: {}", part.num);
                    if let Some(numn) = &part.numn {
                        println!("Normalized: {}", numn);
                    }
                    if let Some(title) = &part.title {
                        println!("Title: {}", title);
                    }
                    println!("Matched text: {}", part.text);
                }
                Lookup::Part(None) => println!("Part not found"),
                other => println!("Unexpected outcome: {:?}", other),
            },
            Err(e) => eprintln!("Error: {}", e),
        },
        _ = tokio::signal::ctrl_c() => {
            println!("Interrupted, shutting down");
        }
    }

    service.shutdown().await;
}
