//! Vehicle identification lookup against the live catalogue.
//!
//! Run with:
//! ```
//! ETKA_USER=... ETKA_PASS=... cargo run --example vehicle_info -- <VIN>
//! ```

use epc_scraper_service::{EtkaConfig, Lookup, ScrapeRequest, ServiceConfig};
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

    let vin = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "WVWZZZ1KZAW123456".to_string());

    println!("=== SuperETKA Vehicle Info ===");
    println!("VIN: {}", vin);
    println!();

    let config = EtkaConfig::new(username, password);
    let service = ServiceConfig::in_process(config).build();

    match service.handle(ScrapeRequest::vehicle_info(&vin)).await {
        Ok(reply) => match reply.outcome {
            Lookup::Vehicle(details) if !details.is_empty() => {
                println!("=== Vehicle ===");
                for (key, value) in details.iter() {
                    println!("{}: {}", key, value);
                }
            }
            Lookup::Vehicle(_) => println!("No vehicle details found."),
            other => println!("Unexpected outcome: {:?}", other),
        },
        Err(e) => eprintln!("Error: {}", e),
    }

    service.shutdown().await;
}
