//! HTTP-shaped rendering of scrape outcomes.
//!
//! Callers embedding the service behind a web framework get a status code and
//! a ready-to-serialize JSON body; the shapes here are stable and treated as a
//! wire contract by downstream consumers.

use serde_json::{json, Value};

use crate::error::ScrapeError;
use crate::service::{Lookup, ScrapeReply};

/// Status code plus JSON body for one finished request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Value,
}

impl HttpReply {
    fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}

/// Renders a successful scrape into its reply.
///
/// "Not found" outcomes are rendered as 404 with a message body rather than
/// an error: the extraction itself worked, the catalogue just had nothing.
pub fn render_reply(reply: &ScrapeReply) -> HttpReply {
    match &reply.outcome {
        Lookup::Part(Some(part)) => HttpReply::new(
            200,
            json!({
                "success": true,
                "part": part.num,
            }),
        ),
        Lookup::Part(None) => HttpReply::new(
            404,
            json!({
                "success": false,
                "message": "Part not found",
            }),
        ),
        Lookup::Vehicle(details) if !details.is_empty() => HttpReply::new(
            200,
            json!({
                "success": true,
                "vin": reply.vin,
                "vehicleInfo": details,
            }),
        ),
        Lookup::Vehicle(_) => HttpReply::new(
            404,
            json!({
                "success": false,
                "message": "No vehicle details found.",
            }),
        ),
    }
}

/// Renders a failed scrape into its reply.
pub fn render_error(error: &ScrapeError) -> HttpReply {
    let status = error.status_code();
    let body = match error {
        ScrapeError::Validation(_) => json!({
            "error": error.public_message(),
        }),
        _ => json!({
            "success": false,
            "error": error.public_message(),
        }),
    };
    HttpReply::new(status, body)
}

/// Renders either arm of a finished request.
pub fn render(outcome: &Result<ScrapeReply, ScrapeError>) -> HttpReply {
    match outcome {
        Ok(reply) => render_reply(reply),
        Err(error) => render_error(error),
    }
}
