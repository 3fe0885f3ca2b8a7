//! External helper-process backend.
//!
//! Some deployments keep the browser work in a separate script. The contract
//! is narrow: the helper is invoked with `[vin]` or `[vin, category]` as
//! positional arguments, prints a single JSON document on stdout and exits 0.
//! A non-zero exit is an upstream failure whose stderr becomes the error
//! message; malformed JSON on a clean exit is an invalid-output error.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::ScrapeError;
use crate::etka::{PartRecord, VehicleInfo};
use crate::traits::Extractor;

/// Default wall-clock limit for one helper invocation.
pub const DEFAULT_PROCESS_TIMEOUT_SECS: u64 = 120;

/// How to invoke the helper: `command` plus fixed leading `args`, with the
/// request's positional arguments appended.
#[derive(Debug, Clone)]
pub struct HelperConfig {
    pub command: String,
    pub args: Vec<String>,
    pub process_timeout: Duration,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            command: "node".to_string(),
            args: Vec::new(),
            process_timeout: Duration::from_secs(DEFAULT_PROCESS_TIMEOUT_SECS),
        }
    }
}

impl HelperConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_process_timeout(mut self, process_timeout: Duration) -> Self {
        self.process_timeout = process_timeout;
        self
    }
}

/// Extraction backend that shells out to a helper script per request.
pub struct HelperScraper {
    config: HelperConfig,
}

impl HelperScraper {
    pub fn new(config: HelperConfig) -> Self {
        Self { config }
    }

    async fn run(&self, request_args: &[&str]) -> Result<String, ScrapeError> {
        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args);
        cmd.args(request_args);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        debug!(command = %self.config.command, ?request_args, "invoking helper");
        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|e| {
            ScrapeError::Upstream(format!("failed to spawn {}: {e}", self.config.command))
        })?;

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut out) = stdout_pipe {
                let _ = out.read_to_end(&mut buf).await;
            }
            buf
        });

        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut err) = stderr_pipe {
                let _ = err.read_to_end(&mut buf).await;
            }
            buf
        });

        let status = match timeout(self.config.process_timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => return Err(ScrapeError::Io(e)),
            Err(_) => {
                let _ = child.kill().await;
                let _ = child.wait().await;
                return Err(ScrapeError::Upstream(format!(
                    "helper timed out after {:?}",
                    self.config.process_timeout
                )));
            }
        };

        let stdout = stdout_task.await.unwrap_or_else(|_| Vec::new());
        let stderr = stderr_task.await.unwrap_or_else(|_| Vec::new());

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            let detail = stderr.trim();
            return Err(ScrapeError::Upstream(if detail.is_empty() {
                format!("helper exited with {status}")
            } else {
                detail.to_string()
            }));
        }

        debug!("helper finished in {:?}", start.elapsed());
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

#[async_trait]
impl Extractor for HelperScraper {
    async fn find_part(&self, vin: &str, category: &str) -> Result<Option<PartRecord>, ScrapeError> {
        let raw = self.run(&[vin, category]).await?;
        decode_part(&raw)
    }

    async fn vehicle_info(&self, vin: &str) -> Result<VehicleInfo, ScrapeError> {
        let raw = self.run(&[vin]).await?;
        decode_vehicle(&raw)
    }

    async fn shutdown(&self) {}
}

/// Interprets helper output for a part lookup.
///
/// Accepts a bare part-number string, an array of numbers (first entry wins),
/// a full record object, or a `{"part": ...}` wrapper; `null` and no-match
/// shapes decode to `None`.
pub fn decode_part(raw: &str) -> Result<Option<PartRecord>, ScrapeError> {
    let value = parse_document(raw)?;
    Ok(part_from_value(&value))
}

/// Interprets helper output for a vehicle lookup. Accepts either a flat
/// key/value object or a `{"vehicleInfo": {...}}` wrapper.
pub fn decode_vehicle(raw: &str) -> Result<VehicleInfo, ScrapeError> {
    let value = parse_document(raw)?;
    let map = match &value {
        Value::Object(map) => match map.get("vehicleInfo") {
            Some(Value::Object(inner)) => inner,
            _ => map,
        },
        _ => {
            return Err(ScrapeError::InvalidOutput(
                "helper output is not a JSON object".to_string(),
            ))
        }
    };

    let pairs = map.iter().filter_map(|(key, value)| {
        if matches!(key.as_str(), "success" | "message" | "error" | "vin") {
            return None;
        }
        Some((key.clone(), value_to_string(value)))
    });
    Ok(VehicleInfo::from_pairs(pairs))
}

fn parse_document(raw: &str) -> Result<Value, ScrapeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ScrapeError::InvalidOutput(
            "helper emitted no output".to_string(),
        ));
    }
    serde_json::from_str(trimmed)
        .map_err(|e| ScrapeError::InvalidOutput(format!("helper output is not JSON: {e}")))
}

fn part_from_value(value: &Value) -> Option<PartRecord> {
    match value {
        Value::String(num) if !num.trim().is_empty() => Some(PartRecord::from_number(num.trim())),
        Value::Array(items) => items.iter().find_map(part_from_value),
        Value::Object(map) => {
            if let Some(num) = non_empty_str(map.get("num")) {
                let mut record = PartRecord::from_number(num);
                record.numn = map.get("numn").and_then(Value::as_str).map(str::to_string);
                record.title = map.get("title").and_then(Value::as_str).map(str::to_string);
                if let Some(text) = non_empty_str(map.get("text")) {
                    record.text = text.to_string();
                }
                Some(record)
            } else {
                non_empty_str(map.get("part")).map(PartRecord::from_number)
            }
        }
        _ => None,
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
