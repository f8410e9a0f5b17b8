//! Traceflow Shipper - scheduled batch delivery to the ingestion endpoint
//!
//! Runs independently of any request: on a fixed interval it takes the
//! oldest lines from the backing file, posts them to the remote endpoint,
//! and removes exactly the delivered prefix. Failures leave the file
//! untouched so the same batch retries on the next run — at-least-once
//! delivery, with the remote expected to tolerate duplicates from a
//! shipper that crashed between sending and rotating.

use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, error, info};
use traceflow_core::errors::{PipelineError, Result};
use traceflow_core::PipelineConfig;
use traceflow_store::JsonlSink;

/// What one shipper run did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipOutcome {
    /// Nothing to do: shipping unconfigured, file absent, or file empty
    Idle,
    /// A batch was delivered and its prefix removed from the file
    Shipped { shipped: usize, remaining: usize },
}

/// Local record of shipping activity
///
/// Failures are counted here (and logged) rather than surfaced to any
/// request path.
#[derive(Debug, Default)]
pub struct ShipperStats {
    batches_shipped: AtomicU64,
    lines_shipped: AtomicU64,
    failures: AtomicU64,
}

impl ShipperStats {
    pub fn batches_shipped(&self) -> u64 {
        self.batches_shipped.load(Ordering::Relaxed)
    }

    pub fn lines_shipped(&self) -> u64 {
        self.lines_shipped.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

/// Scheduled task draining the backing file to the remote endpoint
pub struct BatchShipper {
    config: PipelineConfig,
    sink: JsonlSink,
    client: reqwest::Client,
    interval_secs: u64,
    stats: Arc<ShipperStats>,
}

impl BatchShipper {
    /// Create a shipper for the configured backing file and endpoint
    pub fn new(config: PipelineConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.ship_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        let sink = JsonlSink::new(&config.log_path);
        let interval_secs = config.ship_interval_secs;

        Self {
            config,
            sink,
            client,
            interval_secs,
            stats: Arc::new(ShipperStats::default()),
        }
    }

    /// Override the run interval
    pub fn with_interval(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    /// Handle to the shipping counters
    pub fn stats(&self) -> Arc<ShipperStats> {
        Arc::clone(&self.stats)
    }

    /// Start shipping on the configured schedule
    pub fn start(self) {
        tokio::spawn(async move {
            self.ship_loop().await;
        });
    }

    async fn ship_loop(&self) {
        let mut timer = interval(Duration::from_secs(self.interval_secs));

        info!(interval_secs = self.interval_secs, "batch shipper started");

        loop {
            timer.tick().await;

            match self.ship_once().await {
                Ok(ShipOutcome::Shipped { shipped, remaining }) => {
                    info!(shipped, remaining, "batch delivered");
                }
                Ok(ShipOutcome::Idle) => {}
                Err(err) => {
                    // Non-fatal: the same batch retries on the next tick
                    error!(error = %err, "batch delivery failed");
                }
            }
        }
    }

    /// Run one read → ship → rotate cycle
    ///
    /// On anything but HTTP 200/201 the file is left completely untouched.
    /// On success the file is re-read at rotation time, so lines appended
    /// by concurrent flushes after the initial read are preserved.
    pub async fn ship_once(&self) -> Result<ShipOutcome> {
        let (Some(endpoint), Some(token)) = (&self.config.endpoint, &self.config.api_token)
        else {
            debug!("shipping not configured, skipping run");
            return Ok(ShipOutcome::Idle);
        };

        let lines = self.sink.read_lines()?;
        if lines.is_empty() {
            return Ok(ShipOutcome::Idle);
        }

        let batch: Vec<&String> = lines.iter().take(self.config.ship_batch_size).collect();

        // Unparseable lines pass through as raw strings so the payload
        // stays positionally aligned with the file
        let logs: Vec<Value> = batch
            .iter()
            .map(|line| {
                serde_json::from_str(line).unwrap_or_else(|_| Value::String((*line).clone()))
            })
            .collect();

        let url = format!("{}/api/ingest", endpoint.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", token.expose()))
            .header("Accept", "application/json")
            .json(&json!({ "logs": logs }))
            .send()
            .await;

        match response {
            Ok(response) if matches!(response.status().as_u16(), 200 | 201) => {
                let remaining = self.sink.drop_prefix(batch.len())?;
                self.stats.batches_shipped.fetch_add(1, Ordering::Relaxed);
                self.stats
                    .lines_shipped
                    .fetch_add(batch.len() as u64, Ordering::Relaxed);
                Ok(ShipOutcome::Shipped {
                    shipped: batch.len(),
                    remaining,
                })
            }
            Ok(response) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                Err(PipelineError::IngestRejected { status, body })
            }
            Err(err) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                Err(PipelineError::IngestTransport {
                    message: err.to_string(),
                })
            }
        }
    }
}
