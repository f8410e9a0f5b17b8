//! Pipeline configuration schema and defaults
//!
//! How the configuration is loaded (file, environment, host container) is
//! the host's concern; this module only defines the shape, the defaults,
//! and builder methods for programmatic setup.

use serde::Deserialize;
use std::path::PathBuf;
use traceflow_core_types::Sensitive;

/// Configuration for the whole capture/store/ship pipeline
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Field names whose values are redacted, compared after normalization
    pub sensitive_keys: Vec<String>,
    /// Replacement written over redacted values
    pub mask_token: String,
    /// Backing file for not-yet-shipped events (newline-delimited JSON)
    pub log_path: PathBuf,
    /// In-memory events accumulated before a flush is forced
    pub buffer_capacity: usize,
    /// Operational tables whose queries are never captured
    pub excluded_tables: Vec<String>,
    /// Upper bound for summarized response content, in characters
    pub max_content_length: usize,
    /// Remote ingestion endpoint base URL; shipping is disabled when absent
    pub endpoint: Option<String>,
    /// Bearer token for the ingestion endpoint; shipping is disabled when absent
    pub api_token: Option<Sensitive<String>>,
    /// Seconds between shipper runs
    pub ship_interval_secs: u64,
    /// Oldest lines taken from the backing file per shipper run
    pub ship_batch_size: usize,
    /// Outbound request timeout for one shipping attempt, in seconds
    pub ship_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sensitive_keys: default_sensitive_keys(),
            mask_token: "******".to_string(),
            log_path: PathBuf::from("logs/traceflow.jsonl"),
            buffer_capacity: 50,
            excluded_tables: default_excluded_tables(),
            max_content_length: 10_000,
            endpoint: None,
            api_token: None,
            ship_interval_secs: 60,
            ship_batch_size: 100,
            ship_timeout_secs: 10,
        }
    }
}

fn default_sensitive_keys() -> Vec<String> {
    ["password", "password_confirmation", "secret", "token", "api_key", "authorization"]
        .map(String::from)
        .to_vec()
}

fn default_excluded_tables() -> Vec<String> {
    ["jobs", "failed_jobs", "cache", "sessions"]
        .map(String::from)
        .to_vec()
}

impl PipelineConfig {
    /// Create a configuration with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sensitive key list
    pub fn with_sensitive_keys(mut self, keys: Vec<String>) -> Self {
        self.sensitive_keys = keys;
        self
    }

    /// Set the backing file path
    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = path.into();
        self
    }

    /// Set the buffer flush threshold
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Set the remote ingestion endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the ingestion API token
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(Sensitive::new(token.into()));
        self
    }

    /// True when both the endpoint and the token are present
    pub fn shipping_configured(&self) -> bool {
        self.endpoint.is_some() && self.api_token.is_some()
    }
}
