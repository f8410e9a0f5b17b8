//! Error taxonomy for the traceflow pipeline
//!
//! The taxonomy is deliberately small: per the pipeline's failure policy,
//! errors are classified just finely enough for the boundary code to decide
//! between "log and swallow" and "retry next tick" — a pipeline failure
//! must never fail the host request.

use thiserror::Error;

/// Result type alias using PipelineError
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Comprehensive error taxonomy for pipeline operations
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Filesystem failure in the store (open, lock, write, rename)
    #[error("I/O failure in {op}: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding/decoding failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The ingestion endpoint answered with a non-success status
    #[error("Ingestion endpoint rejected batch: HTTP {status}")]
    IngestRejected { status: u16, body: String },

    /// The shipping request never completed (connect, timeout, DNS)
    #[error("Ingestion transport failure: {message}")]
    IngestTransport { message: String },
}

impl PipelineError {
    /// True for outcomes the shipper retries on its next scheduled run
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::IngestRejected { .. } | PipelineError::IngestTransport { .. }
        )
    }
}
