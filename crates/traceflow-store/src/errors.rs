//! Error helpers for traceflow-store
//!
//! Wraps the core PipelineError with store-specific constructors

use traceflow_core::errors::PipelineError;

pub use traceflow_core::errors::Result;

/// Create an IO error with operation context
pub fn io_error(op: &'static str, err: std::io::Error) -> PipelineError {
    PipelineError::Io { op, source: err }
}
