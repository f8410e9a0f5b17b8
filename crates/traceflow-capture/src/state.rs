//! Per-request correlation state
//!
//! Created at route-match, destroyed when the request-completion batch is
//! assembled. Nothing in here is shared across concurrent requests.

use serde_json::Value;
use std::time::Instant;
use traceflow_core_types::{TraceContext, TraceId};

/// Accumulator for one request's pending records
///
/// Holds the masked request record, the query records gathered while the
/// request was handled, and the last deduplicated fault record, until the
/// whole set is flushed as one ordered batch at response time.
#[derive(Debug)]
pub struct CaptureState {
    pub(crate) trace: TraceContext,
    pub(crate) started_at: Instant,
    pub(crate) request_context: Value,
    pub(crate) queries: Vec<Value>,
    pub(crate) fault: Option<Value>,
}

impl CaptureState {
    pub(crate) fn new(trace: TraceContext, request_context: Value) -> Self {
        Self {
            trace,
            started_at: Instant::now(),
            request_context,
            queries: Vec::new(),
            fault: None,
        }
    }

    /// The request's trace id, minted lazily if none was assigned yet
    pub fn trace_id(&mut self) -> TraceId {
        self.trace.get()
    }

    /// Queries recorded so far
    pub fn query_count(&self) -> usize {
        self.queries.len()
    }

    /// True once a fault record has been captured
    pub fn has_fault(&self) -> bool {
        self.fault.is_some()
    }
}
