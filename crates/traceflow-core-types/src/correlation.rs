//! Correlation types for request tracking
//!
//! One TraceId is minted per inbound request and propagated to every event
//! the request produces, including same-cycle asynchronous continuations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response header carrying the request's trace id back to the caller
pub const TRACE_ID_HEADER: &str = "X-Trace-Id";

/// Opaque, time-sortable identifier correlating all events of one request
///
/// Backed by UUIDv7, so ids sort lexicographically in creation order.
/// Never reused across requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceId(String);

impl TraceId {
    /// Generate a new time-ordered TraceId using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (for deserialization)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-request trace-id holder
///
/// An explicitly owned instance replaces ambient global state: the adapter
/// creates one context per request and threads it through the capture
/// lifecycle. `get` lazily mints an id so late observers (a fault reported
/// before routing completed, for instance) still correlate.
#[derive(Debug, Clone, Default)]
pub struct TraceContext {
    current: Option<TraceId>,
}

impl TraceContext {
    /// Create an empty context with no id assigned yet
    pub fn new() -> Self {
        Self { current: None }
    }

    /// Mint a fresh TraceId and make it current
    pub fn generate(&mut self) -> TraceId {
        let id = TraceId::new();
        self.current = Some(id.clone());
        id
    }

    /// Return the current id, minting one if none exists
    pub fn get(&mut self) -> TraceId {
        match &self.current {
            Some(id) => id.clone(),
            None => self.generate(),
        }
    }

    /// Return the current id without minting
    pub fn current(&self) -> Option<&TraceId> {
        self.current.as_ref()
    }
}
