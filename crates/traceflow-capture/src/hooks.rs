//! Host notification boundary
//!
//! The host framework observes its own lifecycle (route matched, query
//! executed, fault reported, request handled) and fills these plain-data
//! snapshots for the recorder. Keeping the boundary at data rather than at
//! host event types means any adapter — or a test — can drive the capture
//! layer directly.

use serde_json::Value;

/// The inbound request as seen at route-match (or raw, at handled time,
/// when routing never completed)
#[derive(Debug, Clone, Default)]
pub struct RequestSnapshot {
    /// Path and query string relative to the application root
    pub uri: String,
    pub method: String,
    /// Resolved handler identifier, absent when routing never completed
    pub action: Option<String>,
    /// Middleware applied to the matched route
    pub middleware: Vec<String>,
    /// Session snapshot as key/value data
    pub session: Value,
    /// Query-string parameters
    pub params: Value,
    pub headers: Value,
    /// Parsed request body
    pub payload: Value,
}

/// One executed database query, as reported by the host
#[derive(Debug, Clone)]
pub struct QueryExecution {
    pub sql: String,
    /// Positional binding values, in placeholder order
    pub bindings: Vec<Value>,
    pub duration_ms: f64,
    /// Connection name for multi-database hosts
    pub connection: Option<String>,
}

/// One frame of a fault's stack, most recent first
#[derive(Debug, Clone, Default)]
pub struct StackFrame {
    pub file: Option<String>,
    pub line: Option<u32>,
    pub function: Option<String>,
    /// Enclosing type of the frame's function, when known
    pub type_name: Option<String>,
}

/// An unrecoverable fault reported during request handling
#[derive(Debug, Clone)]
pub struct FaultReport {
    pub message: String,
    /// Fault-type identifier (error type name, exception class, ...)
    pub kind: String,
    /// Source file the fault originated in
    pub file: String,
    /// 1-based line the fault originated at
    pub line: u32,
    pub frames: Vec<StackFrame>,
}

/// The outbound response at request completion
#[derive(Debug, Clone, Default)]
pub struct ResponseSnapshot {
    pub status: u16,
    pub is_redirect: bool,
    pub content_type: Option<String>,
    pub headers: Value,
    pub body: String,
}
