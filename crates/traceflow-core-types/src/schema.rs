//! Canonical schema constants for the on-disk and wire formats
//!
//! These constants keep the event records, the shipper payload, and the
//! tests agreeing on field names.

// Top-level event record fields
pub const FIELD_TIME: &str = "time";
pub const FIELD_TRACE_ID: &str = "trace_id";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_LEVEL: &str = "level";
pub const FIELD_AUTH: &str = "auth";
pub const FIELD_CONTEXT: &str = "context";

// Request context fields
pub const FIELD_URI: &str = "uri";
pub const FIELD_METHOD: &str = "method";
pub const FIELD_ACTION: &str = "action";
pub const FIELD_MIDDLEWARE: &str = "middleware";
pub const FIELD_SESSION: &str = "session";
pub const FIELD_MEMORY: &str = "memory";
pub const FIELD_PARAMS: &str = "params";
pub const FIELD_HEADERS: &str = "headers";
pub const FIELD_PAYLOAD: &str = "payload";

// Response context fields
pub const FIELD_STATUS: &str = "status";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_TYPE: &str = "type";
pub const FIELD_RESPONSE: &str = "response";

// Shipper payload envelope
pub const PAYLOAD_LOGS: &str = "logs";
