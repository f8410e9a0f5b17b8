//! The persisted event model
//!
//! Every observed moment of a request's lifecycle becomes one `Event`,
//! immutable once constructed. Events are serialized as single-line JSON
//! records on disk and shipped in batches to the ingestion endpoint.

use crate::correlation::TraceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of lifecycle moment an event records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Request,
    Response,
    Query,
    Exception,
}

impl EventKind {
    /// Stable wire name for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Request => "request",
            EventKind::Response => "response",
            EventKind::Query => "query",
            EventKind::Exception => "exception",
        }
    }
}

/// Severity attached to an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl Level {
    /// Derive the level from a final HTTP status code
    ///
    /// 5xx is an error, 4xx a warning, anything else informational.
    pub fn from_status(status: u16) -> Self {
        if status >= 500 {
            Level::Error
        } else if status >= 400 {
            Level::Warning
        } else {
            Level::Info
        }
    }

    /// Stable wire name for this level
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }
}

/// Authenticated principal attached to events, as reported by the host
///
/// The id is kept as a raw JSON value because hosts disagree on integer
/// versus string identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AuthPrincipal {
    pub id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// One structured, timestamped record of the request lifecycle
///
/// Field order here is serialization order on disk and on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub time: DateTime<Utc>,
    pub trace_id: TraceId,
    #[serde(rename = "event")]
    pub kind: EventKind,
    pub level: Level,
    pub auth: Option<AuthPrincipal>,
    pub context: serde_json::Value,
}

impl Event {
    /// Construct an event stamped with the current time
    pub fn new(
        trace_id: TraceId,
        kind: EventKind,
        level: Level,
        auth: Option<AuthPrincipal>,
        context: serde_json::Value,
    ) -> Self {
        // Exceptions are always errors regardless of the request's level
        let level = if kind == EventKind::Exception {
            Level::Error
        } else {
            level
        };

        Self {
            time: Utc::now(),
            trace_id,
            kind,
            level,
            auth,
            context,
        }
    }
}
