//! Core types shared across the traceflow pipeline
//!
//! This crate provides the foundational types every other pipeline crate
//! builds on:
//!
//! - **Correlation types**: TraceId, TraceContext, the trace-id response header
//! - **Event model**: Event, EventKind, Level, AuthPrincipal
//! - **Sensitive data**: Sensitive<T> marker for automatic redaction
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod event;
pub mod schema;
pub mod sensitive;

pub use correlation::{TraceContext, TraceId, TRACE_ID_HEADER};
pub use event::{AuthPrincipal, Event, EventKind, Level};
pub use sensitive::Sensitive;
