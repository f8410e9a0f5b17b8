//! Traceflow Store - durable append-only event persistence
//!
//! The store is the only cross-context shared mutable resource in the
//! pipeline: a newline-delimited JSON file that capture appends to and
//! the shipper drains from. This crate provides:
//! - `AppendLog`: bounded in-memory buffer in front of the file
//! - `JsonlSink`: lock-serialized append-only writer and line reader
//! - `atomic_replace`: temp-then-rename file replacement for rotation

pub mod atomic;
pub mod buffer;
pub mod errors;
pub mod jsonl;

pub use atomic::atomic_replace;
pub use buffer::AppendLog;
pub use jsonl::JsonlSink;
