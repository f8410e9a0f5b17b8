//! Bounded in-memory event buffer in front of the backing file
//!
//! Events accumulate per process and are flushed as one locked append
//! when the buffer reaches capacity or a flush is forced at request end.
//! Per the pipeline's failure policy a flush is attempted once: the buffer
//! is drained whether or not the write succeeds, so a storage fault never
//! re-queues work onto the request path.

use crate::errors::Result;
use crate::jsonl::JsonlSink;
use std::sync::Mutex;
use traceflow_core_types::Event;

/// Buffered, lock-serialized front of the append-only event log
///
/// An explicitly owned instance with a defined lifecycle: create one at
/// process start, share it behind an `Arc`, flush at request boundaries.
#[derive(Debug)]
pub struct AppendLog {
    sink: JsonlSink,
    capacity: usize,
    pending: Mutex<Vec<Event>>,
}

impl AppendLog {
    /// Create an append log writing through to the given sink
    pub fn new(sink: JsonlSink, capacity: usize) -> Self {
        Self {
            sink,
            capacity,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// The underlying sink
    pub fn sink(&self) -> &JsonlSink {
        &self.sink
    }

    /// Buffer one event, flushing when the buffer reaches capacity
    pub fn add(&self, event: Event) -> Result<()> {
        let batch = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.push(event);
            if pending.len() >= self.capacity {
                std::mem::take(&mut *pending)
            } else {
                return Ok(());
            }
        };

        self.sink.append(&batch)
    }

    /// Buffer a batch of events as one logical unit, then flush
    ///
    /// This is the request-completion hand-off: the whole lifecycle batch
    /// lands in file order.
    pub fn add_batch(&self, events: Vec<Event>) -> Result<()> {
        {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.extend(events);
        }
        self.flush()
    }

    /// Write out everything pending; no-op when the buffer is empty
    pub fn flush(&self) -> Result<()> {
        let batch = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            if pending.is_empty() {
                return Ok(());
            }
            std::mem::take(&mut *pending)
        };

        self.sink.append(&batch)
    }

    /// True when events are buffered but not yet on disk
    pub fn has_pending(&self) -> bool {
        !self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use traceflow_core_types::{EventKind, Level, TraceId};

    fn event(n: u32) -> Event {
        Event::new(
            TraceId::new(),
            EventKind::Query,
            Level::Info,
            None,
            json!({"n": n}),
        )
    }

    #[test]
    fn test_add_buffers_until_capacity() {
        let dir = TempDir::new().unwrap();
        let log = AppendLog::new(JsonlSink::new(dir.path().join("log.jsonl")), 3);

        log.add(event(0)).unwrap();
        log.add(event(1)).unwrap();
        assert!(log.has_pending());
        assert!(log.sink().read_lines().unwrap().is_empty());

        // Third event reaches capacity and triggers the flush
        log.add(event(2)).unwrap();
        assert!(!log.has_pending());
        assert_eq!(log.sink().read_lines().unwrap().len(), 3);
    }

    #[test]
    fn test_flush_empty_is_noop() {
        let dir = TempDir::new().unwrap();
        let log = AppendLog::new(JsonlSink::new(dir.path().join("log.jsonl")), 50);

        log.flush().unwrap();
        assert!(!log.sink().path().exists());
    }

    #[test]
    fn test_flush_drains_buffer() {
        let dir = TempDir::new().unwrap();
        let log = AppendLog::new(JsonlSink::new(dir.path().join("log.jsonl")), 50);

        log.add(event(0)).unwrap();
        log.flush().unwrap();

        assert!(!log.has_pending());
        assert_eq!(log.sink().read_lines().unwrap().len(), 1);

        // A second flush writes nothing more
        log.flush().unwrap();
        assert_eq!(log.sink().read_lines().unwrap().len(), 1);
    }

    #[test]
    fn test_add_batch_preserves_order() {
        let dir = TempDir::new().unwrap();
        let log = AppendLog::new(JsonlSink::new(dir.path().join("log.jsonl")), 50);

        log.add_batch(vec![event(0), event(1), event(2)]).unwrap();

        let lines = log.sink().read_lines().unwrap();
        assert_eq!(lines.len(), 3);
        for (i, line) in lines.iter().enumerate() {
            let parsed: Event = serde_json::from_str(line).unwrap();
            assert_eq!(parsed.context, json!({"n": i}));
        }
    }

    #[test]
    fn test_failed_flush_does_not_requeue() {
        let dir = TempDir::new().unwrap();
        // A directory at the sink path makes the append fail
        let path = dir.path().join("log.jsonl");
        std::fs::create_dir(&path).unwrap();

        let log = AppendLog::new(JsonlSink::new(&path), 50);
        log.add(event(0)).unwrap();

        assert!(log.flush().is_err());
        // Attempted once, then dropped
        assert!(!log.has_pending());
    }
}
