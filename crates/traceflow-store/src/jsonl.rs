//! Append-only newline-delimited JSON sink
//!
//! One `Event` per line, UTF-8, compact encoding. Appends run under an
//! exclusive advisory lock so concurrent writers (other worker processes,
//! the shipper's rotation) serialize on the file; the lock is held only
//! for the duration of one write, never across anything slow.

use crate::atomic::atomic_replace;
use crate::errors::{io_error, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use traceflow_core_types::Event;

/// Lock-serialized writer/reader for the backing event file
#[derive(Debug, Clone)]
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a sink for the given backing file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append events as single-line JSON records
    ///
    /// Strictly additive: never reads or rewrites prior content. The
    /// exclusive lock is released when the file handle drops, error paths
    /// included.
    pub fn append(&self, events: &[Event]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let file = self.open_locked()?;

        let mut writer = BufWriter::new(&file);
        for event in events {
            serde_json::to_writer(&mut writer, event)?;
            writer.write_all(b"\n").map_err(|e| io_error("append_event", e))?;
        }
        writer.flush().map_err(|e| io_error("flush_events", e))?;
        drop(writer);

        let _ = FileExt::unlock(&file);

        tracing::debug!(count = events.len(), path = %self.path.display(), "events appended");
        Ok(())
    }

    /// Append a single event
    pub fn append_one(&self, event: &Event) -> Result<()> {
        self.append(std::slice::from_ref(event))
    }

    /// All non-empty lines of the backing file, in file order
    ///
    /// A missing file reads as empty.
    pub fn read_lines(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|e| io_error("read_log", e))?;

        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(String::from)
            .collect())
    }

    /// Atomically drop a shipped prefix from the backing file
    ///
    /// Re-reads the file under the exclusive lock rather than trusting any
    /// earlier read, so lines appended by concurrent flushes after the
    /// caller's snapshot are preserved. Returns the number of lines left.
    pub fn drop_prefix(&self, prefix_len: usize) -> Result<usize> {
        let file = self.open_locked()?;

        let lines = self.read_lines()?;
        let remaining: Vec<&str> = lines.iter().skip(prefix_len).map(String::as_str).collect();

        let mut content = remaining.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        atomic_replace(&self.path, content.as_bytes())?;

        let _ = FileExt::unlock(&file);

        tracing::debug!(
            dropped = lines.len() - remaining.len(),
            remaining = remaining.len(),
            "backing file rotated"
        );
        Ok(remaining.len())
    }

    fn open_locked(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_error("create_log_dir", e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| io_error("open_log", e))?;

        file.lock_exclusive().map_err(|e| io_error("lock_log", e))?;
        Ok(file)
    }
}
