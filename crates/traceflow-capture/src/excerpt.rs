//! Fault record construction: message capping, source excerpts, frames
//!
//! Reads the faulting source file to attach a small annotated excerpt.
//! Everything here degrades silently — a fault record with no excerpt is
//! still worth persisting, and recording a fault must never itself raise.

use crate::hooks::{FaultReport, StackFrame};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Hard cap on recorded fault messages, in characters
pub const MAX_MESSAGE_LEN: usize = 500;

/// Lines of context kept on each side of the fault line
pub const EXCERPT_RADIUS: usize = 5;

/// Most recent stack frames kept on a fault record
pub const MAX_FRAMES: usize = 5;

/// Annotation appended to the fault line inside the excerpt
const FAULT_LINE_MARKER: &str = "    // <--- error line";

/// Build the context value of an exception event
pub fn fault_context(fault: &FaultReport) -> Value {
    json!({
        "message": cap_message(&fault.message),
        "kind": fault.kind,
        "file": fault.file,
        "line": fault.line,
        "line_preview": source_excerpt(&fault.file, fault.line),
        "trace": frames(&fault.frames),
    })
}

fn cap_message(message: &str) -> String {
    if message.chars().count() > MAX_MESSAGE_LEN {
        message.chars().take(MAX_MESSAGE_LEN).collect()
    } else {
        message.to_string()
    }
}

/// ±EXCERPT_RADIUS lines around the fault line, keyed by 1-based line
/// number, with the fault line annotated
///
/// An unreadable or out-of-range source file yields an empty excerpt.
fn source_excerpt(file: &str, line: u32) -> Value {
    let Ok(content) = std::fs::read_to_string(file) else {
        return json!({});
    };

    let lines: Vec<&str> = content.lines().collect();
    let fault_index = line.saturating_sub(1) as usize;

    let start = fault_index.saturating_sub(EXCERPT_RADIUS);
    let end = (fault_index + EXCERPT_RADIUS + 1).min(lines.len());

    let mut preview = BTreeMap::new();
    for (index, text) in lines.iter().enumerate().take(end).skip(start) {
        let mut text = text.to_string();
        if index == fault_index {
            text.push_str(FAULT_LINE_MARKER);
        }
        preview.insert((index + 1) as u32, text);
    }

    json!(preview)
}

fn frames(frames: &[StackFrame]) -> Value {
    Value::Array(
        frames
            .iter()
            .take(MAX_FRAMES)
            .map(|frame| {
                json!({
                    "file": frame.file,
                    "line": frame.line,
                    "function": frame.function,
                    "type": frame.type_name,
                })
            })
            .collect(),
    )
}
