//! Response content classification and size-bounded summarization
//!
//! Bodies recorded on response events are bounded: JSON is reduced by
//! popping trailing top-level elements so the stored value stays
//! well-formed, everything else is cut with an explicit marker.

use serde::Serialize;
use serde_json::Value;

/// Marker appended to text content that was cut at the limit
pub const TRUNCATION_MARKER: &str = "... [TRUNCATED]";

/// A bounded rendition of response content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    #[serde(rename = "is_truncated")]
    pub truncated: bool,
    pub data: Value,
}

/// Classify a response by its Content-Type header
///
/// Matches in a fixed priority order and never silently discards an
/// unmatched type: anything unrecognized comes back as the raw
/// content-type string, or `redirect` when the response is one.
pub fn classify(content_type: Option<&str>, is_redirect: bool) -> String {
    let Some(content_type) = content_type else {
        return "unknown".to_string();
    };

    if content_type.contains("application/json") {
        return "json".to_string();
    }
    if content_type.contains("text/html") {
        return "html".to_string();
    }
    if content_type.contains("text/plain") {
        return "text".to_string();
    }
    if content_type.contains("application/octet-stream") {
        return "stream".to_string();
    }
    if content_type.contains("application/pdf") || content_type.contains("application/zip") {
        return "download".to_string();
    }

    if is_redirect {
        return "redirect".to_string();
    }

    content_type.to_string()
}

/// Reduce content to fit within `max_len` characters
///
/// For the `json` classification the content is parsed and, when its
/// compact re-serialization is oversized, trailing top-level elements are
/// popped one at a time until it fits or the structure is empty — the
/// result is always a well-formed value, never a cut JSON string. Content
/// that fails to parse falls back to the text path. Any other
/// classification is treated as text: oversized content is cut at the
/// limit (on a character boundary) and marked.
pub fn summarize(content: &str, classification: &str, max_len: usize) -> Summary {
    if classification != "json" {
        return summarize_text(content, max_len);
    }

    let Ok(mut decoded) = serde_json::from_str::<Value>(content) else {
        // fallback: treat as text
        return summarize_text(content, max_len);
    };

    if char_len(&serialized(&decoded)) <= max_len {
        return Summary {
            truncated: false,
            data: decoded,
        };
    }

    // Oversized: pop trailing top-level elements until the value fits or
    // empties. A bare scalar has nothing to pop and is kept whole.
    while char_len(&serialized(&decoded)) > max_len {
        if !pop_trailing(&mut decoded) {
            break;
        }
    }

    Summary {
        truncated: true,
        data: decoded,
    }
}

/// Remove the trailing top-level element of an array or object
///
/// Removing the last key of an object keeps the remaining key order
/// intact. Returns false when there is nothing left to remove.
fn pop_trailing(value: &mut Value) -> bool {
    match value {
        Value::Array(items) => items.pop().is_some(),
        Value::Object(map) => match map.keys().next_back().cloned() {
            Some(last) => map.remove(&last).is_some(),
            None => false,
        },
        _ => false,
    }
}

fn summarize_text(content: &str, max_len: usize) -> Summary {
    if char_len(content) > max_len {
        let cut: String = content.chars().take(max_len).collect();
        Summary {
            truncated: true,
            data: Value::String(format!("{}{}", cut, TRUNCATION_MARKER)),
        }
    } else {
        Summary {
            truncated: false,
            data: Value::String(content.to_string()),
        }
    }
}

fn serialized(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
