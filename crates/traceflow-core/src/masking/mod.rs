//! Recursive sensitive-value masking
//!
//! `mask` walks arbitrarily nested key/value data and replaces every value
//! whose normalized key is in the sensitive set. Cookie headers get their
//! own sub-rule: only the sensitive pairs inside the cookie string are
//! rewritten, everything else survives byte-for-byte.

pub mod sql;

pub use sql::mask_sql_bindings;

use serde_json::Value;
use std::collections::HashSet;

/// Normalize a key for comparison: trim, lowercase, hyphens to underscores
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('-', "_")
}

/// Redact sensitive values in a nested structure
///
/// Pure and non-mutating: returns a redacted copy. Keys are compared after
/// normalization. Keys normalizing to `cookie`/`set_cookie` are treated as
/// cookie strings and masked pair-wise; any other matching key has its
/// whole value (scalar or structure) replaced with the mask token. Object
/// and array values recurse; scalar non-matches pass through unchanged.
pub fn mask(data: &Value, sensitive_keys: &[String], mask_token: &str) -> Value {
    let normalized: HashSet<String> = sensitive_keys.iter().map(|k| normalize_key(k)).collect();
    mask_normalized(data, &normalized, mask_token)
}

fn mask_normalized(data: &Value, keys: &HashSet<String>, mask_token: &str) -> Value {
    match data {
        Value::Object(map) => {
            let mut masked = serde_json::Map::with_capacity(map.len());
            for (key, value) in map {
                let normalized_key = normalize_key(key);

                let replacement = if normalized_key == "cookie" || normalized_key == "set_cookie" {
                    mask_cookie_value(value, keys, mask_token)
                } else if keys.contains(&normalized_key) {
                    Value::String(mask_token.to_string())
                } else {
                    mask_normalized(value, keys, mask_token)
                };

                masked.insert(key.clone(), replacement);
            }
            Value::Object(masked)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| mask_normalized(item, keys, mask_token))
                .collect(),
        ),
        scalar => scalar.clone(),
    }
}

/// Cookie headers arrive either as one string or as a list of strings
fn mask_cookie_value(value: &Value, keys: &HashSet<String>, mask_token: &str) -> Value {
    match value {
        Value::String(cookie) => Value::String(mask_cookie_string(cookie, keys, mask_token)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| match item {
                    Value::String(cookie) => {
                        Value::String(mask_cookie_string(cookie, keys, mask_token))
                    }
                    other => other.clone(),
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Mask the sensitive pairs inside a `;`-separated cookie string
///
/// Pairs split on the first `=` only, so values containing `=` stay
/// intact. Only the value of a sensitive pair is rewritten; keys, pair
/// order, separators, and non-sensitive pairs are preserved verbatim.
fn mask_cookie_string(cookie: &str, keys: &HashSet<String>, mask_token: &str) -> String {
    cookie
        .split(';')
        .map(|part| match part.split_once('=') {
            Some((name, _)) if keys.contains(&normalize_key(name)) => {
                format!("{}={}", name, mask_token)
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}
