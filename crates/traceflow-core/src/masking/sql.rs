//! SQL-binding-to-column inference and redaction
//!
//! Query bindings arrive positionally; to mask them by column name the
//! SQL text is scanned left-to-right with one shared cursor over the
//! bindings. Pattern families in precedence order: predicates
//! (`col OP ?`, `BETWEEN`, `IN (...)`), then `SET col = ?`, then
//! `(col, ...) VALUES (?, ...)`. Placeholders whose column cannot be
//! inferred are keyed `unknown_<index>`.

use crate::masking::normalize_key;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;

static PREDICATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)([`"\w.]+)\s*(<=|>=|=|<|>|LIKE|BETWEEN|IN)\s*(\?|\()"#)
        .expect("predicate pattern is valid")
});

static IN_LIST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bIN\s*\(([^)]*)\)"#).expect("IN-list pattern is valid"));

static SET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)SET\s+[`"]?(\w+)[`"]?\s*=\s*\?"#).expect("SET pattern is valid")
});

static INSERT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\(([^)]+)\)\s*VALUES\s*\(([^)]*)\)"#).expect("VALUES pattern is valid")
});

/// Map positional SQL bindings onto inferred column names, redacting
/// values whose column matches the sensitive set
///
/// Returns an insertion-ordered column→value map. `BETWEEN` consumes two
/// placeholders as `<col>_from`/`<col>_to`; `IN (...)` consumes exactly as
/// many placeholders as `?` occurrences inside its parenthesis and yields
/// an array; bindings left over after every pattern family has run are
/// keyed `unknown_<positional-index>`.
pub fn mask_sql_bindings(
    sql: &str,
    bindings: &[Value],
    sensitive_keys: &[String],
    mask_token: &str,
) -> Map<String, Value> {
    let sensitive: HashSet<String> = sensitive_keys.iter().map(|k| normalize_key(k)).collect();

    let mut mapped = Map::new();
    let mut cursor = 0usize;

    let take = |col: &str, cursor: &mut usize| -> Option<Value> {
        if *cursor < bindings.len() {
            let value = mask_if_sensitive(col, &bindings[*cursor], &sensitive, mask_token);
            *cursor += 1;
            Some(value)
        } else {
            None
        }
    };

    // Predicates: col OP ? (BETWEEN and IN have their own consumption rules)
    for caps in PREDICATE_RE.captures_iter(sql) {
        let col = normalize_column(&caps[1]);
        let op = caps[2].to_uppercase();
        let marker = &caps[3];

        match op.as_str() {
            "BETWEEN" if marker == "?" => {
                if let Some(value) = take(&col, &mut cursor) {
                    mapped.insert(format!("{}_from", col), value);
                }
                if let Some(value) = take(&col, &mut cursor) {
                    mapped.insert(format!("{}_to", col), value);
                }
            }
            "IN" => {
                // Count the placeholders inside this IN's parenthesis
                let tail = &sql[caps.get(0).map(|m| m.start()).unwrap_or(0)..];
                if let Some(in_caps) = IN_LIST_RE.captures(tail) {
                    let placeholders = in_caps[1].matches('?').count();
                    let mut values = Vec::with_capacity(placeholders);
                    for _ in 0..placeholders {
                        match take(&col, &mut cursor) {
                            Some(value) => values.push(value),
                            None => break,
                        }
                    }
                    mapped.insert(col, Value::Array(values));
                }
            }
            _ if marker == "?" => {
                if let Some(value) = take(&col, &mut cursor) {
                    mapped.insert(col, value);
                }
            }
            // col = (subquery): nothing positional to consume
            _ => {}
        }
    }

    // UPDATE ... SET col = ?
    for caps in SET_RE.captures_iter(sql) {
        let col = normalize_column(&caps[1]);
        if let Some(value) = take(&col, &mut cursor) {
            mapped.insert(col, value);
        }
    }

    // INSERT INTO t (col1, col2, ...) VALUES (?, ?, ...)
    if let Some(caps) = INSERT_RE.captures(sql) {
        for raw in caps[1].split(',') {
            let col = normalize_column(raw);
            if let Some(value) = take(&col, &mut cursor) {
                mapped.insert(col, value);
            }
        }
    }

    // Whatever the patterns could not attribute keeps its positional index
    for index in cursor..bindings.len() {
        mapped.insert(format!("unknown_{}", index), bindings[index].clone());
    }

    mapped
}

/// True when the query touches one of the pipeline's excluded operational
/// tables (job queue, failed jobs, cache, sessions)
///
/// Capturing those would route the pipeline's own storage activity back
/// into the pipeline.
pub fn is_excluded_query(sql: &str, excluded_tables: &[String]) -> bool {
    let haystack = sql.to_lowercase();

    excluded_tables.iter().any(|table| {
        let table = table.to_lowercase();
        haystack.contains(&format!("\"{}\"", table))
            || haystack.contains(&format!("`{}`", table))
            || haystack.contains(&format!(" {} ", table))
    })
}

/// Normalize a column token: strip quoting, drop any table qualifier,
/// then apply the shared key normalization
fn normalize_column(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| *c != '`' && *c != '"').collect();
    let bare = cleaned.rsplit('.').next().unwrap_or(&cleaned);
    normalize_key(bare)
}

fn mask_if_sensitive(
    col: &str,
    value: &Value,
    sensitive: &HashSet<String>,
    mask_token: &str,
) -> Value {
    if sensitive.contains(col) {
        Value::String(mask_token.to_string())
    } else {
        value.clone()
    }
}
