//! Path navigation: resolve a dotted, bracket-indexed path against a tree.
//!
//! Paths look like `store.book[1].price`. The separator defaults to `.` and
//! can be swapped per locator instance. A leading `$.` root marker (or a bare
//! leading separator) is stripped before resolution. Misses degrade to `None`;
//! resolution never fails for a malformed path.

use std::io;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::{Error, Result};

static INDEX_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(\d+)\]").unwrap());

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Resolves paths against a parsed tree.
///
/// The separator is fixed for the lifetime of one locator. Each resolution
/// needs a fully materialized tree; re-resolving against an already-consumed
/// single-pass source is the caller's bug, not a runtime-checked condition.
#[derive(Debug, Clone)]
pub struct JsonLocator {
    separator: String,
}

impl Default for JsonLocator {
    fn default() -> Self {
        Self { separator: ".".into() }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl JsonLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locator with a non-default separator (a literal string, not a regex).
    pub fn with_separator(separator: impl Into<String>) -> Self {
        Self { separator: separator.into() }
    }

    /// Resolve `path` against `root`, returning the addressed node.
    ///
    /// Empty or whitespace-only paths, unknown keys, out-of-bounds indices,
    /// and descent through `null` all yield `None`.
    pub fn locate<'a>(&self, root: &'a Value, path: &str) -> Option<&'a Value> {
        if path.trim().is_empty() {
            return None;
        }
        let sep = self.separator.as_str();
        let mut p = path;
        let marker = format!("${sep}");
        if let Some(rest) = p.strip_prefix(&marker) {
            p = rest;
        }
        if let Some(rest) = p.strip_prefix(sep) {
            p = rest;
        }
        let segments: Vec<&str> = p.split(sep).collect();
        resolve(root, &segments)
    }

    /// Pretty-print the resolved node; `None` on a miss.
    pub fn print(&self, root: &Value, path: &str) -> Option<String> {
        let node = self.locate(root, path)?;
        serde_json::to_string_pretty(node).ok()
    }

    /// Pretty-print with a caller-chosen indent string; `None` on a miss.
    pub fn print_indent(&self, root: &Value, path: &str, indent: &str) -> Option<String> {
        let node = self.locate(root, path)?;
        let mut buf = Vec::new();
        let fmt = PrettyFormatter::with_indent(indent.as_bytes());
        let mut ser = Serializer::with_formatter(&mut buf, fmt);
        node.serialize(&mut ser).ok()?;
        String::from_utf8(buf).ok()
    }

    /// Write the pretty-printed node to a sink; writes nothing on a miss.
    pub fn write_pretty(
        &self,
        root: &Value,
        path: &str,
        out: impl io::Write,
        indent: Option<&str>,
    ) -> Result<()> {
        let Some(node) = self.locate(root, path) else {
            return Ok(());
        };
        let indent = indent.unwrap_or("  ");
        let fmt = PrettyFormatter::with_indent(indent.as_bytes());
        let mut ser = Serializer::with_formatter(out, fmt);
        node.serialize(&mut ser).map_err(Error::Encode)
    }
}

/// Resolve with the default `.` separator.
pub fn locate<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    JsonLocator::new().locate(root, path)
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve<'a>(node: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let (seg, rest) = segments.split_first()?;
    let key = INDEX_SUFFIX.replace_all(seg, "");
    match node {
        Value::Null => None,
        Value::Object(entries) => {
            // First key match wins; duplicate keys cannot survive parsing.
            for (k, v) in entries {
                if k != key.as_ref() {
                    continue;
                }
                if let (Value::Array(items), Some(i)) = (v, index_of(seg)) {
                    let element = items.get(i)?;
                    return if rest.is_empty() { Some(element) } else { resolve(element, rest) };
                }
                return if rest.is_empty() { Some(v) } else { resolve(v, rest) };
            }
            None
        }
        // Descent landed on a scalar: hand it back as-is, even when segments
        // remain (matching the resolution contract for over-long paths).
        Value::Bool(_) | Value::Number(_) | Value::String(_) => Some(node),
        Value::Array(_) => None,
    }
}

fn index_of(segment: &str) -> Option<usize> {
    let caps = INDEX_SUFFIX.captures(segment)?;
    caps.get(1)?.as_str().parse().ok()
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> Value {
        json!({
            "store": {
                "book": [
                    {"price": 10, "title": "A"},
                    {"price": 20, "title": "B"}
                ],
                "locate": "Tokyo"
            }
        })
    }

    #[test]
    fn resolves_indexed_path() {
        let t = store();
        assert_eq!(locate(&t, "store.book[1].price"), Some(&json!(20)));
        assert_eq!(locate(&t, "store.book[0].title"), Some(&json!("A")));
    }

    #[test]
    fn root_marker_and_leading_separator_are_stripped() {
        let t = store();
        assert_eq!(locate(&t, "$.store.locate"), Some(&json!("Tokyo")));
        assert_eq!(locate(&t, ".store.locate"), Some(&json!("Tokyo")));
    }

    #[test]
    fn empty_and_whitespace_paths_miss_without_panicking() {
        let t = store();
        assert_eq!(locate(&t, ""), None);
        assert_eq!(locate(&t, "   "), None);
    }

    #[test]
    fn out_of_bounds_index_is_a_miss_not_an_error() {
        let t = store();
        assert_eq!(locate(&t, "store.book[9].price"), None);
    }

    #[test]
    fn unknown_key_misses() {
        let t = store();
        assert_eq!(locate(&t, "store.magazine"), None);
        assert_eq!(locate(&t, "shop.book[0]"), None);
    }

    #[test]
    fn null_node_stops_resolution() {
        let t = json!({"a": null});
        assert_eq!(locate(&t, "a.b"), None);
        assert_eq!(locate(&t, "a"), Some(&Value::Null));
    }

    #[test]
    fn scalar_reached_mid_descent_is_returned() {
        let t = store();
        assert_eq!(locate(&t, "store.locate.extra"), Some(&json!("Tokyo")));
    }

    #[test]
    fn array_without_index_mid_path_misses() {
        let t = store();
        assert_eq!(locate(&t, "store.book.price"), None);
        // terminal array is returned whole
        assert!(locate(&t, "store.book").unwrap().is_array());
    }

    #[test]
    fn custom_separator() {
        let t = store();
        let loc = JsonLocator::with_separator("/");
        assert_eq!(loc.locate(&t, "store/book[1]/price"), Some(&json!(20)));
        assert_eq!(loc.locate(&t, "$/store/locate"), Some(&json!("Tokyo")));
    }

    #[test]
    fn repeated_resolution_is_deterministic() {
        let t = store();
        let fresh = store();
        let a = locate(&t, "store.book[1].price");
        let b = locate(&fresh, "store.book[1].price");
        assert_eq!(a, b);
    }

    #[test]
    fn print_is_none_on_miss_and_writes_nothing() {
        let t = store();
        let loc = JsonLocator::new();
        assert!(loc.print(&t, "store.nothing").is_none());
        let mut sink = Vec::new();
        loc.write_pretty(&t, "store.nothing", &mut sink, None).unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn print_indent_uses_custom_indent() {
        let t = json!({"k": {"v": 1}});
        let loc = JsonLocator::new();
        let s = loc.print_indent(&t, "k", "\t").unwrap();
        assert!(s.contains("\t\"v\""), "got {s:?}");
    }
}
