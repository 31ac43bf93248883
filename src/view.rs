//! Leaf-level viewing with per-path date decoding.
//!
//! `JsonViewer` walks a tree and reports every scalar leaf as a
//! `(path, ViewValue)` pair. Textual leaves whose path matches a registered
//! rule are decoded into chrono date/time values; everything else passes
//! through with integral numbers widened to `i64` and fractional ones to
//! `f64`. Empty arrays surface as an explicit sentinel so they are not
//! silently invisible in the output.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde_json::Value;

use crate::error::Result;
use crate::parse::parse_str;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// A decoded leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewValue {
    Null,
    /// Emitted at an empty array's own path; non-empty arrays expand per
    /// index instead.
    EmptyArray,
    Bool(bool),
    Long(i64),
    Double(f64),
    Str(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleKind {
    Date,
    DateTime,
    Time,
}

#[derive(Debug, Clone)]
struct DateRule {
    kind: RuleKind,
    pattern: Regex,
    format: String,
}

/// Walks trees and reports scalar leaves, decoding dates where rules match.
///
/// Rules are tried in registration order against each textual leaf's path
/// (unanchored match); the first hit decides the chrono format. A leaf whose
/// text does not parse under the chosen format degrades to [`ViewValue::Str`]
/// rather than failing the walk.
#[derive(Debug, Clone, Default)]
pub struct JsonViewer {
    rules: Vec<DateRule>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl JsonViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode matching textual leaves as calendar dates.
    pub fn date_rule(&mut self, pattern: Regex, format: &str) -> &mut Self {
        self.rules.push(DateRule { kind: RuleKind::Date, pattern, format: format.into() });
        self
    }

    /// Decode matching textual leaves as date-times.
    pub fn datetime_rule(&mut self, pattern: Regex, format: &str) -> &mut Self {
        self.rules.push(DateRule { kind: RuleKind::DateTime, pattern, format: format.into() });
        self
    }

    /// Decode matching textual leaves as times of day.
    pub fn time_rule(&mut self, pattern: Regex, format: &str) -> &mut Self {
        self.rules.push(DateRule { kind: RuleKind::Time, pattern, format: format.into() });
        self
    }

    /// Report every leaf of `root` to `f` in document order.
    pub fn read(&self, root: &Value, mut f: impl FnMut(&str, ViewValue)) {
        self.walk_root(root, &mut |path, value| f(path, value));
    }

    /// Parse `src` and report every leaf to `f`.
    pub fn read_str(&self, src: &str, f: impl FnMut(&str, ViewValue)) -> Result<()> {
        let root = parse_str(src)?;
        self.read(&root, f);
        Ok(())
    }

    /// Like `read`, but only leaves whose path satisfies `pred` reach `f`.
    pub fn read_filtered(
        &self,
        root: &Value,
        pred: impl Fn(&str) -> bool,
        mut f: impl FnMut(&str, ViewValue),
    ) {
        self.walk_root(root, &mut |path, value| {
            if pred(path) {
                f(path, value);
            }
        });
    }

    /// One-shot iterator over `(path, value)` pairs in document order.
    ///
    /// The iterator owns its entries; restarting means calling `entries`
    /// again with a fresh source.
    pub fn entries(&self, root: &Value) -> Entries {
        let mut collected = Vec::new();
        self.walk_root(root, &mut |path, value| collected.push((path.to_owned(), value)));
        Entries { inner: collected.into_iter() }
    }

    /// Parse `src` and iterate its leaves.
    pub fn entries_str(&self, src: &str) -> Result<Entries> {
        let root = parse_str(src)?;
        Ok(self.entries(&root))
    }

    // any root walks: array roots emit `[i]`-prefixed paths, scalar roots
    // emit once at the empty path
    fn walk_root(&self, root: &Value, sink: &mut dyn FnMut(&str, ViewValue)) {
        self.walk(String::new(), root, sink);
    }

    fn walk(&self, path: String, node: &Value, sink: &mut dyn FnMut(&str, ViewValue)) {
        match node {
            Value::Null => sink(&path, ViewValue::Null),
            Value::Bool(b) => sink(&path, ViewValue::Bool(*b)),
            Value::Number(n) => sink(&path, view_number(n)),
            Value::String(s) => sink(&path, self.decode_text(&path, s)),
            Value::Array(items) if items.is_empty() => sink(&path, ViewValue::EmptyArray),
            Value::Array(items) => {
                for (i, element) in items.iter().enumerate() {
                    self.walk(format!("{path}[{i}]"), element, sink);
                }
            }
            Value::Object(entries) => {
                for (key, value) in entries {
                    let at = if path.is_empty() { key.clone() } else { format!("{path}.{key}") };
                    self.walk(at, value, sink);
                }
            }
        }
    }

    fn decode_text(&self, path: &str, text: &str) -> ViewValue {
        let Some(rule) = self.rules.iter().find(|r| r.pattern.is_match(path)) else {
            return ViewValue::Str(text.to_owned());
        };
        let decoded = match rule.kind {
            RuleKind::Date => NaiveDate::parse_from_str(text, &rule.format).map(ViewValue::Date),
            RuleKind::DateTime => {
                NaiveDateTime::parse_from_str(text, &rule.format).map(ViewValue::DateTime)
            }
            RuleKind::Time => NaiveTime::parse_from_str(text, &rule.format).map(ViewValue::Time),
        };
        decoded.unwrap_or_else(|_| ViewValue::Str(text.to_owned()))
    }
}

fn view_number(n: &serde_json::Number) -> ViewValue {
    if let Some(i) = n.as_i64() {
        return ViewValue::Long(i);
    }
    if let Some(u) = n.as_u64() {
        return ViewValue::Long(u as i64);
    }
    ViewValue::Double(n.as_f64().unwrap_or(f64::NAN))
}

/// Finite, consumed-by-value leaf iterator produced by [`JsonViewer::entries`].
#[derive(Debug)]
pub struct Entries {
    inner: std::vec::IntoIter<(String, ViewValue)>,
}

impl Iterator for Entries {
    type Item = (String, ViewValue);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Entries {}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn leaves_emit_in_document_order() {
        let root = json!({"a": 1, "b": {"c": 2.5, "d": true}, "e": null});
        let mut out = Vec::new();
        JsonViewer::new().read(&root, |p, v| out.push((p.to_owned(), v)));
        assert_eq!(
            out,
            vec![
                ("a".to_owned(), ViewValue::Long(1)),
                ("b.c".to_owned(), ViewValue::Double(2.5)),
                ("b.d".to_owned(), ViewValue::Bool(true)),
                ("e".to_owned(), ViewValue::Null),
            ]
        );
    }

    #[test]
    fn empty_array_emits_sentinel_nonempty_expands() {
        let root = json!({"none": [], "some": ["x"]});
        let mut out = Vec::new();
        JsonViewer::new().read(&root, |p, v| out.push((p.to_owned(), v)));
        assert_eq!(
            out,
            vec![
                ("none".to_owned(), ViewValue::EmptyArray),
                ("some[0]".to_owned(), ViewValue::Str("x".into())),
            ]
        );
    }

    #[test]
    fn date_rule_decodes_matching_path() {
        let root = json!({"order": {"shipday": "2023/04/05", "note": "2023/04/05"}});
        let mut viewer = JsonViewer::new();
        viewer.date_rule(Regex::new("shipday$").unwrap(), "%Y/%m/%d");
        let mut out = Vec::new();
        viewer.read(&root, |p, v| out.push((p.to_owned(), v)));
        let date = NaiveDate::from_ymd_opt(2023, 4, 5).unwrap();
        assert_eq!(out[0], ("order.shipday".to_owned(), ViewValue::Date(date)));
        // path without a matching rule stays textual
        assert_eq!(out[1].1, ViewValue::Str("2023/04/05".into()));
    }

    #[test]
    fn datetime_and_time_rules() {
        let root = json!({"at": "2023-04-05 06:07:08", "tick": "06:07"});
        let mut viewer = JsonViewer::new();
        viewer
            .datetime_rule(Regex::new("^at$").unwrap(), "%Y-%m-%d %H:%M:%S")
            .time_rule(Regex::new("^tick$").unwrap(), "%H:%M");
        let mut got = std::collections::BTreeMap::new();
        viewer.read(&root, |p, v| {
            got.insert(p.to_owned(), v);
        });
        let at = NaiveDate::from_ymd_opt(2023, 4, 5)
            .unwrap()
            .and_hms_opt(6, 7, 8)
            .unwrap();
        assert_eq!(got["at"], ViewValue::DateTime(at));
        assert_eq!(got["tick"], ViewValue::Time(NaiveTime::from_hms_opt(6, 7, 0).unwrap()));
    }

    #[test]
    fn unparseable_date_degrades_to_string() {
        let root = json!({"day": "not-a-date"});
        let mut viewer = JsonViewer::new();
        viewer.date_rule(Regex::new("day").unwrap(), "%Y/%m/%d");
        let mut out = Vec::new();
        viewer.read(&root, |_, v| out.push(v));
        assert_eq!(out, vec![ViewValue::Str("not-a-date".into())]);
    }

    #[test]
    fn first_matching_rule_wins() {
        let root = json!({"stamp": "2023/04/05"});
        let mut viewer = JsonViewer::new();
        viewer
            .date_rule(Regex::new("stamp").unwrap(), "%Y/%m/%d")
            .time_rule(Regex::new("stamp").unwrap(), "%H:%M");
        let mut out = Vec::new();
        viewer.read(&root, |_, v| out.push(v));
        let date = NaiveDate::from_ymd_opt(2023, 4, 5).unwrap();
        assert_eq!(out, vec![ViewValue::Date(date)]);
    }

    #[test]
    fn filtered_read_applies_predicate_per_path() {
        let root = json!({"keep": 1, "drop": 2, "deep": {"keep": 3}});
        let mut out = Vec::new();
        JsonViewer::new().read_filtered(
            &root,
            |p| p.ends_with("keep"),
            |p, v| out.push((p.to_owned(), v)),
        );
        assert_eq!(
            out,
            vec![
                ("keep".to_owned(), ViewValue::Long(1)),
                ("deep.keep".to_owned(), ViewValue::Long(3)),
            ]
        );
    }

    #[test]
    fn entries_iterator_is_finite_and_ordered() {
        let viewer = JsonViewer::new();
        let entries = viewer.entries_str(r#"{"a": 1, "b": [true, false]}"#).unwrap();
        let paths: Vec<String> = entries.map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["a", "b[0]", "b[1]"]);
    }

    #[test]
    fn array_root_emits_indexed_paths() {
        let root = json!([{"a": 1}, 2]);
        let mut out = Vec::new();
        JsonViewer::new().read(&root, |p, v| out.push((p.to_owned(), v)));
        assert_eq!(
            out,
            vec![
                ("[0].a".to_owned(), ViewValue::Long(1)),
                ("[1]".to_owned(), ViewValue::Long(2)),
            ]
        );
    }

    #[test]
    fn read_str_surfaces_parse_errors() {
        let viewer = JsonViewer::new();
        assert!(viewer.read_str("{broken", |_, _| {}).is_err());
    }
}
