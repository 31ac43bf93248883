//! Structural pattern learning, candidate checking, and sample generation.
//!
//! `JsonShape` learns the shape of a sample document as a map from
//! colon-joined paths (`c:d`, `xs:n`) to leaf kinds, then checks candidate
//! documents against it. Checking reports three disjoint path sets: matched,
//! unmatched (learned but not covered by the candidate), and ignored
//! (present in the candidate but never learned).
//!
//! The same learned sample also drives `format`, which renders a skeleton
//! document with every scalar replaced by a configurable default.

use indexmap::IndexMap;
use serde_json::{Number, Value};

use crate::error::{Error, Result};
use crate::parse::parse_str;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Leaf kind recorded per learned path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Null,
}

fn kind_of(node: &Value) -> Kind {
    match node {
        Value::Null => Kind::Null,
        Value::Bool(_) => Kind::Boolean,
        Value::Number(_) => Kind::Number,
        Value::String(_) => Kind::String,
        Value::Array(_) => Kind::Array,
        Value::Object(_) => Kind::Object,
    }
}

fn type_name(node: &Value) -> &'static str {
    match node {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A learned structural pattern plus the match state of its last check.
///
/// Learning is one-shot; the shape map never changes afterwards. `validate`
/// and `validate_value` reset the match state on entry, so each call reports
/// exactly one candidate.
#[derive(Debug, Clone)]
pub struct JsonShape {
    shape: IndexMap<String, Kind>,
    checked: IndexMap<String, bool>,
    ignored: IndexMap<String, Kind>,
    sample: Value,
    default_string: String,
    default_number: Number,
    default_bool: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// LEARNING
// ————————————————————————————————————————————————————————————————————————————

impl JsonShape {
    /// Learn the shape of a sample document given as text.
    pub fn learn(src: &str) -> Result<Self> {
        Self::from_value(parse_str(src)?)
    }

    /// Learn the shape of an already-parsed sample. The sample root must be
    /// an object.
    pub fn from_value(sample: Value) -> Result<Self> {
        let Value::Object(entries) = &sample else {
            return Err(Error::NotAnObject { found: type_name(&sample) });
        };
        let mut shape = IndexMap::new();
        for (key, value) in entries {
            scan(&mut shape, key.clone(), value);
        }
        Ok(Self {
            shape,
            checked: IndexMap::new(),
            ignored: IndexMap::new(),
            sample,
            default_string: String::new(),
            default_number: 0.into(),
            default_bool: false,
        })
    }

    /// The learned path→kind map.
    pub fn pattern_map(&self) -> &IndexMap<String, Kind> {
        &self.shape
    }
}

/// Records one entry per leaf and per array node. Non-empty objects carry no
/// entry of their own; empty objects do. Object elements of an array are
/// merged under the array's path, so every element contributes to one shared
/// element shape.
fn scan(shape: &mut IndexMap<String, Kind>, path: String, node: &Value) {
    match node {
        Value::Array(items) => {
            shape.insert(path.clone(), Kind::Array);
            for element in items {
                if let Value::Object(entries) = element {
                    for (key, value) in entries {
                        scan(shape, format!("{path}:{key}"), value);
                    }
                }
            }
        }
        Value::Object(entries) if entries.is_empty() => {
            shape.insert(path, Kind::Object);
        }
        Value::Object(entries) => {
            for (key, value) in entries {
                scan(shape, format!("{path}:{key}"), value);
            }
        }
        leaf => {
            shape.insert(path, kind_of(leaf));
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CHECKING
// ————————————————————————————————————————————————————————————————————————————

impl JsonShape {
    /// Check a candidate document given as text.
    ///
    /// Returns `true` when the candidate FAILS to cover the learned shape,
    /// i.e. at least one learned path is left unmatched, and `false` when
    /// every learned path matched. Unparseable input counts as a failure.
    pub fn validate(&mut self, src: &str) -> bool {
        match parse_str(src) {
            Ok(candidate) => self.validate_value(&candidate),
            Err(_) => {
                self.reset();
                true
            }
        }
    }

    /// Check an already-parsed candidate; same polarity as [`validate`].
    pub fn validate_value(&mut self, candidate: &Value) -> bool {
        self.reset();
        let Value::Object(entries) = candidate else {
            return true;
        };
        for (key, value) in entries {
            self.check(key.clone(), value);
        }
        self.has_unmatched()
    }

    /// Learned paths the last candidate did not cover.
    pub fn unmatched(&self) -> Vec<(String, Kind)> {
        self.shape
            .iter()
            .filter(|(path, _)| self.checked.get(*path) != Some(&true))
            .map(|(path, kind)| (path.clone(), *kind))
            .collect()
    }

    /// Learned paths the last candidate covered.
    pub fn matched(&self) -> Vec<(String, Kind)> {
        self.shape
            .iter()
            .filter(|(path, _)| self.checked.get(*path) == Some(&true))
            .map(|(path, kind)| (path.clone(), *kind))
            .collect()
    }

    /// Candidate paths absent from the learned shape, last check only.
    pub fn ignored(&self) -> Vec<(String, Kind)> {
        self.ignored.iter().map(|(path, kind)| (path.clone(), *kind)).collect()
    }

    fn reset(&mut self) {
        self.checked = self.shape.keys().map(|path| (path.clone(), false)).collect();
        self.ignored.clear();
    }

    fn has_unmatched(&self) -> bool {
        self.shape.keys().any(|path| self.checked.get(path) != Some(&true))
    }

    fn check(&mut self, path: String, node: &Value) {
        match node {
            Value::Array(items) => {
                self.mark(path.clone(), Kind::Array);
                for element in items {
                    if let Value::Object(entries) = element {
                        for (key, value) in entries {
                            self.check(format!("{path}:{key}"), value);
                        }
                    }
                }
            }
            Value::Object(entries) if entries.is_empty() => {
                self.mark(path, Kind::Object);
            }
            Value::Object(entries) => {
                if self.shape.get(&path) == Some(&Kind::Object) {
                    self.checked.insert(path.clone(), true);
                }
                for (key, value) in entries {
                    self.check(format!("{path}:{key}"), value);
                }
            }
            leaf => self.mark(path, kind_of(leaf)),
        }
    }

    fn mark(&mut self, path: String, kind: Kind) {
        match self.shape.get(&path) {
            Some(&learned) => {
                // loose-null policy: a null candidate satisfies a learned
                // String, Number, or Null slot
                let hit = learned == kind
                    || (kind == Kind::Null
                        && matches!(learned, Kind::String | Kind::Number | Kind::Null));
                if hit {
                    self.checked.insert(path, true);
                }
            }
            None => {
                self.ignored.insert(path, kind);
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SAMPLE GENERATION
// ————————————————————————————————————————————————————————————————————————————

impl JsonShape {
    pub fn set_default_string(mut self, value: impl Into<String>) -> Self {
        self.default_string = value.into();
        self
    }

    pub fn set_default_number(mut self, value: impl Into<Number>) -> Self {
        self.default_number = value.into();
        self
    }

    pub fn set_default_bool(mut self, value: bool) -> Self {
        self.default_bool = value;
        self
    }

    /// Render a skeleton document from the learning sample: scalars become
    /// the configured defaults, arrays keep only their first object element
    /// (scalar-only arrays render empty, matching the learned shape, which
    /// never records scalar elements), empty objects stay `{}`, nulls stay
    /// null.
    pub fn format(&self) -> String {
        let skeleton = self.rebuild(&self.sample);
        serde_json::to_string_pretty(&skeleton).unwrap_or_default()
    }

    fn rebuild(&self, node: &Value) -> Value {
        match node {
            Value::Null => Value::Null,
            Value::Bool(_) => Value::Bool(self.default_bool),
            Value::Number(_) => Value::Number(self.default_number.clone()),
            Value::String(_) => Value::String(self.default_string.clone()),
            Value::Array(items) => match items.iter().find(|e| e.is_object()) {
                Some(element) => Value::Array(vec![self.rebuild(element)]),
                None => Value::Array(Vec::new()),
            },
            Value::Object(entries) => Value::Object(
                entries.iter().map(|(key, value)| (key.clone(), self.rebuild(value))).collect(),
            ),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
