//! Tree flattening and path-keyed search.
//!
//! One depth-first walk powers three surfaces: `flatten` collects every leaf
//! into an ordered path→value map, `PathSearch` fires registered handlers as
//! the walk passes their paths, and `FlatMap::search` resolves an ordered key
//! list back against the flattened structure.
//!
//! Paths use dotted keys with `[i]` index suffixes: `b.c`, `items[2].name`.

use indexmap::IndexMap;
use serde_json::{Number, Value};

use crate::error::{Error, Result};

// ————————————————————————————————————————————————————————————————————————————
// NUMBER COERCION
// ————————————————————————————————————————————————————————————————————————————

/// How numeric literals are narrowed when the walk records them.
///
/// Closed set; the single coercion site matches exhaustively. With no policy
/// the raw literal is kept as [`FlatValue::Number`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberPolicy {
    Integer,
    Long,
    Double,
    /// Keep the literal as text, digits intact.
    Decimal,
    /// Keep the raw `serde_json::Number` untouched.
    Number,
    Short,
    Float,
    Byte,
    /// First character of the literal text.
    Character,
}

/// A recorded leaf or node payload.
#[derive(Debug, Clone, PartialEq)]
pub enum FlatValue {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Short(i16),
    Byte(i8),
    Float(f32),
    Double(f64),
    Decimal(String),
    Number(Number),
    Char(char),
    Str(String),
    /// The whole array node, recorded at the array's own path.
    Array(Value),
    /// An array element object, handed raw to search handlers.
    Object(Value),
}

pub(crate) fn coerce_number(n: &Number, policy: Option<NumberPolicy>) -> FlatValue {
    let Some(policy) = policy else {
        return FlatValue::Number(n.clone());
    };
    match policy {
        NumberPolicy::Number => FlatValue::Number(n.clone()),
        NumberPolicy::Decimal => FlatValue::Decimal(n.to_string()),
        NumberPolicy::Character => FlatValue::Char(n.to_string().chars().next().unwrap_or('0')),
        NumberPolicy::Integer => FlatValue::Int(integral(n) as i32),
        NumberPolicy::Long => FlatValue::Long(integral(n)),
        NumberPolicy::Short => FlatValue::Short(integral(n) as i16),
        NumberPolicy::Byte => FlatValue::Byte(integral(n) as i8),
        NumberPolicy::Double => FlatValue::Double(n.as_f64().unwrap_or(f64::NAN)),
        NumberPolicy::Float => FlatValue::Float(n.as_f64().unwrap_or(f64::NAN) as f32),
    }
}

/// Integer-family coercions truncate fractional literals toward zero.
fn integral(n: &Number) -> i64 {
    if let Some(i) = n.as_i64() {
        return i;
    }
    if let Some(u) = n.as_u64() {
        return u as i64;
    }
    n.as_f64().map(|f| f as i64).unwrap_or(0)
}

// ————————————————————————————————————————————————————————————————————————————
// THE WALK
// ————————————————————————————————————————————————————————————————————————————

/// Depth-first emission of `(path, FlatValue)` pairs.
///
/// `emit_element_objects` additionally reports array element objects at their
/// `path[i]` with the raw sub-tree, which the handler search wants and the
/// flat map does not.
fn walk(
    path: String,
    node: &Value,
    policy: Option<NumberPolicy>,
    emit_element_objects: bool,
    sink: &mut dyn FnMut(String, FlatValue),
) {
    match node {
        Value::Null => sink(path, FlatValue::Null),
        Value::Bool(b) => sink(path, FlatValue::Bool(*b)),
        Value::Number(n) => sink(path, coerce_number(n, policy)),
        Value::String(s) => sink(path, FlatValue::Str(s.clone())),
        Value::Array(items) => {
            sink(path.clone(), FlatValue::Array(node.clone()));
            for (i, element) in items.iter().enumerate() {
                let at = format!("{path}[{i}]");
                if emit_element_objects && element.is_object() {
                    sink(at.clone(), FlatValue::Object(element.clone()));
                }
                walk(at, element, policy, emit_element_objects, sink);
            }
        }
        Value::Object(entries) => {
            for (key, value) in entries {
                let at = if path.is_empty() { key.clone() } else { format!("{path}.{key}") };
                walk(at, value, policy, emit_element_objects, sink);
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// FLATTEN + REVERSE LOOKUP
// ————————————————————————————————————————————————————————————————————————————

/// Flatten an object root into a path→value map.
///
/// A non-object root yields an empty map. Each leaf and each array node
/// contributes exactly one entry; insertion order follows the walk.
pub fn flatten(root: &Value, policy: Option<NumberPolicy>) -> FlatMap {
    let mut entries = IndexMap::new();
    if root.is_object() {
        walk(String::new(), root, policy, false, &mut |path, value| {
            entries.insert(path, value);
        });
    }
    FlatMap { entries }
}

/// The result of [`flatten`]: an insertion-ordered path→value map with
/// reverse lookup by key list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlatMap {
    entries: IndexMap<String, FlatValue>,
}

impl FlatMap {
    pub fn get(&self, path: &str) -> Option<&FlatValue> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlatValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Resolve an ordered key list against the flattened structure.
    ///
    /// Each key may carry one `[n]` suffix. The list is consumed by the call;
    /// reuse means rebuilding it. The final key must address a recorded entry
    /// (a leaf or an array node), not an interior object.
    ///
    /// Unlike the navigator, misses here are errors: an absent key is
    /// [`Error::UnknownKey`] and an index past the end of the addressed array
    /// is [`Error::IndexOutOfRange`].
    pub fn search<I, S>(&self, keys: I) -> Result<&FlatValue>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut path = String::new();
        for key in keys {
            let key = key.into();
            let (bare, index) = split_index(&key);
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(bare);
            if !self.level_exists(&path) {
                return Err(Error::UnknownKey { key: bare.to_owned() });
            }
            if let Some(i) = index {
                let Some(FlatValue::Array(Value::Array(items))) = self.entries.get(&path) else {
                    return Err(Error::UnknownKey { key: bare.to_owned() });
                };
                if i >= items.len() {
                    return Err(Error::IndexOutOfRange { path, index: i, len: items.len() });
                }
                path.push('[');
                path.push_str(&i.to_string());
                path.push(']');
            }
        }
        self.entries.get(&path).ok_or(Error::UnknownKey { key: path })
    }

    fn level_exists(&self, path: &str) -> bool {
        self.entries.keys().any(|k| {
            k == path
                || (k.starts_with(path) && k[path.len()..].starts_with(['.', '[']))
        })
    }
}

impl<'a> IntoIterator for &'a FlatMap {
    type Item = (&'a String, &'a FlatValue);
    type IntoIter = indexmap::map::Iter<'a, String, FlatValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// `"book[1]"` → `("book", Some(1))`; no suffix → `(key, None)`.
fn split_index(key: &str) -> (&str, Option<usize>) {
    if !key.ends_with(']') {
        return (key, None);
    }
    let Some(open) = key.rfind('[') else {
        return (key, None);
    };
    match key[open + 1..key.len() - 1].parse() {
        Ok(i) => (&key[..open], Some(i)),
        Err(_) => (key, None),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// HANDLER-BASED SEARCH
// ————————————————————————————————————————————————————————————————————————————

/// Path-keyed handler registry driven by the flatten walk.
///
/// Build with `on`, then run `search` any number of times. Each registered
/// handler fires at most once per walk, when the walk emits its exact path.
/// Array element objects are reported at `path[i]` with the raw sub-tree
/// before the walk descends into them.
pub struct PathSearch<'h> {
    policy: Option<NumberPolicy>,
    handlers: IndexMap<String, Box<dyn FnMut(&str, &FlatValue) + 'h>>,
}

impl<'h> PathSearch<'h> {
    pub fn new() -> Self {
        Self { policy: None, handlers: IndexMap::new() }
    }

    /// Registry whose scalar payloads are coerced under `policy`.
    pub fn with_policy(policy: NumberPolicy) -> Self {
        Self { policy: Some(policy), handlers: IndexMap::new() }
    }

    /// Register `handler` for `path`, replacing any prior handler there.
    pub fn on(
        &mut self,
        path: impl Into<String>,
        handler: impl FnMut(&str, &FlatValue) + 'h,
    ) -> &mut Self {
        self.handlers.insert(path.into(), Box::new(handler));
        self
    }

    /// Drop every registered handler. Idempotent.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    /// Walk `root`, invoking the handler registered for each emitted path.
    pub fn search(&mut self, root: &Value) {
        if !root.is_object() {
            return;
        }
        let policy = self.policy;
        let handlers = &mut self.handlers;
        walk(String::new(), root, policy, true, &mut |path, value| {
            if let Some(handler) = handlers.get_mut(&path) {
                handler(&path, &value);
            }
        });
    }
}

impl Default for PathSearch<'_> {
    fn default() -> Self {
        Self::new()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
