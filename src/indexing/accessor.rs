//! Field extraction from documents
//!
//! The index never inspects document structure itself. It asks an
//! [`Accessor`] (or the document's own [`Document::field`]) for the value at a
//! key path and gets back a [`FieldValue`]: a string, a possibly nested list of
//! values, or null.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Value found at a key path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<FieldValue>),
    Null,
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl<V: Into<FieldValue>> From<Vec<V>> for FieldValue {
    fn from(items: Vec<V>) -> Self {
        FieldValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<FieldValue>> From<Option<V>> for FieldValue {
    fn from(value: Option<V>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// A searchable document.
///
/// Collections whose first document reports `as_text() == Some(_)` are
/// searched as plain strings; all others are searched field by field.
pub trait Document {
    /// The document itself as text, for plain string collections
    fn as_text(&self) -> Option<&str> {
        None
    }

    /// Null documents are never added to a collection
    fn is_null(&self) -> bool {
        false
    }

    /// Value at `path`, used when no custom accessor is configured
    fn field(&self, _path: &[String]) -> Option<FieldValue> {
        None
    }
}

impl Document for String {
    fn as_text(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl Document for &str {
    fn as_text(&self) -> Option<&str> {
        Some(*self)
    }
}

impl Document for Value {
    fn as_text(&self) -> Option<&str> {
        self.as_str()
    }

    fn is_null(&self) -> bool {
        Value::is_null(self)
    }

    fn field(&self, path: &[String]) -> Option<FieldValue> {
        get_path(self, path)
    }
}

type AccessorFn<T> = dyn Fn(&T, &[String]) -> Option<FieldValue> + Send + Sync;

/// Pluggable field extraction function
pub struct Accessor<T>(Arc<AccessorFn<T>>);

impl<T> Accessor<T> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T, &[String]) -> Option<FieldValue> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    #[inline]
    pub fn get(&self, doc: &T, path: &[String]) -> Option<FieldValue> {
        (self.0)(doc, path)
    }
}

impl<T> Clone for Accessor<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Accessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Accessor(..)")
    }
}

/// Look up `path` in a JSON value.
///
/// Objects are descended by segment. An array met along the way fans out over
/// its elements, and the result becomes a list of everything found below it.
/// Numbers and booleans are returned as text; nulls and missing segments
/// produce nothing.
pub fn get_path(value: &Value, path: &[String]) -> Option<FieldValue> {
    let mut found = Vec::new();
    let mut fanned_out = false;
    collect(value, path, 0, &mut found, &mut fanned_out);

    if fanned_out {
        Some(FieldValue::List(found))
    } else {
        found.into_iter().next()
    }
}

fn collect(
    value: &Value,
    path: &[String],
    index: usize,
    found: &mut Vec<FieldValue>,
    fanned_out: &mut bool,
) {
    if index >= path.len() {
        if let Some(leaf) = leaf_value(value) {
            found.push(leaf);
        }
        return;
    }

    let Some(next) = value.as_object().and_then(|map| map.get(&path[index])) else {
        return;
    };

    match next {
        Value::Null => {}
        Value::Array(items) => {
            *fanned_out = true;
            for item in items {
                collect(item, path, index + 1, found, fanned_out);
            }
        }
        _ if index == path.len() - 1 => {
            if let Some(text) = scalar_text(next) {
                found.push(FieldValue::Text(text));
            }
        }
        _ => collect(next, path, index + 1, found, fanned_out),
    }
}

fn leaf_value(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Array(items) => Some(FieldValue::List(
            items.iter().filter_map(leaf_value).collect(),
        )),
        other => scalar_text(other).map(FieldValue::Text),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
