//! Search keys and weight normalization
//!
//! A key names a field of a structured document, either as a dotted string
//! (`"author.name"`) or as an explicit path (`["author", "name"]`), and carries
//! a relative weight. A [`KeyStore`] normalizes the weights of all its keys so
//! that they sum to 1.0.

use super::accessor::Accessor;
use crate::error::FuseError;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Field designator as written by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyName {
    Name(String),
    Path(Vec<String>),
}

impl KeyName {
    pub fn path(&self) -> Vec<String> {
        match self {
            KeyName::Name(name) => name.split('.').map(String::from).collect(),
            KeyName::Path(path) => path.clone(),
        }
    }

    /// Segments joined by '.'
    pub fn id(&self) -> String {
        match self {
            KeyName::Name(name) => name.clone(),
            KeyName::Path(path) => path.join("."),
        }
    }
}

impl fmt::Display for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

/// Weighted key with an optional custom accessor
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct KeyDescriptor<T> {
    #[serde(default)]
    pub name: Option<KeyName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip)]
    pub accessor: Option<Accessor<T>>,
}

impl<T> Clone for KeyDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            weight: self.weight,
            accessor: self.accessor.clone(),
        }
    }
}

impl<T> fmt::Debug for KeyDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyDescriptor")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .field("accessor", &self.accessor)
            .finish()
    }
}

/// Raw key specifier.
///
/// Deserializes from a JSON string, an array of segments or an object
/// `{"name": ..., "weight": ...}`.
#[derive(Serialize, Deserialize)]
#[serde(untagged, bound = "")]
pub enum KeySpec<T> {
    Name(String),
    Path(Vec<String>),
    Descriptor(KeyDescriptor<T>),
}

impl<T> KeySpec<T> {
    pub fn name(name: impl Into<String>) -> Self {
        KeySpec::Name(name.into())
    }

    pub fn path<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KeySpec::Path(segments.into_iter().map(Into::into).collect())
    }

    pub fn weighted(name: impl Into<String>, weight: f64) -> Self {
        KeySpec::Descriptor(KeyDescriptor {
            name: Some(KeyName::Name(name.into())),
            weight: Some(weight),
            accessor: None,
        })
    }

    /// Key whose value is produced by `accessor` instead of the shared extractor
    pub fn with_accessor(name: impl Into<String>, weight: Option<f64>, accessor: Accessor<T>) -> Self {
        KeySpec::Descriptor(KeyDescriptor {
            name: Some(KeyName::Name(name.into())),
            weight,
            accessor: Some(accessor),
        })
    }
}

impl<T> Clone for KeySpec<T> {
    fn clone(&self) -> Self {
        match self {
            KeySpec::Name(name) => KeySpec::Name(name.clone()),
            KeySpec::Path(path) => KeySpec::Path(path.clone()),
            KeySpec::Descriptor(descriptor) => KeySpec::Descriptor(descriptor.clone()),
        }
    }
}

impl<T> fmt::Debug for KeySpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySpec::Name(name) => f.debug_tuple("Name").field(name).finish(),
            KeySpec::Path(path) => f.debug_tuple("Path").field(path).finish(),
            KeySpec::Descriptor(d) => f.debug_tuple("Descriptor").field(d).finish(),
        }
    }
}

impl<T> From<&str> for KeySpec<T> {
    fn from(name: &str) -> Self {
        KeySpec::Name(name.to_string())
    }
}

impl<T> From<String> for KeySpec<T> {
    fn from(name: String) -> Self {
        KeySpec::Name(name)
    }
}

impl<T> From<(&str, f64)> for KeySpec<T> {
    fn from((name, weight): (&str, f64)) -> Self {
        KeySpec::weighted(name, weight)
    }
}

/// A resolved key
pub struct SearchKey<T> {
    pub path: Vec<String>,
    pub id: String,
    /// Normalized within its store; raw until then
    pub weight: f64,
    pub source: KeyName,
    pub accessor: Option<Accessor<T>>,
}

impl<T> Clone for SearchKey<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            id: self.id.clone(),
            weight: self.weight,
            source: self.source.clone(),
            accessor: self.accessor.clone(),
        }
    }
}

impl<T> fmt::Debug for SearchKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchKey")
            .field("path", &self.path)
            .field("id", &self.id)
            .field("weight", &self.weight)
            .field("source", &self.source)
            .field("accessor", &self.accessor)
            .finish()
    }
}

impl<T> SearchKey<T> {
    fn from_name(source: KeyName, weight: f64, accessor: Option<Accessor<T>>) -> Self {
        Self {
            path: source.path(),
            id: source.id(),
            weight,
            source,
            accessor,
        }
    }
}

/// Resolve a key specifier.
///
/// Descriptors must carry a `name`, and an explicit weight must be a positive
/// finite number.
pub fn create_key<T>(spec: &KeySpec<T>) -> Result<SearchKey<T>, FuseError> {
    match spec {
        KeySpec::Name(name) => Ok(SearchKey::from_name(KeyName::Name(name.clone()), 1.0, None)),
        KeySpec::Path(path) => Ok(SearchKey::from_name(KeyName::Path(path.clone()), 1.0, None)),
        KeySpec::Descriptor(descriptor) => {
            let name = descriptor.name.clone().ok_or(FuseError::MissingKeyName)?;
            let weight = descriptor.weight.unwrap_or(1.0);
            if !(weight.is_finite() && weight > 0.0) {
                return Err(FuseError::InvalidKeyWeight {
                    key: name.id(),
                    weight,
                });
            }
            Ok(SearchKey::from_name(name, weight, descriptor.accessor.clone()))
        }
    }
}

/// Keys of one search instance, weights normalized to sum to 1.0
pub struct KeyStore<T> {
    keys: Arc<[SearchKey<T>]>,
    by_id: AHashMap<String, usize>,
}

impl<T> KeyStore<T> {
    pub fn new(specs: &[KeySpec<T>]) -> Result<Self, FuseError> {
        let keys = specs.iter().map(create_key).collect::<Result<Vec<_>, _>>()?;
        Self::from_keys(keys)
    }

    /// Normalize already resolved keys
    pub fn from_keys(mut keys: Vec<SearchKey<T>>) -> Result<Self, FuseError> {
        if !keys.is_empty() {
            let total: f64 = keys.iter().map(|k| k.weight).sum();
            if !(total.is_finite() && total > 0.0) {
                return Err(FuseError::InvalidTotalWeight(total));
            }
            for key in &mut keys {
                key.weight /= total;
            }
        }

        // Later duplicates shadow earlier ones
        let by_id = keys
            .iter()
            .enumerate()
            .map(|(i, key)| (key.id.clone(), i))
            .collect();

        Ok(Self {
            keys: keys.into(),
            by_id,
        })
    }

    pub fn get(&self, id: &str) -> Option<&SearchKey<T>> {
        self.by_id.get(id).map(|&i| &self.keys[i])
    }

    /// Normalized weight of the key with `id`
    pub fn weight(&self, id: &str) -> Option<f64> {
        self.get(id).map(|k| k.weight)
    }

    pub fn keys(&self) -> &[SearchKey<T>] {
        &self.keys
    }

    /// Shared handle on the key list, handed to the index
    pub fn shared_keys(&self) -> Arc<[SearchKey<T>]> {
        Arc::clone(&self.keys)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<T> Clone for KeyStore<T> {
    fn clone(&self) -> Self {
        Self {
            keys: Arc::clone(&self.keys),
            by_id: self.by_id.clone(),
        }
    }
}

impl<T> fmt::Debug for KeyStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStore").field("keys", &self.keys).finish()
    }
}
