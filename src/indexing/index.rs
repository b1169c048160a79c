//! Search index
//!
//! Pre-extracts the searchable text of every document once, together with
//! its field-length norm, so that a query only has to run the matcher over
//! flat strings.
//!
//! Plain string collections produce one [`RecordEntry::Text`] per non-blank
//! document. Structured collections produce one [`RecordEntry::Fields`] per
//! document, holding one [`FieldEntry`] per configured key in key order.

use super::accessor::{Accessor, Document, FieldValue};
use super::keys::{KeyName, KeyStore, SearchKey};
use super::norm::NormCache;
use crate::error::FuseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Decimal digits kept in a norm
const NORM_MANTISSA: i32 = 3;

/// One indexed string of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubRecord {
    pub value: String,
    /// Position within the innermost source array, `None` for scalars
    pub array_index: Option<usize>,
    pub norm: f64,
}

/// Indexed content of one key for one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldEntry {
    Absent,
    Scalar(SubRecord),
    Series(Vec<SubRecord>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordEntry {
    Text { value: String, norm: f64 },
    Fields(Vec<FieldEntry>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Position of the document in the owning collection
    pub doc_index: usize,
    pub entry: RecordEntry,
}

/// Serializable form of a key: the accessor does not survive export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub path: Vec<String>,
    pub id: String,
    pub weight: f64,
}

#[derive(Serialize, Deserialize)]
struct IndexSnapshot {
    keys: Vec<KeyRecord>,
    records: Vec<IndexRecord>,
}

pub struct SearchIndex<T> {
    keys: Arc<[SearchKey<T>]>,
    records: Vec<IndexRecord>,
    norm: NormCache,
    accessor: Option<Accessor<T>>,
    is_created: bool,
    /// Number of document positions covered, including blank documents without a record
    document_count: usize,
}

impl<T> SearchIndex<T> {
    pub fn new(keys: Arc<[SearchKey<T>]>, field_norm_weight: f64) -> Self {
        Self {
            keys,
            records: Vec::new(),
            norm: NormCache::new(field_norm_weight, NORM_MANTISSA),
            accessor: None,
            is_created: false,
            document_count: 0,
        }
    }

    /// Shared extractor used for keys without their own accessor
    pub fn with_accessor(mut self, accessor: Option<Accessor<T>>) -> Self {
        self.accessor = accessor;
        self
    }

    /// Restore per-key accessors from `store`, matching keys by id.
    ///
    /// Imported indexes carry no accessors, so documents added later would
    /// otherwise be extracted differently from the originals.
    pub fn with_key_accessors(mut self, store: &KeyStore<T>) -> Self {
        if self.keys.iter().all(|key| key.accessor.is_some()) {
            return self;
        }
        self.keys = self
            .keys
            .iter()
            .map(|key| {
                let mut key = key.clone();
                if key.accessor.is_none() {
                    key.accessor = store.get(&key.id).and_then(|k| k.accessor.clone());
                }
                key
            })
            .collect();
        self
    }

    pub fn with_field_norm_weight(mut self, field_norm_weight: f64) -> Self {
        self.norm = NormCache::new(field_norm_weight, NORM_MANTISSA);
        self
    }

    pub fn keys(&self) -> &[SearchKey<T>] {
        &self.keys
    }

    pub fn records(&self) -> &[IndexRecord] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_created(&self) -> bool {
        self.is_created
    }

    pub fn document_count(&self) -> usize {
        self.document_count
    }

    pub(crate) fn set_document_count(&mut self, count: usize) {
        self.document_count = count;
    }

    /// Index every document of `docs`.
    ///
    /// No-op when already built or when `docs` is empty. The collection is
    /// treated as plain strings if its first document is text.
    pub fn create(&mut self, docs: &[T])
    where
        T: Document,
    {
        if self.is_created || docs.is_empty() {
            return;
        }
        self.is_created = true;

        let text_mode = docs[0].as_text().is_some();
        for (doc_index, doc) in docs.iter().enumerate() {
            if text_mode {
                if let Some(text) = doc.as_text() {
                    self.add_text(text, doc_index);
                }
            } else {
                self.add_fields(doc, doc_index);
            }
        }
        self.document_count = docs.len();
        self.norm.clear();

        tracing::debug!(
            target: "fuse_search::index",
            documents = docs.len(),
            records = self.records.len(),
            keys = self.keys.len(),
            text_mode,
            "Built search index"
        );
    }

    /// Append one document at the next position
    pub fn add(&mut self, doc: &T)
    where
        T: Document,
    {
        let doc_index = self.document_count;
        match doc.as_text() {
            Some(text) => self.add_text(text, doc_index),
            None => self.add_fields(doc, doc_index),
        }
        self.document_count += 1;
        self.norm.clear();

        tracing::trace!(target: "fuse_search::index", doc_index, "Added document");
    }

    /// Drop the document at `idx` and shift every later position down by one.
    ///
    /// Returns whether a record was removed; blank documents occupy a
    /// position without a record.
    pub fn remove_at(&mut self, idx: usize) -> bool {
        if idx >= self.document_count {
            return false;
        }

        let before = self.records.len();
        self.records.retain(|record| record.doc_index != idx);
        let removed = self.records.len() != before;

        for record in &mut self.records {
            if record.doc_index > idx {
                record.doc_index -= 1;
            }
        }
        self.document_count -= 1;

        tracing::trace!(target: "fuse_search::index", idx, removed, "Removed document");
        removed
    }

    fn add_text(&mut self, text: &str, doc_index: usize) {
        if text.trim().is_empty() {
            return;
        }
        let norm = self.norm.get(text);
        self.records.push(IndexRecord {
            doc_index,
            entry: RecordEntry::Text {
                value: text.to_string(),
                norm,
            },
        });
    }

    fn add_fields(&mut self, doc: &T, doc_index: usize)
    where
        T: Document,
    {
        let keys = Arc::clone(&self.keys);
        let fields = keys
            .iter()
            .map(|key| {
                let value = match key.accessor.as_ref().or(self.accessor.as_ref()) {
                    Some(accessor) => accessor.get(doc, &key.path),
                    None => doc.field(&key.path),
                };
                match value {
                    Some(value) => self.field_entry(&value),
                    None => FieldEntry::Absent,
                }
            })
            .collect();

        self.records.push(IndexRecord {
            doc_index,
            entry: RecordEntry::Fields(fields),
        });
    }

    fn field_entry(&mut self, value: &FieldValue) -> FieldEntry {
        match value {
            FieldValue::Text(text) if !text.trim().is_empty() => FieldEntry::Scalar(SubRecord {
                value: text.clone(),
                array_index: None,
                norm: self.norm.get(text),
            }),
            FieldValue::List(_) => FieldEntry::Series(self.flatten(value)),
            _ => FieldEntry::Absent,
        }
    }

    /// Depth-first, left-to-right string leaves of a nested list
    fn flatten(&mut self, value: &FieldValue) -> Vec<SubRecord> {
        let mut sub_records = Vec::new();
        let mut stack: Vec<(Option<usize>, &FieldValue)> = vec![(None, value)];

        while let Some((array_index, current)) = stack.pop() {
            match current {
                FieldValue::Text(text) if !text.trim().is_empty() => {
                    sub_records.push(SubRecord {
                        value: text.clone(),
                        array_index,
                        norm: self.norm.get(text),
                    });
                }
                FieldValue::List(items) => {
                    stack.extend(items.iter().enumerate().rev().map(|(k, item)| (Some(k), item)));
                }
                _ => {}
            }
        }

        sub_records
    }

    fn snapshot(&self) -> IndexSnapshot {
        IndexSnapshot {
            keys: self
                .keys
                .iter()
                .map(|key| KeyRecord {
                    path: key.path.clone(),
                    id: key.id.clone(),
                    weight: key.weight,
                })
                .collect(),
            records: self.records.clone(),
        }
    }

    fn from_snapshot(snapshot: IndexSnapshot) -> Result<Self, FuseError> {
        let key_count = snapshot.keys.len();
        for record in &snapshot.records {
            if let RecordEntry::Fields(fields) = &record.entry {
                if fields.len() != key_count {
                    return Err(FuseError::InvalidIndex(format!(
                        "record {} has {} fields for {} keys",
                        record.doc_index,
                        fields.len(),
                        key_count
                    )));
                }
            }
        }

        let keys: Vec<SearchKey<T>> = snapshot
            .keys
            .into_iter()
            .map(|key| SearchKey {
                source: KeyName::Path(key.path.clone()),
                path: key.path,
                id: key.id,
                weight: key.weight,
                accessor: None,
            })
            .collect();

        let document_count = snapshot
            .records
            .iter()
            .map(|record| record.doc_index + 1)
            .max()
            .unwrap_or(0);

        tracing::debug!(
            target: "fuse_search::index",
            records = snapshot.records.len(),
            keys = keys.len(),
            "Imported search index"
        );

        Ok(Self {
            keys: keys.into(),
            records: snapshot.records,
            norm: NormCache::new(1.0, NORM_MANTISSA),
            accessor: None,
            is_created: true,
            document_count,
        })
    }

    /// Export keys and records as a JSON mapping `{keys, records}`
    pub fn to_json(&self) -> Result<serde_json::Value, FuseError> {
        Ok(serde_json::to_value(self.snapshot())?)
    }

    /// Rebuild an index from the output of [`SearchIndex::to_json`] without re-extracting
    pub fn from_json(value: &serde_json::Value) -> Result<Self, FuseError> {
        let snapshot = IndexSnapshot::deserialize(value)
            .map_err(|e| FuseError::InvalidIndex(e.to_string()))?;
        Self::from_snapshot(snapshot)
    }

    /// Serialize the index to bytes using bincode.
    ///
    /// Custom accessors are not serialized.
    pub fn to_bytes(&self) -> Result<Vec<u8>, FuseError> {
        Ok(bincode::serialize(&self.snapshot())?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, FuseError> {
        let snapshot: IndexSnapshot = bincode::deserialize(data)?;
        Self::from_snapshot(snapshot)
    }
}

impl<T> Clone for SearchIndex<T> {
    fn clone(&self) -> Self {
        Self {
            keys: Arc::clone(&self.keys),
            records: self.records.clone(),
            norm: self.norm.clone(),
            accessor: self.accessor.clone(),
            is_created: self.is_created,
            document_count: self.document_count,
        }
    }
}

impl<T> fmt::Debug for SearchIndex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchIndex")
            .field("keys", &self.keys)
            .field("records", &self.records.len())
            .field("document_count", &self.document_count)
            .field("is_created", &self.is_created)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexing::keys::{KeySpec, KeyStore};
    use serde_json::{json, Value};

    fn index_for(keys: &[&str]) -> SearchIndex<Value> {
        let specs: Vec<KeySpec<Value>> = keys.iter().map(|&k| k.into()).collect();
        let store = KeyStore::new(&specs).unwrap();
        SearchIndex::new(store.shared_keys(), 1.0)
    }

    fn string_index(docs: &[&'static str]) -> SearchIndex<&'static str> {
        let mut index = SearchIndex::new(Arc::from(Vec::new()), 1.0);
        index.create(docs);
        index
    }

    #[test]
    fn test_string_records_skip_blanks() {
        let index = string_index(&["apple", "  ", "banana split"]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.document_count(), 3);
        assert_eq!(
            index.records()[1],
            IndexRecord {
                doc_index: 2,
                entry: RecordEntry::Text {
                    value: "banana split".into(),
                    norm: 0.707
                }
            }
        );
    }

    #[test]
    fn test_empty_collection_is_noop() {
        let mut index: SearchIndex<&str> = SearchIndex::new(Arc::from(Vec::new()), 1.0);
        index.create(&[]);
        assert!(!index.is_created());
        assert!(index.is_empty());
    }

    #[test]
    fn test_create_is_idempotent() {
        let docs = vec![json!({"title": "one"}), json!({"title": "two"})];
        let mut index = index_for(&["title"]);
        index.create(&docs);
        let first = index.records().to_vec();
        index.create(&docs);
        assert_eq!(index.records(), first.as_slice());
    }

    #[test]
    fn test_object_fields() {
        let docs = vec![json!({
            "title": "Old Man's War",
            "author": {"name": "John Scalzi"},
            "tags": ["sci-fi", ["military", ""], "war"],
            "blank": "   "
        })];
        let mut index = index_for(&["title", "author.name", "tags", "blank", "missing"]);
        index.create(&docs);

        let RecordEntry::Fields(fields) = &index.records()[0].entry else {
            panic!("expected field record");
        };
        assert_eq!(fields.len(), 5);
        assert!(matches!(&fields[0], FieldEntry::Scalar(s) if s.value == "Old Man's War" && s.norm == 0.577));
        assert!(matches!(&fields[1], FieldEntry::Scalar(s) if s.value == "John Scalzi"));
        assert_eq!(fields[3], FieldEntry::Absent);
        assert_eq!(fields[4], FieldEntry::Absent);

        let FieldEntry::Series(tags) = &fields[2] else {
            panic!("expected series");
        };
        let flattened: Vec<(&str, Option<usize>)> = tags
            .iter()
            .map(|s| (s.value.as_str(), s.array_index))
            .collect();
        assert_eq!(
            flattened,
            vec![("sci-fi", Some(0)), ("military", Some(0)), ("war", Some(2))]
        );
    }

    #[test]
    fn test_custom_accessor() {
        let accessor = Accessor::new(|doc: &Value, path: &[String]| {
            doc.get(&path[0]).and_then(Value::as_str).map(|s| s.to_uppercase().into())
        });
        let docs = vec![json!({"title": "quiet"})];
        let mut index = index_for(&["title"]).with_accessor(Some(accessor));
        index.create(&docs);

        let RecordEntry::Fields(fields) = &index.records()[0].entry else {
            panic!("expected field record");
        };
        assert!(matches!(&fields[0], FieldEntry::Scalar(s) if s.value == "QUIET"));
    }

    #[test]
    fn test_add_uses_next_position() {
        let mut index = string_index(&["a", "", "c"]);
        index.add(&"d");
        assert_eq!(index.document_count(), 4);
        assert_eq!(index.records().last().map(|r| r.doc_index), Some(3));
    }

    #[test]
    fn test_remove_at_shifts_positions() {
        let mut index = string_index(&["a", "b", "c", "d"]);
        assert!(index.remove_at(1));
        let positions: Vec<usize> = index.records().iter().map(|r| r.doc_index).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert_eq!(index.document_count(), 3);

        assert!(!index.remove_at(10));
        assert_eq!(index.document_count(), 3);
    }

    #[test]
    fn test_remove_blank_position() {
        let mut index = string_index(&["a", " ", "c"]);
        assert!(!index.remove_at(1));
        let positions: Vec<usize> = index.records().iter().map(|r| r.doc_index).collect();
        assert_eq!(positions, vec![0, 1]);
    }

    #[test]
    fn test_json_round_trip() {
        let docs = vec![
            json!({"title": "Dune", "tags": ["desert", "spice"]}),
            json!({"title": "Emma"}),
        ];
        let mut index = index_for(&["title", "tags"]);
        index.create(&docs);

        let exported = index.to_json().unwrap();
        assert!(exported.get("keys").is_some());
        assert!(exported.get("records").is_some());

        let imported: SearchIndex<Value> = SearchIndex::from_json(&exported).unwrap();
        assert_eq!(imported.records(), index.records());
        assert_eq!(imported.keys().len(), 2);
        assert_eq!(imported.keys()[1].id, "tags");
        assert_eq!(imported.document_count(), 2);
        assert!(imported.is_created());
    }

    #[test]
    fn test_bincode_round_trip() {
        let index = string_index(&["alpha", "beta gamma"]);
        let bytes = index.to_bytes().unwrap();
        let restored: SearchIndex<&str> = SearchIndex::from_bytes(&bytes).unwrap();
        assert_eq!(restored.records(), index.records());
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = SearchIndex::<Value>::from_json(&json!({"records": []})).unwrap_err();
        assert!(matches!(err, FuseError::InvalidIndex(_)));

        let err = SearchIndex::<Value>::from_json(&json!({"keys": [], "records": 3})).unwrap_err();
        assert!(matches!(err, FuseError::InvalidIndex(_)));
    }

    #[test]
    fn test_field_count_mismatch_rejected() {
        let mut index = index_for(&["title"]);
        index.create(&[json!({"title": "x"})]);
        let mut exported = index.to_json().unwrap();
        exported["keys"] = json!([]);
        let err = SearchIndex::<Value>::from_json(&exported).unwrap_err();
        assert!(matches!(err, FuseError::InvalidIndex(_)));
    }
}
