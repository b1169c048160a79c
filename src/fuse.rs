//! Search orchestration
//!
//! [`Fuse`] owns a collection and its [`SearchIndex`]. A search compiles the
//! query once, runs it over every record, aggregates and sorts the candidate
//! scores, and projects the survivors into [`FormattedResult`]s.

use crate::algorithms::{BitapSearch, MatchRange};
use crate::config::FuseOptions;
use crate::error::FuseError;
use crate::format::{format, FormattedResult};
use crate::indexing::{
    Document, FieldEntry, IndexRecord, KeySpec, KeyStore, RecordEntry, SearchIndex, SearchKey,
    SubRecord,
};
use crate::scoring::score_results;
use rayon::prelude::*;
use std::fmt;

/// Minimum number of records for parallel matching.
///
/// Below this, thread pool coordination costs more than the per-record
/// bitap scan it would spread.
const PARALLEL_THRESHOLD: usize = 100;

/// A search query
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Text(String),
    /// Logical query expression, not supported
    Expression(serde_json::Value),
}

impl From<&str> for Query {
    fn from(s: &str) -> Self {
        Query::Text(s.to_string())
    }
}

impl From<String> for Query {
    fn from(s: String) -> Self {
        Query::Text(s)
    }
}

impl From<&String> for Query {
    fn from(s: &String) -> Self {
        Query::Text(s.clone())
    }
}

impl From<serde_json::Value> for Query {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Query::Text(s),
            other => Query::Expression(other),
        }
    }
}

/// One field that matched the query
#[derive(Debug, Clone, PartialEq)]
pub struct FuseMatch {
    pub score: f64,
    /// Key id, `None` for plain string collections
    pub key: Option<String>,
    pub value: String,
    pub array_index: Option<usize>,
    pub norm: Option<f64>,
    pub ranges: Vec<MatchRange>,
}

/// A candidate document
#[derive(Debug, Clone, PartialEq)]
pub struct FuseResult {
    pub doc_index: usize,
    /// 1.0 until aggregated
    pub score: f64,
    pub matches: Vec<FuseMatch>,
}

/// Fuzzy search over an in-memory collection
pub struct Fuse<T> {
    options: FuseOptions<T>,
    key_store: KeyStore<T>,
    docs: Vec<T>,
    index: SearchIndex<T>,
}

impl<T: Document> Fuse<T> {
    /// Index `docs` and prepare for searching
    pub fn new(docs: Vec<T>, options: FuseOptions<T>) -> Result<Self, FuseError> {
        Self::build(docs, options, None)
    }

    /// Reuse a prebuilt index for `docs`
    pub fn with_index(
        docs: Vec<T>,
        options: FuseOptions<T>,
        index: SearchIndex<T>,
    ) -> Result<Self, FuseError> {
        Self::build(docs, options, Some(index))
    }

    fn build(
        docs: Vec<T>,
        options: FuseOptions<T>,
        index: Option<SearchIndex<T>>,
    ) -> Result<Self, FuseError> {
        if options.use_extended_search {
            return Err(FuseError::Unsupported("Extended search"));
        }
        options.validate()?;

        let key_store = KeyStore::new(&options.keys)?;
        let index = match index {
            Some(index) => Self::attach_index(index, &docs, &options, &key_store)?,
            None => Self::index_documents(&key_store, &docs, &options),
        };

        Ok(Self {
            options,
            key_store,
            docs,
            index,
        })
    }

    fn index_documents(key_store: &KeyStore<T>, docs: &[T], options: &FuseOptions<T>) -> SearchIndex<T> {
        let mut index = SearchIndex::new(key_store.shared_keys(), options.field_norm_weight)
            .with_accessor(options.accessor.clone());
        index.create(docs);
        index
    }

    fn attach_index(
        mut index: SearchIndex<T>,
        docs: &[T],
        options: &FuseOptions<T>,
        key_store: &KeyStore<T>,
    ) -> Result<SearchIndex<T>, FuseError> {
        if let Some(record) = index.records().iter().find(|r| r.doc_index >= docs.len()) {
            return Err(FuseError::InvalidIndex(format!(
                "record refers to position {} of a {}-document collection",
                record.doc_index,
                docs.len()
            )));
        }

        index = index
            .with_field_norm_weight(options.field_norm_weight)
            .with_key_accessors(key_store);
        if options.accessor.is_some() {
            index = index.with_accessor(options.accessor.clone());
        }
        index.set_document_count(docs.len());
        Ok(index)
    }

    /// Build an index for `docs` over `keys`, for later use with [`Fuse::with_index`]
    pub fn create_index(
        keys: &[KeySpec<T>],
        docs: &[T],
        options: &FuseOptions<T>,
    ) -> Result<SearchIndex<T>, FuseError> {
        let key_store = KeyStore::new(keys)?;
        Ok(Self::index_documents(&key_store, docs, options))
    }

    /// Rebuild an index from its exported JSON form
    pub fn parse_index(
        value: &serde_json::Value,
        options: &FuseOptions<T>,
    ) -> Result<SearchIndex<T>, FuseError> {
        Ok(SearchIndex::from_json(value)?
            .with_field_norm_weight(options.field_norm_weight)
            .with_accessor(options.accessor.clone()))
    }

    /// Replace the collection, reindexing unless an index is supplied
    pub fn set_collection(
        &mut self,
        docs: Vec<T>,
        index: Option<SearchIndex<T>>,
    ) -> Result<(), FuseError> {
        self.index = match index {
            Some(index) => Self::attach_index(index, &docs, &self.options, &self.key_store)?,
            None => Self::index_documents(&self.key_store, &docs, &self.options),
        };
        self.docs = docs;
        Ok(())
    }

    /// Append a document; null documents are ignored
    pub fn add(&mut self, doc: T) {
        if doc.is_null() {
            return;
        }
        self.index.add(&doc);
        self.docs.push(doc);
    }

    /// Remove every document for which `predicate(doc, position)` holds
    pub fn remove<F>(&mut self, mut predicate: F) -> Vec<T>
    where
        F: FnMut(&T, usize) -> bool,
    {
        let mut removed = Vec::new();
        let mut i = 0;
        while i < self.docs.len() {
            if predicate(&self.docs[i], i) {
                if let Some(doc) = self.remove_at(i) {
                    removed.push(doc);
                }
            } else {
                i += 1;
            }
        }
        removed
    }

    /// Remove the document at `idx`, `None` if out of range
    pub fn remove_at(&mut self, idx: usize) -> Option<T> {
        if idx >= self.docs.len() {
            return None;
        }
        let doc = self.docs.remove(idx);
        self.index.remove_at(idx);
        Some(doc)
    }

    /// Search the collection.
    ///
    /// `limit` of `None` returns every match. Queries other than plain text
    /// fail with [`FuseError::Unsupported`].
    pub fn search(
        &self,
        query: impl Into<Query>,
        limit: Option<usize>,
    ) -> Result<Vec<FormattedResult<'_, T>>, FuseError> {
        let pattern = match query.into() {
            Query::Text(pattern) => pattern,
            Query::Expression(_) => return Err(FuseError::Unsupported("Logical search")),
        };

        let searcher = BitapSearch::new(&pattern, self.options.bitap_options());
        let text_mode = self.docs.first().is_some_and(|doc| doc.as_text().is_some());
        let keys = self.index.keys();
        let records = self.index.records();

        let candidates: Vec<Option<FuseResult>> = if records.len() >= PARALLEL_THRESHOLD {
            records
                .par_iter()
                .map(|record| match_record(&searcher, keys, record, text_mode))
                .collect::<Result<_, _>>()?
        } else {
            records
                .iter()
                .map(|record| match_record(&searcher, keys, record, text_mode))
                .collect::<Result<_, _>>()?
        };
        let candidates: Vec<FuseResult> = candidates.into_iter().flatten().collect();
        let candidate_count = candidates.len();

        let mut results = score_results(
            candidates,
            &self.key_store,
            self.options.ignore_field_norm,
            self.options.score_floor,
        );

        if self.options.should_sort {
            results.sort_by(|a, b| self.options.sort.compare(a, b));
        }
        if let Some(limit) = limit {
            results.truncate(limit);
        }

        tracing::debug!(
            target: "fuse_search::search",
            pattern_len = searcher.pattern().len(),
            chunks = searcher.chunks().len(),
            text_mode,
            records = records.len(),
            candidates = candidate_count,
            results = results.len(),
            "Search completed"
        );

        Ok(format(
            &results,
            &self.docs,
            self.options.include_matches,
            self.options.include_score,
        ))
    }
}

impl<T> Fuse<T> {
    pub fn index(&self) -> &SearchIndex<T> {
        &self.index
    }

    pub fn docs(&self) -> &[T] {
        &self.docs
    }

    pub fn options(&self) -> &FuseOptions<T> {
        &self.options
    }

    pub fn key_store(&self) -> &KeyStore<T> {
        &self.key_store
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl<T: fmt::Debug> fmt::Debug for Fuse<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fuse")
            .field("options", &self.options)
            .field("docs", &self.docs)
            .field("index", &self.index)
            .finish()
    }
}

/// Run the query against one record
fn match_record<T>(
    searcher: &BitapSearch,
    keys: &[SearchKey<T>],
    record: &IndexRecord,
    text_mode: bool,
) -> Result<Option<FuseResult>, FuseError> {
    let mut matches = Vec::new();

    match (&record.entry, text_mode) {
        (RecordEntry::Text { value, norm }, true) => {
            let result = searcher.search_in(value)?;
            if result.is_match {
                matches.push(FuseMatch {
                    score: result.score,
                    key: None,
                    value: value.clone(),
                    array_index: None,
                    norm: Some(*norm),
                    ranges: result.ranges,
                });
            }
        }
        (RecordEntry::Fields(fields), false) => {
            for (key, field) in keys.iter().zip(fields) {
                match field {
                    FieldEntry::Absent => {}
                    FieldEntry::Scalar(sub) => match_sub_record(searcher, key, sub, &mut matches)?,
                    FieldEntry::Series(subs) => {
                        for sub in subs {
                            match_sub_record(searcher, key, sub, &mut matches)?;
                        }
                    }
                }
            }
        }
        _ => {}
    }

    if matches.is_empty() {
        return Ok(None);
    }
    Ok(Some(FuseResult {
        doc_index: record.doc_index,
        score: 1.0,
        matches,
    }))
}

fn match_sub_record<T>(
    searcher: &BitapSearch,
    key: &SearchKey<T>,
    sub: &SubRecord,
    matches: &mut Vec<FuseMatch>,
) -> Result<(), FuseError> {
    let result = searcher.search_in(&sub.value)?;
    if result.is_match {
        matches.push(FuseMatch {
            score: result.score,
            key: Some(key.id.clone()),
            value: sub.value.clone(),
            array_index: sub.array_index,
            norm: Some(sub.norm),
            ranges: result.ranges,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexing::Accessor;
    use crate::indexing::FieldValue;
    use serde_json::{json, Value};

    fn fruits() -> Fuse<&'static str> {
        Fuse::new(
            vec!["apple", "banana", "orange", "grape", "pineapple"],
            FuseOptions::default().with_include_score(true),
        )
        .unwrap()
    }

    fn books() -> Vec<Value> {
        vec![
            json!({"title": "The Great Gatsby", "author": "F. Scott Fitzgerald"}),
            json!({"title": "1984", "author": "George Orwell"}),
        ]
    }

    #[test]
    fn test_string_search() {
        let fuse = fruits();
        let results = fuse.search("app", None).unwrap();
        let items: Vec<&str> = results.iter().map(|r| *r.item).collect();
        assert_eq!(&items[..2], &["apple", "pineapple"]);
        assert!(!items.contains(&"banana"));
        assert!(results[0].score.unwrap() < results[1].score.unwrap());
    }

    #[test]
    fn test_limit() {
        let fuse = fruits();
        let results = fuse.search("app", Some(1)).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(*results[0].item, "apple");
        assert!(fuse.search("app", Some(0)).unwrap().is_empty());
    }

    #[test]
    fn test_object_search() {
        let fuse = Fuse::new(books(), FuseOptions::default().with_keys(["title", "author"])).unwrap();
        let results = fuse.search("gatsby", None).unwrap();
        assert_eq!(results[0].item["title"], "The Great Gatsby");
        assert_eq!(results[0].ref_index, 0);
    }

    #[test]
    fn test_include_matches_reports_key_and_ranges() {
        let options = FuseOptions::default()
            .with_keys(["title", "author"])
            .with_include_matches(true);
        let fuse = Fuse::new(books(), options).unwrap();
        let results = fuse.search("Orwell", None).unwrap();
        let matches = results[0].matches.as_ref().unwrap();
        let author = matches.iter().find(|m| m.key.as_deref() == Some("author")).unwrap();
        assert_eq!(author.value, "George Orwell");
        assert!(author.indices.contains(&(7, 12)));
    }

    #[test]
    fn test_array_fields_report_position() {
        let docs = vec![json!({"tags": ["red", "green", "blue"]})];
        let options = FuseOptions::default()
            .with_keys(["tags"])
            .with_include_matches(true)
            .with_threshold(0.0);
        let fuse = Fuse::new(docs, options).unwrap();
        let results = fuse.search("green", None).unwrap();
        let matches = results[0].matches.as_ref().unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].ref_index, Some(1));
    }

    #[test]
    fn test_logical_query_unsupported() {
        let fuse = fruits();
        let err = fuse.search(json!({"$and": [{"title": "x"}]}), None).unwrap_err();
        assert!(matches!(err, FuseError::Unsupported(_)));
        // A JSON string is still a text query
        assert!(fuse.search(json!("apple"), None).is_ok());
    }

    #[test]
    fn test_extended_search_rejected() {
        let err = Fuse::new(vec!["a"], FuseOptions::default().with_extended_search(true)).unwrap_err();
        assert!(matches!(err, FuseError::Unsupported(_)));
    }

    #[test]
    fn test_invalid_key_fails_construction() {
        let options = FuseOptions::default().with_key(KeySpec::weighted("title", -1.0));
        assert!(matches!(
            Fuse::new(books(), options),
            Err(FuseError::InvalidKeyWeight { .. })
        ));
    }

    #[test]
    fn test_empty_collection() {
        let fuse: Fuse<&str> = Fuse::new(Vec::new(), FuseOptions::default()).unwrap();
        assert!(fuse.search("anything", None).unwrap().is_empty());
    }

    #[test]
    fn test_add_and_remove() {
        let mut fuse = fruits();
        fuse.add("test");
        assert_eq!(*fuse.search("test", None).unwrap()[0].item, "test");

        let removed = fuse.remove(|doc, _| *doc == "test");
        assert_eq!(removed, vec!["test"]);
        assert!(fuse.search("test", None).unwrap().iter().all(|r| *r.item != "test"));
    }

    #[test]
    fn test_add_ignores_null() {
        let mut fuse = Fuse::new(books(), FuseOptions::default().with_keys(["title"])).unwrap();
        fuse.add(Value::Null);
        assert_eq!(fuse.len(), 2);
        assert_eq!(fuse.index().document_count(), 2);
    }

    #[test]
    fn test_remove_at_keeps_positions_in_sync() {
        let mut fuse = fruits();
        assert_eq!(fuse.remove_at(0), Some("apple"));
        assert_eq!(fuse.remove_at(10), None);

        let results = fuse.search("pineapple", None).unwrap();
        assert_eq!(results[0].ref_index, 3);
        assert_eq!(fuse.docs()[3], "pineapple");
    }

    #[test]
    fn test_with_index_round_trip() {
        let options = FuseOptions::default().with_keys(["title", "author"]).with_include_score(true);
        let index = Fuse::create_index(&options.keys, &books(), &options).unwrap();
        let exported = index.to_json().unwrap();

        let parsed = Fuse::parse_index(&exported, &options).unwrap();
        let reused = Fuse::with_index(books(), options.clone(), parsed).unwrap();
        let fresh = Fuse::new(books(), options).unwrap();

        assert_eq!(
            reused.search("gatsby", None).unwrap(),
            fresh.search("gatsby", None).unwrap()
        );
    }

    #[test]
    fn test_with_index_rejects_stale_positions() {
        let options = FuseOptions::default().with_keys(["title"]);
        let index = Fuse::create_index(&options.keys, &books(), &options).unwrap();
        let err = Fuse::with_index(vec![books().remove(0)], options, index).unwrap_err();
        assert!(matches!(err, FuseError::InvalidIndex(_)));
    }

    #[test]
    fn test_set_collection() {
        let mut fuse = fruits();
        fuse.set_collection(vec!["kiwi", "mango"], None).unwrap();
        assert_eq!(fuse.len(), 2);
        assert_eq!(*fuse.search("kiwi", None).unwrap()[0].item, "kiwi");
        assert_eq!(fuse.docs(), &["kiwi", "mango"]);
        assert_eq!(fuse.index().document_count(), 2);
    }

    #[test]
    fn test_custom_accessor_option() {
        #[derive(Debug)]
        struct Book {
            title: String,
        }
        impl Document for Book {}

        let accessor = Accessor::new(|book: &Book, _path: &[String]| Some(FieldValue::from(book.title.as_str())));
        let options = FuseOptions::default().with_keys(["title"]).with_accessor(accessor);
        let fuse = Fuse::new(
            vec![
                Book { title: "Dracula".into() },
                Book { title: "Frankenstein".into() },
            ],
            options,
        )
        .unwrap();
        let results = fuse.search("frankenstien", None).unwrap();
        assert_eq!(results[0].item.title, "Frankenstein");
    }

    #[test]
    fn test_location_prefers_nearby_hits() {
        let docs = vec!["needle..........", "..........needle"];
        let ranked = |options: FuseOptions<&'static str>| -> Vec<usize> {
            let fuse = Fuse::new(docs.clone(), options.with_include_score(true)).unwrap();
            fuse.search("needle", None)
                .unwrap()
                .iter()
                .map(|r| r.ref_index)
                .collect()
        };

        assert_eq!(ranked(FuseOptions::default()), vec![0, 1]);
        assert_eq!(ranked(FuseOptions::default().with_location(10)), vec![1, 0]);
    }

    #[test]
    fn test_find_all_matches_reports_far_ranges() {
        let doc = format!("ab{}a", "x".repeat(100));
        let options = FuseOptions::default()
            .with_include_matches(true)
            .with_find_all_matches(true);
        let fuse = Fuse::new(vec![doc], options).unwrap();
        let results = fuse.search("ab", None).unwrap();
        let matches = results[0].matches.as_ref().unwrap();
        assert_eq!(matches[0].indices, vec![(0, 1), (102, 102)]);
    }

    #[test]
    fn test_imported_index_keeps_key_accessors() {
        struct Book {
            title: String,
        }
        impl Document for Book {}

        let book = |title: &str| Book { title: title.into() };
        let accessor = Accessor::new(|book: &Book, _path: &[String]| Some(FieldValue::from(book.title.as_str())));
        let options = FuseOptions::default().with_key(KeySpec::with_accessor("title", None, accessor));

        let docs = vec![book("Dracula"), book("Carmilla")];
        let bytes = Fuse::create_index(&options.keys, &docs, &options)
            .unwrap()
            .to_bytes()
            .unwrap();
        let index = SearchIndex::from_bytes(&bytes).unwrap();

        let mut fuse = Fuse::with_index(docs, options, index).unwrap();
        fuse.add(book("Frankenstein"));
        let results = fuse.search("frankenstein", None).unwrap();
        assert_eq!(results[0].ref_index, 2);
        assert_eq!(results[0].item.title, "Frankenstein");
    }

    #[test]
    fn test_parallel_path_matches_sequential() {
        let docs: Vec<String> = (0..250).map(|i| format!("item number {i}")).collect();
        let fuse = Fuse::new(docs, FuseOptions::default().with_include_score(true)).unwrap();
        let results = fuse.search("number 42", Some(3)).unwrap();
        assert_eq!(results[0].item, "item number 42");
    }
}
