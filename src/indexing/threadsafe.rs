//! Thread-safe wrapper for a search instance.
//!
//! [`Fuse`] has no internal locking. This wrapper uses `parking_lot::RwLock`
//! so that a single instance can be searched from many threads while
//! mutations are serialized.
//!
//! # Usage
//!
//! ```ignore
//! use fuse_search::{FuseOptions, SharedFuse};
//!
//! let fuse = SharedFuse::new(vec!["apple".to_string()], FuseOptions::default())?;
//!
//! let writer = fuse.clone();
//! std::thread::spawn(move || {
//!     writer.add("apricot".to_string());
//! });
//!
//! let hits = fuse.search_with("apr", None, |results| results.len())?;
//! ```
//!
//! # Performance Notes
//!
//! - Searches acquire a shared read lock
//! - `add`, `remove` and `remove_at` acquire an exclusive write lock
//! - Results borrow the collection, so they are consumed inside the lock
//!   through a closure instead of being returned

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::FuseOptions;
use crate::error::FuseError;
use crate::format::FormattedResult;
use crate::fuse::{Fuse, Query};
use crate::indexing::Document;

/// Shared, lock-protected [`Fuse`]
pub struct SharedFuse<T> {
    inner: Arc<RwLock<Fuse<T>>>,
}

impl<T> Clone for SharedFuse<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Document> SharedFuse<T> {
    pub fn new(docs: Vec<T>, options: FuseOptions<T>) -> Result<Self, FuseError> {
        Ok(Self::from_fuse(Fuse::new(docs, options)?))
    }

    /// Wrap an existing instance
    pub fn from_fuse(fuse: Fuse<T>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(fuse)),
        }
    }

    /// Search and hand the results to `f`.
    ///
    /// Acquires a shared read lock for the duration of the search and `f`.
    pub fn search_with<R, F>(
        &self,
        query: impl Into<Query>,
        limit: Option<usize>,
        f: F,
    ) -> Result<R, FuseError>
    where
        F: FnOnce(Vec<FormattedResult<'_, T>>) -> R,
    {
        let guard = self.inner.read();
        let results = guard.search(query, limit)?;
        Ok(f(results))
    }

    /// Positions and scores of the matches.
    ///
    /// Acquires a shared read lock.
    pub fn search_positions(
        &self,
        query: impl Into<Query>,
        limit: Option<usize>,
    ) -> Result<Vec<(usize, Option<f64>)>, FuseError> {
        self.search_with(query, limit, |results| {
            results.iter().map(|r| (r.ref_index, r.score)).collect()
        })
    }

    /// Acquires an exclusive write lock.
    pub fn add(&self, doc: T) {
        self.inner.write().add(doc);
    }

    /// Acquires an exclusive write lock for the entire scan.
    pub fn remove<F>(&self, predicate: F) -> Vec<T>
    where
        F: FnMut(&T, usize) -> bool,
    {
        self.inner.write().remove(predicate)
    }

    /// Acquires an exclusive write lock.
    pub fn remove_at(&self, idx: usize) -> Option<T> {
        self.inner.write().remove_at(idx)
    }

    /// Run `f` with shared access to the wrapped instance
    pub fn read<R>(&self, f: impl FnOnce(&Fuse<T>) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run `f` with exclusive access to the wrapped instance
    pub fn write<R>(&self, f: impl FnOnce(&mut Fuse<T>) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Acquires a shared read lock.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
