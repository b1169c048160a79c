//! fuse-search - Typo-tolerant fuzzy search over in-memory collections
//!
//! Given plain strings or structured documents and a query, returns the
//! documents that approximately match, ranked by a relevance score (0.0 is a
//! perfect match) and optionally annotated with the matched character ranges.
//!
//! # Features
//! - Bitap approximate matching with location and distance weighting
//! - Patterns of any length (chunked into 32-character bit vectors)
//! - Weighted keys over nested fields and arrays
//! - Field-length normalization
//! - Index export/import (JSON and bincode)
//! - Parallel matching over large collections
//!
//! # Example
//!
//! ```
//! use fuse_search::{Fuse, FuseOptions};
//! use serde_json::json;
//!
//! let books = vec![
//!     json!({"title": "The Great Gatsby", "author": "F. Scott Fitzgerald"}),
//!     json!({"title": "1984", "author": "George Orwell"}),
//! ];
//! let options = FuseOptions::with_weighted_keys([("title", 0.8), ("author", 0.2)]);
//! let fuse = Fuse::new(books, options)?;
//!
//! let results = fuse.search("gatsby", None)?;
//! assert_eq!(results[0].item["title"], "The Great Gatsby");
//! # Ok::<(), fuse_search::FuseError>(())
//! ```

pub mod algorithms;
pub mod config;
pub mod error;
pub mod format;
pub mod fuse;
pub mod indexing;
pub mod scoring;

pub use algorithms::{BitapOptions, BitapSearch, MatchRange, SearchResult, TextNormalizer};
pub use config::{FuseOptions, SortOrder};
pub use error::FuseError;
pub use format::{FormattedMatch, FormattedResult};
pub use fuse::{Fuse, FuseMatch, FuseResult, Query};
pub use indexing::{
    Accessor, Document, FieldValue, KeySpec, KeyStore, SearchIndex, SearchKey, SharedFuse,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "1.0.0");
    }
}
