//! Index structures for fuzzy search over document collections
//!
//! - `accessor`: Field extraction from documents
//! - `keys`: Weighted search keys and their store
//! - `norm`: Field-length normalization
//! - `index`: Pre-extracted, normalized searchable text
//! - `threadsafe`: Reader-writer wrapper for concurrent use

pub mod accessor;
pub mod index;
pub mod keys;
pub mod norm;
pub mod threadsafe;

pub use accessor::{get_path, Accessor, Document, FieldValue};
pub use index::{FieldEntry, IndexRecord, KeyRecord, RecordEntry, SearchIndex, SubRecord};
pub use keys::{create_key, KeyDescriptor, KeyName, KeySpec, KeyStore, SearchKey};
pub use norm::NormCache;
pub use threadsafe::SharedFuse;
