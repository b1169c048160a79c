//! Error taxonomy for the search pipeline
//!
//! Three families of failure exist:
//! - configuration errors (bad key descriptors, bad options, malformed index data)
//! - unsupported features (logical / extended query syntax)
//! - contract violations inside the matcher, which indicate a chunking bug
//!
//! "No match", empty collections and blank fields are never errors.

use thiserror::Error;

/// Errors produced while configuring, indexing or searching
#[derive(Error, Debug)]
pub enum FuseError {
    /// A weighted key descriptor was given without a `name`
    #[error("Missing key property 'name'")]
    MissingKeyName,

    /// A key weight was zero, negative or not finite
    #[error("Invalid key weight value for '{key}': {weight} (must be a positive finite number)")]
    InvalidKeyWeight { key: String, weight: f64 },

    /// Key weights could not be normalized
    #[error("Key weights must sum to a positive finite value, got {0}")]
    InvalidTotalWeight(f64),

    /// An option value is outside its documented range
    #[error("Invalid option '{name}': {reason}")]
    InvalidOption { name: &'static str, reason: String },

    /// Index data does not have the expected keys/records shape
    #[error("Incorrect index shape: {0}")]
    InvalidIndex(String),

    /// The requested feature is not implemented
    #[error("{0} is not implemented")]
    Unsupported(&'static str),

    /// A pattern chunk wider than the bit vector reached the matcher
    #[error("Pattern length ({length}) exceeds maximum ({max})")]
    PatternTooLong { length: usize, max: usize },

    /// Options JSON could not be decoded
    #[error("Failed to decode options: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary index snapshot could not be encoded or decoded
    #[error("Index serialization failed: {0}")]
    Bincode(#[from] bincode::Error),
}

impl FuseError {
    /// Whether this error is a configuration problem surfaced at construction time
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FuseError::MissingKeyName
                | FuseError::InvalidKeyWeight { .. }
                | FuseError::InvalidTotalWeight(_)
                | FuseError::InvalidOption { .. }
                | FuseError::InvalidIndex(_)
                | FuseError::Json(_)
        )
    }
}
