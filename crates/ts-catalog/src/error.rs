use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, indexing or writing a catalog.
///
/// A failed load never produces a partial catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The document violates the catalog structure.
    #[error("Malformed catalog at byte {offset}: {reason}")]
    Malformed {
        /// Byte offset in the decoded document where the problem was detected.
        offset: u64,
        /// Human readable description of the violation.
        reason: String,
    },
    /// The byte stream cannot be decoded with the declared encoding.
    #[error("Cannot decode catalog as '{encoding}': {reason}")]
    Encoding {
        /// The encoding label that was attempted.
        encoding: String,
        /// Why decoding failed.
        reason: String,
    },
    /// The catalog file could not be read.
    #[error("Failed to read catalog '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The catalog file could not be written.
    #[error("Failed to write catalog '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A `(context, key)` pair appeared twice under [`DuplicatePolicy::Reject`].
    ///
    /// [`DuplicatePolicy::Reject`]: crate::DuplicatePolicy::Reject
    #[error("Message '{key}' is defined more than once in context '{context}'")]
    DuplicateMessage { context: String, key: String },
}

impl CatalogError {
    pub(crate) fn malformed(offset: u64, reason: impl Into<String>) -> Self {
        Self::Malformed {
            offset,
            reason: reason.into(),
        }
    }
}

/// Errors raised by a lookup request.
///
/// A missing translation is not an error; it is reported through
/// [`ResolvedEntry::found`](crate::ResolvedEntry::found).
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum QueryError {
    #[error("Lookup key must not be empty (context '{context}')")]
    EmptyKey { context: String },
}
