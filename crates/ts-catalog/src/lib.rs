#![doc = include_str!("../README.md")]

pub mod dialog;
pub mod error;
pub mod index;
pub mod model;
pub mod parser;
pub mod resolver;
pub mod writer;

pub use error::{CatalogError, QueryError};
pub use index::{CatalogIndex, CatalogStats, Duplicate, DuplicatePolicy};
pub use model::{
    CatalogDocument, Context, Message, MessageStatus, OpaqueElement, Translation,
    UNTRANSLATED_SENTINEL,
};
pub use parser::{parse, parse_file, parse_str};
pub use resolver::{Origin, Resolve, ResolvedEntry};
pub use writer::{write_catalog, write_catalog_file};

#[doc(hidden)]
pub use unic_langid;

/// Parses `bytes` and builds a last-wins index in one step.
pub fn load(bytes: &[u8]) -> Result<CatalogIndex, CatalogError> {
    Ok(CatalogIndex::build(parse(bytes)?))
}
