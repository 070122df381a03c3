#![doc = include_str!("../README.md")]

mod configured;
mod error;
mod handle;
mod source;
#[cfg(feature = "watch")]
mod watcher;

pub use configured::ConfiguredCatalog;
pub use error::LoadError;
#[cfg(feature = "watch")]
pub use error::WatchError;
pub use handle::{CatalogHandle, LoadOptions};
pub use source::CatalogSource;
#[cfg(feature = "watch")]
pub use watcher::{CatalogWatcher, DEFAULT_DEBOUNCE};

pub use ts_catalog::{CatalogError, CatalogIndex, QueryError, Resolve, ResolvedEntry};

use std::path::Path;
use std::sync::Arc;
use ts_catalog_toml::CatalogConfig;

/// Loads a catalog and publishes it as revision 1.
pub fn load(source: impl Into<CatalogSource>) -> Result<CatalogHandle, CatalogError> {
    CatalogHandle::load(source)
}

/// Loads the catalog described by `config` and watches it when the
/// configuration asks for it; see [`ConfiguredCatalog::load`].
pub fn load_from_config(
    config: &CatalogConfig,
    base_dir: Option<&Path>,
) -> Result<ConfiguredCatalog, LoadError> {
    ConfiguredCatalog::load(config, base_dir)
}

/// Atomically replaces the catalog behind `handle`; see [`CatalogHandle::reload`].
pub fn reload(
    handle: &CatalogHandle,
    source: impl Into<CatalogSource>,
) -> Result<u64, CatalogError> {
    handle.reload(source)
}

/// Reloads `handle` from its last loaded source.
pub fn refresh(handle: &CatalogHandle) -> Result<u64, CatalogError> {
    handle.refresh()
}

/// The index currently published by `handle`.
pub fn current(handle: &CatalogHandle) -> Arc<CatalogIndex> {
    handle.current()
}

/// Resolves against the snapshot published at the time of the call.
pub fn resolve(
    handle: &CatalogHandle,
    context: &str,
    key: &str,
    default_text: &str,
) -> Result<ResolvedEntry, QueryError> {
    handle.resolve(context, key, default_text)
}
