use thiserror::Error;
use ts_catalog::CatalogError;
use ts_catalog_toml::CatalogConfigError;

/// Errors raised while building a handle from `i18n.toml` settings.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Config(#[from] CatalogConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[cfg(feature = "watch")]
    #[error(transparent)]
    Watch(#[from] WatchError),
}

/// Errors raised while starting a [`CatalogWatcher`](crate::CatalogWatcher).
#[cfg(feature = "watch")]
#[derive(Debug, Error)]
pub enum WatchError {
    /// Only file-backed catalogs can be watched.
    #[error("Catalog loaded from memory cannot be watched")]
    NotAFile,
    #[error("Failed to watch catalog: {0}")]
    Notify(#[from] notify::Error),
    #[error("Failed to spawn catalog watcher thread: {0}")]
    Spawn(#[source] std::io::Error),
}
