use crate::error::LoadError;
use crate::handle::{CatalogHandle, LoadOptions};
#[cfg(feature = "watch")]
use crate::watcher::CatalogWatcher;
use std::ops::Deref;
use std::path::Path;
use ts_catalog_toml::CatalogConfig;

/// A catalog opened from `i18n.toml` settings.
///
/// When the configuration sets `watch = true`, the catalog file is watched
/// for as long as this value lives.
pub struct ConfiguredCatalog {
    handle: CatalogHandle,
    #[cfg(feature = "watch")]
    watcher: Option<CatalogWatcher>,
}

impl ConfiguredCatalog {
    /// Loads the catalog described by `config`, following the language
    /// fallback chain and applying its duplicate policy.
    pub fn load(config: &CatalogConfig, base_dir: Option<&Path>) -> Result<Self, LoadError> {
        let path = config.resolve_catalog_path(base_dir)?;
        let options = LoadOptions::default().with_duplicate_policy(config.duplicate_policy);
        let handle = CatalogHandle::load_with_options(path, options)?;

        #[cfg(feature = "watch")]
        let watcher = if config.watch {
            Some(CatalogWatcher::start(&handle)?)
        } else {
            None
        };

        #[cfg(not(feature = "watch"))]
        if config.watch {
            tracing::warn!("i18n.toml sets watch = true but the `watch` feature is disabled");
        }

        Ok(Self {
            handle,
            #[cfg(feature = "watch")]
            watcher,
        })
    }

    pub fn handle(&self) -> &CatalogHandle {
        &self.handle
    }

    /// Whether the catalog file is being watched.
    pub fn is_watching(&self) -> bool {
        #[cfg(feature = "watch")]
        {
            self.watcher.is_some()
        }
        #[cfg(not(feature = "watch"))]
        {
            false
        }
    }

    /// Stops watching and returns the handle.
    pub fn into_handle(self) -> CatalogHandle {
        self.handle
    }
}

impl Deref for ConfiguredCatalog {
    type Target = CatalogHandle;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}
