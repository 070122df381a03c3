use crate::source::CatalogSource;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use ts_catalog::{CatalogError, CatalogIndex, DuplicatePolicy, QueryError, Resolve, ResolvedEntry};

/// Settings applied to every load of a handle.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LoadOptions {
    pub duplicate_policy: DuplicatePolicy,
}

impl LoadOptions {
    pub fn with_duplicate_policy(mut self, duplicate_policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = duplicate_policy;
        self
    }
}

struct ReloadState {
    source: CatalogSource,
    revision: u64,
}

struct Inner {
    current: ArcSwap<CatalogIndex>,
    reload: Mutex<ReloadState>,
    options: LoadOptions,
}

/// Shared, reloadable access to one catalog.
///
/// Clones share the published index. Lookups load the current snapshot
/// without locking; reloads build a complete index before publishing it, so a
/// lookup sees either the old or the new catalog, never a mix.
#[derive(Clone)]
pub struct CatalogHandle {
    inner: Arc<Inner>,
}

impl CatalogHandle {
    /// Loads `source` with default options and publishes it as revision 1.
    pub fn load(source: impl Into<CatalogSource>) -> Result<Self, CatalogError> {
        Self::load_with_options(source, LoadOptions::default())
    }

    pub fn load_with_options(
        source: impl Into<CatalogSource>,
        options: LoadOptions,
    ) -> Result<Self, CatalogError> {
        let source = source.into();
        let index = build(&source, options, 1)?;

        tracing::info!(
            "Loaded catalog '{}' from {} ({} messages)",
            index.language(),
            source,
            index.len()
        );

        Ok(Self {
            inner: Arc::new(Inner {
                current: ArcSwap::from_pointee(index),
                reload: Mutex::new(ReloadState {
                    source,
                    revision: 1,
                }),
                options,
            }),
        })
    }

    /// Replaces the published catalog with `source`.
    ///
    /// Returns the new revision. On failure the previous catalog stays
    /// published and the revision is unchanged.
    pub fn reload(&self, source: impl Into<CatalogSource>) -> Result<u64, CatalogError> {
        let mut state = self.inner.reload.lock();
        self.publish(&mut state, source.into())
    }

    /// Reloads from the last successfully loaded source.
    pub fn refresh(&self) -> Result<u64, CatalogError> {
        let mut state = self.inner.reload.lock();
        let source = state.source.clone();
        self.publish(&mut state, source)
    }

    /// The currently published index.
    pub fn current(&self) -> Arc<CatalogIndex> {
        self.inner.current.load_full()
    }

    pub fn revision(&self) -> u64 {
        self.inner.current.load().revision()
    }

    /// The source of the currently published index.
    pub fn source(&self) -> CatalogSource {
        self.inner.reload.lock().source.clone()
    }

    pub fn options(&self) -> LoadOptions {
        self.inner.options
    }

    fn publish(&self, state: &mut ReloadState, source: CatalogSource) -> Result<u64, CatalogError> {
        let revision = state.revision + 1;

        match build(&source, self.inner.options, revision) {
            Ok(index) => {
                let messages = index.len();
                self.inner.current.store(Arc::new(index));
                state.revision = revision;
                state.source = source;

                tracing::info!(
                    "Published catalog revision {} from {} ({} messages)",
                    revision,
                    state.source,
                    messages
                );
                Ok(revision)
            },
            Err(error) => {
                tracing::warn!(
                    "Catalog reload from {} failed, keeping revision {}: {}",
                    source,
                    state.revision,
                    error
                );
                Err(error)
            },
        }
    }
}

impl Resolve for CatalogHandle {
    fn resolve(
        &self,
        context: &str,
        key: &str,
        default_text: &str,
    ) -> Result<ResolvedEntry, QueryError> {
        let snapshot = self.inner.current.load();
        CatalogIndex::resolve(&snapshot, context, key, default_text)
    }
}

impl fmt::Debug for CatalogHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.inner.current.load();
        f.debug_struct("CatalogHandle")
            .field("language", &snapshot.language().to_string())
            .field("revision", &snapshot.revision())
            .field("options", &self.inner.options)
            .finish()
    }
}

fn build(
    source: &CatalogSource,
    options: LoadOptions,
    revision: u64,
) -> Result<CatalogIndex, CatalogError> {
    let document = source.read()?;
    let index = CatalogIndex::build_with_policy(document, options.duplicate_policy)?;

    tracing::debug!(
        "Indexed {} messages from {} ({} duplicates)",
        index.len(),
        source,
        index.duplicates().len()
    );

    Ok(index.with_revision(revision))
}
