use crate::error::WatchError;
use crate::handle::CatalogHandle;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{DebounceEventResult, Debouncer, RecommendedCache, new_debouncer};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Quiet period after the last change before the catalog is reloaded.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Reloads a file-backed [`CatalogHandle`] whenever its file changes.
///
/// Bursts of events (editors often write a file in several steps) collapse
/// into one reload. A reload that fails is logged and the previous catalog
/// stays published. Dropping the watcher stops its thread.
pub struct CatalogWatcher {
    path: PathBuf,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
}

impl CatalogWatcher {
    pub fn start(handle: &CatalogHandle) -> Result<Self, WatchError> {
        Self::with_debounce(handle, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(handle: &CatalogHandle, debounce: Duration) -> Result<Self, WatchError> {
        let source = handle.source();
        let path = source.path().ok_or(WatchError::NotAFile)?.to_path_buf();
        let file_name = path
            .file_name()
            .map(ToOwned::to_owned)
            .ok_or(WatchError::NotAFile)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (event_tx, event_rx) = mpsc::channel();
        let mut debouncer = new_debouncer(debounce, None, event_tx)?;
        debouncer.watch(&dir, RecursiveMode::NonRecursive)?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let thread = thread::Builder::new()
            .name("ts-catalog-watcher".to_string())
            .spawn({
                let handle = handle.clone();
                let shutdown = Arc::clone(&shutdown);
                move || watch_loop(event_rx, handle, file_name, shutdown)
            })
            .map_err(WatchError::Spawn)?;

        tracing::debug!("Watching catalog file {}", path.display());

        Ok(Self {
            path,
            shutdown,
            thread: Some(thread),
            _debouncer: debouncer,
        })
    }

    /// The watched catalog file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CatalogWatcher {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            tracing::error!("Catalog watcher thread panicked");
        }
    }
}

fn watch_loop(
    events: mpsc::Receiver<DebounceEventResult>,
    handle: CatalogHandle,
    file_name: OsString,
    shutdown: Arc<AtomicBool>,
) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::debug!("Catalog watcher received shutdown signal. Exiting.");
            break;
        }

        match events.recv_timeout(POLL_INTERVAL) {
            Ok(Ok(batch)) => {
                if !batch.iter().any(|event| touches_catalog(event, &file_name)) {
                    continue;
                }
                match handle.refresh() {
                    Ok(revision) => {
                        tracing::debug!("Catalog watcher published revision {}", revision);
                    },
                    Err(error) => {
                        tracing::error!("Catalog watcher could not reload the catalog: {}", error);
                    },
                }
            },
            Ok(Err(errors)) => {
                for error in errors {
                    tracing::warn!("Catalog watch error: {}", error);
                }
            },
            Err(mpsc::RecvTimeoutError::Timeout) => {},
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("Catalog watcher channel disconnected. Watcher stopping.");
                break;
            },
        }
    }
}

fn touches_catalog(event: &Event, file_name: &OsString) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event
            .paths
            .iter()
            .any(|path| path.file_name() == Some(file_name.as_os_str()))
}
