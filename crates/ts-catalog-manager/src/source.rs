use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use ts_catalog::{CatalogDocument, CatalogError};

/// Where a catalog is read from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CatalogSource {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

impl CatalogSource {
    /// Reads and parses the source.
    pub fn read(&self) -> Result<CatalogDocument, CatalogError> {
        match self {
            Self::Path(path) => ts_catalog::parse_file(path),
            Self::Bytes(bytes) => ts_catalog::parse(bytes),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::Bytes(_) => None,
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Bytes(bytes) => write!(f, "<{} bytes in memory>", bytes.len()),
        }
    }
}

impl From<PathBuf> for CatalogSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for CatalogSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&PathBuf> for CatalogSource {
    fn from(path: &PathBuf) -> Self {
        Self::Path(path.clone())
    }
}

impl From<Vec<u8>> for CatalogSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes.into())
    }
}

impl From<&[u8]> for CatalogSource {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.into())
    }
}

impl<const N: usize> From<&[u8; N]> for CatalogSource {
    fn from(bytes: &[u8; N]) -> Self {
        Self::Bytes(bytes.as_slice().into())
    }
}

impl From<Arc<[u8]>> for CatalogSource {
    fn from(bytes: Arc<[u8]>) -> Self {
        Self::Bytes(bytes)
    }
}
