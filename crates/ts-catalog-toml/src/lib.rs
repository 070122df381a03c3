#![doc = include_str!("../README.md")]

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, io};
use thiserror::Error;
use ts_catalog::DuplicatePolicy;
use unic_langid::{LanguageIdentifier, LanguageIdentifierError};

/// Name of the configuration file looked up in a manifest directory.
pub const CONFIG_FILE_NAME: &str = "i18n.toml";

const CATALOG_EXTENSION: &str = "ts";

#[derive(Debug, Error)]
pub enum CatalogConfigError {
    /// Configuration file not found.
    #[error("i18n.toml configuration file not found")]
    NotFound,
    /// Failed to read configuration file or catalog directory.
    #[error("Failed to read configuration: {0}")]
    ReadError(#[from] io::Error),
    /// Failed to parse configuration file.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),
    /// A language identifier in the configuration or a catalog file name is invalid.
    #[error("Invalid language identifier '{name}'")]
    InvalidLanguageIdentifier {
        name: String,
        #[source]
        source: LanguageIdentifierError,
    },
    /// No catalog exists for the configured language or its fallbacks.
    #[error("No catalog for language '{language}' in '{}'", dir.display())]
    CatalogNotFound { language: String, dir: PathBuf },
}

/// The contents of `i18n.toml`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CatalogConfig {
    /// Target language of the catalog (e.g. "es" or "pt_BR").
    pub language: String,
    /// Directory holding the catalogs, relative to the configuration file.
    pub catalog_dir: PathBuf,
    /// Catalog files are named `{file_prefix}_{language}.ts`.
    pub file_prefix: String,
    /// Context used for runtime messages that do not belong to a dialog.
    #[serde(default)]
    pub default_context: Option<String>,
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
    /// Reload the catalog when its file changes.
    #[serde(default)]
    pub watch: bool,
}

/// A catalog file discovered in the catalog directory.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AvailableCatalog {
    pub language: LanguageIdentifier,
    pub path: PathBuf,
}

impl CatalogConfig {
    /// Reads the configuration from a path.
    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(CatalogConfigError::NotFound);
        }

        let content = fs_err::read_to_string(path)?;
        let config: CatalogConfig = toml::from_str(&content)?;

        Ok(config)
    }

    /// Reads `i18n.toml` from `CARGO_MANIFEST_DIR`.
    pub fn read_from_manifest_dir() -> Result<Self, CatalogConfigError> {
        let manifest_dir =
            env::var("CARGO_MANIFEST_DIR").map_err(|_| CatalogConfigError::NotFound)?;
        Self::from_manifest_dir(Path::new(&manifest_dir))
    }

    /// Reads `i18n.toml` from `manifest_dir`.
    pub fn from_manifest_dir(manifest_dir: &Path) -> Result<Self, CatalogConfigError> {
        Self::read_from_path(manifest_dir.join(CONFIG_FILE_NAME))
    }

    /// The configured language as a `LanguageIdentifier`.
    pub fn language_identifier(&self) -> Result<LanguageIdentifier, CatalogConfigError> {
        parse_language(&self.language)
    }

    /// The context for runtime messages, `ui_message` unless configured.
    pub fn default_context(&self) -> &str {
        self.default_context.as_deref().unwrap_or("ui_message")
    }

    /// Returns the catalog directory from a base directory.
    /// If `base_dir` is `None`, uses the `CARGO_MANIFEST_DIR` environment variable.
    pub fn catalog_dir_from_base(
        &self,
        base_dir: Option<&Path>,
    ) -> Result<PathBuf, CatalogConfigError> {
        let base = match base_dir {
            Some(dir) => dir.to_path_buf(),
            None => {
                let manifest_dir =
                    env::var("CARGO_MANIFEST_DIR").map_err(|_| CatalogConfigError::NotFound)?;
                PathBuf::from(manifest_dir)
            },
        };

        Ok(base.join(&self.catalog_dir))
    }

    /// File name of the catalog for `language_tag`.
    pub fn catalog_file_name(&self, language_tag: &str) -> String {
        format!("{}_{}.{}", self.file_prefix, language_tag, CATALOG_EXTENSION)
    }

    /// Path of the catalog for the configured language, without fallback.
    pub fn catalog_path_from_base(
        &self,
        base_dir: Option<&Path>,
    ) -> Result<PathBuf, CatalogConfigError> {
        Ok(self
            .catalog_dir_from_base(base_dir)?
            .join(self.catalog_file_name(&self.language)))
    }

    /// Catalog files present in the catalog directory, sorted by language.
    pub fn available_catalogs_from_base(
        &self,
        base_dir: Option<&Path>,
    ) -> Result<Vec<AvailableCatalog>, CatalogConfigError> {
        let dir = self.catalog_dir_from_base(base_dir)?;
        let prefix = format!("{}_", self.file_prefix);
        let suffix = format!(".{}", CATALOG_EXTENSION);

        let mut catalogs = Vec::new();
        for entry in fs_err::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let file_name = entry.file_name();
            let Some(tag) = file_name
                .to_str()
                .and_then(|name| name.strip_prefix(&prefix))
                .and_then(|name| name.strip_suffix(&suffix))
            else {
                continue;
            };

            catalogs.push(AvailableCatalog {
                language: parse_language(tag)?,
                path: entry.path(),
            });
        }

        catalogs.sort_by_key(|catalog| catalog.language.to_string());
        catalogs.dedup_by(|a, b| a.language == b.language);

        Ok(catalogs)
    }

    /// Languages that have a catalog in the catalog directory.
    pub fn available_languages_from_base(
        &self,
        base_dir: Option<&Path>,
    ) -> Result<Vec<LanguageIdentifier>, CatalogConfigError> {
        Ok(self
            .available_catalogs_from_base(base_dir)?
            .into_iter()
            .map(|catalog| catalog.language)
            .collect())
    }

    /// Path of the catalog to load, following the fallback chain of the
    /// configured language.
    pub fn resolve_catalog_path(
        &self,
        base_dir: Option<&Path>,
    ) -> Result<PathBuf, CatalogConfigError> {
        let requested = self.language_identifier()?;
        let available = self.available_catalogs_from_base(base_dir)?;

        fallback_languages(&requested)
            .iter()
            .find_map(|candidate| {
                available
                    .iter()
                    .find(|catalog| &catalog.language == candidate)
                    .map(|catalog| catalog.path.clone())
            })
            .ok_or_else(|| CatalogConfigError::CatalogNotFound {
                language: self.language.clone(),
                dir: self
                    .catalog_dir_from_base(base_dir)
                    .unwrap_or_else(|_| self.catalog_dir.clone()),
            })
    }
}

/// The requested language followed by its primary language when the request
/// carries a script, region or variant.
pub fn fallback_languages(requested: &LanguageIdentifier) -> Vec<LanguageIdentifier> {
    let mut languages = vec![requested.clone()];

    let needs_primary_fallback = requested.script.is_some()
        || requested.region.is_some()
        || requested.variants().next().is_some();

    if needs_primary_fallback
        && let Ok(primary) = requested.language.as_str().parse::<LanguageIdentifier>()
        && !languages.contains(&primary)
    {
        languages.push(primary);
    }

    languages
}

fn parse_language(tag: &str) -> Result<LanguageIdentifier, CatalogConfigError> {
    tag.parse::<LanguageIdentifier>()
        .map_err(|source| CatalogConfigError::InvalidLanguageIdentifier {
            name: tag.to_string(),
            source,
        })
}
