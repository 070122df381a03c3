//! Context-scoped lookup with deterministic fallback.

use crate::error::QueryError;
use crate::index::CatalogIndex;
use std::sync::Arc;

/// Where the text of a [`ResolvedEntry`] came from.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Origin {
    /// The requested context defines a usable translation.
    Exact,
    /// The key was found without its context; `context` is where it was found.
    Unscoped { context: String },
    /// Nothing usable was found; the caller's default was returned.
    Fallback,
}

/// Result of a lookup. Never persisted.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ResolvedEntry {
    pub context: String,
    pub key: String,
    pub text: String,
    /// `true` when `text` is a real translation, `false` when it is the default.
    pub found: bool,
    pub origin: Origin,
}

/// Lookup contract shared by a bare index and a reloadable handle.
pub trait Resolve {
    /// Resolves `key` inside `context`, falling back to `default_text`.
    ///
    /// Fails only when `key` is empty.
    fn resolve(
        &self,
        context: &str,
        key: &str,
        default_text: &str,
    ) -> Result<ResolvedEntry, QueryError>;

    /// Like [`Resolve::resolve`] but returns only the text; an empty key yields
    /// `default_text`.
    fn resolve_or(&self, context: &str, key: &str, default_text: &str) -> String {
        match self.resolve(context, key, default_text) {
            Ok(entry) => entry.text,
            Err(_) => default_text.to_string(),
        }
    }

    /// Translates a message whose key is its own source-language text.
    fn translate(&self, context: &str, message: &str) -> String {
        self.resolve_or(context, message, message)
    }
}

impl CatalogIndex {
    /// Resolves `(context, key)`:
    ///
    /// 1. a usable translation under `context`;
    /// 2. otherwise the usable translation shared by every context carrying `key`;
    /// 3. otherwise `default_text` with `found = false`.
    ///
    /// Empty and `None` translations count as missing.
    pub fn resolve(
        &self,
        context: &str,
        key: &str,
        default_text: &str,
    ) -> Result<ResolvedEntry, QueryError> {
        if key.is_empty() {
            return Err(QueryError::EmptyKey {
                context: context.to_string(),
            });
        }

        let entry = |text: &str, found: bool, origin: Origin| ResolvedEntry {
            context: context.to_string(),
            key: key.to_string(),
            text: text.to_string(),
            found,
            origin,
        };

        if let Some(text) = self
            .message(context, key)
            .and_then(|message| message.translation().usable())
        {
            return Ok(entry(text, true, Origin::Exact));
        }

        if let Some((owner, text)) = self.unscoped(key) {
            return Ok(entry(
                text,
                true,
                Origin::Unscoped {
                    context: owner.to_string(),
                },
            ));
        }

        Ok(entry(default_text, false, Origin::Fallback))
    }

    /// The translation of `key` when all contexts defining it agree on one text.
    fn unscoped(&self, key: &str) -> Option<(&str, &str)> {
        let mut candidate: Option<(&str, &str)> = None;

        for (context, message) in self.messages_for_key(key) {
            let Some(text) = message.translation().usable() else {
                continue;
            };
            match candidate {
                None => candidate = Some((context, text)),
                Some((_, chosen)) if chosen == text => {},
                Some(_) => return None,
            }
        }

        candidate
    }
}

impl Resolve for CatalogIndex {
    fn resolve(
        &self,
        context: &str,
        key: &str,
        default_text: &str,
    ) -> Result<ResolvedEntry, QueryError> {
        CatalogIndex::resolve(self, context, key, default_text)
    }
}

impl<T: Resolve + ?Sized> Resolve for Arc<T> {
    fn resolve(
        &self,
        context: &str,
        key: &str,
        default_text: &str,
    ) -> Result<ResolvedEntry, QueryError> {
        (**self).resolve(context, key, default_text)
    }
}
