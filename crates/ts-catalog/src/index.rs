//! Queryable view over a [`CatalogDocument`].

use crate::error::CatalogError;
use crate::model::{CatalogDocument, Context, Message, MessageStatus};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

/// What to do when a `(context, key)` pair is defined more than once.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// The later definition replaces the earlier one.
    #[default]
    LastWins,
    /// The first definition is kept; later ones are ignored.
    FirstWins,
    /// Duplicates make the build fail.
    Reject,
}

/// A duplicate definition that was discarded while building an index.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Duplicate {
    pub context: String,
    pub key: String,
}

/// Position of a message inside the owned document.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Slot {
    context: usize,
    message: usize,
}

/// Counts describing how complete a catalog is.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CatalogStats {
    /// Distinct context names.
    pub contexts: usize,
    /// Messages reachable through the index.
    pub messages: usize,
    /// Messages with a displayable translation.
    pub translated: usize,
    /// Messages explicitly marked with the `None` sentinel.
    pub untranslated: usize,
    /// Messages with an empty or missing translation.
    pub empty: usize,
    /// Messages flagged `unfinished`.
    pub unfinished: usize,
}

impl CatalogStats {
    /// Share of indexed messages with a displayable translation, in `[0, 100]`.
    pub fn coverage_percent(&self) -> f64 {
        if self.messages == 0 {
            return 100.0;
        }
        self.translated as f64 * 100.0 / self.messages as f64
    }
}

/// Lookup structure built once per loaded document.
///
/// The index owns the document and never mutates it.
#[derive(Debug)]
pub struct CatalogIndex {
    document: CatalogDocument,
    primary: FxHashMap<String, FxHashMap<String, Slot>>,
    by_key: FxHashMap<String, Vec<Slot>>,
    duplicates: Vec<Duplicate>,
    revision: u64,
}

impl CatalogIndex {
    /// Builds an index with [`DuplicatePolicy::LastWins`]. Never fails.
    pub fn build(document: CatalogDocument) -> Self {
        Self::index(document, DuplicatePolicy::LastWins)
    }

    /// Builds an index applying `policy` to repeated `(context, key)` pairs.
    ///
    /// Only [`DuplicatePolicy::Reject`] can fail.
    pub fn build_with_policy(
        document: CatalogDocument,
        policy: DuplicatePolicy,
    ) -> Result<Self, CatalogError> {
        let index = Self::index(document, policy);

        if policy == DuplicatePolicy::Reject
            && let Some(duplicate) = index.duplicates.first()
        {
            return Err(CatalogError::DuplicateMessage {
                context: duplicate.context.clone(),
                key: duplicate.key.clone(),
            });
        }

        Ok(index)
    }

    fn index(document: CatalogDocument, policy: DuplicatePolicy) -> Self {
        let mut primary: FxHashMap<String, FxHashMap<String, Slot>> = FxHashMap::default();
        let mut duplicates = Vec::new();

        for (context_idx, context) in document.contexts().iter().enumerate() {
            let entries = primary.entry(context.name().clone()).or_default();

            for (message_idx, message) in context.messages().iter().enumerate() {
                if !message.status().is_active() {
                    continue;
                }

                let slot = Slot {
                    context: context_idx,
                    message: message_idx,
                };

                if entries.contains_key(message.source()) {
                    let duplicate = Duplicate {
                        context: context.name().clone(),
                        key: message.source().clone(),
                    };
                    match policy {
                        DuplicatePolicy::LastWins | DuplicatePolicy::Reject => {
                            tracing::debug!(
                                "Message '{}' in context '{}' overrides an earlier definition",
                                duplicate.key,
                                duplicate.context
                            );
                            entries.insert(message.source().clone(), slot);
                        },
                        DuplicatePolicy::FirstWins => {
                            tracing::debug!(
                                "Ignoring repeated message '{}' in context '{}'",
                                duplicate.key,
                                duplicate.context
                            );
                        },
                    }
                    duplicates.push(duplicate);
                } else {
                    entries.insert(message.source().clone(), slot);
                }
            }
        }

        // The secondary map is derived from the primary one so it follows the
        // same duplicate policy. Slots are sorted to keep document order.
        let mut by_key: FxHashMap<String, Vec<Slot>> = FxHashMap::default();
        for entries in primary.values() {
            for (key, slot) in entries {
                by_key.entry(key.clone()).or_default().push(*slot);
            }
        }
        for slots in by_key.values_mut() {
            slots.sort_by_key(|slot| (slot.context, slot.message));
        }

        tracing::debug!(
            "Indexed {} messages in {} contexts ({} duplicates)",
            by_key.values().map(Vec::len).sum::<usize>(),
            primary.len(),
            duplicates.len()
        );

        Self {
            document,
            primary,
            by_key,
            duplicates,
            revision: 0,
        }
    }

    /// Stamps the revision under which this index is published.
    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn document(&self) -> &CatalogDocument {
        &self.document
    }

    pub fn language(&self) -> &LanguageIdentifier {
        self.document.language()
    }

    /// Duplicate definitions discarded by the duplicate policy, in document order.
    pub fn duplicates(&self) -> &[Duplicate] {
        &self.duplicates
    }

    /// Number of `(context, key)` pairs in the index.
    pub fn len(&self) -> usize {
        self.primary.values().map(FxHashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_context(&self, context: &str) -> bool {
        self.primary.contains_key(context)
    }

    /// The message registered for `(context, key)`.
    pub fn message(&self, context: &str, key: &str) -> Option<&Message> {
        let slot = self.primary.get(context)?.get(key)?;
        Some(self.message_at(*slot))
    }

    /// Every context carrying `key`, with its message, in document order.
    pub fn messages_for_key<'a>(
        &'a self,
        key: &str,
    ) -> impl Iterator<Item = (&'a str, &'a Message)> + 'a {
        self.by_key
            .get(key)
            .into_iter()
            .flatten()
            .map(|slot| (self.context_at(*slot).name().as_str(), self.message_at(*slot)))
    }

    /// Context names in order of first appearance.
    pub fn context_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::with_capacity(self.primary.len());
        for context in self.document.contexts() {
            if !names.contains(&context.name().as_str()) {
                names.push(context.name());
            }
        }
        names
    }

    pub fn stats(&self) -> CatalogStats {
        let mut stats = CatalogStats {
            contexts: self.primary.len(),
            ..CatalogStats::default()
        };

        for slot in self.primary.values().flat_map(FxHashMap::values) {
            let message = self.message_at(*slot);
            stats.messages += 1;
            if message.status() == MessageStatus::Unfinished {
                stats.unfinished += 1;
            }
            match message.translation() {
                translation if translation.is_untranslated() => stats.untranslated += 1,
                translation if translation.usable().is_some() => stats.translated += 1,
                _ => stats.empty += 1,
            }
        }

        stats
    }

    fn context_at(&self, slot: Slot) -> &Context {
        &self.document.contexts()[slot.context]
    }

    fn message_at(&self, slot: Slot) -> &Message {
        &self.context_at(slot).messages()[slot.message]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Context, Message, Translation};

    fn text(value: &str) -> Translation {
        Translation::from_text(value)
    }

    fn sample() -> CatalogDocument {
        CatalogDocument::new("es")
            .unwrap()
            .with_context(
                Context::new("doc")
                    .with_message(Message::new("tab_arc", text("Relaciones")))
                    .with_message(Message::new("tooltip_tab_arc", text("None")))
                    .with_message(Message::new("tab_arc", text("Arc")))
                    .with_message(Message::new("tooltip_tab_arc", text("Arco"))),
            )
            .with_context(
                Context::new("element")
                    .with_message(Message::new("btn_accept", text("Aceptar")))
                    .with_message(
                        Message::new("old", text("Viejo")).with_status(MessageStatus::Obsolete),
                    ),
            )
    }

    #[test]
    fn last_definition_wins_by_default() {
        let index = CatalogIndex::build(sample());

        assert_eq!(
            index.message("doc", "tab_arc").unwrap().translation(),
            &text("Arc")
        );
        assert_eq!(
            index.duplicates(),
            &[
                Duplicate {
                    context: "doc".to_string(),
                    key: "tab_arc".to_string()
                },
                Duplicate {
                    context: "doc".to_string(),
                    key: "tooltip_tab_arc".to_string()
                },
            ]
        );
    }

    #[test]
    fn first_wins_keeps_the_earlier_definition() {
        let index = CatalogIndex::build_with_policy(sample(), DuplicatePolicy::FirstWins).unwrap();

        assert_eq!(
            index.message("doc", "tab_arc").unwrap().translation(),
            &text("Relaciones")
        );
    }

    #[test]
    fn reject_fails_on_the_first_duplicate() {
        let err = CatalogIndex::build_with_policy(sample(), DuplicatePolicy::Reject).unwrap_err();

        assert!(matches!(
            err,
            CatalogError::DuplicateMessage { ref context, ref key }
                if context == "doc" && key == "tab_arc"
        ));
    }

    #[test]
    fn obsolete_messages_are_not_indexed() {
        let index = CatalogIndex::build(sample());

        assert!(index.message("element", "old").is_none());
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn secondary_map_lists_every_context() {
        let doc = sample().with_context(
            Context::new("doc_extra").with_message(Message::new("btn_accept", text("Aceptar"))),
        );
        let index = CatalogIndex::build(doc);

        let contexts: Vec<&str> = index
            .messages_for_key("btn_accept")
            .map(|(context, _)| context)
            .collect();
        assert_eq!(contexts, vec!["element", "doc_extra"]);
        assert_eq!(index.messages_for_key("missing").count(), 0);
    }

    #[test]
    fn same_named_contexts_share_one_key_space() {
        let doc = CatalogDocument::new("es")
            .unwrap()
            .with_context(
                Context::new("doc")
                    .with_message(Message::new("a", text("uno")))
                    .with_message(Message::new("b", text("dos"))),
            )
            .with_context(Context::new("doc").with_message(Message::new("a", text("otro"))));
        let index = CatalogIndex::build(doc);

        assert_eq!(index.message("doc", "a").unwrap().translation(), &text("otro"));
        assert_eq!(index.message("doc", "b").unwrap().translation(), &text("dos"));
        assert_eq!(index.context_names(), vec!["doc"]);
    }

    #[test]
    fn stats_count_each_translation_kind() {
        let doc = CatalogDocument::new("es").unwrap().with_context(
            Context::new("c")
                .with_message(Message::new("a", text("uno")))
                .with_message(Message::new("b", text("None")))
                .with_message(Message::new("c", text("")))
                .with_message(Message::new("d", Translation::Absent))
                .with_message(
                    Message::new("e", text("cinco")).with_status(MessageStatus::Unfinished),
                ),
        );
        let stats = CatalogIndex::build(doc).stats();

        assert_eq!(
            stats,
            CatalogStats {
                contexts: 1,
                messages: 5,
                translated: 2,
                untranslated: 1,
                empty: 2,
                unfinished: 1,
            }
        );
        assert!((stats.coverage_percent() - 40.0).abs() < f64::EPSILON);
    }
}
