//! In-memory representation of a parsed catalog document.

use crate::error::CatalogError;
use getset::{CopyGetters, Getters};
use unic_langid::LanguageIdentifier;

/// Translation text that marks a message as deliberately left untranslated.
pub const UNTRANSLATED_SENTINEL: &str = "None";

/// The translation side of a [`Message`].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Translation {
    /// Translation text, stored verbatim. May be empty.
    ///
    /// `Text("None")` behaves like [`Translation::Untranslated`] and reads back
    /// as that variant once written.
    Text(String),
    /// The message carries no `<translation>` text. An empty element
    /// (`<translation type="unfinished"/>`) is also absent.
    Absent,
    /// The translation is the `None` sentinel.
    Untranslated,
}

impl Translation {
    /// Builds a translation from raw element text, recognizing the sentinel.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text == UNTRANSLATED_SENTINEL {
            Self::Untranslated
        } else {
            Self::Text(text)
        }
    }

    /// Returns the text if it can be shown to a user in place of the source.
    pub fn usable(&self) -> Option<&str> {
        match self {
            Self::Text(text) if !text.is_empty() && text != UNTRANSLATED_SENTINEL => Some(text),
            _ => None,
        }
    }

    /// The text as it appears in the document. The sentinel maps to `None`.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Absent => None,
            Self::Untranslated => Some(UNTRANSLATED_SENTINEL),
        }
    }

    pub fn is_untranslated(&self) -> bool {
        match self {
            Self::Untranslated => true,
            Self::Text(text) => text == UNTRANSLATED_SENTINEL,
            Self::Absent => false,
        }
    }
}

/// Progress marker carried by the `type` attribute of `<translation>`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum MessageStatus {
    #[default]
    Finished,
    Unfinished,
    Obsolete,
    Vanished,
}

impl MessageStatus {
    /// Maps a `type` attribute value. Unknown values yield `None`.
    pub fn from_type_attribute(value: &str) -> Option<Self> {
        match value {
            "unfinished" => Some(Self::Unfinished),
            "obsolete" => Some(Self::Obsolete),
            "vanished" => Some(Self::Vanished),
            _ => None,
        }
    }

    pub fn as_type_attribute(self) -> Option<&'static str> {
        match self {
            Self::Finished => None,
            Self::Unfinished => Some("unfinished"),
            Self::Obsolete => Some("obsolete"),
            Self::Vanished => Some("vanished"),
        }
    }

    /// Obsolete and vanished messages no longer exist in the application.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Finished | Self::Unfinished)
    }
}

/// An element the parser does not understand, kept so it can be written back.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OpaqueElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<OpaqueElement>,
}

impl OpaqueElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// One translatable unit.
#[derive(Clone, Debug, Eq, Getters, CopyGetters, PartialEq)]
pub struct Message {
    #[getset(get = "pub")]
    source: String,
    #[getset(get = "pub")]
    translation: Translation,
    #[getset(get_copy = "pub")]
    status: MessageStatus,
    #[getset(get = "pub")]
    extra: Vec<OpaqueElement>,
}

impl Message {
    pub fn new(source: impl Into<String>, translation: Translation) -> Self {
        Self {
            source: source.into(),
            translation,
            status: MessageStatus::Finished,
            extra: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: MessageStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_extra(mut self, extra: Vec<OpaqueElement>) -> Self {
        self.extra = extra;
        self
    }
}

/// A named group of messages, usually one dialog or subsystem.
#[derive(Clone, Debug, Eq, Getters, PartialEq)]
#[getset(get = "pub")]
pub struct Context {
    name: String,
    messages: Vec<Message>,
    extra: Vec<OpaqueElement>,
}

impl Context {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            messages: Vec::new(),
            extra: Vec::new(),
        }
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn push_extra(&mut self, element: OpaqueElement) {
        self.extra.push(element);
    }
}

/// A whole catalog for one target language.
#[derive(Clone, Debug, Eq, Getters, PartialEq)]
pub struct CatalogDocument {
    /// The `language` attribute exactly as written.
    #[getset(get = "pub")]
    language_tag: String,
    #[getset(get = "pub")]
    language: LanguageIdentifier,
    version: Option<String>,
    source_language: Option<String>,
    #[getset(get = "pub")]
    contexts: Vec<Context>,
    #[getset(get = "pub")]
    extra: Vec<OpaqueElement>,
}

impl CatalogDocument {
    /// Creates an empty document for `language_tag` (`es`, `es_ES`, `pt-BR`...).
    pub fn new(language_tag: impl Into<String>) -> Result<Self, CatalogError> {
        let language_tag = language_tag.into();
        let language = parse_language(&language_tag, 0)?;

        Ok(Self {
            language_tag,
            language,
            version: None,
            source_language: None,
            contexts: Vec::new(),
            extra: Vec::new(),
        })
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn source_language(&self) -> Option<&str> {
        self.source_language.as_deref()
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_source_language(mut self, language: impl Into<String>) -> Self {
        self.source_language = Some(language.into());
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.contexts.push(context);
        self
    }

    pub fn push_context(&mut self, context: Context) {
        self.contexts.push(context);
    }

    pub fn push_extra(&mut self, element: OpaqueElement) {
        self.extra.push(element);
    }

    /// Total number of message entries, duplicates and obsolete ones included.
    pub fn message_count(&self) -> usize {
        self.contexts.iter().map(|ctx| ctx.messages.len()).sum()
    }
}

pub(crate) fn parse_language(tag: &str, offset: u64) -> Result<LanguageIdentifier, CatalogError> {
    if tag.trim().is_empty() {
        return Err(CatalogError::malformed(
            offset,
            "the language attribute of <TS> is empty",
        ));
    }

    tag.parse::<LanguageIdentifier>().map_err(|err| {
        CatalogError::malformed(offset, format!("invalid language tag '{}': {}", tag, err))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_text_is_untranslated() {
        assert_eq!(Translation::from_text("None"), Translation::Untranslated);
        assert_eq!(
            Translation::from_text("none"),
            Translation::Text("none".to_string())
        );
    }

    #[test]
    fn only_non_empty_text_is_usable() {
        assert_eq!(Translation::from_text("Aceptar").usable(), Some("Aceptar"));
        assert_eq!(Translation::from_text("").usable(), None);
        assert_eq!(Translation::Absent.usable(), None);
        assert_eq!(Translation::Untranslated.usable(), None);
        assert_eq!(Translation::Text("None".to_string()).usable(), None);
    }

    #[test]
    fn sentinel_built_as_text_is_still_untranslated() {
        assert!(Translation::Text("None".to_string()).is_untranslated());
        assert!(!Translation::Text("Nada".to_string()).is_untranslated());
        assert!(!Translation::Absent.is_untranslated());
    }

    #[test]
    fn underscore_language_tags_are_accepted() {
        let doc = CatalogDocument::new("es_ES").unwrap();
        assert_eq!(doc.language_tag(), "es_ES");
        assert_eq!(doc.language().to_string(), "es-ES");
    }

    #[test]
    fn empty_language_tag_is_rejected() {
        assert!(matches!(
            CatalogDocument::new("  "),
            Err(CatalogError::Malformed { .. })
        ));
    }

    #[test]
    fn status_round_trips_through_type_attribute() {
        for status in [
            MessageStatus::Unfinished,
            MessageStatus::Obsolete,
            MessageStatus::Vanished,
        ] {
            let attr = status.as_type_attribute().unwrap();
            assert_eq!(MessageStatus::from_type_attribute(attr), Some(status));
        }
        assert_eq!(MessageStatus::Finished.as_type_attribute(), None);
    }
}
