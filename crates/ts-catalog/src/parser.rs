//! Parsing of `.ts` catalog documents.
//!
//! The accepted structure is the subset of the Qt Linguist format the
//! catalog generator writes:
//!
//! ```xml
//! <TS version="2.0" language="es">
//!     <context>
//!         <name>doc</name>
//!         <message>
//!             <source>btn_accept</source>
//!             <translation>Aceptar</translation>
//!         </message>
//!     </context>
//! </TS>
//! ```
//!
//! Elements outside that vocabulary are kept as [`OpaqueElement`]s on their
//! parent. Catalog elements found at the wrong depth are rejected.

use crate::error::CatalogError;
use crate::model::{
    CatalogDocument, Context, Message, MessageStatus, OpaqueElement, Translation, parse_language,
};
use encoding_rs::{Encoding, UTF_8};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, BytesText, Event};
use std::borrow::Cow;
use std::path::Path;

const TS: &[u8] = b"TS";
const CONTEXT: &[u8] = b"context";
const NAME: &[u8] = b"name";
const MESSAGE: &[u8] = b"message";
const SOURCE: &[u8] = b"source";
const TRANSLATION: &[u8] = b"translation";

/// Decodes and parses a serialized catalog.
pub fn parse(bytes: &[u8]) -> Result<CatalogDocument, CatalogError> {
    let text = decode(bytes)?;
    parse_str(&text)
}

/// Parses a catalog that is already decoded.
pub fn parse_str(text: &str) -> Result<CatalogDocument, CatalogError> {
    let document = Parser::new(text).document()?;

    tracing::debug!(
        "Parsed catalog for '{}': {} contexts, {} messages",
        document.language_tag(),
        document.contexts().len(),
        document.message_count()
    );

    Ok(document)
}

/// Reads and parses the catalog stored at `path`.
pub fn parse_file(path: impl AsRef<Path>) -> Result<CatalogDocument, CatalogError> {
    let path = path.as_ref();
    let bytes = fs_err::read(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&bytes)
}

/// Decodes `bytes` using, in order of precedence, the byte order mark, the
/// encoding named by the XML declaration, or UTF-8.
pub fn decode(bytes: &[u8]) -> Result<Cow<'_, str>, CatalogError> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return decode_with(encoding, &bytes[bom_len..]);
    }

    let encoding = match declared_encoding(bytes) {
        Some(label) => {
            Encoding::for_label(label.as_bytes()).ok_or_else(|| CatalogError::Encoding {
                reason: "unknown encoding label".to_string(),
                encoding: label,
            })?
        },
        None => UTF_8,
    };

    decode_with(encoding, bytes)
}

fn decode_with<'a>(
    encoding: &'static Encoding,
    bytes: &'a [u8],
) -> Result<Cow<'a, str>, CatalogError> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or_else(|| CatalogError::Encoding {
            encoding: encoding.name().to_string(),
            reason: "byte stream contains invalid sequences".to_string(),
        })
}

/// Extracts the `encoding` pseudo-attribute of a leading XML declaration.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let rest = bytes.strip_prefix(b"<?xml")?;
    let end = rest.windows(2).position(|window| window == b"?>")?;
    let declaration = std::str::from_utf8(&rest[..end]).ok()?;

    let after_key = &declaration[declaration.find("encoding")? + "encoding".len()..];
    let value = after_key.trim_start().strip_prefix('=')?.trim_start();
    let quote = value.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &value[1..];
    let close = value.find(quote)?;

    Some(value[..close].to_string())
}

fn is_catalog_element(name: &[u8]) -> bool {
    matches!(name, TS | CONTEXT | NAME | MESSAGE | SOURCE | TRANSLATION)
}

fn display_name(name: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(name)
}

fn is_blank(text: &BytesText<'_>) -> bool {
    text.iter().all(u8::is_ascii_whitespace)
}

struct Parser<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            reader: Reader::from_str(text),
        }
    }

    fn offset(&self) -> u64 {
        self.reader.buffer_position() as u64
    }

    fn malformed(&self, reason: impl Into<String>) -> CatalogError {
        CatalogError::malformed(self.offset(), reason)
    }

    /// Next event that carries meaning for the catalog.
    fn next(&mut self) -> Result<Event<'a>, CatalogError> {
        loop {
            match self.reader.read_event() {
                Ok(Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_)) => {},
                Ok(event) => return Ok(event),
                Err(err) => {
                    return Err(CatalogError::malformed(
                        self.reader.error_position() as u64,
                        err.to_string(),
                    ));
                },
            }
        }
    }

    fn document(&mut self) -> Result<CatalogDocument, CatalogError> {
        loop {
            match self.next()? {
                Event::Start(start) if start.name().as_ref() == TS => {
                    let document = self.ts(&start, false)?;
                    self.finish()?;
                    return Ok(document);
                },
                Event::Empty(start) if start.name().as_ref() == TS => {
                    let document = self.ts(&start, true)?;
                    self.finish()?;
                    return Ok(document);
                },
                Event::Start(start) | Event::Empty(start) => {
                    return Err(self.malformed(format!(
                        "expected <TS> root element, found <{}>",
                        display_name(start.name().as_ref())
                    )));
                },
                Event::Text(text) if is_blank(&text) => {},
                Event::Eof => return Err(self.malformed("document has no <TS> root element")),
                _ => return Err(self.malformed("unexpected content before <TS>")),
            }
        }
    }

    /// Only whitespace and comments may follow the root element.
    fn finish(&mut self) -> Result<(), CatalogError> {
        loop {
            match self.next()? {
                Event::Eof => return Ok(()),
                Event::Text(text) if is_blank(&text) => {},
                _ => return Err(self.malformed("unexpected content after </TS>")),
            }
        }
    }

    fn ts(&mut self, start: &BytesStart<'_>, empty: bool) -> Result<CatalogDocument, CatalogError> {
        let offset = self.offset();
        let mut language = None;
        let mut version = None;
        let mut source_language = None;

        for (key, value) in self.attributes(start)? {
            match key.as_str() {
                "language" => language = Some(value),
                "version" => version = Some(value),
                "sourcelanguage" => source_language = Some(value),
                _ => {},
            }
        }

        let language_tag =
            language.ok_or_else(|| self.malformed("<TS> is missing the language attribute"))?;
        parse_language(&language_tag, offset)?;

        let mut document = CatalogDocument::new(language_tag)?;
        if let Some(version) = version {
            document = document.with_version(version);
        }
        if let Some(source_language) = source_language {
            document = document.with_source_language(source_language);
        }

        if empty {
            return Ok(document);
        }

        loop {
            match self.next()? {
                Event::Start(start) if start.name().as_ref() == CONTEXT => {
                    let context = self.context()?;
                    document.push_context(context);
                },
                Event::Empty(start) if start.name().as_ref() == CONTEXT => {
                    return Err(self.malformed("<context> has no <name>"));
                },
                Event::Start(start) => {
                    let element = self.opaque(&start, "TS")?;
                    document.push_extra(element);
                },
                Event::Empty(start) => {
                    let element = self.opaque_empty(&start, "TS")?;
                    document.push_extra(element);
                },
                Event::Text(text) if is_blank(&text) => {},
                Event::End(_) => return Ok(document),
                Event::Eof => return Err(self.malformed("unexpected end of document inside <TS>")),
                _ => return Err(self.malformed("unexpected text inside <TS>")),
            }
        }
    }

    fn context(&mut self) -> Result<Context, CatalogError> {
        let mut name = None;
        let mut messages = Vec::new();
        let mut extra = Vec::new();

        loop {
            match self.next()? {
                Event::Start(start) if start.name().as_ref() == NAME => {
                    if name.is_some() {
                        return Err(self.malformed("<context> has more than one <name>"));
                    }
                    name = Some(self.text(NAME, &mut extra)?);
                },
                Event::Empty(start) if start.name().as_ref() == NAME => {
                    if name.is_some() {
                        return Err(self.malformed("<context> has more than one <name>"));
                    }
                    name = Some(String::new());
                },
                Event::Start(start) if start.name().as_ref() == MESSAGE => {
                    messages.push(self.message()?);
                },
                Event::Empty(start) if start.name().as_ref() == MESSAGE => {
                    return Err(self.malformed("<message> has no <source>"));
                },
                Event::Start(start) => extra.push(self.opaque(&start, "context")?),
                Event::Empty(start) => extra.push(self.opaque_empty(&start, "context")?),
                Event::Text(text) if is_blank(&text) => {},
                Event::End(_) => break,
                Event::Eof => {
                    return Err(self.malformed("unexpected end of document inside <context>"));
                },
                _ => return Err(self.malformed("unexpected text inside <context>")),
            }
        }

        let name = name.ok_or_else(|| self.malformed("<context> has no <name>"))?;
        let mut context = Context::new(name);
        for message in messages {
            context.push_message(message);
        }
        for element in extra {
            context.push_extra(element);
        }
        Ok(context)
    }

    fn message(&mut self) -> Result<Message, CatalogError> {
        let mut source = None;
        let mut translation = None;
        let mut extra = Vec::new();

        loop {
            match self.next()? {
                Event::Start(start) if start.name().as_ref() == SOURCE => {
                    if source.is_some() {
                        return Err(self.malformed("<message> has more than one <source>"));
                    }
                    source = Some(self.text(SOURCE, &mut extra)?);
                },
                Event::Empty(start) if start.name().as_ref() == SOURCE => {
                    return Err(self.malformed("<message> has an empty <source>"));
                },
                Event::Start(start) if start.name().as_ref() == TRANSLATION => {
                    if translation.is_some() {
                        return Err(self.malformed("<message> has more than one <translation>"));
                    }
                    let status = self.status(&start)?;
                    let text = self.text(TRANSLATION, &mut extra)?;
                    translation = Some((Translation::from_text(text), status));
                },
                Event::Empty(start) if start.name().as_ref() == TRANSLATION => {
                    if translation.is_some() {
                        return Err(self.malformed("<message> has more than one <translation>"));
                    }
                    let status = self.status(&start)?;
                    translation = Some((Translation::Absent, status));
                },
                Event::Start(start) => extra.push(self.opaque(&start, "message")?),
                Event::Empty(start) => extra.push(self.opaque_empty(&start, "message")?),
                Event::Text(text) if is_blank(&text) => {},
                Event::End(_) => break,
                Event::Eof => {
                    return Err(self.malformed("unexpected end of document inside <message>"));
                },
                _ => return Err(self.malformed("unexpected text inside <message>")),
            }
        }

        let source = source.ok_or_else(|| self.malformed("<message> has no <source>"))?;
        if source.is_empty() {
            return Err(self.malformed("<message> has an empty <source>"));
        }

        let (translation, status) =
            translation.unwrap_or((Translation::Absent, MessageStatus::Finished));

        Ok(Message::new(source, translation)
            .with_status(status)
            .with_extra(extra))
    }

    fn status(&self, start: &BytesStart<'_>) -> Result<MessageStatus, CatalogError> {
        for (key, value) in self.attributes(start)? {
            if key == "type" {
                return Ok(MessageStatus::from_type_attribute(&value).unwrap_or_else(|| {
                    tracing::debug!("Ignoring unknown translation type '{}'", value);
                    MessageStatus::Finished
                }));
            }
        }
        Ok(MessageStatus::Finished)
    }

    /// Collects the character data of a leaf element up to its end tag.
    ///
    /// Nested unknown elements are moved to `extra`.
    fn text(
        &mut self,
        tag: &[u8],
        extra: &mut Vec<OpaqueElement>,
    ) -> Result<String, CatalogError> {
        let mut content = String::new();
        let parent = display_name(tag).into_owned();

        loop {
            match self.next()? {
                Event::Text(text) => {
                    let unescaped = text
                        .unescape()
                        .map_err(|err| self.malformed(err.to_string()))?;
                    content.push_str(&unescaped);
                },
                Event::CData(data) => content.push_str(&String::from_utf8_lossy(&data)),
                Event::Start(start) => extra.push(self.opaque(&start, &parent)?),
                Event::Empty(start) => extra.push(self.opaque_empty(&start, &parent)?),
                Event::End(_) => return Ok(content),
                Event::Eof => {
                    return Err(self.malformed(format!(
                        "unexpected end of document inside <{}>",
                        parent
                    )));
                },
                _ => {},
            }
        }
    }

    fn opaque(
        &mut self,
        start: &BytesStart<'_>,
        parent: &str,
    ) -> Result<OpaqueElement, CatalogError> {
        let mut element = self.opaque_empty(start, parent)?;
        let name = element.name.clone();

        loop {
            match self.next()? {
                Event::Text(text) => {
                    let unescaped = text
                        .unescape()
                        .map_err(|err| self.malformed(err.to_string()))?;
                    element.text.push_str(&unescaped);
                },
                Event::CData(data) => element.text.push_str(&String::from_utf8_lossy(&data)),
                Event::Start(child) => element.children.push(self.opaque(&child, &name)?),
                Event::Empty(child) => element.children.push(self.opaque_empty(&child, &name)?),
                Event::End(_) => return Ok(element),
                Event::Eof => {
                    return Err(self.malformed(format!(
                        "unexpected end of document inside <{}>",
                        name
                    )));
                },
                _ => {},
            }
        }
    }

    fn opaque_empty(
        &self,
        start: &BytesStart<'_>,
        parent: &str,
    ) -> Result<OpaqueElement, CatalogError> {
        let name = start.name();
        if is_catalog_element(name.as_ref()) {
            return Err(self.malformed(format!(
                "<{}> is not allowed inside <{}>",
                display_name(name.as_ref()),
                parent
            )));
        }

        let mut element = OpaqueElement::new(display_name(name.as_ref()));
        element.attributes = self.attributes(start)?;
        Ok(element)
    }

    fn attributes(&self, start: &BytesStart<'_>) -> Result<Vec<(String, String)>, CatalogError> {
        start
            .attributes()
            .map(|attr| {
                let attr = attr.map_err(|err| self.malformed(err.to_string()))?;
                let value = attr
                    .unescape_value()
                    .map_err(|err| self.malformed(err.to_string()))?;
                Ok((
                    display_name(attr.key.as_ref()).into_owned(),
                    value.into_owned(),
                ))
            })
            .collect()
    }
}
