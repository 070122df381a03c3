//! Serialization of a [`CatalogDocument`] back to the `.ts` format.

use crate::error::CatalogError;
use crate::model::{CatalogDocument, Message, OpaqueElement, Translation};
use quick_xml::escape::{escape, partial_escape};
use std::path::Path;

const DEFAULT_VERSION: &str = "2.0";

/// Renders `document` as a tab-indented `.ts` document.
///
/// Absent translations are omitted unless they carry a status, which is kept
/// on an empty `<translation/>`. The sentinel is written as `None`, so
/// `Translation::Text("None")` reads back as `Translation::Untranslated`.
/// Unknown elements are written back after the known ones of their parent.
pub fn write_catalog(document: &CatalogDocument) -> String {
    let mut out = String::new();

    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    out.push_str("<!DOCTYPE TS>\n");
    out.push_str(&format!(
        "<TS version=\"{}\"",
        escape(document.version().unwrap_or(DEFAULT_VERSION))
    ));
    if let Some(source_language) = document.source_language() {
        out.push_str(&format!(" sourcelanguage=\"{}\"", escape(source_language)));
    }
    out.push_str(&format!(
        " language=\"{}\">\n",
        escape(document.language_tag().as_str())
    ));

    for element in document.extra() {
        write_opaque(&mut out, element, 1);
    }

    for context in document.contexts() {
        out.push_str("\t<context>\n");
        out.push_str(&format!(
            "\t\t<name>{}</name>\n",
            partial_escape(context.name().as_str())
        ));
        for element in context.extra() {
            write_opaque(&mut out, element, 2);
        }
        for message in context.messages() {
            write_message(&mut out, message);
        }
        out.push_str("\t</context>\n");
    }

    out.push_str("</TS>\n");
    out
}

/// Writes `document` to `path` unless the file already holds the same content.
///
/// Returns `true` when the file was written.
pub fn write_catalog_file(
    path: impl AsRef<Path>,
    document: &CatalogDocument,
) -> Result<bool, CatalogError> {
    let path = path.as_ref();
    let content = write_catalog(document);
    let write_error = |source| CatalogError::Write {
        path: path.to_path_buf(),
        source,
    };

    if path.exists() {
        let current = fs_err::read_to_string(path).map_err(write_error)?;
        if current == content {
            tracing::debug!("Catalog file unchanged: {}", path.display());
            return Ok(false);
        }
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs_err::create_dir_all(parent).map_err(write_error)?;
    }
    fs_err::write(path, content).map_err(write_error)?;
    tracing::info!("Updated catalog file: {}", path.display());

    Ok(true)
}

fn write_message(out: &mut String, message: &Message) {
    out.push_str("\t\t<message>\n");
    out.push_str(&format!(
        "\t\t\t<source>{}</source>\n",
        partial_escape(message.source().as_str())
    ));

    match (message.translation(), message.status().as_type_attribute()) {
        (Translation::Absent, None) => {},
        (Translation::Absent, Some(kind)) => {
            out.push_str(&format!("\t\t\t<translation type=\"{}\"/>\n", kind));
        },
        (translation, Some(kind)) => out.push_str(&format!(
            "\t\t\t<translation type=\"{}\">{}</translation>\n",
            kind,
            partial_escape(translation.raw().unwrap_or_default())
        )),
        (translation, None) => out.push_str(&format!(
            "\t\t\t<translation>{}</translation>\n",
            partial_escape(translation.raw().unwrap_or_default())
        )),
    }

    for element in message.extra() {
        write_opaque(out, element, 3);
    }
    out.push_str("\t\t</message>\n");
}

fn write_opaque(out: &mut String, element: &OpaqueElement, depth: usize) {
    out.push_str(&"\t".repeat(depth));
    write_opaque_inline(out, element);
    out.push('\n');
}

fn write_opaque_inline(out: &mut String, element: &OpaqueElement) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        out.push_str(&format!(" {}=\"{}\"", key, escape(value.as_str())));
    }

    if element.text.is_empty() && element.children.is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    out.push_str(&partial_escape(element.text.as_str()));
    for child in &element.children {
        write_opaque_inline(out, child);
    }
    out.push_str(&format!("</{}>", element.name));
}
