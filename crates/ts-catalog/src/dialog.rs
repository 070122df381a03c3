//! Helpers for translating dialogs whose widgets are keyed by object name.
//!
//! A dialog context holds its window title under [`TITLE_KEY`], each widget
//! label under the widget name and each tooltip under
//! [`TOOLTIP_PREFIX`]` + widget name`. Only translations defined in the
//! dialog's own context are applied.

use crate::resolver::{Origin, Resolve};

pub const TITLE_KEY: &str = "title";
pub const TOOLTIP_PREFIX: &str = "tooltip_";

/// Translated strings for one widget. `None` means "keep the designer text".
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WidgetText {
    pub label: Option<String>,
    pub tooltip: Option<String>,
}

/// The translated window title of `dialog`, if the catalog has one.
pub fn dialog_title<R: Resolve + ?Sized>(resolver: &R, dialog: &str) -> Option<String> {
    found(resolver, dialog, TITLE_KEY)
}

/// The translated label and tooltip of `widget` inside `dialog`.
pub fn widget_text<R: Resolve + ?Sized>(resolver: &R, dialog: &str, widget: &str) -> WidgetText {
    WidgetText {
        label: found(resolver, dialog, widget),
        tooltip: found(resolver, dialog, &format!("{}{}", TOOLTIP_PREFIX, widget)),
    }
}

fn found<R: Resolve + ?Sized>(resolver: &R, context: &str, key: &str) -> Option<String> {
    resolver
        .resolve(context, key, "")
        .ok()
        .filter(|entry| entry.found && entry.origin == Origin::Exact)
        .map(|entry| entry.text)
}
