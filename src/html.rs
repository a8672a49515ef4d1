//! Small lookups over parsed portal pages.
//!
//! Every helper turns a missing element or attribute into
//! [`ForumError::Parse`] so page scrapers can use `?` throughout.

use std::str::FromStr;

use scraper::{ElementRef, Selector};

use crate::error::{ForumError, Result};

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ForumError::parse(format!("invalid selector {css:?}: {e:?}")))
}

/// First descendant of `scope` matching `selector`.
pub(crate) fn select_first<'a>(
    scope: ElementRef<'a>,
    selector: &Selector,
    what: &str,
) -> Result<ElementRef<'a>> {
    scope
        .select(selector)
        .next()
        .ok_or_else(|| ForumError::parse(format!("missing {what}")))
}

pub(crate) fn attr<'a>(element: ElementRef<'a>, name: &str, what: &str) -> Result<&'a str> {
    element
        .value()
        .attr(name)
        .ok_or_else(|| ForumError::parse(format!("missing {name} attribute on {what}")))
}

/// Attribute parsed as a number (ids, timestamps).
pub(crate) fn numeric_attr<T: FromStr>(element: ElementRef<'_>, name: &str, what: &str) -> Result<T> {
    let raw = attr(element, name, what)?;
    raw.trim()
        .parse()
        .map_err(|_| ForumError::parse(format!("invalid {name} {raw:?} on {what}")))
}

/// Concatenated text content, trimmed.
pub(crate) fn text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// First element child of `element`, skipping text and comment nodes.
pub(crate) fn first_child_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.children().find_map(ElementRef::wrap)
}

/// Next sibling that is an element, skipping whitespace between tags.
pub(crate) fn next_sibling_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.next_siblings().find_map(ElementRef::wrap)
}
