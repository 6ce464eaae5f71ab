//! CSS selector-based extraction
//!
//! Uses the scraper crate to read the first element a selector matches.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Attributes consulted for an image URL, in order
const IMAGE_ATTRS: [&str; 2] = ["src", "data-src"];

/// Text of the first element matching `selector`, whitespace-collapsed.
///
/// Only the first match is consulted; an element with blank text yields
/// `None` so the caller can fall through to its next candidate.
pub fn select_text(document: &Html, selector: &Selector) -> Option<String> {
    let element = document.select(selector).next()?;
    let text = element_text(&element);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Image URL of the first element matching `selector`, resolved against `base`.
pub fn select_image_url(document: &Html, selector: &Selector, base: &Url) -> Option<String> {
    let element = document.select(selector).next()?;

    IMAGE_ATTRS
        .iter()
        .filter_map(|attr| element.value().attr(attr))
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .find_map(|raw| base.join(raw).ok())
        .map(|url| url.to_string())
}

fn element_text(element: &ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
