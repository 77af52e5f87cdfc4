//! Small helpers over `scraper` shared by the page readers.

use scraper::{ElementRef, Selector};

/// Parses a CSS selector, reporting a readable reason on failure.
pub(crate) fn selector(css: &str) -> Result<Selector, String> {
    Selector::parse(css).map_err(|e| format!("invalid selector {css:?}: {e:?}"))
}

/// Trimmed text of the first match below `scope`.
pub(crate) fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
}

/// Trimmed text of the first match below `scope`, empty when nothing matches.
pub(crate) fn text_or_empty(scope: ElementRef<'_>, selector: &Selector) -> String {
    first_text(scope, selector).unwrap_or_default()
}

/// Attribute value of the first match below `scope`.
pub(crate) fn first_attr(scope: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    scope
        .select(selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(ToString::to_string)
}
