//! Text normalization at the catalog boundary.
//!
//! Product pages and stock responses arrive GBK-encoded; everything past
//! [`decode_legacy_text`] works on ordinary UTF-8 strings.

use std::borrow::Cow;

use encoding_rs::GBK;
use tracing::trace;

/// Display names longer than this many characters are cut.
pub const MAX_NAME_LEN: usize = 40;

const ELLIPSIS: &str = "...";

/// Decodes a GBK body. Malformed sequences become U+FFFD.
#[must_use]
pub fn decode_legacy_text(bytes: &[u8]) -> String {
    let (text, had_errors) = GBK.decode_without_bom_handling(bytes);
    if had_errors {
        trace!(bytes = bytes.len(), "legacy body contained undecodable sequences");
    }
    text.into_owned()
}

/// Keeps the first `MAX_NAME_LEN - 1` characters of an over-long name and
/// appends `...`.
#[must_use]
pub fn truncate_name(name: &str) -> Cow<'_, str> {
    if name.chars().count() > MAX_NAME_LEN {
        let kept: String = name.chars().take(MAX_NAME_LEN - 1).collect();
        Cow::Owned(kept + ELLIPSIS)
    } else {
        Cow::Borrowed(name)
    }
}

/// Upgrades a protocol-relative link (`//host/path`) to https.
#[must_use]
pub fn normalize_link(link: &str) -> String {
    let link = link.trim();
    if link.starts_with("//") {
        format!("https:{link}")
    } else {
        link.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_gbk_bytes() {
        let (encoded, _, _) = GBK.encode("现货 in stock");
        assert_eq!(decode_legacy_text(&encoded), "现货 in stock");
    }

    #[test]
    fn test_decode_plain_ascii_is_unchanged() {
        assert_eq!(decode_legacy_text(br#"{"p":"1.00"}"#), r#"{"p":"1.00"}"#);
    }

    #[test]
    fn test_short_names_are_borrowed() {
        assert!(matches!(truncate_name("Phone"), Cow::Borrowed("Phone")));
    }

    #[test]
    fn test_long_names_are_cut_by_character() {
        let name = "手".repeat(45);
        let truncated = truncate_name(&name);
        assert_eq!(truncated.chars().count(), MAX_NAME_LEN - 1 + ELLIPSIS.len());
        assert!(truncated.ends_with("..."));
        assert!(truncated.starts_with(&"手".repeat(39)));
    }

    #[test]
    fn test_exactly_max_len_is_kept() {
        let name = "a".repeat(MAX_NAME_LEN);
        assert_eq!(truncate_name(&name), name);
    }

    #[test]
    fn test_normalize_link() {
        assert_eq!(
            normalize_link("//cart.jd.com/gate.action?pid=1"),
            "https://cart.jd.com/gate.action?pid=1"
        );
        assert_eq!(
            normalize_link(" https://cart.jd.com/gate.action "),
            "https://cart.jd.com/gate.action"
        );
        assert_eq!(normalize_link("http://127.0.0.1:80/x"), "http://127.0.0.1:80/x");
    }
}
