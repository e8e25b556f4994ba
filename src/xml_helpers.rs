//! Shared XML helpers for the spreadsheet reader.
//!
//! All functions handle namespace-prefixed attributes and UTF-8 conversion
//! safely, returning `None` instead of failing.

use quick_xml::events::{BytesStart, BytesText};

/// Extract a string attribute value by key.
///
/// Entities are unescaped. Returns `None` if the attribute is missing or
/// not valid UTF-8.
pub fn attr_string(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return attr.unescape_value().ok().map(|v| v.into_owned());
        }
    }
    None
}

/// Extract a string attribute by local name (ignoring namespace prefix).
///
/// `r:id` and `id` both match `b"id"`.
pub fn attr_string_local(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == key {
            return attr.unescape_value().ok().map(|v| v.into_owned());
        }
    }
    None
}

/// Decode a text event, unescaping entities only when one is present.
pub fn text_string(text: &BytesText) -> Option<String> {
    let raw = text.as_ref();
    if raw.contains(&b'&') {
        text.unescape().ok().map(|s| s.to_string())
    } else {
        std::str::from_utf8(raw).ok().map(ToString::to_string)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    fn make_start(xml: &str) -> BytesStart<'_> {
        // Strip < and > / /> to get just the tag content
        let content = xml
            .trim_start_matches('<')
            .trim_end_matches('>')
            .trim_end_matches('/')
            .trim_end();
        BytesStart::from_content(content, content.find(' ').unwrap_or(content.len()))
    }

    #[test]
    fn test_attr_string() {
        let e = make_start(r#"<sheet name="sigDEG_FC1" sheetId="1" />"#);
        assert_eq!(attr_string(&e, b"name"), Some("sigDEG_FC1".to_string()));
        assert_eq!(attr_string(&e, b"missing"), None);
    }

    #[test]
    fn test_attr_string_unescapes_entities() {
        let e = make_start(r#"<sheet name="Leaf &amp; Root" />"#);
        assert_eq!(attr_string(&e, b"name"), Some("Leaf & Root".to_string()));
    }

    #[test]
    fn test_attr_string_local_ignores_prefix() {
        let e = make_start(r#"<sheet name="A" r:id="rId3" />"#);
        assert_eq!(attr_string_local(&e, b"id"), Some("rId3".to_string()));
        assert_eq!(attr_string(&e, b"id"), None);
    }

    #[test]
    fn test_text_string_unescapes() {
        let text = BytesText::from_escaped("Tissues &amp; Conditions");
        assert_eq!(text_string(&text), Some("Tissues & Conditions".to_string()));
        let plain = BytesText::from_escaped("logFC");
        assert_eq!(text_string(&plain), Some("logFC".to_string()));
    }
}
