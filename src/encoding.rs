//! Decoding raw SVG bytes to text.
//!
//! A byte order mark takes precedence, then the encoding named in the XML
//! declaration. Without either the file must be UTF-8.

use std::borrow::Cow;
use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8};
use regex::bytes::Regex;

use crate::error::WhitenError;

static RE_DECL_ENCODING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?-u)^<\?xml\s[^>]*?\bencoding\s*=\s*["']([A-Za-z][A-Za-z0-9._-]*)["']"#)
        .expect("valid encoding declaration regex")
});

/// Decode an SVG file's bytes to a string.
pub fn decode_svg(bytes: &[u8]) -> Result<Cow<'_, str>, WhitenError> {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => (encoding, &bytes[bom_len..]),
        None => (declared_encoding(bytes)?.unwrap_or(UTF_8), bytes),
    };

    if encoding == UTF_8 {
        return Ok(Cow::Borrowed(std::str::from_utf8(body)?));
    }

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or_else(|| WhitenError::InvalidSvg(format!("Invalid {} data", encoding.name())))
}

fn declared_encoding(bytes: &[u8]) -> Result<Option<&'static Encoding>, WhitenError> {
    let Some(caps) = RE_DECL_ENCODING.captures(bytes) else {
        return Ok(None);
    };
    let label = &caps[1];
    Encoding::for_label(label).map(Some).ok_or_else(|| {
        WhitenError::InvalidSvg(format!(
            "Unsupported encoding: {}",
            String::from_utf8_lossy(label)
        ))
    })
}
