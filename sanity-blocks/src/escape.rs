//! Charset-aware HTML entity escaping
//!
//! Escapes the five HTML-special characters and, for non-UTF-8 charsets,
//! round-trips the result through the caller's encoding so the output
//! only contains characters that charset can represent.

use encoding_rs::{Encoding, UTF_8};

/// Escape `&`, `<`, `>`, `"` and `'` for HTML output
///
/// # Parameters
/// * `text` - The text to escape
/// * `charset` - A WHATWG encoding label (e.g. `utf-8`, `iso-8859-1`)
///
/// Characters that cannot be represented in the requested charset come
/// back as decimal numeric character references. Unknown charset labels
/// fall back to plain UTF-8 escaping rather than failing.
pub fn escape(text: &str, charset: &str) -> String {
    let escaped = escape_utf8(text);

    match Encoding::for_label(charset.as_bytes()) {
        Some(encoding) if encoding == UTF_8 => escaped,
        Some(encoding) => {
            let (bytes, _, _) = encoding.encode(&escaped);
            let (decoded, _, _) = encoding.decode(&bytes);
            decoded.into_owned()
        }
        None => {
            log::warn!("unknown charset label {charset:?}, escaping as utf-8");
            escaped
        }
    }
}

fn escape_utf8(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}
