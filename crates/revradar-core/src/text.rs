//! Canonicalization of text extracted from rendered pages.
//!
//! Upstream markup carries NBSPs, zero-width characters, and composed
//! Unicode forms that differ between the static and rendered paths for the
//! same visible text. Everything the engine extracts passes through
//! [`clean_text`] so the two paths agree byte-for-byte.

use unicode_normalization::UnicodeNormalization;

/// Canonicalizes extracted page text: NFKD normalization, NBSP and
/// zero-width artifact removal, whitespace-run collapse, trim.
///
/// Newlines are treated as ordinary whitespace — extracted fragments are
/// single logical strings, not documents.
#[must_use]
pub fn clean_text(raw: &str) -> String {
    let normalized: String = raw
        .nfkd()
        .filter(|c| !matches!(c, '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{feff}'))
        .collect();

    let mut out = String::with_capacity(normalized.len());
    let mut pending_space = false;
    for c in normalized.chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
    }
    out
}
