//! Escaping of metadata values placed inside `"…"` in an ebuild

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Collapse every whitespace run into a single space and trim the ends.
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escape the characters bash interprets inside double quotes.
pub fn bash_dquote_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Bytes percent-encoded in `HOMEPAGE`; non-ASCII bytes always are.
const HOMEPAGE_UNSAFE: &AsciiSet = &CONTROLS.add(b'"').add(b'`').add(b'$').add(b'\\');

/// Make a URL safe for a double-quoted ebuild variable.
///
/// Spaces become `+`; quotes, backticks, dollars, backslashes, control
/// characters and non-ASCII bytes are percent-encoded.
pub fn url_dquote_escape(value: &str) -> String {
    value
        .split(' ')
        .map(|part| utf8_percent_encode(part, HOMEPAGE_UNSAFE).to_string())
        .collect::<Vec<_>>()
        .join("+")
}
