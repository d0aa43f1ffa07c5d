//! String and URL helpers shared by the request decoder and the static file resolver.

use std::borrow::Cow;

/// Decodes a `application/x-www-form-urlencoded` component.
///
/// `+` becomes a space and `%XX` sequences are decoded. Invalid escapes are
/// left as written and invalid UTF-8 is replaced.
pub fn url_decode(s: &str) -> String {
    let spaced: Cow<'_, str> = if s.contains('+') {
        Cow::Owned(s.replace('+', " "))
    } else {
        Cow::Borrowed(s)
    };

    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}

/// Decodes `%XX` sequences in a URL path. Unlike [`url_decode`], `+` is kept.
pub fn percent_decode_path(path: &str) -> String {
    if !path.contains('%') {
        return path.to_string();
    }
    String::from_utf8_lossy(&urlencoding::decode_binary(path.as_bytes())).into_owned()
}

/// Percent-encodes everything except `A-Z a-z 0-9 - _ . ~`.
pub fn url_encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// Trims spaces, tabs, carriage returns and line feeds from both ends.
pub fn trim(s: &str) -> &str {
    s.trim_matches(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}

/// Normalizes a header name to Title-Case-With-Hyphens.
///
/// The first letter after the start or after a `-` is upper-cased, the rest
/// lower-cased. Digits do not consume the capital: `x-1abc` becomes `X-1Abc`.
pub fn normalize_header_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut capitalize = true;

    for c in name.chars() {
        if capitalize && c.is_ascii_alphabetic() {
            out.push(c.to_ascii_uppercase());
            capitalize = false;
        } else {
            if c == '-' {
                capitalize = true;
            }
            out.push(c.to_ascii_lowercase());
        }
    }

    out
}

/// Splits a request target into path and query string at the first `?`.
pub fn split_target(target: &str) -> (&str, &str) {
    target.split_once('?').unwrap_or((target, ""))
}

/// Lower-cased text after the last `.`, or an empty string.
pub fn file_extension(name: &str) -> String {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Rejects paths containing `..`, backslashes or empty segments.
pub fn contains_path_traversal(path: &str) -> bool {
    path.contains("..") || path.contains('\\') || path.contains("//")
}
