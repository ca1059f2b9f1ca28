//! Identifier quoting shared by the emitter and the editor.
//!
//! An identifier may be written bare when it starts with an ASCII letter,
//! an underscore or a Latin-1 supplement character (U+0080..=U+00FF), and
//! continues with those or ASCII digits. Keywords are never bare. Anything
//! else is double-quoted with internal `"` escaped as `\"`.

use std::borrow::Cow;

/// Reserved words, matched case-insensitively.
pub(crate) const KEYWORDS: [&str; 6] = ["strict", "graph", "digraph", "subgraph", "node", "edge"];

fn is_latin1_extended(c: char) -> bool {
    ('\u{80}'..='\u{ff}').contains(&c)
}

/// Whether `s` can be written without quotes.
pub fn is_bare_id(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || is_latin1_extended(c) => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || is_latin1_extended(c))
        && !KEYWORDS.iter().any(|keyword| keyword.eq_ignore_ascii_case(s))
}

/// Wrap `s` in double quotes, escaping embedded quotes.
pub fn quote_id(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\\\""))
}

/// Quote `s` unless it is a valid bare identifier.
pub fn quote_id_if_necessary(s: &str) -> Cow<'_, str> {
    if is_bare_id(s) {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(quote_id(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_ids_stay_bare() {
        assert_eq!(quote_id_if_necessary("node_1"), "node_1");
        assert_eq!(quote_id_if_necessary("_x"), "_x");
        assert_eq!(quote_id_if_necessary("caf\u{e9}"), "caf\u{e9}");
    }

    #[test]
    fn non_bare_ids_are_quoted() {
        assert_eq!(quote_id_if_necessary("1abc"), "\"1abc\"");
        assert_eq!(quote_id_if_necessary("two words"), "\"two words\"");
        assert_eq!(quote_id_if_necessary(""), "\"\"");
        assert_eq!(quote_id_if_necessary("\u{65e5}"), "\"\u{65e5}\"");
    }

    #[test]
    fn keywords_are_quoted() {
        assert_eq!(quote_id_if_necessary("node"), "\"node\"");
        assert_eq!(quote_id_if_necessary("Graph"), "\"Graph\"");
        assert_eq!(quote_id_if_necessary("nodes"), "nodes");
    }

    #[test]
    fn embedded_quotes_are_escaped() {
        assert_eq!(quote_id("a\"b"), r#""a\"b""#);
    }
}
