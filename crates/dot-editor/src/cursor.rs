//! Mutation cursor: a working copy of the text and the position used to walk
//! a parse tree against it.
//!
//! Every token check first passes over insignificant material (whitespace,
//! optional `,`/`;`, newlines, and the three comment styles). In an erasing
//! walk that material is spliced out as well, up to and including the first
//! newline or comment, so removing a statement does not leave a blank line
//! behind.
//!
//! Two marks drive the blank-line bookkeeping:
//! - `skippable_index`: end of the last token matched without erasure, or of
//!   the last newline/comment passed over.
//! - `erased_index`: where the most recent splice happened.
//!
//! When nothing has been matched since the last splice
//! (`skippable_index <= erased_index`), the text between the two belongs to
//! an erased statement and may be trimmed.

use crate::error::EditError;
use dot_core::quote_id;

const INLINE_WHITESPACE: &[u8] = b" \t\r";
const STATEMENT_SEPARATORS: &[u8] = b" \t\r\n;";
const CONTEXT_CHARS: usize = 40;

/// What may be passed over before a token, and whether it may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipOptions {
    pub comma: bool,
    pub semicolon: bool,
    pub optional: bool,
}

impl SkipOptions {
    pub const NONE: Self = Self {
        comma: false,
        semicolon: false,
        optional: false,
    };

    /// Between statements.
    pub const STATEMENT: Self = Self {
        semicolon: true,
        ..Self::NONE
    };

    /// Inside an attribute list.
    pub const LIST: Self = Self {
        comma: true,
        semicolon: true,
        ..Self::NONE
    };

    pub const OPTIONAL: Self = Self {
        optional: true,
        ..Self::NONE
    };

    pub const fn optional(self) -> Self {
        Self {
            optional: true,
            ..self
        }
    }
}

/// A literal the walk expects to find at the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Case-insensitive, must end at an identifier boundary.
    Keyword(&'a str),
    /// An identifier, matched in quoted form when the cursor sits on `"`.
    Ident(&'a str),
    /// An HTML label; matches `<text>` as a single token.
    Html(&'a str),
    Punct(&'a str),
}

fn is_id_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

impl Token<'_> {
    /// Length of this token's source form at the start of `text`.
    fn match_len(&self, text: &str) -> Option<usize> {
        match *self {
            Token::Keyword(word) => {
                let bytes = text.as_bytes();
                let n = word.len();
                let matched = bytes.len() >= n
                    && bytes[..n].eq_ignore_ascii_case(word.as_bytes())
                    && !bytes.get(n).copied().is_some_and(is_id_byte);
                matched.then_some(n)
            }
            Token::Ident(id) if text.starts_with('"') => {
                let quoted = quote_id(id);
                text.starts_with(quoted.as_str()).then_some(quoted.len())
            }
            Token::Ident(literal) | Token::Punct(literal) => {
                text.starts_with(literal).then_some(literal.len())
            }
            Token::Html(inner) => text
                .strip_prefix('<')
                .and_then(|rest| rest.strip_prefix(inner))
                .filter(|rest| rest.starts_with('>'))
                .map(|_| inner.len() + 2),
        }
    }

    /// The source form reported in a mismatch.
    fn describe(&self, at_quote: bool) -> String {
        match *self {
            Token::Ident(id) if at_quote => quote_id(id),
            Token::Html(inner) => format!("<{inner}>"),
            Token::Keyword(s) | Token::Ident(s) | Token::Punct(s) => s.to_string(),
        }
    }
}

/// State of one pass over a run of separators.
struct SeparatorRun {
    erase: bool,
    index: usize,
    skip_index: usize,
}

/// Working text plus read/write position for a single structural edit.
#[derive(Debug)]
pub struct Cursor {
    text: String,
    index: usize,
    skippable_index: usize,
    erased_index: Option<usize>,
    erased: usize,
}

impl Cursor {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            index: 0,
            skippable_index: 0,
            erased_index: None,
            erased: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of structural elements erased so far.
    pub fn erased(&self) -> usize {
        self.erased
    }

    pub fn count_erased(&mut self) {
        self.erased += 1;
    }

    pub fn into_text(self) -> String {
        self.text
    }

    // ─── Token matching ──────────────────────────────────────────────────

    /// Pass over separators, then match `token`: step past it, or splice it
    /// out when `erase` is set. Returns whether the token was present.
    ///
    /// Inside attribute lists (`comma`/`semicolon` options) an erasing skip
    /// also removes the separators in front of the token.
    pub fn skip(&mut self, token: Token<'_>, erase: bool, opts: SkipOptions) -> Result<bool, EditError> {
        self.skip_separators(erase && (opts.comma || opts.semicolon), opts);
        let start = self.index;
        let matched = token.match_len(&self.text[start..]);
        let end = match matched {
            Some(len) => start + len,
            None if opts.optional => start,
            None => return Err(self.mismatch(token)),
        };

        if erase {
            self.splice(start, end);
            self.skip_separators(true, SkipOptions::NONE);
        } else {
            self.index = end;
            if end > start {
                self.skippable_index = end;
            }
        }
        Ok(matched.is_some())
    }

    /// Pass over separators and check that `token` comes next, leaving the
    /// cursor in front of it.
    pub fn seek(&mut self, token: Token<'_>) -> Result<(), EditError> {
        self.skip_separators(false, SkipOptions::NONE);
        match token.match_len(&self.text[self.index..]) {
            Some(_) => Ok(()),
            None => Err(self.mismatch(token)),
        }
    }

    fn mismatch(&self, token: Token<'_>) -> EditError {
        let rest = &self.text[self.index..];
        EditError::StructuralMismatch {
            expected: token.describe(rest.starts_with('"')),
            found: rest.chars().take(CONTEXT_CHARS).collect(),
        }
    }

    // ─── Separators ──────────────────────────────────────────────────────

    /// Pass over insignificant material until nothing more applies.
    ///
    /// With `erase`, everything up to the first newline or comment is
    /// spliced out; the rest of the run is only passed over. If the erased
    /// stretch ends at a newline that directly follows an erased line, the
    /// splice starts one character earlier to swallow that line's newline.
    pub fn skip_separators(&mut self, erase: bool, opts: SkipOptions) {
        let mut run = SeparatorRun {
            erase,
            index: self.index,
            skip_index: self.index,
        };
        loop {
            let before = run.index;
            if self
                .byte_at(run.index)
                .is_some_and(|b| INLINE_WHITESPACE.contains(&b))
            {
                run.index += 1;
            }
            if opts.comma && self.byte_at(run.index) == Some(b',') {
                run.index += 1;
            }
            if opts.semicolon && self.byte_at(run.index) == Some(b';') {
                run.index += 1;
            }
            if self.byte_at(run.index) == Some(b'\n') {
                let next = run.index + 1;
                self.skip_partially(&mut run, next);
            }
            if self.text[run.index..].starts_with("/*") {
                let end = self.block_comment_end(run.index);
                self.skip_partially(&mut run, end);
            }
            if self.text[run.index..].starts_with("//") {
                let end = self.line_end(run.index + 2);
                self.skip_partially(&mut run, end);
            }
            if self.byte_at(run.index) == Some(b'#') {
                let end = self.line_end(run.index + 1);
                self.skip_partially(&mut run, end);
            }
            if run.index == before {
                break;
            }
        }

        if run.erase {
            self.splice(run.skip_index, run.index);
        } else {
            self.index = run.index;
        }
    }

    /// Move the run to `next`, first splicing out the pending stretch if the
    /// run is still erasing.
    fn skip_partially(&mut self, run: &mut SeparatorRun, next: usize) {
        let mut next = next;
        if run.erase {
            if self.nothing_matched_since_erase()
                && self.skippable_index > 0
                && self.byte_at(self.skippable_index - 1) == Some(b'\n')
                && self.byte_at(run.index) == Some(b'\n')
            {
                run.skip_index = self.skippable_index - 1;
            }
            self.splice(run.skip_index, run.index);
            next -= run.index - run.skip_index;
            run.erase = false;
        }
        run.index = next;
        run.skip_index = next;
        self.skippable_index = next;
    }

    /// After a wholly erased element, drop the gap between the last matched
    /// token and the cursor.
    pub fn trim_after_last_match(&mut self) {
        if self.nothing_matched_since_erase() && self.skippable_index <= self.index {
            self.splice_range(self.skippable_index, self.index);
            self.index = self.skippable_index;
        }
    }

    /// Whether a following `[` ... `]` with nothing but separators inside
    /// starts at the cursor.
    pub fn at_empty_attr_list(&self) -> bool {
        let open = self.peek_past_separators(self.index);
        if self.byte_at(open) != Some(b'[') {
            return false;
        }
        let close = self.peek_past_separators(open + 1);
        self.byte_at(close) == Some(b']')
    }

    fn peek_past_separators(&self, from: usize) -> usize {
        let mut index = from;
        loop {
            let rest = &self.text[index..];
            index = if rest.starts_with([' ', '\t', '\r', '\n']) {
                index + 1
            } else if rest.starts_with("/*") {
                self.block_comment_end(index)
            } else if rest.starts_with("//") {
                self.line_end(index + 2)
            } else if rest.starts_with('#') {
                self.line_end(index + 1)
            } else {
                return index;
            };
        }
    }

    fn nothing_matched_since_erase(&self) -> bool {
        self.erased_index
            .is_some_and(|erased| self.skippable_index <= erased)
    }

    // ─── Text surgery ────────────────────────────────────────────────────

    /// Insert `s` at the cursor and step past it.
    pub fn insert(&mut self, s: &str) {
        self.text.insert_str(self.index, s);
        self.index += s.len();
    }

    /// Whether the character before the cursor separates statements.
    pub fn follows_separator(&self) -> bool {
        self.index == 0 || STATEMENT_SEPARATORS.contains(&self.text.as_bytes()[self.index - 1])
    }

    pub fn follows_newline(&self) -> bool {
        self.index > 0 && self.text.as_bytes()[self.index - 1] == b'\n'
    }

    fn splice(&mut self, start: usize, end: usize) {
        self.splice_range(start, end);
        self.erased_index = Some(start);
    }

    fn splice_range(&mut self, start: usize, end: usize) {
        if start < end {
            log::trace!("erase {:?} at {start}", &self.text[start..end]);
            self.text.replace_range(start..end, "");
        }
    }

    fn byte_at(&self, index: usize) -> Option<u8> {
        self.text.as_bytes().get(index).copied()
    }

    /// Position just past the `\n` at or after `from`, or the end of text.
    fn line_end(&self, from: usize) -> usize {
        self.text
            .get(from..)
            .and_then(|rest| rest.find('\n'))
            .map_or(self.text.len(), |pos| from + pos + 1)
    }

    /// Position just past the `*/` closing a comment opened at `from`.
    fn block_comment_end(&self, from: usize) -> usize {
        self.text
            .get(from + 2..)
            .and_then(|rest| rest.find("*/"))
            .map_or(self.text.len(), |pos| from + 2 + pos + 2)
    }
}
