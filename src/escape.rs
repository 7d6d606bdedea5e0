//! Quoting rules for registry keys and values.
//!
//! Tokens drawn from the bare alphabet (`[0-9A-Za-z._%&|!+-]`) are emitted
//! byte-for-byte so a regenerated description only changes where its content
//! changes. Anything else is wrapped in double quotes with backslash, quote,
//! carriage return, tab and newline escaped as two-character sequences.
//!
//! # Examples
//!
//! ```
//! use mheader::escape::escape_token;
//!
//! assert_eq!(escape_token("Target.Type", false), "Target.Type");
//! assert_eq!(escape_token("a b", false), "\"a b\"");
//! assert_eq!(escape_token("true", true), "true");
//! ```

use std::borrow::Cow;

/// Characters rewritten inside quoted strings and the letter that follows the
/// backslash for each.
const ESCAPES: [(char, char); 5] = [
    ('\\', '\\'),
    ('"', '"'),
    ('\r', 'r'),
    ('\n', 'n'),
    ('\t', 't'),
];

/// Columns occupied by a tab when aligning continuation lines.
const TAB_WIDTH: usize = 4;

const fn is_bare_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '%' | '&' | '|' | '!' | '+' | '-')
}

/// Returns `true` for the literals `true` and `false`, which are never quoted.
#[must_use]
pub fn is_boolean_literal(text: &str) -> bool {
    matches!(text, "true" | "false")
}

/// Returns `true` when `text` cannot be emitted as a bare token.
///
/// Empty strings, strings containing `"`, `{`, `#` or `\`, strings that would
/// open a comment (`/*` or `//`) and strings with any character outside the
/// bare alphabet all need quoting.
#[must_use]
pub fn needs_quoting(text: &str) -> bool {
    if text.is_empty() {
        return true;
    }
    let mut prev = None;
    for ch in text.chars() {
        if matches!(ch, '"' | '{' | '#' | '\\') {
            return true;
        }
        if prev == Some('/') && matches!(ch, '*' | '/') {
            return true;
        }
        if !is_bare_char(ch) {
            return true;
        }
        prev = Some(ch);
    }
    false
}

fn should_quote(text: &str, force: bool) -> bool {
    (force && !is_boolean_literal(text)) || needs_quoting(text)
}

fn push_quoted(out: &mut String, text: &str) {
    out.push('"');
    for ch in text.chars() {
        match ESCAPES.iter().find(|(raw, _)| *raw == ch) {
            Some((_, code)) => {
                out.push('\\');
                out.push(*code);
            }
            None => out.push(ch),
        }
    }
    out.push('"');
}

/// Quote `text` on a single line when required (or when `force` is set).
///
/// Newlines are escaped as `\n`. Strings that need no quoting are returned
/// borrowed and unchanged.
#[must_use]
pub fn escape_token(text: &str, force: bool) -> Cow<'_, str> {
    if !should_quote(text, force) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 2);
    push_quoted(&mut out, text);
    Cow::Owned(out)
}

/// Quote a value, turning embedded newlines into continuation lines.
///
/// Each line (including its escaped newline) is quoted on its own and
/// followed by a `\` line continuation and `continuation`, which should be the
/// whitespace returned by [`continuation_indent`] for the key that precedes
/// the value.
///
/// # Examples
///
/// ```
/// use mheader::escape::escape_multiline;
///
/// let out = escape_multiline("a\nb", true, "\t");
/// assert_eq!(out, "\"a\\n\"\\\n\t\"b\"");
/// ```
#[must_use]
pub fn escape_multiline<'a>(text: &'a str, force: bool, continuation: &str) -> Cow<'a, str> {
    if !should_quote(text, force) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 2);
    let mut tail = "";
    for segment in text.split_inclusive('\n') {
        if segment.ends_with('\n') {
            push_quoted(&mut out, segment);
            out.push_str("\\\n");
            out.push_str(continuation);
        } else {
            tail = segment;
        }
    }
    push_quoted(&mut out, tail);
    Cow::Owned(out)
}

/// Whitespace that aligns a continuation line under the column following
/// `prefix`.
///
/// Tabs in `prefix` count as four columns. The result uses as many tabs as
/// fit and pads the remainder with spaces.
#[must_use]
pub fn continuation_indent(prefix: &str) -> String {
    let width: usize = prefix
        .chars()
        .map(|ch| if ch == '\t' { TAB_WIDTH } else { 1 })
        .sum();
    let tabs = width.div_euclid(TAB_WIDTH);
    let spaces = width.rem_euclid(TAB_WIDTH);
    let mut indent = "\t".repeat(tabs);
    indent.push_str(&" ".repeat(spaces));
    indent
}
