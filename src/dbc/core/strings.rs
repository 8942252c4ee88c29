//! Utilities for quoted strings in DBC files.
//!
//! These helpers support escaped quotes (`\"`) and multi-line quoted strings,
//! which are common in `CM_` comments.

use crate::types::errors::ParseErrorKind;

/// Counts unescaped double quotes in a string.
///
/// A quote is considered escaped if immediately preceded by an **odd** number
/// of backslashes.
pub(crate) fn count_unescaped_quotes(s: &str) -> usize {
    let mut count = 0usize;
    let mut backslashes = 0usize;
    for ch in s.chars() {
        if ch == '\\' {
            backslashes += 1;
            continue;
        }
        if ch == '"' && backslashes % 2 == 0 {
            count += 1;
        }
        backslashes = 0;
    }
    count
}

/// Returns `true` if every opened quoted segment is closed again.
pub(crate) fn has_complete_quoted_segment(s: &str) -> bool {
    let quotes = count_unescaped_quotes(s);
    quotes >= 2 && quotes % 2 == 0
}

/// Escapes characters so they are safe inside DBC quoted strings.
pub(crate) fn escape_dbc_string(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Splits a leading quoted string off `s` (leading whitespace allowed).
///
/// Returns the unescaped content and the remainder after the closing quote.
/// Unknown escapes are kept verbatim.
pub(crate) fn take_quoted<'a>(
    s: &'a str,
    what: &'static str,
) -> Result<(String, &'a str), ParseErrorKind> {
    let s = s.trim_start();
    let Some(body) = s.strip_prefix('"') else {
        return Err(if s.is_empty() {
            ParseErrorKind::Missing(what)
        } else {
            ParseErrorKind::Expected {
                expected: what,
                found: first_token(s).to_string(),
            }
        });
    };

    let mut out = String::with_capacity(body.len());
    let mut chars = body.char_indices();
    while let Some((i, ch)) = chars.next() {
        match ch {
            '"' => return Ok((out, &body[i + 1..])),
            '\\' => match chars.next() {
                Some((_, '"')) => out.push('"'),
                Some((_, '\\')) => out.push('\\'),
                Some((_, 'n')) => out.push('\n'),
                Some((_, 'r')) => out.push('\r'),
                Some((_, 't')) => out.push('\t'),
                Some((_, other)) => {
                    out.push('\\');
                    out.push(other);
                }
                None => break,
            },
            _ => out.push(ch),
        }
    }
    Err(ParseErrorKind::UnterminatedString)
}

/// Splits the first whitespace-delimited token off `s`.
pub(crate) fn split_token(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(pos) => (&s[..pos], &s[pos..]),
        None => (s, ""),
    }
}

/// First whitespace-delimited token of `s`, used to quote offending input in errors.
pub(crate) fn first_token(s: &str) -> &str {
    split_token(s).0
}

/// Rejects anything but whitespace and an optional single `;` terminator.
pub(crate) fn expect_end(rest: &str) -> Result<(), ParseErrorKind> {
    let rest = rest.trim();
    let rest = rest.strip_prefix(';').unwrap_or(rest).trim();
    if rest.is_empty() {
        Ok(())
    } else {
        Err(ParseErrorKind::TrailingContent(rest.to_string()))
    }
}

/// Parses a numeric field, naming it in the error.
pub(crate) fn parse_number<T: std::str::FromStr>(
    token: &str,
    field: &'static str,
) -> Result<T, ParseErrorKind> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ParseErrorKind::Missing(field));
    }
    token.parse::<T>().map_err(|_| ParseErrorKind::InvalidNumber {
        field,
        value: token.to_string(),
    })
}
