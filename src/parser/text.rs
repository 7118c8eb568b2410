//! Text normalization and scanning primitives shared by the extractors.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Punctuation retained by normalization; everything else non-alphanumeric
/// and ASCII becomes a space.
const ALLOWED_PUNCT: &str = ".,:@-/+#$%&*()[]{}";

/// Normalize message text for extraction: uppercase, all whitespace
/// collapsed to single spaces, disallowed ASCII punctuation stripped.
/// Non-ASCII characters (emoji direction markers in particular) survive.
pub(crate) fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_space = true;
    for raw in input.chars() {
        let keep = raw.is_alphanumeric() || ALLOWED_PUNCT.contains(raw) || !raw.is_ascii();
        if raw.is_whitespace() || !keep {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            for upper in raw.to_uppercase() {
                out.push(upper);
            }
            prev_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Byte offsets of occurrences of `word` in `text` that sit on word
/// boundaries. A boundary is only required on a side where the word itself
/// starts/ends with an alphanumeric character, so punctuation labels like
/// `@` or `S/L` match anywhere sensible.
pub(crate) fn word_occurrences<'a>(
    text: &'a str,
    word: &'a str,
) -> impl Iterator<Item = usize> + 'a {
    let check_before = word.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
    let check_after = word
        .chars()
        .next_back()
        .is_some_and(|c| c.is_ascii_alphanumeric());
    let mut from = 0usize;
    std::iter::from_fn(move || {
        while from < text.len() {
            let found = text[from..].find(word)? + from;
            let end = found + word.len();
            from = found + 1;

            let before_ok = !check_before
                || text[..found]
                    .chars()
                    .next_back()
                    .map_or(true, |c| !c.is_ascii_alphanumeric());
            let after_ok = !check_after
                || text[end..]
                    .chars()
                    .next()
                    .map_or(true, |c| !c.is_ascii_alphanumeric());
            if before_ok && after_ok {
                return Some(found);
            }
        }
        None
    })
}

pub(crate) fn contains_word(text: &str, word: &str) -> bool {
    word_occurrences(text, word).next().is_some()
}

/// Skip spaces and at most one `:`/`=`/`@` value separator.
pub(crate) fn skip_value_separator(text: &str, mut at: usize) -> usize {
    let bytes = text.as_bytes();
    while at < bytes.len() && bytes[at] == b' ' {
        at += 1;
    }
    if at < bytes.len() && matches!(bytes[at], b':' | b'=' | b'@') {
        at += 1;
        while at < bytes.len() && bytes[at] == b' ' {
            at += 1;
        }
    }
    at
}

/// Read a decimal number starting at byte offset `at`.
///
/// Returns the parsed value and the byte offset just past it. A trailing
/// dot (sentence punctuation) is not consumed.
pub(crate) fn read_decimal(text: &str, at: usize) -> Option<(Decimal, usize)> {
    let bytes = text.as_bytes();
    let mut end = at;
    let mut seen_digit = false;
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => {
                seen_digit = true;
                end += 1;
            }
            b'.' if seen_digit && !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }
    if !seen_digit {
        return None;
    }
    let raw = text[at..end].trim_end_matches('.');
    let value = Decimal::from_str(raw).ok()?;
    Some((value, at + raw.len()))
}
