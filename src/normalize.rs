//! Content normalization for extracted text blocks.
//!
//! [`normalize`] is deterministic and idempotent: feeding a normalized block
//! back in yields the same block.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::model::{NormalizedBlock, StyleHint, TextBlock};

/// Glyphs recognised as list markers at the start of a line.
pub const BULLET_MARKERS: &[char] = &[
    '•', '‣', '–', '—', '*', '-', '●', '○', '■', '▪', '►', '◦', '·', '∙', '❖', '➢', '✓',
];

const LIGATURES: &[(char, &str)] = &[
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{FB05}', "st"),
    ('\u{FB06}', "st"),
];

/// A letter, a hyphen, one or more line breaks, then a lowercase letter.
static WRAP_HYPHEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\p{L})-[ \t]*(?:\n[ \t]*)+(\p{Ll})").unwrap());

/// Normalize one block.
pub fn normalize(block: &TextBlock) -> NormalizedBlock {
    let mut hints = block.style_hints.clone();
    let mut text = clean_encoding(&block.text);

    if !hints.contains(&StyleHint::Bullet) && !hints.contains(&StyleHint::HeadingLike) {
        text = dehyphenate(&text);
    }

    let lines = collapse_whitespace(&text);
    let (lines, had_markers) = unify_bullets(lines);
    if had_markers {
        hints.insert(StyleHint::Bullet);
    }

    NormalizedBlock {
        text: lines.join("\n"),
        page: block.page,
        style_hints: hints,
        order_index: block.order_index,
    }
}

/// Normalize a whole block sequence, keeping order and indices.
pub fn normalize_all(blocks: &[TextBlock]) -> Vec<NormalizedBlock> {
    blocks.iter().map(normalize).collect()
}

/// Encoding repairs and whitespace collapse for free text, without any
/// bullet handling. Used on job descriptions.
pub fn normalize_text(text: &str) -> String {
    collapse_whitespace(&clean_encoding(text)).join("\n")
}

/// Lowercase a term and trim surrounding punctuation.
///
/// Keeps trailing `+`/`#` (`c++`, `c#`) and a leading `.` (`.net`).
pub fn normalize_term(term: &str) -> String {
    let lower = term.to_lowercase();
    let trimmed = lower
        .trim_start_matches(|c: char| !c.is_alphanumeric() && c != '.')
        .trim_end_matches(|c: char| !c.is_alphanumeric() && c != '+' && c != '#');
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clean_encoding(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() != Some(&'\n') {
                    out.push('\n');
                }
            }
            '\n' => out.push('\n'),
            '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}'
            | '\u{FFFD}' => {}
            c if c.is_whitespace() => out.push(' '),
            c if c.is_control() => {}
            c => match LIGATURES.iter().find(|(l, _)| *l == c) {
                Some((_, expanded)) => out.push_str(expanded),
                None => out.push(c),
            },
        }
    }
    out.nfc().collect()
}

fn dehyphenate(text: &str) -> String {
    let mut text = text.to_string();
    // Chained wraps ("a-\nb-\nc") overlap, so repeat until stable.
    while WRAP_HYPHEN.is_match(&text) {
        text = WRAP_HYPHEN.replace_all(&text, "$1$2").into_owned();
    }
    text
}

fn collapse_whitespace(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect()
}

/// Strip leading list markers from a line. Returns `None` when the line
/// had no marker.
fn strip_marker(line: &str) -> Option<&str> {
    let mut rest = line;
    let mut stripped = false;
    loop {
        let mut chars = rest.chars();
        match (chars.next(), chars.next()) {
            (Some(c), next)
                if BULLET_MARKERS.contains(&c) && next.map_or(true, char::is_whitespace) =>
            {
                rest = rest[c.len_utf8()..].trim_start();
                stripped = true;
            }
            _ => break,
        }
    }
    stripped.then_some(rest)
}

fn unify_bullets(lines: Vec<String>) -> (Vec<String>, bool) {
    let marked: Vec<Option<String>> = lines
        .iter()
        .map(|l| strip_marker(l).map(str::to_string))
        .collect();
    if marked.iter().all(Option::is_none) {
        return (lines, false);
    }

    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut in_item = false;
    for (line, stripped) in lines.into_iter().zip(marked) {
        match stripped {
            Some(item) => {
                in_item = !item.is_empty();
                if in_item {
                    out.push(item);
                }
            }
            None if in_item => {
                if let Some(last) = out.last_mut() {
                    last.push(' ');
                    last.push_str(&line);
                }
            }
            None => out.push(line),
        }
    }
    (out, true)
}
