//! Section heading detection.

use crate::model::Section;
use crate::rules::HeadingRules;

/// Score at which a line is taken as a heading.
const HEADING_THRESHOLD: f32 = 2.0;

/// Longest line, in words, that can be a heading.
const MAX_HEADING_WORDS: usize = 6;

/// A line recognised as a section heading.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingHit {
    /// Candidate sections, in canonical order
    pub sections: Vec<Section>,
    /// Content after an inline `Label:` heading
    pub rest: Option<String>,
}

/// Lowercase, drop decoration and a trailing colon, spell out `&`.
pub fn heading_key(line: &str) -> String {
    let lower = line.to_lowercase().replace('&', " and ");
    let trimmed = lower.trim_matches(|c: char| !c.is_alphanumeric());
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_all_caps(line: &str) -> bool {
    let letters: Vec<char> = line.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 3 && letters.iter().all(|c| c.is_uppercase())
}

/// Score a whole line against the heading lexicon.
///
/// An exact phrase scores 2.0; a phrase at the start or end of a line of at
/// most three words scores 1.0. Emphasis adds 1.0 and all caps 0.5.
pub fn score_line(
    line: &str,
    emphasized: bool,
    headings: &HeadingRules,
) -> Option<(f32, Vec<Section>)> {
    let words = line.split_whitespace().count();
    if words == 0 || words > MAX_HEADING_WORDS {
        return None;
    }
    let key = heading_key(line);
    if key.is_empty() {
        return None;
    }

    let exact = headings.sections_for(&key);
    let (base, sections) = if !exact.is_empty() {
        (2.0, exact)
    } else if key.split(' ').count() <= 3 {
        let partial: Vec<Section> = Section::CANONICAL_ORDER
            .iter()
            .copied()
            .filter(|s| {
                headings.phrases(*s).iter().any(|p| {
                    key.starts_with(&format!("{} ", p)) || key.ends_with(&format!(" {}", p))
                })
            })
            .collect();
        if partial.is_empty() {
            return None;
        }
        (1.0, partial)
    } else {
        return None;
    };

    let mut score = base;
    if emphasized {
        score += 1.0;
    }
    if is_all_caps(line) {
        score += 0.5;
    }
    Some((score, sections))
}

/// Detect a heading on a line.
///
/// `strict` lines (not the first line of their block) only qualify as an
/// exact phrase in all caps.
pub fn detect(
    line: &str,
    emphasized: bool,
    strict: bool,
    headings: &HeadingRules,
) -> Option<HeadingHit> {
    if let Some((score, sections)) = score_line(line, emphasized && !strict, headings) {
        let accepted = if strict {
            score >= 2.5 && is_all_caps(line)
        } else {
            score >= HEADING_THRESHOLD
        };
        if accepted {
            return Some(HeadingHit {
                sections,
                rest: None,
            });
        }
    }

    let (label, rest) = line.split_once(':')?;
    let rest = rest.trim();
    if strict || rest.is_empty() || label.split_whitespace().count() > 4 {
        return None;
    }
    let sections = headings.sections_for(&heading_key(label));
    if sections.is_empty() {
        return None;
    }
    Some(HeadingHit {
        sections,
        rest: Some(rest.to_string()),
    })
}

/// Pick one of several candidate sections given the last assigned one:
/// the nearest canonical successor, else the nearest predecessor.
pub fn resolve(candidates: &[Section], last: Option<Section>) -> Option<Section> {
    let Some(last) = last else {
        return candidates.first().copied();
    };
    let rank = last.rank();
    candidates
        .iter()
        .copied()
        .filter(|s| s.rank() > rank)
        .min_by_key(|s| s.rank())
        .or_else(|| {
            candidates
                .iter()
                .copied()
                .filter(|s| s.rank() <= rank)
                .max_by_key(|s| s.rank())
        })
}
