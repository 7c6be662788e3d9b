//! Skills section parsing.

use super::{RecordBuilder, SourcedLine};
use crate::normalize::normalize_term;
use crate::rules::RuleSet;

/// Longest fragment, in characters, kept as a single skill.
const MAX_SKILL_CHARS: usize = 50;

/// Longest fragment, in words, kept as a single skill.
const MAX_SKILL_WORDS: usize = 5;

/// Strip a short `Category:` prefix such as `Languages:` or `Cloud & DevOps:`.
fn strip_category(line: &str) -> &str {
    match line.split_once(':') {
        Some((label, rest))
            if label.split_whitespace().count() <= 4 && !rest.trim_start().starts_with("//") =>
        {
            rest
        }
        _ => line,
    }
}

fn clean_token(token: &str) -> &str {
    let token = token.trim();
    let token = token
        .strip_prefix("and ")
        .or_else(|| token.strip_prefix("& "))
        .unwrap_or(token);
    token.trim().trim_end_matches(['.', ':'])
}

/// Parse lines of the skills section into skill tokens.
///
/// Fragments that are not skill-shaped (too long, or a bare filler word such
/// as "etc") are kept as free text.
pub(crate) fn fill_skills(builder: &mut RecordBuilder, lines: &[SourcedLine], rules: &RuleSet) {
    for line in lines {
        let text = line.text.replace(['(', ')'], ",");
        for token in strip_category(&text)
            .split([',', '|', '•', ';', '·'])
            .map(clean_token)
            .filter(|t| !t.is_empty())
        {
            let term = normalize_term(token);
            let fits = token.chars().count() <= MAX_SKILL_CHARS
                && token.split_whitespace().count() <= MAX_SKILL_WORDS
                && !rules.skills.stop_words.contains(&term);
            if fits {
                builder.record.add_skill(token);
                builder.provenance.record("skills", [line.order]);
                let canonical = rules.skills.canonical(&term);
                if rules.skills.is_soft(canonical) {
                    builder.record.soft_skills.insert(canonical.to_string());
                    builder.provenance.record("soft_skills", [line.order]);
                }
            } else {
                builder.push_free_text(token, line.order);
            }
        }
    }
}
