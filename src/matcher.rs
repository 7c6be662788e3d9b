//! Job-description keyword matching.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{JobMatchReport, ResumeRecord};
use crate::normalize::{normalize_term, normalize_text};
use crate::rules::{RuleSet, SkillRules};

/// Longest n-gram looked up in the lexicon.
const MAX_NGRAM: usize = 3;

/// Words may carry `+ # . / -` inside or at the end (`c++`, `node.js`, `ci/cd`).
static WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.?[\p{L}\p{N}][\p{L}\p{N}+#./\-]*").unwrap());

/// Tokenize free text into canonical terms.
///
/// Unigrams are kept unless they are stop words, numbers or single
/// characters; longer n-grams only when the lexicon or synonym table knows
/// them.
pub fn tokenize(text: &str, rules: &RuleSet) -> BTreeSet<String> {
    let skills = &rules.skills;
    let text = normalize_text(text).to_lowercase();
    let words = split_words(&text, skills);

    let mut tokens = BTreeSet::new();
    for n in 1..=MAX_NGRAM {
        for window in words.windows(n) {
            let gram = window.join(" ");
            let canonical = skills.canonical(&gram);
            let keep = if n == 1 {
                !skills.stop_words.iter().any(|s| s == canonical)
                    && canonical.chars().count() >= 2
                    && !canonical.chars().all(|c| c.is_ascii_digit() || c == '.')
            } else {
                is_known(canonical, skills) || skills.synonyms.contains_key(&gram)
            };
            if keep {
                tokens.insert(canonical.to_string());
            }
        }
    }
    tokens
}

fn split_words(text: &str, skills: &SkillRules) -> Vec<String> {
    let mut words = Vec::new();
    for m in WORD.find_iter(text) {
        let word = normalize_term(m.as_str());
        if word.is_empty() {
            continue;
        }
        let known =
            is_known(skills.canonical(&word), skills) || skills.synonyms.contains_key(&word);
        if word.contains('/') && !known {
            words.extend(
                word.split('/')
                    .map(normalize_term)
                    .filter(|w| !w.is_empty()),
            );
        } else {
            words.push(word);
        }
    }
    words
}

fn is_known(term: &str, skills: &SkillRules) -> bool {
    skills.is_technical(term) || skills.is_soft(term)
}

/// Canonical terms a record offers for matching: skills, project
/// technologies and the skill-like words inside them.
pub fn resume_terms(record: &ResumeRecord, rules: &RuleSet) -> BTreeSet<String> {
    let skills = &rules.skills;
    let mut terms = BTreeSet::new();
    let sources = record
        .skills
        .iter()
        .chain(record.projects.iter().flat_map(|p| p.technologies.iter()));
    for source in sources {
        let term = normalize_term(source);
        if term.is_empty() {
            continue;
        }
        terms.insert(skills.canonical(&term).to_string());
        terms.extend(
            tokenize(&term, rules)
                .into_iter()
                .filter(|t| skills.is_technical(t)),
        );
    }
    terms
}

/// Compare a record against a job description.
pub fn match_job(record: &ResumeRecord, job_text: &str, rules: &RuleSet) -> JobMatchReport {
    let job_tokens = tokenize(job_text, rules);
    let skill_like: BTreeSet<&String> = job_tokens
        .iter()
        .filter(|t| rules.skills.is_technical(t))
        .collect();

    let resume = resume_terms(record, rules);
    let matched_terms: BTreeSet<String> = resume.intersection(&job_tokens).cloned().collect();
    let gap_terms: BTreeSet<String> = skill_like
        .iter()
        .filter(|t| !matched_terms.contains(t.as_str()))
        .map(|t| t.to_string())
        .collect();

    let covered = skill_like
        .iter()
        .filter(|t| matched_terms.contains(t.as_str()))
        .count();
    let percent = (100.0 * covered as f64 / skill_like.len().max(1) as f64).round() as u32;

    log::debug!(
        "job match {}%: {} matched, {} gaps",
        percent,
        matched_terms.len(),
        gap_terms.len()
    );
    JobMatchReport {
        match_percent: percent.min(100),
        matched_terms,
        gap_terms,
    }
}
