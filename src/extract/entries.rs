//! Entry-based sections: experience, education, projects, certifications.

use once_cell::sync::Lazy;
use regex::Regex;

use super::contact::{has_title_keyword, looks_like_location};
use super::dates::{self, find_span, strip_dates};
use super::{contains_term, RecordBuilder, SourcedLine};
use crate::model::{Certification, EducationEntry, ExperienceEntry, ProjectEntry};
use crate::normalize::normalize_term;
use crate::rules::RuleSet;

/// Most leading non-bullet lines treated as an entry header.
const MAX_HEADER_LINES: usize = 3;

static HEADER_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*(?:\||•|·|–|—|\s-\s|\s+at\s+|@)\s*").unwrap());

static SEGMENT_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*(?:\||,|–|—|\s-\s)\s*").unwrap());

static TECH_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:(?:technologies|technology|tech stack|tech|tools|stack)\s*:|built with\b:?)\s*",
    )
    .unwrap()
});

static PARENTHESIZED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([^)]*)\)").unwrap());

/// Lines of one entry split into header and body.
#[derive(Debug, Default)]
pub(crate) struct EntryLines<'a> {
    pub header: Vec<&'a SourcedLine>,
    pub body: Vec<&'a SourcedLine>,
    has_bullets: bool,
    header_dated: bool,
}

impl<'a> EntryLines<'a> {
    fn push(&mut self, line: &'a SourcedLine) {
        if line.bullet {
            self.body.push(line);
            self.has_bullets = true;
        } else if self.body.is_empty() && self.header.len() < MAX_HEADER_LINES {
            self.header_dated |= dates::contains_date(&line.text);
            self.header.push(line);
        } else {
            self.body.push(line);
        }
    }

    fn is_empty(&self) -> bool {
        self.header.is_empty() && self.body.is_empty()
    }

    fn lines(&self) -> impl Iterator<Item = &'a SourcedLine> + '_ {
        self.header.iter().chain(self.body.iter()).copied()
    }
}

/// Group section lines into entries.
///
/// A new entry starts after a blank separator, at a non-bullet line once
/// the current entry has bullets, at a dated non-bullet line when the header
/// is already dated, or wherever `starts_entry` says so.
pub(crate) fn group_entries<'a, F>(
    lines: &'a [SourcedLine],
    starts_entry: F,
) -> Vec<EntryLines<'a>>
where
    F: Fn(&EntryLines<'a>, &SourcedLine) -> bool,
{
    let mut entries = Vec::new();
    let mut current = EntryLines::default();

    for line in lines {
        let boundary = !current.is_empty()
            && (line.gap_before
                || (!line.bullet
                    && (current.has_bullets
                        || (current.header_dated && dates::contains_date(&line.text))
                        || starts_entry(&current, line))));
        if boundary {
            entries.push(std::mem::take(&mut current));
        }
        current.push(line);
    }
    if !current.is_empty() {
        entries.push(current);
    }
    entries
}

fn split_parts(text: &str, rules: &RuleSet) -> Vec<String> {
    let mut parts = Vec::new();
    for part in HEADER_SEPARATOR.split(text) {
        let part = part.trim().trim_matches(',').trim();
        if part.is_empty() {
            continue;
        }
        if part.contains(',') && !looks_like_location(part, rules) {
            parts.extend(split_commas(part, rules));
        } else {
            parts.push(part.to_string());
        }
    }
    parts
}

/// Split on commas, keeping `Acme, Inc.` and `Austin, TX` together.
fn split_commas(part: &str, rules: &RuleSet) -> Vec<String> {
    let mut pieces: Vec<String> = Vec::new();
    for piece in part.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let is_suffix = has_org_suffix(piece, rules) && piece.split_whitespace().count() == 1;
        let is_region = piece.len() == 2 && piece.chars().all(|c| c.is_ascii_uppercase());
        match pieces.last_mut() {
            Some(last) if is_suffix || is_region => {
                last.push_str(", ");
                last.push_str(piece);
            }
            _ => pieces.push(piece.to_string()),
        }
    }
    pieces
}

fn has_org_suffix(text: &str, rules: &RuleSet) -> bool {
    rules
        .extraction
        .organization_suffixes
        .iter()
        .any(|s| contains_term(text, s, false))
}

/// Parse the experience section.
pub(crate) fn fill_experience(
    builder: &mut RecordBuilder,
    lines: &[SourcedLine],
    rules: &RuleSet,
) {
    for group in group_entries(lines, |_, _| false) {
        let i = builder.record.experience.len();
        let path = |field: &str| format!("experience[{}].{}", i, field);
        let mut entry = ExperienceEntry::default();
        let mut unclassified: Vec<(String, u32)> = Vec::new();

        for line in &group.header {
            let mut text = line.text.clone();
            if entry.start_date.is_none() {
                if let Some(span) = find_span(&text) {
                    entry.start_date = Some(span.start);
                    builder.provenance.record(path("start_date"), [line.order]);
                    if let Some(end) = span.end {
                        entry.end_date = Some(end);
                        builder.provenance.record(path("end_date"), [line.order]);
                    }
                    text = strip_dates(&text);
                }
            }

            for part in split_parts(&text, rules) {
                if entry.location.is_none() && looks_like_location(&part, rules) {
                    entry.location = Some(part);
                    builder.provenance.record(path("location"), [line.order]);
                } else if entry.title.is_none() && has_title_keyword(&part, rules) {
                    entry.title = Some(part);
                    builder.provenance.record(path("title"), [line.order]);
                } else if entry.organization.is_none() && has_org_suffix(&part, rules) {
                    entry.organization = Some(part);
                    builder.provenance.record(path("organization"), [line.order]);
                } else {
                    unclassified.push((part, line.order));
                }
            }
        }

        let mut leftovers = unclassified.into_iter();
        if entry.title.is_none() {
            if let Some((title, order)) = leftovers.next() {
                entry.title = Some(title);
                builder.provenance.record(path("title"), [order]);
            }
        }
        if entry.organization.is_none() {
            if let Some((org, order)) = leftovers.next() {
                entry.organization = Some(org);
                builder.provenance.record(path("organization"), [order]);
            }
        }

        let body = group.body.iter().map(|l| (l.text.clone(), l.order));
        for (bullet, order) in leftovers.chain(body) {
            builder
                .provenance
                .record(path(&format!("bullets[{}]", entry.bullets.len())), [order]);
            entry.bullets.push(bullet);
        }

        builder.record.experience.push(entry);
    }
}

fn degree_keyword_at(text: &str, rules: &RuleSet) -> bool {
    rules.extraction.degree_keywords.iter().any(|k| {
        let case_sensitive = k.chars().any(char::is_uppercase);
        contains_term(text, k, case_sensitive)
    })
}

fn institution_keyword_at(text: &str, rules: &RuleSet) -> bool {
    rules
        .extraction
        .institution_keywords
        .iter()
        .any(|k| contains_term(text, k, false))
}

/// Names after "of" that belong to the degree rather than the field.
const DEGREE_OF: &[&str] = &[
    "science",
    "arts",
    "technology",
    "engineering",
    "business administration",
    "commerce",
    "philosophy",
    "computer applications",
];

/// Split a degree segment into degree and field of study.
fn split_degree(segment: &str, next: Option<&str>) -> (String, Option<String>) {
    if let Some((degree, field)) = segment.split_once(" in ") {
        return (degree.trim().to_string(), Some(field.trim().to_string()));
    }
    if let Some(next) = next {
        return (segment.to_string(), Some(next.to_string()));
    }
    if let Some((degree, field)) = segment.split_once(" of ") {
        let field = field.trim();
        if !DEGREE_OF.contains(&field.to_lowercase().as_str()) {
            return (degree.trim().to_string(), Some(field.to_string()));
        }
    }
    (segment.to_string(), None)
}

/// Parse the education section.
pub(crate) fn fill_education(
    builder: &mut RecordBuilder,
    lines: &[SourcedLine],
    rules: &RuleSet,
) {
    let starts_entry = |entry: &EntryLines<'_>, line: &SourcedLine| {
        let has = |f: &dyn Fn(&str) -> bool| entry.lines().any(|l| f(&l.text));
        let degree = |t: &str| degree_keyword_at(t, rules);
        let institution = |t: &str| institution_keyword_at(t, rules);
        (degree(&line.text) && has(&degree)) || (institution(&line.text) && has(&institution))
    };

    for group in group_entries(lines, starts_entry) {
        let i = builder.record.education.len();
        let path = |field: &str| format!("education[{}].{}", i, field);
        let mut entry = EducationEntry::default();

        for line in group.lines() {
            for year in dates::years(&line.text) {
                if entry.year.map_or(true, |y| year > y) {
                    entry.year = Some(year);
                    builder.provenance.record(path("year"), [line.order]);
                }
            }

            let stripped = strip_dates(&line.text);
            let segments: Vec<&str> = SEGMENT_SEPARATOR
                .split(&stripped)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();

            let mut claimed = vec![false; segments.len()];
            for (k, segment) in segments.iter().enumerate() {
                if claimed[k] {
                    continue;
                }
                if entry.degree.is_none() && degree_keyword_at(segment, rules) {
                    let next = segments.get(k + 1).copied().filter(|n| {
                        !institution_keyword_at(n, rules) && !looks_like_location(n, rules)
                    });
                    let (degree, field) = split_degree(segment, next);
                    let field_from_next =
                        field.is_some() && next.is_some() && !segment.contains(" in ");
                    entry.degree = Some(degree);
                    builder.provenance.record(path("degree"), [line.order]);
                    if let Some(field) = field {
                        entry.field = Some(field);
                        builder.provenance.record(path("field"), [line.order]);
                    }
                    claimed[k] = true;
                    if field_from_next {
                        claimed[k + 1] = true;
                    }
                } else if entry.institution.is_none() && institution_keyword_at(segment, rules) {
                    entry.institution = Some(segment.to_string());
                    builder.provenance.record(path("institution"), [line.order]);
                    claimed[k] = true;
                }
            }

            // A line no field claimed is kept whole; otherwise only its leftovers.
            let details: Vec<String> = if claimed.iter().any(|c| *c) {
                segments
                    .iter()
                    .zip(&claimed)
                    .filter(|(_, c)| !**c)
                    .map(|(s, _)| s.to_string())
                    .collect()
            } else if stripped.is_empty() {
                Vec::new()
            } else {
                vec![line.text.clone()]
            };
            for detail in details {
                builder
                    .provenance
                    .record(path(&format!("details[{}]", entry.details.len())), [line.order]);
                entry.details.push(detail);
            }
        }

        builder.record.education.push(entry);
    }
}

/// Add the items of a technology list; returns the items too long to be a
/// technology name.
fn push_technologies(
    technologies: &mut Vec<String>,
    list: &str,
    rules: &RuleSet,
) -> Vec<String> {
    let mut prose = Vec::new();
    for item in list.split([',', ';', '|']) {
        let item = item.trim();
        let item = item.strip_prefix("and ").unwrap_or(item);
        let term = normalize_term(item);
        if term.is_empty() {
            continue;
        }
        if term.split(' ').count() > 4 {
            prose.push(item.to_string());
            continue;
        }
        let canonical = rules.skills.canonical(&term).to_string();
        if !technologies.contains(&canonical) {
            technologies.push(canonical);
        }
    }
    prose
}

/// Parse the projects section.
pub(crate) fn fill_projects(
    builder: &mut RecordBuilder,
    lines: &[SourcedLine],
    rules: &RuleSet,
) {
    for group in group_entries(lines, |_, _| false) {
        let i = builder.record.projects.len();
        let path = |field: &str| format!("projects[{}].{}", i, field);
        let mut technologies = Vec::new();
        let mut description = Vec::new();
        let mut name = String::new();
        let mut description_orders = Vec::new();
        let mut tech_orders = Vec::new();
        let mut stray = Vec::new();

        for (k, line) in group.lines().enumerate() {
            if let Some(m) = TECH_LABEL.find(&line.text) {
                for item in push_technologies(&mut technologies, &line.text[m.end()..], rules) {
                    stray.push((item, line.order));
                }
                tech_orders.push(line.order);
                continue;
            }
            if k == 0 {
                let header = strip_dates(&line.text);
                for caps in PARENTHESIZED.captures_iter(&header) {
                    for item in push_technologies(&mut technologies, &caps[1], rules) {
                        stray.push((item, line.order));
                    }
                    tech_orders.push(line.order);
                }
                let header = PARENTHESIZED.replace_all(&header, "");
                let mut parts = HEADER_SEPARATOR.split(&header).map(str::trim);
                name = parts.next().unwrap_or_default().to_string();
                for rest in parts.filter(|p| !p.is_empty()) {
                    // An inline description after the name, not a stack.
                    for item in push_technologies(&mut technologies, rest, rules) {
                        if description.is_empty() {
                            description.push(item);
                            description_orders.push(line.order);
                        } else {
                            stray.push((item, line.order));
                        }
                    }
                    tech_orders.push(line.order);
                }
                if name.is_empty() {
                    name = line.text.clone();
                }
                builder.provenance.record(path("name"), [line.order]);
                continue;
            }
            description.push(line.text.clone());
            description_orders.push(line.order);
        }

        let description = (!description.is_empty()).then(|| description.join(" "));
        if let Some(text) = &description {
            for skill in &rules.skills.technical {
                if contains_term(text, skill, false) && !technologies.contains(skill) {
                    technologies.push(skill.clone());
                }
            }
            builder.provenance.record(path("description"), description_orders.iter().copied());
        }
        if !technologies.is_empty() {
            tech_orders.extend(description_orders.iter().copied());
            builder.provenance.record(path("technologies"), tech_orders);
        }

        for (text, order) in stray {
            builder.push_free_text(&text, order);
        }
        builder.record.projects.push(ProjectEntry {
            name,
            description,
            technologies: technologies.into_iter().collect(),
        });
    }
}

/// Parse the certifications section, one certification per line.
pub(crate) fn fill_certifications(
    builder: &mut RecordBuilder,
    lines: &[SourcedLine],
    _rules: &RuleSet,
) {
    static ISSUER_SEPARATOR: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\s*(?:\||–|—|\s-\s|,|\s+by\s+)\s*").unwrap());

    for line in lines {
        let year = dates::years(&line.text).into_iter().max();
        let text = strip_dates(&line.text);
        if text.is_empty() {
            // A bare date line belongs to the certification above.
            let previous = builder.record.certifications.len().checked_sub(1);
            match (previous, year) {
                (Some(i), Some(year)) if builder.record.certifications[i].year.is_none() => {
                    builder.record.certifications[i].year = Some(year);
                    builder
                        .provenance
                        .record(format!("certifications[{}]", i), [line.order]);
                }
                _ if !line.text.trim().is_empty() => {
                    builder.push_free_text(line.text.trim(), line.order)
                }
                _ => {}
            }
            continue;
        }
        let mut parts = ISSUER_SEPARATOR
            .split(&text)
            .map(str::trim)
            .filter(|p| !p.is_empty());
        let name = parts.next().unwrap_or(text.as_str()).to_string();
        let issuer = parts.next().map(str::to_string);
        let rest: Vec<&str> = parts.collect();

        let i = builder.record.certifications.len();
        builder
            .provenance
            .record(format!("certifications[{}]", i), [line.order]);
        builder.record.certifications.push(Certification { name, issuer, year });
        for part in rest {
            builder.push_free_text(part, line.order);
        }
    }
}
