//! Section segmentation and field extraction.
//!
//! Normalized blocks are split into lines and each line is assigned to a
//! section by a small state machine driven by heading detection. Lines seen
//! before the first heading are routed to contact or summary. Each section's
//! lines are then handed to its field parser, which records where every
//! populated field came from.
//!
//! Extraction never fails: anything that cannot be mapped ends up in
//! `free_text`, an extra bullet or a detail line, and problems are reported
//! as [`ExtractionWarning`]s.

mod contact;
mod dates;
mod entries;
mod section;
mod skills;

use std::borrow::Cow;

use crate::model::{
    Extraction, ExtractionWarning, NormalizedBlock, Provenance, ResumeRecord, Section,
    SectionHeading, StyleHint,
};
use crate::rules::RuleSet;

pub use contact::{find_email, find_links, find_phone, has_contact_channel};
pub use dates::{find_span, parse_date, strip_dates, DateSpan};
pub use section::{detect as detect_heading, heading_key, resolve as resolve_heading, HeadingHit};

/// Blocks this close to the top may be contact details without a channel.
const CONTACT_LOOKAHEAD: usize = 3;

/// Longest block, in words, taken as a contact detail by position alone.
const MAX_CONTACT_WORDS: usize = 8;

/// One line of a section, tagged with the block it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourcedLine {
    pub text: String,
    /// `order_index` of the source block
    pub order: u32,
    /// The source block is a list
    pub bullet: bool,
    /// A blank separator or a heading precedes this line
    pub gap_before: bool,
}

/// Record under construction, with its provenance and warnings.
#[derive(Debug, Default)]
pub(crate) struct RecordBuilder {
    pub record: ResumeRecord,
    pub provenance: Provenance,
    pub warnings: Vec<ExtractionWarning>,
}

impl RecordBuilder {
    /// Keep a line that did not map to any field.
    pub fn push_free_text(&mut self, text: &str, order: u32) {
        let path = format!("free_text[{}]", self.record.free_text.len());
        self.record.free_text.push(text.to_string());
        self.provenance.record(path, [order]);
    }

    fn finish(self) -> Extraction {
        Extraction {
            record: self.record,
            provenance: self.provenance,
            warnings: self.warnings,
        }
    }
}

/// Whole-word, case-insensitive containment.
pub(crate) fn contains_word(text: &str, word: &str) -> bool {
    contains_term(text, word, false)
}

/// Whether `term` occurs in `text` with no letter or digit directly around it.
pub(crate) fn contains_term(text: &str, term: &str, case_sensitive: bool) -> bool {
    let term = term.trim();
    if term.is_empty() {
        return false;
    }
    let (haystack, needle) = if case_sensitive {
        (Cow::Borrowed(text), Cow::Borrowed(term))
    } else {
        (Cow::Owned(text.to_lowercase()), Cow::Owned(term.to_lowercase()))
    };
    haystack.match_indices(needle.as_ref()).any(|(start, m)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + m.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Segment blocks into sections and extract the résumé record.
pub fn extract(blocks: &[NormalizedBlock], rules: &RuleSet) -> Extraction {
    Segmenter::new(rules).run(blocks)
}

/// Line-to-section state machine.
struct Segmenter<'r> {
    rules: &'r RuleSet,
    /// Section of the last heading; `None` before the first heading
    current: Option<Section>,
    /// Section of the last assigned content or heading
    last_assigned: Option<Section>,
    /// Blocks seen before the first heading
    pre_heading_blocks: usize,
    /// The next content line follows a heading
    after_heading: bool,
    lines: Vec<(Section, SourcedLine)>,
    builder: RecordBuilder,
}

impl<'r> Segmenter<'r> {
    fn new(rules: &'r RuleSet) -> Self {
        Self {
            rules,
            current: None,
            last_assigned: None,
            pre_heading_blocks: 0,
            after_heading: false,
            lines: Vec::new(),
            builder: RecordBuilder::default(),
        }
    }

    fn run(mut self, blocks: &[NormalizedBlock]) -> Extraction {
        if blocks.iter().all(|b| b.lines().next().is_none()) {
            self.builder.warnings.push(ExtractionWarning::EmptyDocument);
            return self.builder.finish();
        }

        let mut previous: Option<u32> = None;
        for block in blocks {
            let gap = previous.is_some_and(|p| block.order_index > p + 1);
            self.segment_block(block, gap);
            previous = Some(block.order_index);
        }
        log::debug!(
            "segmented {} lines under {} headings",
            self.lines.len(),
            self.builder.record.sections.len()
        );

        self.fill_sections();
        self.check_warnings();
        self.builder.finish()
    }

    fn segment_block(&mut self, block: &NormalizedBlock, gap: bool) {
        let bullet = block.has_hint(StyleHint::Bullet);
        let mut fallback: Option<Section> = None;

        for (i, line) in block.lines().enumerate() {
            let order = block.order_index;
            if !bullet {
                let emphasized = block.is_emphasized();
                let hit = section::detect(line, emphasized, i > 0, &self.rules.headings);
                if let Some(hit) = hit.filter(|h| !self.is_content_label(h)) {
                    self.open_section(line, &hit, order);
                    if let Some(rest) = hit.rest {
                        self.push_line(rest, order, false, false);
                    }
                    continue;
                }
            }

            if self.current.is_none() && fallback.is_none() {
                let section = self.pre_heading_section(block);
                self.last_assigned = Some(section);
                fallback = Some(section);
            }
            self.push_line(line.to_string(), order, bullet, gap && i == 0);
        }

        if fallback.is_some() {
            self.pre_heading_blocks += 1;
        }
    }

    /// Inline labels that read as headings but are content of the current
    /// section: `Languages:` inside skills, `Technologies:` inside a project.
    fn is_content_label(&self, hit: &HeadingHit) -> bool {
        if hit.rest.is_none() {
            return false;
        }
        let label_of = |s: Section| hit.sections.contains(&s);
        match self.current {
            Some(Section::Skills) => true,
            Some(Section::Experience | Section::Projects) => {
                label_of(Section::Skills) || label_of(Section::Languages)
            }
            _ => false,
        }
    }

    fn open_section(&mut self, line: &str, hit: &HeadingHit, order: u32) {
        let text = match &hit.rest {
            Some(_) => line.split_once(':').map_or(line, |(label, _)| label).trim(),
            None => line,
        };
        let section = if hit.sections.len() > 1 {
            let chosen = section::resolve(&hit.sections, self.last_assigned)
                .unwrap_or(hit.sections[0]);
            log::debug!("ambiguous heading '{}' read as {}", text, chosen);
            self.builder.warnings.push(ExtractionWarning::AmbiguousHeading {
                text: text.to_string(),
                chosen,
            });
            chosen
        } else {
            hit.sections[0]
        };

        self.builder.record.sections.push(SectionHeading {
            section,
            text: text.to_string(),
            order_index: order,
        });
        self.current = Some(section);
        self.last_assigned = Some(section);
        self.after_heading = true;
    }

    /// Contact or summary, for a block seen before any heading.
    fn pre_heading_section(&self, block: &NormalizedBlock) -> Section {
        if block.lines().any(has_contact_channel) {
            return Section::Contact;
        }
        let words = block.text.split_whitespace().count();
        let sentence = block.text.trim_end().ends_with(['.', '!', '?']);
        if self.pre_heading_blocks < CONTACT_LOOKAHEAD && words <= MAX_CONTACT_WORDS && !sentence
        {
            Section::Contact
        } else {
            Section::Summary
        }
    }

    fn push_line(&mut self, text: String, order: u32, bullet: bool, gap_before: bool) {
        let gap_before = gap_before || std::mem::take(&mut self.after_heading);
        let section = self
            .current
            .or(self.last_assigned)
            .unwrap_or(Section::Summary);
        self.lines.push((
            section,
            SourcedLine {
                text,
                order,
                bullet,
                gap_before,
            },
        ));
    }

    fn section_lines(&self, section: Section) -> Vec<SourcedLine> {
        self.lines
            .iter()
            .filter(|(s, _)| *s == section)
            .map(|(_, line)| line.clone())
            .collect()
    }

    fn fill_sections(&mut self) {
        let rules = self.rules;
        for section in Section::CANONICAL_ORDER {
            let lines = self.section_lines(section);
            if lines.is_empty() {
                continue;
            }
            let builder = &mut self.builder;
            match section {
                Section::Contact => contact::fill_contact(builder, &lines, rules),
                Section::Summary => fill_summary(builder, &lines),
                Section::Skills => skills::fill_skills(builder, &lines, rules),
                Section::Experience => entries::fill_experience(builder, &lines, rules),
                Section::Education => entries::fill_education(builder, &lines, rules),
                Section::Projects => entries::fill_projects(builder, &lines, rules),
                Section::Certifications => entries::fill_certifications(builder, &lines, rules),
                Section::Languages => fill_languages(builder, &lines),
                Section::Awards => fill_awards(builder, &lines),
            }
        }

        let all: Vec<SourcedLine> = self.lines.iter().map(|(_, l)| l.clone()).collect();
        contact::scan_for_channels(&mut self.builder, &all);
    }

    fn check_warnings(&mut self) {
        let builder = &mut self.builder;
        if builder.record.sections.is_empty() {
            builder.warnings.push(ExtractionWarning::NoSectionHeadings);
        }
        if !builder.record.contact.is_reachable() {
            builder.warnings.push(ExtractionWarning::MissingContact);
        }
        if builder.record.contact.name.is_none() {
            builder.warnings.push(ExtractionWarning::MissingName);
        }
    }
}

fn fill_summary(builder: &mut RecordBuilder, lines: &[SourcedLine]) {
    let text = lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    builder.record.summary = Some(text);
    builder
        .provenance
        .record("summary", lines.iter().map(|l| l.order));
}

fn fill_languages(builder: &mut RecordBuilder, lines: &[SourcedLine]) {
    for line in lines {
        for language in line.text.split([',', '|', '•', ';']).map(str::trim) {
            if language.is_empty() {
                continue;
            }
            let path = format!("languages[{}]", builder.record.languages.len());
            builder.record.languages.push(language.to_string());
            builder.provenance.record(path, [line.order]);
        }
    }
}

fn fill_awards(builder: &mut RecordBuilder, lines: &[SourcedLine]) {
    for line in lines {
        let path = format!("awards[{}]", builder.record.awards.len());
        builder.record.awards.push(line.text.clone());
        builder.provenance.record(path, [line.order]);
    }
}
