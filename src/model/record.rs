//! The structured résumé record and its provenance.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Canonical résumé sections, in conventional document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Contact,
    Summary,
    Skills,
    Experience,
    Education,
    Projects,
    Certifications,
    Languages,
    Awards,
}

impl Section {
    /// Sections in canonical order.
    pub const CANONICAL_ORDER: [Section; 9] = [
        Section::Contact,
        Section::Summary,
        Section::Skills,
        Section::Experience,
        Section::Education,
        Section::Projects,
        Section::Certifications,
        Section::Languages,
        Section::Awards,
    ];

    /// Position in the canonical order.
    pub fn rank(&self) -> usize {
        Self::CANONICAL_ORDER
            .iter()
            .position(|s| s == self)
            .unwrap_or(Self::CANONICAL_ORDER.len())
    }

    /// Display name used in suggestions.
    pub fn title(&self) -> &'static str {
        match self {
            Section::Contact => "Contact",
            Section::Summary => "Summary",
            Section::Skills => "Skills",
            Section::Experience => "Experience",
            Section::Education => "Education",
            Section::Projects => "Projects",
            Section::Certifications => "Certifications",
            Section::Languages => "Languages",
            Section::Awards => "Awards",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A detected section heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionHeading {
    pub section: Section,
    /// Heading text as it appeared
    pub text: String,
    pub order_index: u32,
}

/// A date with year and optional month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartialDate {
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
}

impl PartialDate {
    pub fn year(year: i32) -> Self {
        Self { year, month: None }
    }

    pub fn month(year: i32, month: u32) -> Self {
        Self {
            year,
            month: Some(month),
        }
    }

    /// Sortable key; a missing month sorts as January.
    pub fn key(&self) -> (i32, u32) {
        (self.year, self.month.unwrap_or(1))
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month {
            Some(m) => write!(f, "{:04}-{:02}", self.year, m),
            None => write!(f, "{:04}", self.year),
        }
    }
}

/// End of a dated range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndDate {
    Date(PartialDate),
    Current,
}

impl fmt::Display for EndDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndDate::Date(d) => d.fmt(f),
            EndDate::Current => f.write_str("present"),
        }
    }
}

/// Contact details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub links: BTreeSet<String>,
}

impl Contact {
    /// Whether any way of reaching the candidate was found.
    pub fn is_reachable(&self) -> bool {
        self.email.is_some() || self.phone.is_some()
    }
}

/// One position held.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub organization: Option<String>,
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start_date: Option<PartialDate>,
    pub end_date: Option<EndDate>,
    pub bullets: Vec<String>,
}

/// One degree or course of study.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub field: Option<String>,
    pub year: Option<i32>,
    /// Lines that did not map to a field (GPA, honours, coursework)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

/// A project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub name: String,
    pub description: Option<String>,
    pub technologies: BTreeSet<String>,
}

/// A certification or license.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    pub issuer: Option<String>,
    pub year: Option<i32>,
}

/// The canonical structured résumé.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub contact: Contact,

    /// Current role line under the name
    pub headline: Option<String>,

    pub summary: Option<String>,

    /// Lowercase skill tokens
    pub skills: BTreeSet<String>,

    /// Skills with their first-seen casing, in first-seen order
    pub skills_display: Vec<String>,

    /// Canonical soft skills among `skills` ("communication", "leadership")
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub soft_skills: BTreeSet<String>,

    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub projects: Vec<ProjectEntry>,
    pub certifications: Vec<Certification>,
    pub languages: Vec<String>,
    pub awards: Vec<String>,

    /// Section headings detected in document order
    pub sections: Vec<SectionHeading>,

    /// Lines kept verbatim because they did not map to any field
    pub free_text: Vec<String>,
}

impl ResumeRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a heading for the section was detected.
    pub fn has_heading(&self, section: Section) -> bool {
        self.sections.iter().any(|h| h.section == section)
    }

    /// Add a skill, keeping the first-seen casing for display.
    ///
    /// Returns `false` when the skill was already present.
    pub fn add_skill(&mut self, skill: &str) -> bool {
        let display = skill.trim();
        if display.is_empty() {
            return false;
        }
        let key = display.to_lowercase();
        if self.skills.insert(key) {
            self.skills_display.push(display.to_string());
            true
        } else {
            false
        }
    }

    /// All experience bullets in order.
    pub fn experience_bullets(&self) -> impl Iterator<Item = &str> {
        self.experience
            .iter()
            .flat_map(|e| e.bullets.iter().map(String::as_str))
    }

    /// Check whether nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        *self == ResumeRecord::default()
    }
}

/// Field path → `order_index` values of the blocks a field was taken from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Provenance(BTreeMap<String, BTreeSet<u32>>);

impl Provenance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `path` was derived from the given blocks.
    pub fn record<I>(&mut self, path: impl Into<String>, blocks: I)
    where
        I: IntoIterator<Item = u32>,
    {
        self.0.entry(path.into()).or_default().extend(blocks);
    }

    /// Blocks behind a field path.
    pub fn sources(&self, path: &str) -> Option<&BTreeSet<u32>> {
        self.0.get(path)
    }

    /// Iterate over all recorded paths.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<u32>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Non-fatal extraction finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionWarning {
    /// No text blocks at all.
    EmptyDocument,
    /// Neither email nor phone found anywhere.
    MissingContact,
    /// No candidate name line found.
    MissingName,
    /// Text was found but no section heading was recognized.
    NoSectionHeadings,
    /// A heading matched several sections.
    AmbiguousHeading { text: String, chosen: Section },
}

impl fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionWarning::EmptyDocument => f.write_str("document contains no text"),
            ExtractionWarning::MissingContact => {
                f.write_str("no email address or phone number found")
            }
            ExtractionWarning::MissingName => f.write_str("no candidate name found"),
            ExtractionWarning::NoSectionHeadings => {
                f.write_str("no standard section headings recognized")
            }
            ExtractionWarning::AmbiguousHeading { text, chosen } => {
                write!(f, "heading '{}' is ambiguous; read as {}", text, chosen)
            }
        }
    }
}

/// Output of the segmenter and field extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub record: ResumeRecord,
    pub provenance: Provenance,
    pub warnings: Vec<ExtractionWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_skill_keeps_first_casing() {
        let mut record = ResumeRecord::new();
        assert!(record.add_skill("JavaScript"));
        assert!(!record.add_skill("javascript"));
        assert!(record.add_skill(" Rust "));
        assert_eq!(record.skills_display, vec!["JavaScript", "Rust"]);
        assert!(record.skills.contains("javascript"));
    }

    #[test]
    fn test_section_rank_follows_canonical_order() {
        assert!(Section::Contact.rank() < Section::Summary.rank());
        assert!(Section::Experience.rank() < Section::Education.rank());
        assert_eq!(Section::Awards.rank(), 8);
    }

    #[test]
    fn test_partial_date_display() {
        assert_eq!(PartialDate::month(2021, 3).to_string(), "2021-03");
        assert_eq!(PartialDate::year(2019).to_string(), "2019");
        assert_eq!(EndDate::Current.to_string(), "present");
        assert!(PartialDate::year(2020).key() < PartialDate::month(2020, 2).key());
    }

    #[test]
    fn test_provenance_merges_sources() {
        let mut provenance = Provenance::new();
        provenance.record("contact.email", [3]);
        provenance.record("contact.email", [1, 3]);
        let sources: Vec<u32> = provenance
            .sources("contact.email")
            .unwrap()
            .iter()
            .copied()
            .collect();
        assert_eq!(sources, vec![1, 3]);
    }

    #[test]
    fn test_empty_record() {
        let mut record = ResumeRecord::new();
        assert!(record.is_empty());
        record.summary = Some("x".into());
        assert!(!record.is_empty());
    }

    #[test]
    fn test_warning_serialization() {
        let warning = ExtractionWarning::AmbiguousHeading {
            text: "Profile".into(),
            chosen: Section::Summary,
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "ambiguous_heading");
        assert_eq!(json["chosen"], "summary");
    }
}
