//! Rule tables: heading lexicon, extraction lexicons, skill taxonomy and
//! scoring rubric.
//!
//! The built-in tables are embedded from `default_rules.toml`. A user file
//! only needs to name what it overrides:
//!
//! ```
//! use resume_ats::rules::RuleSet;
//!
//! let rules = RuleSet::from_toml_str(r#"
//!     [scoring.targets]
//!     quantified_bullets = 3
//! "#).unwrap();
//! assert_eq!(rules.scoring.targets.quantified_bullets, 3);
//! assert_eq!(rules.scoring.targets.skills, 6);
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{ScoreCategory, Section};

const DEFAULT_RULES: &str = include_str!("default_rules.toml");

static BUILTIN: Lazy<RuleSet> = Lazy::new(|| {
    toml::from_str(DEFAULT_RULES).expect("embedded rule table is valid TOML")
});

/// Every deficiency code the scoring engine can emit.
pub const KNOWN_CODES: &[&str] = &[
    "contact.missing_email",
    "contact.missing_phone",
    "contact.missing_name",
    "contact.missing_location",
    "quantified_achievements.no_experience_bullets",
    "quantified_achievements.few_metrics",
    "skills.missing_section",
    "skills.few_skills",
    "structure.missing_headings",
    "structure.nonstandard_order",
    "formatting.tables",
    "formatting.images",
    "formatting.columns",
    "formatting.text_boxes",
    "consistency.missing_dates",
    "consistency.date_order",
    "consistency.too_long",
    "consistency.bullet_overload",
];

/// The complete set of rule tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub headings: HeadingRules,
    pub extraction: ExtractionRules,
    pub skills: SkillRules,
    pub scoring: ScoringRules,
}

/// Heading phrases per section, lowercase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingRules {
    pub contact: Vec<String>,
    pub summary: Vec<String>,
    pub skills: Vec<String>,
    pub experience: Vec<String>,
    pub education: Vec<String>,
    pub projects: Vec<String>,
    pub certifications: Vec<String>,
    pub languages: Vec<String>,
    pub awards: Vec<String>,
}

impl HeadingRules {
    /// Phrases announcing a section.
    pub fn phrases(&self, section: Section) -> &[String] {
        match section {
            Section::Contact => &self.contact,
            Section::Summary => &self.summary,
            Section::Skills => &self.skills,
            Section::Experience => &self.experience,
            Section::Education => &self.education,
            Section::Projects => &self.projects,
            Section::Certifications => &self.certifications,
            Section::Languages => &self.languages,
            Section::Awards => &self.awards,
        }
    }

    /// Sections whose lexicon contains `phrase` exactly, in canonical order.
    pub fn sections_for(&self, phrase: &str) -> Vec<Section> {
        Section::CANONICAL_ORDER
            .iter()
            .copied()
            .filter(|s| self.phrases(*s).iter().any(|p| p == phrase))
            .collect()
    }
}

/// Lexicons used by the field extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRules {
    /// Words marking a job title (lowercase)
    pub title_keywords: Vec<String>,

    /// Degree names; entries with an uppercase letter match case-sensitively
    pub degree_keywords: Vec<String>,

    /// Words marking an educational institution (lowercase)
    pub institution_keywords: Vec<String>,

    /// Suffixes marking a company name (lowercase)
    pub organization_suffixes: Vec<String>,

    /// Known places and work arrangements (lowercase)
    pub location_hints: Vec<String>,
}

/// Skill taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRules {
    /// Technical skills; these are the skill-like terms
    pub technical: Vec<String>,

    /// Soft skills, recognised but never reported as gaps
    pub soft: Vec<String>,

    /// Terms ignored when tokenizing job descriptions
    pub stop_words: Vec<String>,

    /// Alias → canonical term
    pub synonyms: BTreeMap<String, String>,
}

impl SkillRules {
    /// Canonical form of a lowercase term.
    pub fn canonical<'a>(&'a self, term: &'a str) -> &'a str {
        self.synonyms.get(term).map(String::as_str).unwrap_or(term)
    }

    /// Check if a canonical term is a technical skill.
    pub fn is_technical(&self, term: &str) -> bool {
        self.technical.iter().any(|t| t == term)
    }

    /// Check if a canonical term is a soft skill.
    pub fn is_soft(&self, term: &str) -> bool {
        self.soft.iter().any(|t| t == term)
    }
}

/// Scoring rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRules {
    pub weights: Weights,
    pub targets: Targets,
    pub penalties: Penalties,

    /// `category.code` → suggestion text
    pub suggestions: BTreeMap<String, String>,
}

impl ScoringRules {
    /// Suggestion text for a deficiency code, falling back to the category
    /// default. `{name}` placeholders are filled from `vars`.
    pub fn suggestion(
        &self,
        category: ScoreCategory,
        code: Option<&str>,
        vars: &[(&str, String)],
    ) -> Option<String> {
        let specific = code.and_then(|c| self.text(&format!("{}.{}", category.key(), c)));
        let template = specific.or_else(|| self.text(&format!("{}.default", category.key())))?;
        let mut text = template.to_string();
        for (name, value) in vars {
            text = text.replace(&format!("{{{}}}", name), value);
        }
        Some(text)
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.suggestions
            .get(key)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}

/// Maximum points per category; must sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weights {
    pub contact: u32,
    pub quantified_achievements: u32,
    pub skills: u32,
    pub structure: u32,
    pub formatting: u32,
    pub consistency: u32,
}

impl Weights {
    pub fn get(&self, category: ScoreCategory) -> u32 {
        match category {
            ScoreCategory::Contact => self.contact,
            ScoreCategory::QuantifiedAchievements => self.quantified_achievements,
            ScoreCategory::Skills => self.skills,
            ScoreCategory::Structure => self.structure,
            ScoreCategory::Formatting => self.formatting,
            ScoreCategory::Consistency => self.consistency,
        }
    }

    pub fn total(&self) -> u32 {
        ScoreCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Targets {
    /// Quantified experience bullets for full marks
    pub quantified_bullets: u32,

    /// Skills for full density marks
    pub skills: u32,

    /// Page limit (the page check passes when the count is unknown)
    pub max_pages: u32,

    /// Bullet limit per experience entry
    pub max_bullets_per_entry: u32,
}

/// Points deducted from the formatting weight per offending signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Penalties {
    pub tables: u32,
    pub images: u32,
    pub columns: u32,
    pub text_boxes: u32,
}

impl RuleSet {
    /// The embedded default tables.
    pub fn builtin() -> &'static RuleSet {
        &BUILTIN
    }

    /// Parse a user rule file and merge it over the built-in tables.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut merged = toml::Value::Table(toml::from_str::<toml::Table>(DEFAULT_RULES)?);
        let overlay = toml::Value::Table(toml::from_str::<toml::Table>(s)?);
        merge(&mut merged, overlay);

        let rules: RuleSet = merged.try_into()?;
        rules.validate()?;
        Ok(rules)
    }

    /// Load a rule file from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        log::debug!("loading rule table from {}", path.as_ref().display());
        Self::from_toml_str(&content)
    }

    /// Check the rubric: weights sum to 100, targets are positive, every
    /// section has a heading phrase and every deficiency code has text.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        let total = self.scoring.weights.total();
        if total != 100 {
            problems.push(format!("scoring weights sum to {}, expected 100", total));
        }
        let targets = &self.scoring.targets;
        if targets.quantified_bullets == 0 || targets.skills == 0 {
            problems.push("scoring targets must be positive".to_string());
        }
        for section in Section::CANONICAL_ORDER {
            if self.headings.phrases(section).is_empty() {
                problems.push(format!("no heading phrases for '{}'", section));
            }
        }
        for category in ScoreCategory::ALL {
            if self.scoring.suggestion(category, None, &[]).is_none() {
                problems.push(format!("missing suggestion '{}.default'", category.key()));
            }
        }
        for code in KNOWN_CODES {
            let covered = self
                .scoring
                .suggestions
                .get(*code)
                .is_some_and(|s| !s.trim().is_empty());
            let category = code.split('.').next().unwrap_or_default();
            let default = format!("{}.default", category);
            if !covered && !self.scoring.suggestions.contains_key(&default) {
                problems.push(format!("no suggestion text for '{}'", code));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::RuleTable(problems.join("; ")))
        }
    }

    /// Serialize the tables back to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::RuleTable(e.to_string()))
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin().clone()
    }
}

/// Merge `overlay` into `base`: tables recursively, anything else replaced.
fn merge(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
