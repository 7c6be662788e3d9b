//! Scoring and job-match reports.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::{ExtractionWarning, LayoutSignals, Provenance, ResumeRecord};

/// Rubric categories of the ATS score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    Contact,
    QuantifiedAchievements,
    Skills,
    Structure,
    Formatting,
    Consistency,
}

impl ScoreCategory {
    /// All categories in report order.
    pub const ALL: [ScoreCategory; 6] = [
        ScoreCategory::Contact,
        ScoreCategory::QuantifiedAchievements,
        ScoreCategory::Skills,
        ScoreCategory::Structure,
        ScoreCategory::Formatting,
        ScoreCategory::Consistency,
    ];

    /// Key used in rule tables.
    pub fn key(&self) -> &'static str {
        match self {
            ScoreCategory::Contact => "contact",
            ScoreCategory::QuantifiedAchievements => "quantified_achievements",
            ScoreCategory::Skills => "skills",
            ScoreCategory::Structure => "structure",
            ScoreCategory::Formatting => "formatting",
            ScoreCategory::Consistency => "consistency",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ScoreCategory::Contact => "Contact completeness",
            ScoreCategory::QuantifiedAchievements => "Quantified achievements",
            ScoreCategory::Skills => "Skills section",
            ScoreCategory::Structure => "Section headings & order",
            ScoreCategory::Formatting => "ATS-safe formatting",
            ScoreCategory::Consistency => "Length & date consistency",
        }
    }
}

impl fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Coarse score band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn from_score(score: u32) -> Self {
        match score {
            85.. => ScoreBand::Excellent,
            70..=84 => ScoreBand::Good,
            50..=69 => ScoreBand::Fair,
            _ => ScoreBand::Poor,
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScoreBand::Excellent => "excellent",
            ScoreBand::Good => "good",
            ScoreBand::Fair => "fair",
            ScoreBand::Poor => "poor",
        };
        f.write_str(s)
    }
}

/// ATS compliance report for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtsReport {
    /// Sum of sub-scores, 0..=100
    pub overall_score: u32,

    pub band: ScoreBand,

    /// Points earned per category
    pub sub_scores: BTreeMap<ScoreCategory, u32>,

    /// Maximum points per category (the rubric weights)
    pub max_scores: BTreeMap<ScoreCategory, u32>,

    /// Job keywords missing from the résumé (empty without a job description)
    pub missing_keywords: BTreeSet<String>,

    /// Imperative fixes, in category order
    pub suggestions: Vec<String>,
}

impl AtsReport {
    /// Attach missing keywords from a job match.
    pub fn with_missing_keywords(mut self, keywords: BTreeSet<String>) -> Self {
        self.missing_keywords = keywords;
        self
    }

    /// Points earned for a category.
    pub fn sub_score(&self, category: ScoreCategory) -> u32 {
        self.sub_scores.get(&category).copied().unwrap_or(0)
    }
}

/// Keyword alignment against a job description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMatchReport {
    /// Share of skill-like job terms covered, 0..=100
    pub match_percent: u32,

    /// Résumé terms that also appear in the job description
    pub matched_terms: BTreeSet<String>,

    /// Skill-like job terms missing from the résumé
    pub gap_terms: BTreeSet<String>,
}

/// Everything produced for one upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub record: ResumeRecord,
    pub provenance: Provenance,
    pub warnings: Vec<ExtractionWarning>,
    pub signals: LayoutSignals,
    pub report: AtsReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_match: Option<JobMatchReport>,
}
