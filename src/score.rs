//! ATS compliance scoring.
//!
//! Every category earns a share of its rubric weight. Shortfalls are
//! reported as deficiency codes (`category.code`) whose text comes from the
//! rule table, so the wording can be tuned without touching this module.

use chrono::{Datelike, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{
    AtsReport, EndDate, LayoutSignals, ResumeRecord, ScoreBand, ScoreCategory, Section,
};
use crate::rules::RuleSet;

/// Sections every résumé is expected to have, in canonical order.
const REQUIRED_SECTIONS: [Section; 3] = [Section::Skills, Section::Experience, Section::Education];

/// A percentage, a currency amount, or a multiplier.
static METRIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\d+(?:[.,]\d+)?\s*(?:%|percent\b|x\b)|[$€£₹]\s*\d").unwrap()
});

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:[.,]\d+)*").unwrap());

/// Whether a bullet states a measurable outcome.
///
/// A bare year (`2021`) does not count as a metric.
pub fn has_metric(text: &str) -> bool {
    METRIC.is_match(text) || NUMBER.find_iter(text).any(|m| !is_year(m.as_str()))
}

fn is_year(number: &str) -> bool {
    number.len() == 4
        && (number.starts_with("19") || number.starts_with("20"))
        && number.bytes().all(|b| b.is_ascii_digit())
}

/// A shortfall within one category.
#[derive(Debug, Clone, PartialEq)]
struct Deficiency {
    code: &'static str,
    vars: Vec<(&'static str, String)>,
}

impl Deficiency {
    fn new(code: &'static str) -> Self {
        Self {
            code,
            vars: Vec::new(),
        }
    }

    fn with(mut self, name: &'static str, value: impl ToString) -> Self {
        self.vars.push((name, value.to_string()));
        self
    }
}

/// Share of a category earned, with the reasons for anything missing.
#[derive(Debug, Default)]
struct Assessment {
    fraction: f64,
    deficiencies: Vec<Deficiency>,
}

impl Assessment {
    fn add(&mut self, share: f64) {
        self.fraction += share;
    }

    fn miss(&mut self, deficiency: Deficiency) {
        self.deficiencies.push(deficiency);
    }

    fn points(&self, weight: u32) -> u32 {
        let points = (weight as f64 * self.fraction.clamp(0.0, 1.0)).round() as u32;
        points.min(weight)
    }
}

/// Scores records against a rule table.
#[derive(Debug, Clone)]
pub struct Scorer<'r> {
    rules: &'r RuleSet,
    today: NaiveDate,
}

impl<'r> Scorer<'r> {
    /// Create a scorer that checks dates against the local date.
    pub fn new(rules: &'r RuleSet) -> Self {
        Self {
            rules,
            today: Local::now().date_naive(),
        }
    }

    /// Use a fixed "today" for date checks.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Score a record.
    pub fn score(&self, record: &ResumeRecord, signals: &LayoutSignals) -> AtsReport {
        let weights = &self.rules.scoring.weights;
        let mut report = AtsReport {
            overall_score: 0,
            band: ScoreBand::Poor,
            sub_scores: Default::default(),
            max_scores: Default::default(),
            missing_keywords: Default::default(),
            suggestions: Vec::new(),
        };

        for category in ScoreCategory::ALL {
            let weight = weights.get(category);
            let assessment = match category {
                ScoreCategory::Contact => self.contact(record),
                ScoreCategory::QuantifiedAchievements => self.quantified(record),
                ScoreCategory::Skills => self.skills(record),
                ScoreCategory::Structure => self.structure(record),
                ScoreCategory::Formatting => self.formatting(signals, weight),
                ScoreCategory::Consistency => self.consistency(record, signals),
            };
            let points = assessment.points(weight);

            if points < weight {
                report
                    .suggestions
                    .extend(self.suggestions(category, &assessment.deficiencies));
            }
            report.sub_scores.insert(category, points);
            report.max_scores.insert(category, weight);
        }

        let total: u32 = report.sub_scores.values().sum();
        report.overall_score = total.min(100);
        report.band = ScoreBand::from_score(report.overall_score);
        log::debug!(
            "ats score {} ({}), {} suggestions",
            report.overall_score,
            report.band,
            report.suggestions.len()
        );
        report
    }

    fn suggestions(&self, category: ScoreCategory, deficiencies: &[Deficiency]) -> Vec<String> {
        let scoring = &self.rules.scoring;
        if deficiencies.is_empty() {
            return scoring.suggestion(category, None, &[]).into_iter().collect();
        }
        deficiencies
            .iter()
            .filter_map(|d| scoring.suggestion(category, Some(d.code), &d.vars))
            .collect()
    }

    fn contact(&self, record: &ResumeRecord) -> Assessment {
        let contact = &record.contact;
        let mut a = Assessment::default();
        let checks = [
            (contact.email.is_some(), 0.4, "missing_email"),
            (contact.phone.is_some(), 0.3, "missing_phone"),
            (contact.name.is_some(), 0.2, "missing_name"),
            (
                contact.location.is_some() || !contact.links.is_empty(),
                0.1,
                "missing_location",
            ),
        ];
        for (present, share, code) in checks {
            if present {
                a.add(share);
            } else {
                a.miss(Deficiency::new(code));
            }
        }
        a
    }

    fn quantified(&self, record: &ResumeRecord) -> Assessment {
        let mut a = Assessment::default();
        let target = self.rules.scoring.targets.quantified_bullets.max(1);
        let bullets: Vec<&str> = record.experience_bullets().collect();
        if bullets.is_empty() {
            a.miss(Deficiency::new("no_experience_bullets"));
            return a;
        }

        let count = bullets.iter().filter(|b| has_metric(b)).count() as u32;
        a.add(count.min(target) as f64 / target as f64);
        if count < target {
            a.miss(
                Deficiency::new("few_metrics")
                    .with("target", target)
                    .with("count", count),
            );
        }
        a
    }

    fn skills(&self, record: &ResumeRecord) -> Assessment {
        let mut a = Assessment::default();
        let target = self.rules.scoring.targets.skills.max(1);
        let count = record.skills.len() as u32;

        if count > 0 {
            a.add(0.6);
        } else if record.has_heading(Section::Skills) {
            a.add(0.3);
        } else {
            a.miss(Deficiency::new("missing_section"));
            return a;
        }

        a.add(0.4 * count.min(target) as f64 / target as f64);
        if count < target {
            a.miss(
                Deficiency::new("few_skills")
                    .with("target", target)
                    .with("count", count),
            );
        }
        a
    }

    fn structure(&self, record: &ResumeRecord) -> Assessment {
        let mut a = Assessment::default();

        let missing: Vec<&str> = REQUIRED_SECTIONS
            .iter()
            .filter(|s| !record.has_heading(**s))
            .map(|s| s.title())
            .collect();
        let present = REQUIRED_SECTIONS.len() - missing.len();
        a.add(0.6 * present as f64 / REQUIRED_SECTIONS.len() as f64);
        if !missing.is_empty() {
            a.miss(Deficiency::new("missing_headings").with("missing", missing.join(", ")));
        }

        let mut order: Vec<Section> = Vec::new();
        for heading in &record.sections {
            if !order.contains(&heading.section) {
                order.push(heading.section);
            }
        }
        if order.len() >= 2 {
            let inversions = inversions(&order);
            a.add(0.4 * (1.0 - 0.5 * inversions as f64).max(0.0));
            if inversions > 0 {
                a.miss(Deficiency::new("nonstandard_order"));
            }
        }
        a
    }

    fn formatting(&self, signals: &LayoutSignals, weight: u32) -> Assessment {
        let penalties = &self.rules.scoring.penalties;
        let mut a = Assessment::default();
        let mut deducted = 0;
        let checks = [
            (signals.tables > 0, penalties.tables, "tables"),
            (signals.images > 0, penalties.images, "images"),
            (signals.multi_column, penalties.columns, "columns"),
            (signals.text_boxes > 0, penalties.text_boxes, "text_boxes"),
        ];
        for (found, penalty, code) in checks {
            if found {
                deducted += penalty;
                a.miss(Deficiency::new(code));
            }
        }
        if weight > 0 {
            a.add(weight.saturating_sub(deducted) as f64 / weight as f64);
        }
        a
    }

    fn consistency(&self, record: &ResumeRecord, signals: &LayoutSignals) -> Assessment {
        let targets = &self.rules.scoring.targets;
        let mut a = Assessment::default();

        let entries = record.experience.len();
        let dated: Vec<_> = record
            .experience
            .iter()
            .filter(|e| e.start_date.is_some())
            .collect();
        if entries > 0 {
            a.add(0.4 * dated.len() as f64 / entries as f64);
        }
        if entries == 0 || dated.len() < entries {
            a.miss(Deficiency::new("missing_dates"));
        }

        if !dated.is_empty() {
            let today = (self.today.year(), self.today.month());
            let valid = dated
                .iter()
                .filter(|e| {
                    let Some(start) = e.start_date.map(|d| d.key()) else {
                        return false;
                    };
                    let end_ok = match e.end_date {
                        Some(EndDate::Date(end)) => start <= end.key() && end.key() <= today,
                        _ => true,
                    };
                    start <= today && end_ok
                })
                .count();
            a.add(0.3 * valid as f64 / dated.len() as f64);
            if valid < dated.len() {
                a.miss(Deficiency::new("date_order"));
            }
        }

        if signals.pages == 0 || signals.pages <= targets.max_pages {
            a.add(0.15);
        } else {
            a.miss(
                Deficiency::new("too_long")
                    .with("target", targets.max_pages)
                    .with("count", signals.pages),
            );
        }

        let limit = targets.max_bullets_per_entry as usize;
        if record.experience.iter().all(|e| e.bullets.len() <= limit) {
            a.add(0.15);
        } else {
            a.miss(Deficiency::new("bullet_overload").with("target", limit));
        }
        a
    }
}

/// Pairs of sections that appear out of canonical order.
fn inversions(order: &[Section]) -> usize {
    let mut count = 0;
    for (i, a) in order.iter().enumerate() {
        count += order[i + 1..].iter().filter(|b| a.rank() > b.rank()).count();
    }
    count
}

/// Score a record with the given rules.
pub fn score(record: &ResumeRecord, signals: &LayoutSignals, rules: &RuleSet) -> AtsReport {
    Scorer::new(rules).score(record, signals)
}
