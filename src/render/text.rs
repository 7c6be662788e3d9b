//! Plain text summary of an analysis.

use std::fmt::Write;

use crate::model::{Analysis, ResumeRecord, ScoreCategory};

/// What the text summary includes besides the score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextOptions {
    /// Extracted contact details, skills and entry counts
    pub include_record: bool,

    /// Suggestions and extraction warnings
    pub include_suggestions: bool,
}

impl TextOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Include the extracted record summary.
    pub fn with_record(mut self, include: bool) -> Self {
        self.include_record = include;
        self
    }

    /// Include suggestions and warnings.
    pub fn with_suggestions(mut self, include: bool) -> Self {
        self.include_suggestions = include;
        self
    }
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            include_record: true,
            include_suggestions: true,
        }
    }
}

/// Render an analysis as a plain text report.
pub fn to_text(analysis: &Analysis, options: &TextOptions) -> String {
    let mut out = String::new();
    let report = &analysis.report;

    let _ = writeln!(
        out,
        "ATS score: {}/100 ({})",
        report.overall_score, report.band
    );
    out.push('\n');
    for category in ScoreCategory::ALL {
        let max = report.max_scores.get(&category).copied().unwrap_or(0);
        let _ = writeln!(
            out,
            "  {:<28} {:>3}/{}",
            category.label(),
            report.sub_score(category),
            max
        );
    }

    if let Some(job) = &analysis.job_match {
        out.push('\n');
        let _ = writeln!(out, "Job match: {}%", job.match_percent);
        if !job.matched_terms.is_empty() {
            let _ = writeln!(out, "  Matched: {}", join(&job.matched_terms));
        }
        if !job.gap_terms.is_empty() {
            let _ = writeln!(out, "  Missing: {}", join(&job.gap_terms));
        }
    }

    if options.include_record {
        out.push('\n');
        write_record(&mut out, &analysis.record);
    }

    if options.include_suggestions {
        if !report.suggestions.is_empty() {
            out.push_str("\nSuggestions:\n");
            for suggestion in &report.suggestions {
                let _ = writeln!(out, "  - {}", suggestion);
            }
        }
        if !analysis.warnings.is_empty() {
            out.push_str("\nWarnings:\n");
            for warning in &analysis.warnings {
                let _ = writeln!(out, "  - {}", warning);
            }
        }
    }

    out.trim_end().to_string()
}

fn write_record(out: &mut String, record: &ResumeRecord) {
    let contact = &record.contact;
    let fields = [
        ("Name", contact.name.as_deref()),
        ("Headline", record.headline.as_deref()),
        ("Email", contact.email.as_deref()),
        ("Phone", contact.phone.as_deref()),
        ("Location", contact.location.as_deref()),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            let _ = writeln!(out, "{}: {}", label, value);
        }
    }
    if !contact.links.is_empty() {
        let _ = writeln!(out, "Links: {}", join(&contact.links));
    }
    if !record.skills_display.is_empty() {
        let _ = writeln!(out, "Skills: {}", record.skills_display.join(", "));
    }
    if !record.soft_skills.is_empty() {
        let _ = writeln!(out, "Soft skills: {}", join(&record.soft_skills));
    }
    let _ = writeln!(
        out,
        "Experience: {} entries, Education: {} entries, Projects: {}",
        record.experience.len(),
        record.education.len(),
        record.projects.len()
    );
}

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{JobMatchReport, LayoutSignals};
    use crate::rules::RuleSet;
    use crate::score::Scorer;

    fn analysis() -> Analysis {
        let mut record = ResumeRecord::new();
        record.contact.name = Some("Jane Doe".into());
        record.contact.email = Some("jane@x.com".into());
        record.add_skill("Rust");
        let report = Scorer::new(RuleSet::builtin()).score(&record, &LayoutSignals::default());
        Analysis {
            record,
            provenance: Default::default(),
            warnings: Vec::new(),
            signals: LayoutSignals::default(),
            report,
            job_match: Some(JobMatchReport {
                match_percent: 50,
                matched_terms: ["rust".to_string()].into(),
                gap_terms: ["aws".to_string()].into(),
            }),
        }
    }

    #[test]
    fn test_to_text_sections() {
        let text = to_text(&analysis(), &TextOptions::default());
        assert!(text.starts_with("ATS score: "));
        assert!(text.contains("Contact completeness"));
        assert!(text.contains("Job match: 50%"));
        assert!(text.contains("Missing: aws"));
        assert!(text.contains("Name: Jane Doe"));
        assert!(text.contains("Suggestions:"));
    }

    #[test]
    fn test_to_text_score_only() {
        let options = TextOptions::new()
            .with_record(false)
            .with_suggestions(false);
        let text = to_text(&analysis(), &options);
        assert!(!text.contains("Name:"));
        assert!(!text.contains("Suggestions:"));
    }
}
