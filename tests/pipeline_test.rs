//! End-to-end tests: bytes in, analysis out.

mod common;

use std::sync::Arc;

use common::{docx, heading, para, pptx, strong_resume, weak_resume};
use resume_ats::{
    render, BlockCache, DocumentFormat, ErrorKind, ExtractionWarning, JsonFormat, RawDocument,
    ResumeAts, RuleSet, Section,
};

#[test]
fn test_docx_record_fields() {
    let analysis = ResumeAts::new()
        .analyze(&strong_resume(), DocumentFormat::Docx, None)
        .unwrap();
    let record = &analysis.record;

    assert_eq!(record.contact.name.as_deref(), Some("Jane Doe"));
    assert_eq!(record.contact.email.as_deref(), Some("jane.doe@example.com"));
    assert!(record.contact.phone.is_some());
    assert!(record.skills.contains("rust"));
    assert!(record.skills.contains("kubernetes"));
    assert_eq!(record.skills_display.first().map(String::as_str), Some("Python"));

    assert_eq!(record.experience.len(), 2);
    assert_eq!(record.experience[0].bullets.len(), 3);
    assert_eq!(record.experience[1].bullets.len(), 2);
    assert!(record.experience.iter().all(|e| e.start_date.is_some()));
    assert_eq!(record.education.len(), 1);

    let sections: Vec<Section> = record.sections.iter().map(|h| h.section).collect();
    assert_eq!(
        sections,
        vec![
            Section::Summary,
            Section::Skills,
            Section::Experience,
            Section::Education
        ]
    );
    assert!(analysis.warnings.is_empty());
    assert!(analysis.job_match.is_none());
}

#[test]
fn test_provenance_points_at_blocks() {
    let ats = ResumeAts::new();
    let doc = RawDocument::new(strong_resume(), DocumentFormat::Docx);
    let blocks = ats.extract_blocks(&doc).unwrap();
    let analysis = ats.analyze_document(&doc, None).unwrap();

    let known: Vec<u32> = blocks.iter().map(|b| b.order_index).collect();
    for (path, sources) in analysis.provenance.iter() {
        assert!(!sources.is_empty(), "{} has no source", path);
        assert!(sources.iter().all(|s| known.contains(s)), "{}", path);
    }
    let email = analysis.provenance.sources("contact.email").unwrap();
    let block = blocks
        .iter()
        .find(|b| email.contains(&b.order_index))
        .unwrap();
    assert!(block.text.contains("jane.doe@example.com"));
}

#[test]
fn test_analysis_with_job_description() {
    let job = "We need Python, AWS and Terraform experience, plus strong communication.";
    let analysis = ResumeAts::new()
        .analyze(&strong_resume(), DocumentFormat::Docx, Some(job))
        .unwrap();
    let job_match = analysis.job_match.as_ref().unwrap();

    assert!(job_match.matched_terms.contains("python"));
    assert!(job_match.matched_terms.contains("aws"));
    assert!(job_match.gap_terms.contains("terraform"));
    assert!(!job_match.gap_terms.contains("communication"));
    assert_eq!(analysis.report.missing_keywords, job_match.gap_terms);
    assert!(job_match.match_percent > 0 && job_match.match_percent < 100);
}

#[test]
fn test_blank_job_description_is_ignored() {
    let analysis = ResumeAts::new()
        .analyze(&strong_resume(), DocumentFormat::Docx, Some("   "))
        .unwrap();
    assert!(analysis.job_match.is_none());
    assert!(analysis.report.missing_keywords.is_empty());
}

#[test]
fn test_pptx_resume() {
    let bytes = pptx(&[
        (
            "Jane Doe",
            &["jane@example.com | +1 555 123 4567", "Backend Engineer"],
        ),
        ("Skills", &["Python, Rust, Docker"]),
    ]);
    let analysis = ResumeAts::new()
        .analyze(&bytes, DocumentFormat::Pptx, None)
        .unwrap();
    assert_eq!(analysis.record.contact.name.as_deref(), Some("Jane Doe"));
    assert!(analysis.record.skills.contains("docker"));
    assert_eq!(analysis.signals.pages, 2);
}

#[test]
fn test_empty_document_warns() {
    let analysis = ResumeAts::new()
        .analyze(&docx(&[]), DocumentFormat::Docx, None)
        .unwrap();
    assert_eq!(analysis.warnings, vec![ExtractionWarning::EmptyDocument]);
    assert!(analysis.record.is_empty());
    assert!(analysis.report.overall_score <= 100);
}

#[test]
fn test_weak_resume_warnings() {
    let analysis = ResumeAts::new()
        .analyze(&weak_resume(), DocumentFormat::Docx, None)
        .unwrap();
    assert!(analysis
        .warnings
        .contains(&ExtractionWarning::NoSectionHeadings));
    assert!(analysis.warnings.contains(&ExtractionWarning::MissingContact));
}

#[test]
fn test_cache_reuses_adapter_output() {
    let cache = Arc::new(BlockCache::new(4));
    let ats = ResumeAts::new().with_shared_cache(Arc::clone(&cache));
    let doc = RawDocument::new(strong_resume(), DocumentFormat::Docx);

    let first = ats.analyze_document(&doc, None).unwrap();
    let second = ats.analyze_document(&doc, Some("Rust")).unwrap();
    assert_eq!(cache.len(), 1);
    assert_eq!(first.record, second.record);

    // Same bytes, different declared format: separate entry, and an error.
    let as_pptx = RawDocument::new(strong_resume(), DocumentFormat::Pptx);
    assert!(ats.analyze_document(&as_pptx, None).is_err());
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_batch_keeps_input_order() {
    let docs = vec![
        RawDocument::new(strong_resume(), DocumentFormat::Docx),
        RawDocument::new(b"not a pdf".to_vec(), DocumentFormat::Pdf),
        RawDocument::new(weak_resume(), DocumentFormat::Docx),
    ];
    let results = ResumeAts::new().analyze_batch(&docs, None);

    assert_eq!(results.len(), 3);
    let strong = results[0].as_ref().unwrap();
    assert_eq!(results[1].as_ref().unwrap_err().kind(), ErrorKind::CorruptDocument);
    let weak = results[2].as_ref().unwrap();
    assert!(strong.report.overall_score > weak.report.overall_score);
}

#[test]
fn test_analyze_file_detects_format() {
    let dir = tempfile::tempdir().unwrap();
    let named = dir.path().join("resume.docx");
    std::fs::write(&named, strong_resume()).unwrap();
    let unnamed = dir.path().join("upload");
    std::fs::write(&unnamed, strong_resume()).unwrap();

    let ats = ResumeAts::new();
    let a = ats.analyze_file(&named, None).unwrap();
    let b = ats.analyze_file(&unnamed, None).unwrap();
    assert_eq!(a.record, b.record);

    let missing = ats.analyze_file(dir.path().join("nope.pdf"), None);
    assert_eq!(missing.unwrap_err().kind(), ErrorKind::Io);
}

#[test]
fn test_legacy_extension_is_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resume.doc");
    std::fs::write(&path, b"\xd0\xcf\x11\xe0legacy").unwrap();
    let err = ResumeAts::new().analyze_file(&path, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
}

#[test]
fn test_custom_rules_change_headings() {
    let rules = RuleSet::from_toml_str(
        r#"
        [headings]
        skills = ["skills", "toolbox"]
        "#,
    )
    .unwrap();
    let bytes = docx(&[
        heading("Jane Doe"),
        para("jane@example.com"),
        heading("Toolbox"),
        para("Rust, Go, Docker"),
    ]);

    let default = ResumeAts::new()
        .analyze(&bytes, DocumentFormat::Docx, None)
        .unwrap();
    assert!(!default.record.has_heading(Section::Skills));

    let custom = ResumeAts::new()
        .with_rules(rules)
        .analyze(&bytes, DocumentFormat::Docx, None)
        .unwrap();
    assert!(custom.record.has_heading(Section::Skills));
    assert!(custom.record.skills.contains("rust"));
}

#[test]
fn test_analysis_serializes() {
    let analysis = ResumeAts::new()
        .analyze(&strong_resume(), DocumentFormat::Docx, Some("Rust"))
        .unwrap();
    let json = render::to_json(&analysis, JsonFormat::Compact).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["record"]["contact"]["name"], "Jane Doe");
    assert!(value["report"]["overall_score"].as_u64().unwrap() <= 100);
    assert!(value["job_match"]["match_percent"].is_u64());
    assert!(value["provenance"].is_object());
}

#[cfg(feature = "async")]
#[tokio::test]
async fn test_analyze_async() {
    let ats = Arc::new(ResumeAts::new());
    let doc = RawDocument::new(strong_resume(), DocumentFormat::Docx);
    let analysis = ats
        .analyze_async(doc, Some("Python".to_string()))
        .await
        .unwrap();
    assert_eq!(analysis.record.contact.name.as_deref(), Some("Jane Doe"));
}

#[test]
fn test_year_list_in_bullet_is_not_a_phone() {
    let bytes = docx(&[
        heading("Jane Doe"),
        para("jane@example.com"),
        heading("Experience"),
        para("Recruiter | Acme Inc | 2018 - 2022"),
        common::bullet("Ran hiring for the 2019 2020 2021 cohorts"),
    ]);
    let analysis = ResumeAts::new()
        .analyze(&bytes, DocumentFormat::Docx, None)
        .unwrap();

    assert_eq!(analysis.record.contact.phone, None);
    assert!(analysis
        .report
        .suggestions
        .contains(&"Add a phone number so recruiters can reach you".to_string()));
}
