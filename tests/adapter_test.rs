//! Integration tests for the format adapters and the registry.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    body, bullet, deck, docx, heading, image_only_pdf, para, pdf, pptx, table, table_slide,
    title,
};
use resume_ats::adapter::{AdapterRegistry, ExtractOptions, FormatAdapter};
use resume_ats::error::Result;
use resume_ats::{
    AdapterOutput, DocumentFormat, Error, ErrorKind, RawDocument, ResumeAts, StyleHint,
    TextBlock,
};

/// Adapter returning fixed blocks after an optional delay.
struct MockAdapter {
    blocks: Vec<TextBlock>,
    delay: Duration,
}

impl MockAdapter {
    fn new(blocks: Vec<TextBlock>) -> Self {
        Self {
            blocks,
            delay: Duration::ZERO,
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            blocks: vec![TextBlock::new("late", 1, 0)],
            delay,
        }
    }
}

impl FormatAdapter for MockAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn extract(&self, _doc: &RawDocument, _options: &ExtractOptions) -> Result<AdapterOutput> {
        std::thread::sleep(self.delay);
        Ok(AdapterOutput {
            blocks: self.blocks.clone(),
            signals: Default::default(),
        })
    }
}

fn extract(bytes: Vec<u8>, format: DocumentFormat) -> Result<AdapterOutput> {
    let registry = AdapterRegistry::with_defaults();
    registry.extract(&RawDocument::new(bytes, format), &ExtractOptions::default())
}

fn assert_strictly_increasing(output: &AdapterOutput) {
    assert!(output
        .blocks
        .windows(2)
        .all(|w| w[0].order_index < w[1].order_index));
}

#[test]
fn test_registry_defaults() {
    let registry = AdapterRegistry::with_defaults();
    assert_eq!(
        registry.formats(),
        vec![DocumentFormat::Pdf, DocumentFormat::Docx, DocumentFormat::Pptx]
    );
    assert_eq!(registry.get(DocumentFormat::Docx).unwrap().name(), "docx");
}

#[test]
fn test_unregistered_format() {
    let registry = AdapterRegistry::new();
    let doc = RawDocument::new(b"%PDF-1.4".to_vec(), DocumentFormat::Pdf);
    let err = registry
        .extract(&doc, &ExtractOptions::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
}

#[test]
fn test_pdf_blocks_in_reading_order() {
    let bytes = pdf(&[vec![
        title("Jane Doe"),
        body("jane@example.com | +1 555 123 4567"),
        title("SKILLS"),
        body("Python, Rust, Docker"),
        title("EXPERIENCE"),
        body("Senior Engineer | Acme Inc | 2019 - 2023"),
    ]]);
    let output = extract(bytes, DocumentFormat::Pdf).unwrap();

    assert_eq!(output.signals.pages, 1);
    assert!(!output.blocks.is_empty());
    assert_strictly_increasing(&output);

    let text: Vec<&str> = output.blocks.iter().map(|b| b.text.as_str()).collect();
    let all = text.join("\n");
    let name = all.find("Jane Doe").unwrap();
    let skills = all.find("Python, Rust, Docker").unwrap();
    let role = all.find("Senior Engineer").unwrap();
    assert!(name < skills && skills < role);
    assert!(output.blocks.iter().all(|b| b.page == 1));
}

#[test]
fn test_pdf_pages_are_numbered() {
    let bytes = pdf(&[
        vec![title("Jane Doe"), body("First page content")],
        vec![body("Second page content")],
    ]);
    let output = extract(bytes, DocumentFormat::Pdf).unwrap();
    assert_eq!(output.signals.pages, 2);
    assert_eq!(output.blocks.last().unwrap().page, 2);
    assert_strictly_increasing(&output);
}

#[test]
fn test_empty_pdf_page_yields_no_blocks() {
    let output = extract(pdf(&[vec![]]), DocumentFormat::Pdf).unwrap();
    assert!(output.blocks.is_empty());
    assert_eq!(output.signals.pages, 1);
}

#[test]
fn test_image_only_pdf_has_no_text() {
    let err = extract(image_only_pdf(), DocumentFormat::Pdf).unwrap_err();
    assert!(matches!(err, Error::NoExtractableText { pages: 1 }));
    assert_eq!(err.kind(), ErrorKind::NoExtractableText);
    assert!(err.is_input_error());
}

#[test]
fn test_far_translated_text_is_read() {
    let bytes = pdf(&[vec![
        title("Jane Doe"),
        body("jane@example.com"),
        body("off the page").at(3.0e11),
    ]]);
    let output = extract(bytes, DocumentFormat::Pdf).unwrap();
    assert!(!output.signals.multi_column);
    let all: Vec<&str> = output.blocks.iter().map(|b| b.text.as_str()).collect();
    assert!(all.join("\n").contains("off the page"));
}

#[test]
fn test_rating_line_survives_page_number_filter() {
    let bytes = pdf(&[vec![title("Languages"), body("German"), body("9/10")]]);
    let output = extract(bytes, DocumentFormat::Pdf).unwrap();
    let all: Vec<&str> = output.blocks.iter().map(|b| b.text.as_str()).collect();
    assert!(all.join("\n").contains("9/10"));
}

#[test]
fn test_malformed_pdf_is_corrupt() {
    let err = extract(b"%PDF-1.7\nthis is not a pdf body".to_vec(), DocumentFormat::Pdf)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptDocument);
    assert!(err.is_input_error());
}

#[test]
fn test_docx_blocks_and_hints() {
    let bytes = docx(&[
        heading("Skills"),
        para("Python, Rust"),
        String::from("<w:p/>"),
        bullet("Cut latency by 40%"),
        table("inside a table"),
    ]);
    let output = extract(bytes, DocumentFormat::Docx).unwrap();

    assert_strictly_increasing(&output);
    assert_eq!(output.blocks[0].text, "Skills");
    assert!(output.blocks[0].has_hint(StyleHint::Bold));
    assert!(output.blocks[0].has_hint(StyleHint::HeadingLike));
    assert!(output.blocks[2].has_hint(StyleHint::Bullet));
    // The empty paragraph leaves a gap in the order.
    assert!(output.blocks[2].order_index > output.blocks[1].order_index + 1);
    assert_eq!(output.signals.tables, 1);
}

#[test]
fn test_empty_docx_yields_no_blocks() {
    let output = extract(docx(&[]), DocumentFormat::Docx).unwrap();
    assert!(output.blocks.is_empty());
}

#[test]
fn test_docx_without_document_part_is_corrupt() {
    let bytes = common::package(&[("word/styles.xml", String::from("<w:styles/>"))]);
    let err = extract(bytes, DocumentFormat::Docx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptDocument);
}

#[test]
fn test_pptx_slides_in_order() {
    let bytes = pptx(&[
        ("Jane Doe", &["jane@example.com", "Backend Engineer"]),
        ("Skills", &["Python, Rust"]),
    ]);
    let output = extract(bytes, DocumentFormat::Pptx).unwrap();

    assert_eq!(output.signals.pages, 2);
    assert_strictly_increasing(&output);
    let texts: Vec<&str> = output.blocks.iter().map(|b| b.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["Jane Doe", "jane@example.com", "Backend Engineer", "Skills", "Python, Rust"]
    );
    assert!(output.blocks[3].has_hint(StyleHint::HeadingLike));
    assert_eq!(output.blocks[3].page, 2);
}

#[test]
fn test_empty_pptx_yields_no_blocks() {
    let output = extract(deck(&[]), DocumentFormat::Pptx).unwrap();
    assert!(output.blocks.is_empty());
    assert_eq!(output.signals.pages, 0);
}

#[test]
fn test_pptx_table_cells_are_blocks() {
    let bytes = deck(&[table_slide(
        "Skills",
        &[&["Languages", "Python, Rust"], &["Platforms", "Kubernetes, AWS"]],
    )]);
    let output = extract(bytes, DocumentFormat::Pptx).unwrap();

    assert_eq!(output.signals.tables, 1);
    assert_strictly_increasing(&output);
    let texts: Vec<&str> = output.blocks.iter().map(|b| b.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["Skills", "Languages", "Python, Rust", "Platforms", "Kubernetes, AWS"]
    );
}

#[test]
fn test_declared_format_mismatch() {
    // A DOCX package declared as a presentation has no presentation part.
    let err = extract(docx(&[para("hello")]), DocumentFormat::Pptx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptDocument);

    let err = extract(docx(&[para("hello")]), DocumentFormat::Pdf).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptDocument);
}

#[test]
fn test_timeout_is_enforced() {
    let registry = {
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(MockAdapter::slow(Duration::from_millis(500))));
        registry
    };
    let options = ExtractOptions::default().with_timeout(Duration::from_millis(20));
    let doc = RawDocument::new(b"%PDF-1.4".to_vec(), DocumentFormat::Pdf);

    let err = registry.extract(&doc, &options).unwrap_err();
    assert!(matches!(err, Error::ExtractionTimeout { limit_ms: 20 }));
}

#[test]
fn test_order_violation_is_rejected() {
    let ats = ResumeAts::new().register_adapter(Arc::new(MockAdapter::new(vec![
        TextBlock::new("Jane Doe", 1, 3),
        TextBlock::new("Skills", 1, 3),
    ])));
    let err = ats
        .analyze(b"%PDF-1.4", DocumentFormat::Pdf, None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    assert!(!err.is_input_error());
}

#[test]
fn test_custom_adapter_feeds_pipeline() {
    let ats = ResumeAts::new().register_adapter(Arc::new(MockAdapter::new(vec![
        TextBlock::new("Jane Doe", 1, 0),
        TextBlock::new("jane@example.com", 1, 1),
        TextBlock::new("Skills", 1, 2).with_hint(StyleHint::HeadingLike),
        TextBlock::new("Rust, Go", 1, 3),
    ])));
    let analysis = ats.analyze(b"ignored", DocumentFormat::Pdf, None).unwrap();
    assert_eq!(analysis.record.contact.name.as_deref(), Some("Jane Doe"));
    assert_eq!(analysis.record.skills_display, vec!["Rust", "Go"]);
}
