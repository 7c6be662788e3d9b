//! Benchmarks for the analysis pipeline.
//!
//! Run with: cargo bench
//!
//! These benchmarks use a synthetic DOCX résumé built in memory.

use std::io::{Cursor, Write};

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use resume_ats::{DocumentFormat, RawDocument, ResumeAts, RuleSet};

fn paragraph(text: &str, bold: bool, bullet: bool) -> String {
    let ppr = if bullet {
        "<w:pPr><w:numPr><w:ilvl w:val=\"0\"/><w:numId w:val=\"1\"/></w:numPr></w:pPr>"
    } else {
        ""
    };
    let rpr = if bold { "<w:rPr><w:b/></w:rPr>" } else { "" };
    format!("<w:p>{}<w:r>{}<w:t>{}</w:t></w:r></w:p>", ppr, rpr, text)
}

/// Creates a DOCX résumé with the given number of roles.
fn create_test_docx(roles: usize) -> Vec<u8> {
    let mut body = String::new();
    body.push_str(&paragraph("Jane Doe", true, false));
    body.push_str(&paragraph(
        "jane@example.com | +1 555 123 4567 | github.com/janedoe",
        false,
        false,
    ));
    body.push_str(&paragraph("Skills", true, false));
    body.push_str(&paragraph(
        "Python, Rust, Go, Docker, Kubernetes, AWS, PostgreSQL",
        false,
        false,
    ));
    body.push_str(&paragraph("Experience", true, false));
    for i in 0..roles {
        let year = 2023 - i;
        body.push_str(&paragraph(
            &format!("Senior Engineer | Company {} Inc | {} - {}", i, year - 1, year),
            false,
            false,
        ));
        body.push_str(&paragraph("Cut API latency by 40% across 12 services", false, true));
        body.push_str(&paragraph("Led a team of 5 engineers", false, true));
    }
    body.push_str(&paragraph("Education", true, false));
    body.push_str(&paragraph("B.S. in Computer Science, State University, 2012", false, false));

    let document = format!(
        "<w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
        body
    );
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .unwrap();
    zip.write_all(document.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

/// Benchmark format sniffing.
fn bench_format_detection(c: &mut Criterion) {
    let docx = create_test_docx(1);

    c.bench_function("sniff_docx", |b| {
        b.iter(|| resume_ats::sniff_format(black_box(&docx)).unwrap());
    });
}

/// Benchmark the whole pipeline at various sizes.
fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_docx");
    let ats = ResumeAts::new();

    for roles in [1, 5, 20].iter() {
        let data = create_test_docx(*roles);

        group.bench_function(format!("{}_roles", roles), |b| {
            b.iter(|| {
                let _ = ats.analyze(
                    black_box(&data),
                    DocumentFormat::Docx,
                    Some("Python, AWS, Terraform, communication"),
                );
            });
        });
    }

    group.finish();
}

/// Benchmark cached re-analysis against a new job description.
fn bench_cached(c: &mut Criterion) {
    let ats = ResumeAts::new().with_cache(8);
    let doc = RawDocument::new(create_test_docx(5), DocumentFormat::Docx);
    let _ = ats.analyze_document(&doc, None);

    c.bench_function("analyze_cached", |b| {
        b.iter(|| {
            let _ = ats.analyze_document(black_box(&doc), Some("Rust and Kubernetes"));
        });
    });
}

/// Benchmark loading rule tables.
fn bench_rules(c: &mut Criterion) {
    let overlay = "[skills.synonyms]\n\"rustlang\" = \"rust\"\n";

    c.bench_function("rules_overlay", |b| {
        b.iter(|| RuleSet::from_toml_str(black_box(overlay)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_format_detection,
    bench_analyze,
    bench_cached,
    bench_rules,
);
criterion_main!(benches);
