//! Builders for in-memory PDF, DOCX and PPTX fixtures.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// One line of text on a PDF page.
pub struct PdfLine {
    pub text: &'static str,
    pub size: f32,
    pub bold: bool,
    pub x: f32,
}

impl PdfLine {
    /// Move the line's left edge.
    pub fn at(mut self, x: f32) -> Self {
        self.x = x;
        self
    }
}

pub fn body(text: &'static str) -> PdfLine {
    PdfLine {
        text,
        size: 11.0,
        bold: false,
        x: 72.0,
    }
}

pub fn title(text: &'static str) -> PdfLine {
    PdfLine {
        text,
        size: 15.0,
        bold: true,
        x: 72.0,
    }
}

/// Build a PDF with one page per entry of `pages`, lines laid out top-down
/// in a single column.
pub fn pdf(pages: &[Vec<PdfLine>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        let mut y = 740.0f32;
        for line in lines {
            if line.bold {
                y -= line.size;
            }
            let font = if line.bold { "F2" } else { "F1" };
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec![font.into(), line.size.into()]));
            operations.push(Operation::new("Td", vec![line.x.into(), y.into()]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(line.text)],
            ));
            operations.push(Operation::new("ET", vec![]));
            y -= line.size * 1.4;
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! {
                "Font" => dictionary! {
                    "F1" => regular,
                    "F2" => bold,
                },
            },
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Build a one-page PDF whose page only paints an image.
pub fn image_only_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 1,
            "Height" => 1,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        vec![0u8],
    ));
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![400.into(), 0.into(), 0.into(), 500.into(), 100.into(), 200.into()],
            ),
            Operation::new("Do", vec!["Im1".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Im1" => image_id,
            },
        },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Zip the given parts into an OOXML package.
pub fn package(parts: &[(&str, String)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in parts {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Paragraph XML for a DOCX body.
pub fn para(text: &str) -> String {
    format!(
        "<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
        escape(text)
    )
}

/// Bold, large paragraph as a heading would be typed.
pub fn heading(text: &str) -> String {
    format!(
        "<w:p><w:r><w:rPr><w:b/><w:sz w:val=\"28\"/></w:rPr><w:t>{}</w:t></w:r></w:p>",
        escape(text)
    )
}

/// Numbered list paragraph.
pub fn bullet(text: &str) -> String {
    format!(
        "<w:p><w:pPr><w:numPr><w:ilvl w:val=\"0\"/><w:numId w:val=\"1\"/></w:numPr></w:pPr>\
         <w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
        escape(text)
    )
}

/// Single-cell table around `text`.
pub fn table(text: &str) -> String {
    format!("<w:tbl><w:tr><w:tc>{}</w:tc></w:tr></w:tbl>", para(text))
}

/// Build a DOCX from body paragraphs.
pub fn docx(paragraphs: &[String]) -> Vec<u8> {
    let document = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{}</w:body></w:document>",
        paragraphs.concat()
    );
    package(&[
        ("[Content_Types].xml", content_types("word/document.xml")),
        ("word/document.xml", document),
    ])
}

/// Build a PPTX with one slide per entry: a title and body paragraphs.
pub fn pptx(slides: &[(&str, &[&str])]) -> Vec<u8> {
    let trees: Vec<String> = slides
        .iter()
        .map(|(title, lines)| {
            let body: String = lines.iter().map(|l| slide_paragraph(l)).collect();
            format!("{}{}", shape(true, &slide_paragraph(title)), shape(false, &body))
        })
        .collect();
    deck(&trees)
}

/// Shape tree of a slide with a title and a table, one `&[&str]` per row.
pub fn table_slide(title: &str, rows: &[&[&str]]) -> String {
    let rows: String = rows
        .iter()
        .map(|cells| {
            let cells: String = cells
                .iter()
                .map(|c| {
                    format!(
                        "<a:tc><a:txBody><a:bodyPr/>{}</a:txBody></a:tc>",
                        slide_paragraph(c)
                    )
                })
                .collect();
            format!("<a:tr h=\"370840\">{}</a:tr>", cells)
        })
        .collect();
    format!(
        "{}<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id=\"4\" name=\"Table\"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr>\
         <a:graphic><a:graphicData uri=\"http://schemas.openxmlformats.org/drawingml/2006/table\"><a:tbl>{}</a:tbl></a:graphicData></a:graphic></p:graphicFrame>",
        shape(true, &slide_paragraph(title)),
        rows
    )
}

/// Build a PPTX from raw slide shape trees, in order.
pub fn deck(trees: &[String]) -> Vec<u8> {
    let mut ids = String::new();
    let mut rels = String::new();
    let mut slide_parts = Vec::new();

    for (i, tree) in trees.iter().enumerate() {
        let n = i + 1;
        ids.push_str(&format!("<p:sldId id=\"{}\" r:id=\"rId{}\"/>", 255 + n, n));
        rels.push_str(&format!(
            "<Relationship Id=\"rId{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide\" Target=\"slides/slide{}.xml\"/>",
            n, n
        ));
        let xml = format!(
            "<p:sld xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" \
             xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\"><p:cSld><p:spTree>\
             {}</p:spTree></p:cSld></p:sld>",
            tree
        );
        slide_parts.push((format!("ppt/slides/slide{}.xml", n), xml));
    }

    let mut parts: Vec<(&str, String)> = vec![
        ("[Content_Types].xml", content_types("ppt/presentation.xml")),
        (
            "ppt/presentation.xml",
            format!(
                "<p:presentation xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\" \
                 xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
                 <p:sldIdLst>{}</p:sldIdLst></p:presentation>",
                ids
            ),
        ),
        (
            "ppt/_rels/presentation.xml.rels",
            format!(
                "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">{}</Relationships>",
                rels
            ),
        ),
    ];
    for (name, xml) in &slide_parts {
        parts.push((name.as_str(), xml.clone()));
    }
    package(&parts)
}

fn slide_paragraph(text: &str) -> String {
    format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", escape(text))
}

fn shape(title: bool, paragraphs: &str) -> String {
    let ph = if title { "<p:ph type=\"title\"/>" } else { "" };
    format!(
        "<p:sp><p:nvSpPr><p:cNvPr id=\"1\" name=\"shape\"/><p:cNvSpPr/><p:nvPr>{}</p:nvPr></p:nvSpPr>\
         <p:txBody>{}</p:txBody></p:sp>",
        ph, paragraphs
    )
}

fn content_types(main: &str) -> String {
    format!(
        "<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
         <Override PartName=\"/{}\" ContentType=\"application/xml\"/></Types>",
        main
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// A well-formed résumé: contact block, standard sections in order,
/// quantified bullets and dated roles.
pub fn strong_resume() -> Vec<u8> {
    docx(&[
        heading("Jane Doe"),
        para("Senior Backend Engineer"),
        para("jane.doe@example.com | +1 555 123 4567 | Austin, TX | linkedin.com/in/janedoe"),
        heading("Summary"),
        para("Backend engineer with eight years building data platforms."),
        heading("Skills"),
        para("Python, Rust, Go, Docker, Kubernetes, AWS, PostgreSQL"),
        heading("Experience"),
        para("Senior Engineer | Acme Inc | Jan 2020 - Present"),
        bullet("Cut API latency by 40% across 12 services"),
        bullet("Led a team of 5 engineers through a platform migration"),
        bullet("Reduced cloud spend by $200K per year"),
        para("Software Engineer | Globex Corp | Jun 2016 - Dec 2019"),
        bullet("Built ingestion pipelines processing 2M events per day"),
        bullet("Migrated 30 services to Kubernetes"),
        heading("Education"),
        para("B.S. in Computer Science, State University, 2016"),
    ])
}

/// A résumé with no headings, no contact details and no metrics.
pub fn weak_resume() -> Vec<u8> {
    docx(&[
        para("John Smith"),
        para("I have worked on many different projects over the years and enjoy computers."),
        para("Looking for a new opportunity where I can grow and learn new things."),
    ])
}
