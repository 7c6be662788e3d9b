//! PPTX adapter.
//!
//! Slides are read in presentation order. Within a slide, title placeholders
//! come first and the remaining shapes follow in z-order.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::ooxml::{
    attr, dominant_size, is_on, open_package, parse_relationships, read_part, require_part,
    resolve_target, text_of,
};
use super::options::ExtractOptions;
use super::{ensure_supported, FormatAdapter};
use crate::detect::DocumentFormat;
use crate::error::Result;
use crate::model::{AdapterOutput, LayoutSignals, RawDocument, StyleHint, TextBlock};

/// Default run size in hundredths of a point.
const DEFAULT_CENTI_POINTS: u32 = 1800;

/// Reads text shapes from PresentationML decks.
#[derive(Debug, Clone, Default)]
pub struct PptxAdapter;

impl PptxAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl FormatAdapter for PptxAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pptx
    }

    fn name(&self) -> &str {
        "pptx"
    }

    fn extract(&self, doc: &RawDocument, options: &ExtractOptions) -> Result<AdapterOutput> {
        ensure_supported(self, doc)?;
        let mut archive = open_package(doc.bytes())?;
        let presentation = require_part(&mut archive, "ppt/presentation.xml")?;
        let rels = match read_part(&mut archive, "ppt/_rels/presentation.xml.rels")? {
            Some(xml) => parse_relationships(&xml)?,
            None => HashMap::new(),
        };

        let slide_paths = slide_order(&presentation, &rels)?;
        let mut signals = LayoutSignals::default();
        let mut slides = Vec::new();

        for (i, path) in slide_paths.iter().enumerate() {
            let number = i as u32 + 1;
            if !options.includes_page(number) {
                continue;
            }
            options.check_deadline()?;
            let Some(xml) = read_part(&mut archive, path)? else {
                log::warn!("slide part '{}' is missing", path);
                continue;
            };
            let slide = parse_slide(&xml, number)?;
            signals.absorb(&slide.signals);
            slides.push(slide);
        }
        signals.pages = slide_paths.len() as u32;

        let mut histogram = HashMap::new();
        for para in slides.iter().flat_map(|s| &s.shapes).flat_map(|s| &s.paragraphs) {
            *histogram
                .entry(para.size.unwrap_or(DEFAULT_CENTI_POINTS))
                .or_insert(0) += para.chars;
        }
        let body = dominant_size(&histogram).unwrap_or(DEFAULT_CENTI_POINTS);

        let mut blocks = Vec::new();
        let mut order = 0u32;
        for slide in slides {
            let mut shapes = slide.shapes;
            shapes.sort_by_key(|s| !s.title);
            for shape in shapes {
                for para in shape.paragraphs {
                    let index = order;
                    order += 1;
                    if para.text.trim().is_empty() {
                        continue;
                    }
                    let large = para.size.is_some_and(|s| s >= body + 200);
                    let bold = para.chars > 0 && para.bold_chars * 2 > para.chars;
                    let words = para.text.split_whitespace().count();

                    let mut block = TextBlock::new(para.text, slide.number, index);
                    if bold {
                        block.style_hints.insert(StyleHint::Bold);
                    }
                    if large {
                        block.style_hints.insert(StyleHint::LargeFont);
                    }
                    if shape.title || (words <= 6 && (large || bold)) {
                        block.style_hints.insert(StyleHint::HeadingLike);
                    }
                    if para.bullet {
                        block.style_hints.insert(StyleHint::Bullet);
                    }
                    blocks.push(block);
                }
            }
        }

        Ok(AdapterOutput { blocks, signals })
    }
}

/// Slide part paths in presentation order.
fn slide_order(presentation: &str, rels: &HashMap<String, String>) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(presentation);
    let mut paths = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"p:sldId" => {
                let target = attr(&e, b"r:id").and_then(|id| rels.get(&id));
                match target {
                    Some(target) => paths.push(resolve_target("ppt", target)),
                    None => log::warn!("slide entry without a resolvable relationship"),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(paths)
}

#[derive(Debug, Default)]
struct SlideParagraph {
    text: String,
    bullet: bool,
    size: Option<u32>,
    chars: usize,
    bold_chars: usize,
}

#[derive(Debug, Default)]
struct Shape {
    title: bool,
    paragraphs: Vec<SlideParagraph>,
}

#[derive(Debug)]
struct Slide {
    number: u32,
    shapes: Vec<Shape>,
    signals: LayoutSignals,
}

fn parse_slide(xml: &str, number: u32) -> Result<Slide> {
    let mut reader = Reader::from_str(xml);
    let mut slide = Slide {
        number,
        shapes: Vec::new(),
        signals: LayoutSignals::default(),
    };

    let mut shape: Option<Shape> = None;
    let mut para: Option<SlideParagraph> = None;
    let mut run_bold = false;
    let mut run_size: Option<u32> = None;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"p:sp" | b"p:graphicFrame" => shape = Some(Shape::default()),
                b"a:p" => para = Some(SlideParagraph::default()),
                b"a:r" => {
                    run_bold = false;
                    run_size = None;
                }
                b"a:rPr" => {
                    run_bold = is_bold(&e);
                    run_size = attr(&e, b"sz").and_then(|v| v.parse().ok());
                }
                b"a:t" => in_text = true,
                b"a:tbl" => slide.signals.tables += 1,
                b"p:pic" => slide.signals.images += 1,
                b"p:cNvSpPr" if is_text_box(&e) => slide.signals.text_boxes += 1,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"p:ph" => {
                    let kind = attr(&e, b"type");
                    if matches!(kind.as_deref(), Some("title") | Some("ctrTitle")) {
                        if let Some(s) = shape.as_mut() {
                            s.title = true;
                        }
                    }
                }
                b"p:cNvSpPr" if is_text_box(&e) => slide.signals.text_boxes += 1,
                b"a:rPr" => {
                    run_bold = is_bold(&e);
                    run_size = attr(&e, b"sz").and_then(|v| v.parse().ok());
                }
                b"a:buChar" | b"a:buAutoNum" => {
                    if let Some(p) = para.as_mut() {
                        p.bullet = true;
                    }
                }
                b"a:buNone" => {
                    if let Some(p) = para.as_mut() {
                        p.bullet = false;
                    }
                }
                b"a:br" => {
                    if let Some(p) = para.as_mut() {
                        p.text.push('\n');
                    }
                }
                b"a:p" => {
                    if let Some(s) = shape.as_mut() {
                        s.paragraphs.push(SlideParagraph::default());
                    }
                }
                b"p:pic" => slide.signals.images += 1,
                _ => {}
            },
            Event::Text(t) if in_text => {
                if let Some(p) = para.as_mut() {
                    let text = text_of(&t);
                    let chars = text.chars().filter(|c| !c.is_whitespace()).count();
                    p.chars += chars;
                    if run_bold {
                        p.bold_chars += chars;
                    }
                    if let Some(size) = run_size {
                        p.size = Some(p.size.map_or(size, |m| m.max(size)));
                    }
                    p.text.push_str(&text);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"a:t" => in_text = false,
                b"a:p" => {
                    if let (Some(p), Some(s)) = (para.take(), shape.as_mut()) {
                        s.paragraphs.push(p);
                    }
                }
                b"p:sp" | b"p:graphicFrame" => {
                    if let Some(s) = shape.take() {
                        slide.shapes.push(s);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(slide)
}

fn is_bold(e: &BytesStart<'_>) -> bool {
    attr(e, b"b").is_some_and(|v| is_on(Some(&v)))
}

fn is_text_box(e: &BytesStart<'_>) -> bool {
    attr(e, b"txBox").is_some_and(|v| is_on(Some(&v)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(body: &str) -> String {
        format!(
            r#"<p:sld xmlns:p="p" xmlns:a="a"><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sld>"#,
            body
        )
    }

    fn text_shape(title: bool, paragraphs: &str) -> String {
        let ph = if title { r#"<p:ph type="title"/>"# } else { "" };
        format!(
            "<p:sp><p:nvSpPr><p:cNvPr id=\"1\" name=\"s\"/><p:cNvSpPr/><p:nvPr>{}</p:nvPr></p:nvSpPr><p:txBody>{}</p:txBody></p:sp>",
            ph, paragraphs
        )
    }

    #[test]
    fn test_parse_slide_paragraphs() {
        let xml = slide(&text_shape(
            false,
            "<a:p><a:pPr><a:buChar char=\"•\"/></a:pPr><a:r><a:rPr lang=\"en\"/><a:t>Led migration</a:t></a:r></a:p>\
             <a:p><a:r><a:t>Plain</a:t></a:r></a:p>",
        ));
        let parsed = parse_slide(&xml, 1).unwrap();
        let paragraphs = &parsed.shapes[0].paragraphs;
        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs[0].bullet);
        assert_eq!(paragraphs[0].text, "Led migration");
        assert!(!paragraphs[1].bullet);
    }

    #[test]
    fn test_title_placeholder() {
        let xml = slide(&format!(
            "{}{}",
            text_shape(false, "<a:p><a:r><a:t>Body</a:t></a:r></a:p>"),
            text_shape(true, "<a:p><a:r><a:t>Jane Doe</a:t></a:r></a:p>")
        ));
        let parsed = parse_slide(&xml, 1).unwrap();
        assert!(!parsed.shapes[0].title);
        assert!(parsed.shapes[1].title);
    }

    #[test]
    fn test_bold_and_size() {
        let xml = slide(&text_shape(
            false,
            "<a:p><a:r><a:rPr b=\"1\" sz=\"2800\"/><a:t>Skills</a:t></a:r></a:p>",
        ));
        let parsed = parse_slide(&xml, 1).unwrap();
        let para = &parsed.shapes[0].paragraphs[0];
        assert_eq!(para.size, Some(2800));
        assert_eq!(para.bold_chars, para.chars);
    }

    #[test]
    fn test_signals() {
        let xml = slide(
            "<p:sp><p:nvSpPr><p:cNvSpPr txBox=\"1\"/></p:nvSpPr></p:sp>\
             <p:graphicFrame><a:graphic><a:graphicData><a:tbl></a:tbl></a:graphicData></a:graphic></p:graphicFrame>\
             <p:pic><p:blipFill/></p:pic>",
        );
        let parsed = parse_slide(&xml, 1).unwrap();
        assert_eq!(parsed.signals.text_boxes, 1);
        assert_eq!(parsed.signals.tables, 1);
        assert_eq!(parsed.signals.images, 1);
    }

    #[test]
    fn test_table_cells_become_paragraphs() {
        let cell = |text: &str| {
            format!(
                "<a:tc><a:txBody><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></a:txBody></a:tc>",
                text
            )
        };
        let xml = slide(&format!(
            "<p:graphicFrame><a:graphic><a:graphicData><a:tbl><a:tr>{}{}</a:tr></a:tbl></a:graphicData></a:graphic></p:graphicFrame>",
            cell("Languages"),
            cell("Python, Rust, Kubernetes")
        ));
        let parsed = parse_slide(&xml, 1).unwrap();
        assert_eq!(parsed.signals.tables, 1);
        let texts: Vec<&str> = parsed
            .shapes
            .iter()
            .flat_map(|s| &s.paragraphs)
            .map(|p| p.text.as_str())
            .collect();
        assert_eq!(texts, vec!["Languages", "Python, Rust, Kubernetes"]);
    }

    #[test]
    fn test_slide_order_follows_presentation() {
        let presentation = r#"<p:presentation xmlns:p="p" xmlns:r="r"><p:sldIdLst><p:sldId id="257" r:id="rId3"/><p:sldId id="256" r:id="rId2"/></p:sldIdLst></p:presentation>"#;
        let mut rels = HashMap::new();
        rels.insert("rId2".to_string(), "slides/slide1.xml".to_string());
        rels.insert("rId3".to_string(), "slides/slide2.xml".to_string());
        let order = slide_order(presentation, &rels).unwrap();
        assert_eq!(order, vec!["ppt/slides/slide2.xml", "ppt/slides/slide1.xml"]);
    }
}
