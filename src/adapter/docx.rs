//! DOCX adapter.
//!
//! Paragraphs are emitted in document order. Every paragraph, empty or not,
//! consumes an `order_index`, so a gap between consecutive blocks marks a
//! blank paragraph.

use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use super::ooxml::{attr, dominant_size, is_on, open_package, read_part, require_part, text_of};
use super::options::ExtractOptions;
use super::{ensure_supported, FormatAdapter};
use crate::detect::DocumentFormat;
use crate::error::Result;
use crate::model::{AdapterOutput, LayoutSignals, RawDocument, StyleHint, TextBlock};

/// Default run size in half-points when the document never sets one.
const DEFAULT_HALF_POINTS: u32 = 22;

/// Reads paragraphs from WordprocessingML documents.
#[derive(Debug, Clone, Default)]
pub struct DocxAdapter;

impl DocxAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl FormatAdapter for DocxAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Docx
    }

    fn name(&self) -> &str {
        "docx"
    }

    fn extract(&self, doc: &RawDocument, options: &ExtractOptions) -> Result<AdapterOutput> {
        ensure_supported(self, doc)?;
        let mut archive = open_package(doc.bytes())?;
        let document = require_part(&mut archive, "word/document.xml")?;
        let styles = match read_part(&mut archive, "word/styles.xml")? {
            Some(xml) => parse_styles(&xml)?,
            None => HashMap::new(),
        };
        options.check_deadline()?;

        let parsed = parse_document(&document, &styles)?;
        Ok(parsed.into_output(&styles, options))
    }
}

/// Formatting facts of a paragraph style.
#[derive(Debug, Clone, Default)]
struct StyleInfo {
    heading: bool,
    list: bool,
    bold: bool,
    size: Option<u32>,
}

fn parse_styles(xml: &str) -> Result<HashMap<String, StyleInfo>> {
    let mut reader = Reader::from_str(xml);
    let mut styles = HashMap::new();
    let mut current: Option<(String, StyleInfo)> = None;
    let mut in_rpr = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:style" => {
                current = attr(&e, b"w:styleId").map(|id| {
                    let info = StyleInfo {
                        heading: is_heading_style(&id),
                        list: id.to_lowercase().starts_with("list"),
                        ..Default::default()
                    };
                    (id, info)
                });
            }
            Event::Start(e) if e.name().as_ref() == b"w:rPr" => in_rpr = true,
            Event::End(e) if e.name().as_ref() == b"w:rPr" => in_rpr = false,
            Event::Empty(e) => {
                if let Some((_, info)) = current.as_mut() {
                    match e.name().as_ref() {
                        b"w:name" => {
                            if let Some(name) = attr(&e, b"w:val") {
                                info.heading |= is_heading_style(&name);
                                info.list |= name.to_lowercase().starts_with("list");
                            }
                        }
                        b"w:b" if in_rpr => info.bold = is_on(attr(&e, b"w:val").as_deref()),
                        b"w:sz" if in_rpr => {
                            info.size = attr(&e, b"w:val").and_then(|v| v.parse().ok())
                        }
                        _ => {}
                    }
                }
            }
            Event::End(e) if e.name().as_ref() == b"w:style" => {
                if let Some((id, info)) = current.take() {
                    styles.insert(id, info);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(styles)
}

fn is_heading_style(name: &str) -> bool {
    let name = name.to_lowercase().replace(' ', "");
    name.starts_with("heading") || name == "title" || name == "subtitle"
}

/// A paragraph under construction.
#[derive(Debug, Clone)]
struct Paragraph {
    text: String,
    style: Option<String>,
    numbered: bool,
    bold_chars: usize,
    total_chars: usize,
    max_size: Option<u32>,
    page: u32,
    order: u32,
}

impl Paragraph {
    fn new(page: u32, order: u32) -> Self {
        Self {
            text: String::new(),
            style: None,
            numbered: false,
            bold_chars: 0,
            total_chars: 0,
            max_size: None,
            page,
            order,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct RunProps {
    bold: Option<bool>,
    size: Option<u32>,
}

#[derive(Debug, Default)]
struct ParsedDocument {
    paragraphs: Vec<Paragraph>,
    size_histogram: HashMap<u32, usize>,
    signals: LayoutSignals,
}

impl ParsedDocument {
    fn into_output(
        mut self,
        styles: &HashMap<String, StyleInfo>,
        options: &ExtractOptions,
    ) -> AdapterOutput {
        let body = dominant_size(&self.size_histogram).unwrap_or(DEFAULT_HALF_POINTS);
        // Textbox paragraphs close before their host paragraph.
        self.paragraphs.sort_by_key(|p| p.order);

        let blocks = self
            .paragraphs
            .into_iter()
            .filter(|p| options.includes_page(p.page) && !p.text.trim().is_empty())
            .map(|p| {
                let style = p.style.as_ref().and_then(|s| styles.get(s));
                let words = p.text.split_whitespace().count();
                let bold = p.total_chars > 0 && p.bold_chars * 2 > p.total_chars;
                let size = p.max_size.or(style.and_then(|s| s.size));
                let large = size.is_some_and(|s| s >= body + 4);

                let mut block = TextBlock::new(p.text, p.page, p.order);
                if bold {
                    block.style_hints.insert(StyleHint::Bold);
                }
                if large {
                    block.style_hints.insert(StyleHint::LargeFont);
                }
                let heading_style = style.is_some_and(|s| s.heading);
                let single_line = !block.text.contains('\n');
                if heading_style || (single_line && words <= 6 && (large || bold)) {
                    block.style_hints.insert(StyleHint::HeadingLike);
                }
                if p.numbered || style.is_some_and(|s| s.list) {
                    block.style_hints.insert(StyleHint::Bullet);
                }
                block
            })
            .collect();

        AdapterOutput {
            blocks,
            signals: self.signals,
        }
    }
}

/// Walk `word/document.xml`, collecting paragraphs and layout signals.
fn parse_document(xml: &str, styles: &HashMap<String, StyleInfo>) -> Result<ParsedDocument> {
    let mut reader = Reader::from_str(xml);
    let mut parsed = ParsedDocument::default();

    let mut stack: Vec<Paragraph> = Vec::new();
    let mut next_order: u32 = 0;
    let mut run: Option<RunProps> = None;
    let mut in_ppr = false;
    let mut in_rpr = false;
    let mut in_text = false;
    let mut table_depth = 0u32;
    let mut skip_depth = 0u32;
    let mut explicit_breaks = 0u32;
    let mut rendered_breaks = 0u32;

    loop {
        let event = reader.read_event()?;

        // Legacy VML fallbacks duplicate the content of their modern choice.
        if skip_depth > 0 {
            match event {
                Event::Start(_) => skip_depth += 1,
                Event::End(_) => skip_depth -= 1,
                Event::Eof => break,
                _ => {}
            }
            continue;
        }

        let page = 1 + explicit_breaks.max(rendered_breaks);
        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"mc:Fallback" => skip_depth = 1,
                b"w:p" => {
                    stack.push(Paragraph::new(page, next_order));
                    next_order += 1;
                }
                b"w:pPr" => in_ppr = true,
                b"w:r" => run = Some(RunProps::default()),
                b"w:rPr" => in_rpr = true,
                b"w:t" => in_text = true,
                b"w:numPr" if in_ppr => {
                    if let Some(p) = stack.last_mut() {
                        p.numbered = true;
                    }
                }
                b"w:tbl" => {
                    if table_depth == 0 {
                        parsed.signals.tables += 1;
                    }
                    table_depth += 1;
                }
                b"w:txbxContent" => parsed.signals.text_boxes += 1,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" => next_order += 1,
                b"w:pStyle" if in_ppr => {
                    if let Some(p) = stack.last_mut() {
                        p.style = attr(&e, b"w:val");
                    }
                }
                b"w:numPr" if in_ppr => {
                    if let Some(p) = stack.last_mut() {
                        p.numbered = true;
                    }
                }
                b"w:b" if in_rpr && !in_ppr => {
                    if let Some(r) = run.as_mut() {
                        r.bold = Some(is_on(attr(&e, b"w:val").as_deref()));
                    }
                }
                b"w:sz" if in_rpr && !in_ppr => {
                    if let Some(r) = run.as_mut() {
                        r.size = attr(&e, b"w:val").and_then(|v| v.parse().ok());
                    }
                }
                b"w:br" => {
                    if attr(&e, b"w:type").as_deref() == Some("page") {
                        explicit_breaks += 1;
                    } else {
                        push_text(&mut stack, "\n");
                    }
                }
                b"w:cr" => push_text(&mut stack, "\n"),
                b"w:tab" if run.is_some() && !in_ppr => push_text(&mut stack, " "),
                b"w:lastRenderedPageBreak" => rendered_breaks += 1,
                b"w:cols" => {
                    let columns: u32 = attr(&e, b"w:num")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(1);
                    parsed.signals.multi_column |= columns > 1;
                }
                b"a:blip" | b"v:imagedata" => parsed.signals.images += 1,
                _ => {}
            },
            Event::Text(t) if in_text => {
                let text = text_of(&t);
                if let Some(p) = stack.last_mut() {
                    let chars = text.chars().filter(|c| !c.is_whitespace()).count();
                    let style = p.style.as_ref().and_then(|s| styles.get(s));
                    let props = run.clone().unwrap_or_default();
                    let bold = props
                        .bold
                        .unwrap_or_else(|| style.is_some_and(|s| s.bold));
                    let size = props.size.or(style.and_then(|s| s.size));

                    p.total_chars += chars;
                    if bold {
                        p.bold_chars += chars;
                    }
                    if let Some(size) = size {
                        p.max_size = Some(p.max_size.map_or(size, |m| m.max(size)));
                    }
                    *parsed
                        .size_histogram
                        .entry(size.unwrap_or(DEFAULT_HALF_POINTS))
                        .or_insert(0) += chars;
                    p.text.push_str(&text);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:p" => {
                    if let Some(p) = stack.pop() {
                        parsed.paragraphs.push(p);
                    }
                }
                b"w:pPr" => in_ppr = false,
                b"w:r" => run = None,
                b"w:rPr" => in_rpr = false,
                b"w:t" => in_text = false,
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    parsed.signals.pages = 1 + explicit_breaks.max(rendered_breaks);
    log::debug!(
        "docx: {} paragraphs, {} tables, {} images",
        parsed.paragraphs.len(),
        parsed.signals.tables,
        parsed.signals.images
    );
    Ok(parsed)
}

fn push_text(stack: &mut [Paragraph], text: &str) {
    if let Some(p) = stack.last_mut() {
        p.text.push_str(text);
    }
}
