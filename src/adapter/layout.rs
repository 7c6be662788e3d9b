//! Layout analysis for PDF pages.
//!
//! Text is decoded from content streams with position and font information,
//! grouped into lines by baseline, ordered column by column, and grouped into
//! paragraph blocks by spacing, font size and indentation.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

/// Bullet glyphs recognized at the start of a PDF line.
pub(crate) const BULLET_GLYPHS: &[char] = &[
    '•', '‣', '–', '—', '*', '-', '●', '○', '■', '▪', '►', '◦', '·', '∙', '❖', '➢', '✓',
];

static PAGE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:page\s*)?\d{1,3}$|^[-–]\s*\d{1,3}\s*[-–]$").unwrap()
});

static PAGE_OF_TOTAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:page\s*)?(\d{1,3})\s*(?:of|/)\s*(\d{1,3})$").unwrap()
});

/// A text span with position and style information.
#[derive(Debug, Clone)]
pub struct TextSpan {
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Estimated advance width
    pub width: f32,
    /// Font size in points
    pub font_size: f32,
    pub is_bold: bool,
}

impl TextSpan {
    /// Create a new text span; the width is estimated from the glyph count.
    pub fn new(text: String, x: f32, y: f32, font_size: f32, font_name: &str) -> Self {
        let lower = font_name.to_lowercase();
        let is_bold = lower.contains("bold") || lower.contains("black") || lower.contains("heavy");
        let width = text.chars().count() as f32 * font_size * 0.5;
        Self {
            text,
            x,
            y,
            width,
            font_size,
            is_bold,
        }
    }

    fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// Spans sharing a baseline.
#[derive(Debug, Clone)]
pub struct TextLine {
    /// Spans sorted by X position
    pub spans: Vec<TextSpan>,
    pub y: f32,
    pub x: f32,
    /// Dominant font size, weighted by text length
    pub font_size: f32,
}

impl TextLine {
    pub fn from_spans(mut spans: Vec<TextSpan>) -> Self {
        spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));

        let total_chars: usize = spans.iter().map(|s| s.text.len()).sum();
        let weighted: f32 = spans
            .iter()
            .map(|s| s.font_size * s.text.len() as f32)
            .sum();
        let font_size = match (total_chars, spans.first()) {
            (0, Some(first)) => first.font_size,
            (0, None) => 0.0,
            (n, _) => weighted / n as f32,
        };
        let (x, y) = spans.first().map(|s| (s.x, s.y)).unwrap_or((0.0, 0.0));

        Self {
            spans,
            y,
            x,
            font_size,
        }
    }

    /// Combined text, inserting spaces where spans are visibly apart.
    pub fn text(&self) -> String {
        let mut result = String::new();
        for (i, span) in self.spans.iter().enumerate() {
            if i > 0 {
                let prev = &self.spans[i - 1];
                let gap = span.x - prev.right();
                let needs_space = gap > span.font_size * 0.1
                    && !prev.text.ends_with(char::is_whitespace)
                    && !span.text.starts_with(char::is_whitespace)
                    && !(prev.text.chars().last().is_some_and(is_spaceless_script_char)
                        && span.text.chars().next().is_some_and(is_spaceless_script_char));
                if needs_space {
                    result.push(' ');
                }
            }
            result.push_str(&span.text);
        }
        result
    }

    /// Check if the line is predominantly bold.
    pub fn is_bold(&self) -> bool {
        let bold: usize = self
            .spans
            .iter()
            .filter(|s| s.is_bold)
            .map(|s| s.text.len())
            .sum();
        let total: usize = self.spans.iter().map(|s| s.text.len()).sum();
        total > 0 && bold as f32 / total as f32 > 0.5
    }

    /// Check if all letters are uppercase (at least three of them).
    pub fn is_uppercase(&self) -> bool {
        let text = self.text();
        let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
        letters.len() >= 3 && letters.iter().all(|c| c.is_uppercase())
    }

    /// Whether the line opens with a bullet glyph.
    pub fn starts_with_bullet(&self) -> bool {
        let text = self.text();
        let mut chars = text.trim_start().chars();
        match chars.next() {
            Some(c) if BULLET_GLYPHS.contains(&c) => {
                matches!(chars.next(), None | Some(' ') | Some('\t'))
                    || self.spans.first().is_some_and(|s| s.text.trim() == c.to_string())
            }
            _ => false,
        }
    }

    /// Number of visually separated cells in the line.
    fn cell_count(&self) -> usize {
        if self.spans.is_empty() {
            return 0;
        }
        let gaps = self
            .spans
            .windows(2)
            .filter(|w| w[1].x - w[0].right() > (w[1].font_size * 1.5).max(15.0))
            .count();
        gaps + 1
    }

    fn word_count(&self) -> usize {
        self.text().split_whitespace().count()
    }
}

/// A detected column in the page layout.
#[derive(Debug, Clone)]
pub struct Column {
    pub left: f32,
    pub right: f32,
}

impl Column {
    pub fn contains(&self, x: f32) -> bool {
        x >= self.left && x <= self.right
    }

    /// A span belongs to a column if its left edge or center is inside it.
    pub fn contains_span(&self, span: &TextSpan) -> bool {
        self.contains(span.x) || self.contains(span.x + span.width / 2.0)
    }
}

/// Font size statistics across the whole document.
#[derive(Debug, Clone, Default)]
pub struct FontStatistics {
    /// Body text font size (most common)
    pub body_size: f32,
    histogram: HashMap<i32, usize>,
}

impl FontStatistics {
    /// Add a font size observation, weighted by glyph count.
    pub fn add(&mut self, size: f32, glyphs: usize) {
        let key = (size * 10.0).round() as i32;
        *self.histogram.entry(key).or_insert(0) += glyphs.max(1);
    }

    /// Determine the body size.
    pub fn analyze(&mut self) {
        self.body_size = self
            .histogram
            .iter()
            .max_by(|(ka, ca), (kb, cb)| ca.cmp(cb).then(kb.cmp(ka)))
            .map(|(k, _)| *k as f32 / 10.0)
            .unwrap_or(12.0);
    }

    /// Whether a size is noticeably larger than body text.
    pub fn is_large(&self, size: f32) -> bool {
        size >= self.body_size + 1.5
    }
}

/// Spans and image facts of one page.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    pub page: u32,
    pub spans: Vec<TextSpan>,
    pub images: u32,
    /// Horizontal extent of the MediaBox, when the page declares one.
    pub bounds: Option<(f32, f32)>,
}

/// A paragraph block built from lines.
#[derive(Debug, Clone)]
pub struct LineBlock {
    pub lines: Vec<TextLine>,
}

impl LineBlock {
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_bold(&self) -> bool {
        let bold = self.lines.iter().filter(|l| l.is_bold()).count();
        bold * 2 > self.lines.len()
    }

    pub fn has_large_font(&self, stats: &FontStatistics) -> bool {
        self.lines.iter().any(|l| stats.is_large(l.font_size))
    }

    /// A single short line set apart by size, weight or capitals.
    pub fn is_heading_like(&self, stats: &FontStatistics) -> bool {
        match self.lines.as_slice() {
            [line] => {
                line.word_count() <= 6
                    && (stats.is_large(line.font_size) || line.is_bold() || line.is_uppercase())
            }
            _ => false,
        }
    }

    pub fn starts_with_bullet(&self) -> bool {
        self.lines.first().is_some_and(|l| l.starts_with_bullet())
    }
}

/// Reads spans and image counts from pages of a loaded document.
pub struct PageReader<'a> {
    doc: &'a LopdfDocument,
}

impl<'a> PageReader<'a> {
    pub fn new(doc: &'a LopdfDocument) -> Self {
        Self { doc }
    }

    /// Extract spans and count images on a page.
    pub fn read_page(&self, page: u32, page_id: ObjectId) -> Result<PageContent> {
        let fonts = self.doc.get_page_fonts(page_id)?;
        let font_names: HashMap<Vec<u8>, String> = fonts
            .iter()
            .map(|(key, font)| {
                let base = font
                    .get(b"BaseFont")
                    .ok()
                    .and_then(|o| o.as_name().ok())
                    .map(|n| String::from_utf8_lossy(n).to_string())
                    .unwrap_or_else(|| String::from_utf8_lossy(key).to_string());
                (key.clone(), base)
            })
            .collect();

        let content = self.page_content(page_id)?;
        let (spans, inline_images) = self.parse_content(&content, &font_names, &fonts)?;
        let images = self.count_image_xobjects(page_id) + inline_images;

        Ok(PageContent {
            page,
            spans,
            images,
            bounds: self.media_box(page_id),
        })
    }

    /// Left and right edge of the page's MediaBox, following `Parent` inheritance.
    fn media_box(&self, page_id: ObjectId) -> Option<(f32, f32)> {
        let mut current = Some(page_id);
        let mut depth = 0;
        while let Some(id) = current.take() {
            let dict = self.doc.get_dictionary(id).ok()?;
            if let Ok(obj) = dict.get(b"MediaBox") {
                let rect = match obj {
                    Object::Reference(r) => self.doc.get_object(*r).ok()?,
                    other => other,
                };
                let coords: Vec<f32> = rect.as_array().ok()?.iter().filter_map(get_number).collect();
                if coords.len() != 4 {
                    return None;
                }
                let (left, right) = (coords[0].min(coords[2]), coords[0].max(coords[2]));
                return (right > left).then_some((left, right));
            }
            depth += 1;
            if depth < 32 {
                current = dict.get(b"Parent").and_then(Object::as_reference).ok();
            }
        }
        None
    }

    /// Concatenated, decompressed content streams; empty for pages without content.
    fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self.doc.get_dictionary(page_id)?;
        let Ok(contents) = page_dict.get(b"Contents") else {
            return Ok(Vec::new());
        };

        let refs: Vec<ObjectId> = match contents {
            Object::Reference(r) => match self.doc.get_object(*r)? {
                Object::Array(arr) => arr.iter().filter_map(|o| o.as_reference().ok()).collect(),
                _ => vec![*r],
            },
            Object::Array(arr) => arr.iter().filter_map(|o| o.as_reference().ok()).collect(),
            _ => {
                return Err(Error::CorruptDocument(
                    "page content is not a stream".to_string(),
                ))
            }
        };

        let mut content = Vec::new();
        for r in refs {
            if let Object::Stream(stream) = self.doc.get_object(r)? {
                let data = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                content.extend_from_slice(&data);
                content.push(b'\n');
            }
        }
        Ok(content)
    }

    /// Resource dictionaries of a page, including inherited ones.
    fn resource_dicts(&self, page_id: ObjectId) -> Vec<&'a Dictionary> {
        let mut dicts = Vec::new();
        let mut current = Some(page_id);
        let mut depth = 0;
        while let Some(id) = current.take() {
            let Ok(dict) = self.doc.get_dictionary(id) else {
                break;
            };
            if let Ok(res) = dict.get(b"Resources") {
                if let Some(res) = self.as_dict(res) {
                    dicts.push(res);
                }
            }
            depth += 1;
            if depth < 32 {
                current = dict.get(b"Parent").and_then(Object::as_reference).ok();
            }
        }
        dicts
    }

    fn as_dict(&self, obj: &'a Object) -> Option<&'a Dictionary> {
        match obj {
            Object::Dictionary(d) => Some(d),
            Object::Reference(r) => self.doc.get_dictionary(*r).ok(),
            _ => None,
        }
    }

    fn count_image_xobjects(&self, page_id: ObjectId) -> u32 {
        let mut count = 0;
        for res in self.resource_dicts(page_id) {
            let Some(xobjects) = res.get(b"XObject").ok().and_then(|o| self.as_dict(o)) else {
                continue;
            };
            for (_, obj) in xobjects.iter() {
                let stream = match obj {
                    Object::Reference(r) => self.doc.get_object(*r).ok(),
                    other => Some(other),
                };
                if let Some(Object::Stream(s)) = stream {
                    let is_image = s
                        .dict
                        .get(b"Subtype")
                        .ok()
                        .and_then(|o| o.as_name().ok())
                        .is_some_and(|n| n == b"Image");
                    if is_image {
                        count += 1;
                    }
                }
            }
        }
        count
    }

    /// Decode text operators into positioned spans; also counts inline images.
    fn parse_content(
        &self,
        content: &[u8],
        font_names: &HashMap<Vec<u8>, String>,
        fonts: &BTreeMap<Vec<u8>, &Dictionary>,
    ) -> Result<(Vec<TextSpan>, u32)> {
        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok((Vec::new(), 0));
        }
        let content = lopdf::content::Content::decode(content)?;

        let mut spans = Vec::new();
        let mut inline_images = 0;
        let mut font_key: Vec<u8> = Vec::new();
        let mut font_name = String::new();
        let mut font_size: f32 = 12.0;
        let mut matrix = TextMatrix::default();
        let mut in_text = false;

        for op in content.operations {
            match op.operator.as_str() {
                "BT" => {
                    in_text = true;
                    matrix = TextMatrix {
                        leading: matrix.leading,
                        ..TextMatrix::default()
                    };
                }
                "ET" => in_text = false,
                "BI" => inline_images += 1,
                "Tf" if op.operands.len() >= 2 => {
                    if let Object::Name(name) = &op.operands[0] {
                        font_key = name.clone();
                        font_name = font_names
                            .get(name.as_slice())
                            .cloned()
                            .unwrap_or_else(|| String::from_utf8_lossy(name).to_string());
                    }
                    font_size = get_number(&op.operands[1]).unwrap_or(12.0);
                }
                "TL" => {
                    if let Some(leading) = op.operands.first().and_then(get_number) {
                        matrix.leading = leading;
                    }
                }
                "Td" | "TD" if op.operands.len() >= 2 => {
                    let tx = get_number(&op.operands[0]).unwrap_or(0.0);
                    let ty = get_number(&op.operands[1]).unwrap_or(0.0);
                    if op.operator == "TD" {
                        matrix.leading = -ty;
                    }
                    matrix.translate(tx, ty);
                }
                "Tm" if op.operands.len() >= 6 => {
                    let n: Vec<f32> = op
                        .operands
                        .iter()
                        .take(6)
                        .map(|o| get_number(o).unwrap_or(0.0))
                        .collect();
                    matrix.set(n[0], n[1], n[2], n[3], n[4], n[5]);
                }
                "T*" => matrix.next_line(),
                "Tj" | "TJ" | "'" | "\"" if in_text => {
                    if op.operator == "'" || op.operator == "\"" {
                        matrix.next_line();
                    }
                    let encoding = fonts
                        .get(&font_key)
                        .and_then(|f| f.get_font_encoding(self.doc).ok());
                    let decode = |bytes: &[u8]| match &encoding {
                        Some(enc) => LopdfDocument::decode_text(enc, bytes)
                            .unwrap_or_else(|_| decode_text_simple(bytes)),
                        None => decode_text_simple(bytes),
                    };

                    let text = match op.operator.as_str() {
                        "TJ" => match op.operands.first() {
                            Some(Object::Array(items)) => decode_tj_array(items, decode),
                            _ => String::new(),
                        },
                        "\"" => match op.operands.get(2) {
                            Some(Object::String(bytes, _)) => decode(bytes),
                            _ => String::new(),
                        },
                        _ => match op.operands.first() {
                            Some(Object::String(bytes, _)) => decode(bytes),
                            _ => String::new(),
                        },
                    };

                    if !text.trim().is_empty() {
                        let (x, y) = matrix.position();
                        let span =
                            TextSpan::new(text, x, y, font_size * matrix.scale(), &font_name);
                        matrix.advance(span.width);
                        spans.push(span);
                    }
                }
                _ => {}
            }
        }

        Ok((spans, inline_images))
    }
}

/// Join a TJ array, treating large negative kerning as a word space.
fn decode_tj_array(items: &[Object], decode: impl Fn(&[u8]) -> String) -> String {
    const SPACE_THRESHOLD: f32 = 200.0;
    let mut combined = String::new();
    for item in items {
        match item {
            Object::String(bytes, _) => combined.push_str(&decode(bytes)),
            Object::Integer(_) | Object::Real(_) => {
                let adjustment = -get_number(item).unwrap_or(0.0);
                let last = combined.chars().last();
                if adjustment > SPACE_THRESHOLD
                    && last.is_some_and(|c| !c.is_whitespace() && !is_spaceless_script_char(c))
                {
                    combined.push(' ');
                }
            }
            _ => {}
        }
    }
    combined
}

/// Occupancy slices above this count are not scanned for a gutter.
const MAX_SLICES: usize = 4096;

/// Detect a two-column layout from a vertical gutter in span occupancy.
///
/// `bounds` is the page's horizontal extent; spans reaching past it are
/// clipped so a stray text matrix cannot stretch the occupancy grid.
pub fn detect_columns(spans: &[TextSpan], bounds: Option<(f32, f32)>) -> Vec<Column> {
    let mut min_x = spans.iter().map(|s| s.x).fold(f32::MAX, f32::min);
    let mut max_x = spans.iter().map(|s| s.right()).fold(f32::MIN, f32::max);
    if let Some((left, right)) = bounds {
        min_x = min_x.max(left);
        max_x = max_x.min(right);
    }
    let single = || {
        vec![Column {
            left: f32::MIN,
            right: f32::MAX,
        }]
    };

    if spans.is_empty() {
        return vec![];
    }
    let page_width = max_x - min_x;
    if !page_width.is_finite() || page_width < 250.0 {
        return single();
    }

    const SLICE: f32 = 3.0;
    if page_width / SLICE >= MAX_SLICES as f32 {
        log::warn!(
            "text spans {:.0}pt wide, reading page as a single column",
            page_width
        );
        return single();
    }
    let slices = (page_width / SLICE) as usize + 1;
    let mut occupancy = vec![0usize; slices];
    for span in spans {
        let start = ((span.x - min_x) / SLICE).max(0.0) as usize;
        let end = ((span.right() - min_x) / SLICE).max(0.0) as usize;
        for slot in occupancy
            .iter_mut()
            .take(end.min(slices - 1) + 1)
            .skip(start)
        {
            *slot += 1;
        }
    }

    // Widest empty run in the middle 70% of the page, closer to center on ties.
    let center = slices / 2;
    let mut best: Option<(usize, usize)> = None;
    let mut run_start = None;
    for i in (slices * 15 / 100)..=(slices * 85 / 100).min(slices - 1) {
        let empty = occupancy[i] == 0;
        match (empty, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                let candidate = (start, i - start);
                best = pick_gutter(best, candidate, center);
                run_start = None;
            }
            _ => {}
        }
    }

    let Some((gap_start, gap_len)) = best else {
        return single();
    };
    if gap_len as f32 * SLICE < 12.0 {
        return single();
    }

    let gutter = min_x + (gap_start as f32 + gap_len as f32 / 2.0) * SLICE;
    if gutter - min_x < 80.0 || max_x - gutter < 80.0 {
        return single();
    }

    let left = spans
        .iter()
        .filter(|s| s.x + s.width / 2.0 < gutter)
        .count();
    let right = spans.len() - left;
    let min_spans = (spans.len() / 10).max(2);
    if left < min_spans || right < min_spans {
        log::debug!("column candidate at x={:.1} too imbalanced", gutter);
        return single();
    }

    log::debug!("two columns split at x={:.1}", gutter);
    vec![
        Column {
            left: f32::MIN,
            right: gutter,
        },
        Column {
            left: gutter,
            right: f32::MAX,
        },
    ]
}

fn pick_gutter(
    best: Option<(usize, usize)>,
    candidate: (usize, usize),
    center: usize,
) -> Option<(usize, usize)> {
    let dist = |(start, len): (usize, usize)| (start + len / 2).abs_diff(center);
    match best {
        None => Some(candidate),
        Some(b) if candidate.1 * 2 > b.1 * 3 => Some(candidate),
        Some(b) if candidate.1 * 10 >= b.1 * 7 && dist(candidate) < dist(b) => Some(candidate),
        keep => keep,
    }
}

/// Lines in reading order: column by column, each top to bottom.
///
/// Returns the lines and whether more than one column was found.
pub fn lines_in_reading_order(
    spans: Vec<TextSpan>,
    bounds: Option<(f32, f32)>,
) -> (Vec<TextLine>, bool) {
    let columns = detect_columns(&spans, bounds);
    if columns.len() <= 1 {
        return (group_spans_into_lines(spans), false);
    }

    let mut per_column: Vec<Vec<TextSpan>> = vec![Vec::new(); columns.len()];
    for span in spans {
        let idx = columns
            .iter()
            .position(|c| c.contains_span(&span))
            .unwrap_or(0);
        per_column[idx].push(span);
    }

    let lines = per_column
        .into_iter()
        .flat_map(group_spans_into_lines)
        .collect();
    (lines, true)
}

/// Y-based line grouping, top to bottom then left to right.
pub fn group_spans_into_lines(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    spans.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
    });

    let mut lines = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in spans {
        let tolerance = span.font_size * 0.3;
        match current_y {
            Some(y) if (span.y - y).abs() <= tolerance => current.push(span),
            _ => {
                if !current.is_empty() {
                    lines.push(TextLine::from_spans(std::mem::take(&mut current)));
                }
                current_y = Some(span.y);
                current.push(span);
            }
        }
    }
    if !current.is_empty() {
        lines.push(TextLine::from_spans(current));
    }
    lines
}

/// Check whether a line is only a page number ("3", "Page 3", "- 3 -").
///
/// "3 of 5" and "3/5" count only when the total is the document's page
/// count, so ratings like "9/10" survive.
pub fn is_page_number(text: &str, page_count: u32) -> bool {
    let text = text.trim();
    if PAGE_NUMBER.is_match(text) {
        return true;
    }
    PAGE_OF_TOTAL.captures(text).is_some_and(|caps| {
        let page = caps[1].parse::<u32>().unwrap_or(u32::MAX);
        let total = caps[2].parse::<u32>().unwrap_or(0);
        page <= total && total == page_count
    })
}

/// Count tables: runs of at least two consecutive lines with the same
/// number (≥ 3) of visually separated cells.
pub fn count_tables(lines: &[TextLine]) -> u32 {
    let mut tables = 0;
    let mut run = 0;
    let mut run_cells = 0;
    for line in lines {
        let cells = line.cell_count();
        if cells >= 3 && (run == 0 || cells == run_cells) {
            run += 1;
            run_cells = cells;
            if run == 2 {
                tables += 1;
            }
        } else if cells >= 3 {
            run = 1;
            run_cells = cells;
        } else {
            run = 0;
        }
    }
    tables
}

/// Group lines into paragraph blocks.
pub fn group_lines_into_blocks(lines: Vec<TextLine>, stats: &FontStatistics) -> Vec<LineBlock> {
    let avg_spacing = average_line_spacing(&lines);
    let mut blocks: Vec<LineBlock> = Vec::new();
    let mut current: Vec<TextLine> = Vec::new();
    let mut bullet_x: Option<f32> = None;

    for line in lines {
        if let Some(prev) = current.last() {
            if should_break(prev, &line, avg_spacing, stats, bullet_x) {
                blocks.push(LineBlock {
                    lines: std::mem::take(&mut current),
                });
                bullet_x = None;
            }
        }
        if line.starts_with_bullet() && bullet_x.is_none() {
            bullet_x = Some(line.x);
        }
        current.push(line);
    }
    if !current.is_empty() {
        blocks.push(LineBlock { lines: current });
    }
    blocks
}

fn average_line_spacing(lines: &[TextLine]) -> f32 {
    let spacings: Vec<f32> = lines
        .windows(2)
        .map(|w| (w[0].y - w[1].y).abs())
        .filter(|s| *s > 0.1)
        .collect();
    if spacings.is_empty() {
        return 12.0;
    }
    spacings.iter().sum::<f32>() / spacings.len() as f32
}

fn should_break(
    prev: &TextLine,
    curr: &TextLine,
    avg_spacing: f32,
    stats: &FontStatistics,
    bullet_x: Option<f32>,
) -> bool {
    let heading = |l: &TextLine| stats.is_large(l.font_size);
    if heading(prev) || heading(curr) {
        return true;
    }
    // Moving up the page means a new column.
    if curr.y > prev.y + 1.0 {
        return true;
    }
    if (prev.y - curr.y).abs() > avg_spacing * 1.5 {
        return true;
    }
    if (prev.font_size - curr.font_size).abs() > 1.0 {
        return true;
    }
    if prev.is_bold() != curr.is_bold() {
        return true;
    }
    let curr_bullet = curr.starts_with_bullet();
    match bullet_x {
        // A list starts after plain lines.
        None if curr_bullet => true,
        // Back at the bullet margin without a bullet: the list has ended.
        Some(bx) if !curr_bullet && curr.x <= bx + 2.0 => true,
        Some(_) => false,
        None => (prev.x - curr.x).abs() > 20.0,
    }
}

/// Text matrix for tracking position in content stream.
#[derive(Debug, Clone)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
    line_x: f32,
    line_y: f32,
    leading: f32,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
            line_x: 0.0,
            line_y: 0.0,
            leading: 12.0,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.e = e;
        self.f = f;
        self.line_x = e;
        self.line_y = f;
    }

    /// Td moves relative to the start of the current line.
    fn translate(&mut self, tx: f32, ty: f32) {
        self.line_x += tx * self.a + ty * self.c;
        self.line_y += tx * self.b + ty * self.d;
        self.e = self.line_x;
        self.f = self.line_y;
    }

    fn next_line(&mut self) {
        self.translate(0.0, -self.leading);
    }

    /// Move the pen after showing text.
    fn advance(&mut self, width: f32) {
        self.e += width;
    }

    fn position(&self) -> (f32, f32) {
        (self.e, self.f)
    }

    fn scale(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }
}

fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Chinese and Japanese scripts do not use word spaces; Korean does.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        || (0x3040..=0x30FF).contains(&code)
        || (0x3000..=0x303F).contains(&code)
}

/// Decoding fallback when no font encoding is available.
fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
