//! PDF adapter built on lopdf.

use lopdf::Document as LopdfDocument;
use rayon::prelude::*;

use super::layout::{
    count_tables, group_lines_into_blocks, is_page_number, lines_in_reading_order,
    FontStatistics, PageContent, PageReader,
};
use super::options::{ErrorMode, ExtractOptions};
use super::{ensure_supported, FormatAdapter};
use crate::detect::DocumentFormat;
use crate::error::{Error, Result};
use crate::model::{AdapterOutput, LayoutSignals, RawDocument, StyleHint, TextBlock};

/// Reads text blocks from PDF documents.
///
/// Pages are read in page order. Within a page, lines are reconstructed from
/// glyph positions and read column by column, top to bottom.
#[derive(Debug, Clone, Default)]
pub struct PdfAdapter;

impl PdfAdapter {
    pub fn new() -> Self {
        Self
    }

    fn load(bytes: &[u8]) -> Result<LopdfDocument> {
        let head = &bytes[..bytes.len().min(1024)];
        if !head.windows(5).any(|w| w == b"%PDF-") {
            return Err(Error::CorruptDocument("missing %PDF header".to_string()));
        }
        let doc = LopdfDocument::load_mem(bytes)?;
        doc.catalog()
            .map_err(|e| Error::CorruptDocument(format!("PDF has no document catalog: {}", e)))?;
        Ok(doc)
    }

    fn read_pages(
        doc: &LopdfDocument,
        options: &ExtractOptions,
    ) -> Result<Vec<PageContent>> {
        let reader = PageReader::new(doc);
        let pages: Vec<(u32, lopdf::ObjectId)> = doc
            .get_pages()
            .into_iter()
            .filter(|(n, _)| options.includes_page(*n))
            .collect();

        let read = |&(n, id): &(u32, lopdf::ObjectId)| -> Result<Option<PageContent>> {
            options.check_deadline()?;
            match reader.read_page(n, id) {
                Ok(page) => Ok(Some(page)),
                Err(e) if options.error_mode == ErrorMode::Lenient => {
                    log::warn!("skipping unreadable page {}: {}", n, e);
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        };

        let results: Vec<Result<Option<PageContent>>> = if options.parallel && pages.len() > 1 {
            pages.par_iter().map(read).collect()
        } else {
            pages.iter().map(read).collect()
        };

        let mut contents = Vec::with_capacity(results.len());
        for result in results {
            if let Some(page) = result? {
                contents.push(page);
            }
        }
        Ok(contents)
    }
}

impl FormatAdapter for PdfAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn name(&self) -> &str {
        "pdf"
    }

    fn extract(&self, doc: &RawDocument, options: &ExtractOptions) -> Result<AdapterOutput> {
        ensure_supported(self, doc)?;
        let pdf = Self::load(doc.bytes())?;
        let pages = Self::read_pages(&pdf, options)?;

        let mut stats = FontStatistics::default();
        for span in pages.iter().flat_map(|p| &p.spans) {
            stats.add(span.font_size, span.text.chars().count());
        }
        stats.analyze();
        log::debug!("body font size {:.1}pt", stats.body_size);

        let mut signals = LayoutSignals {
            pages: pages.len() as u32,
            ..Default::default()
        };
        let mut blocks = Vec::new();
        let mut image_only_pages = 0;
        let page_count = pdf.get_pages().len() as u32;

        for page in pages {
            options.check_deadline()?;
            signals.images += page.images;
            if page.spans.is_empty() {
                if page.images > 0 {
                    image_only_pages += 1;
                }
                continue;
            }

            let (lines, multi_column) = lines_in_reading_order(page.spans, page.bounds);
            let lines: Vec<_> = lines
                .into_iter()
                .filter(|l| !is_page_number(&l.text(), page_count))
                .collect();
            signals.multi_column |= multi_column;
            signals.tables += count_tables(&lines);

            for block in group_lines_into_blocks(lines, &stats) {
                let text = block.text();
                if text.trim().is_empty() {
                    continue;
                }
                let mut out = TextBlock::new(text, page.page, blocks.len() as u32);
                if block.is_bold() {
                    out.style_hints.insert(StyleHint::Bold);
                }
                if block.has_large_font(&stats) {
                    out.style_hints.insert(StyleHint::LargeFont);
                }
                if block.is_heading_like(&stats) {
                    out.style_hints.insert(StyleHint::HeadingLike);
                }
                if block.starts_with_bullet() {
                    out.style_hints.insert(StyleHint::Bullet);
                }
                blocks.push(out);
            }
        }

        if blocks.is_empty() && image_only_pages > 0 {
            return Err(Error::NoExtractableText {
                pages: image_only_pages,
            });
        }

        Ok(AdapterOutput { blocks, signals })
    }
}
