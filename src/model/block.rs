//! Raw input and the block-level intermediate representation.

use crate::detect::DocumentFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Uploaded document bytes together with their declared format.
///
/// Bytes are shared so that a timeout worker can own a clone without copying.
#[derive(Debug, Clone)]
pub struct RawDocument {
    bytes: Arc<[u8]>,
    format: DocumentFormat,
}

impl RawDocument {
    /// Wrap uploaded bytes.
    pub fn new(bytes: impl Into<Arc<[u8]>>, format: DocumentFormat) -> Self {
        Self {
            bytes: bytes.into(),
            format,
        }
    }

    /// Raw content.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Declared format tag.
    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if there is no content at all.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Style hint attached to a text block by its adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleHint {
    Bold,
    LargeFont,
    Bullet,
    HeadingLike,
}

/// An ordered unit of text in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Text content; lines are separated by `\n`
    pub text: String,

    /// Page (PDF, DOCX) or slide (PPTX) number, 1-based
    pub page: u32,

    /// Style hints
    pub style_hints: BTreeSet<StyleHint>,

    /// Position in reading order, strictly increasing per document
    pub order_index: u32,
}

impl TextBlock {
    /// Create a block without style hints.
    pub fn new(text: impl Into<String>, page: u32, order_index: u32) -> Self {
        Self {
            text: text.into(),
            page,
            style_hints: BTreeSet::new(),
            order_index,
        }
    }

    /// Add a style hint (builder style).
    pub fn with_hint(mut self, hint: StyleHint) -> Self {
        self.style_hints.insert(hint);
        self
    }

    /// Check for a style hint.
    pub fn has_hint(&self, hint: StyleHint) -> bool {
        self.style_hints.contains(&hint)
    }
}

/// A [`TextBlock`] after content normalization.
///
/// Keeps the `order_index` of its source block, which is the provenance key
/// used by extracted fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedBlock {
    pub text: String,
    pub page: u32,
    pub style_hints: BTreeSet<StyleHint>,
    pub order_index: u32,
}

impl NormalizedBlock {
    /// Check for a style hint.
    pub fn has_hint(&self, hint: StyleHint) -> bool {
        self.style_hints.contains(&hint)
    }

    /// Whether the block carries any emphasis a heading would have.
    pub fn is_emphasized(&self) -> bool {
        self.has_hint(StyleHint::HeadingLike)
            || self.has_hint(StyleHint::Bold)
            || self.has_hint(StyleHint::LargeFont)
    }

    /// Non-empty lines of the block.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines().map(str::trim).filter(|l| !l.is_empty())
    }
}

impl From<NormalizedBlock> for TextBlock {
    fn from(block: NormalizedBlock) -> Self {
        TextBlock {
            text: block.text,
            page: block.page,
            style_hints: block.style_hints,
            order_index: block.order_index,
        }
    }
}

/// Raw layout facts gathered by an adapter, consumed by formatting scores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSignals {
    /// Number of pages or slides (0 when unknown)
    pub pages: u32,

    /// Tables detected
    pub tables: u32,

    /// Embedded images
    pub images: u32,

    /// Floating text boxes or free-standing shapes
    pub text_boxes: u32,

    /// Whether a multi-column layout was detected
    pub multi_column: bool,
}

impl LayoutSignals {
    /// Merge counts from another set of signals (e.g. a second page).
    pub fn absorb(&mut self, other: &LayoutSignals) {
        self.pages += other.pages;
        self.tables += other.tables;
        self.images += other.images;
        self.text_boxes += other.text_boxes;
        self.multi_column |= other.multi_column;
    }
}

/// Everything an adapter yields for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterOutput {
    pub blocks: Vec<TextBlock>,
    pub signals: LayoutSignals,
}

impl AdapterOutput {
    /// Check that `order_index` is strictly increasing.
    ///
    /// Returns the position of the first offending block.
    pub fn first_order_violation(&self) -> Option<usize> {
        self.blocks
            .windows(2)
            .position(|w| w[1].order_index <= w[0].order_index)
            .map(|i| i + 1)
    }
}
