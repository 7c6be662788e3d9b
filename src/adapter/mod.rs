//! Format adapters turning uploaded containers into ordered text blocks.
//!
//! Each supported container has one [`FormatAdapter`]. The
//! [`AdapterRegistry`] selects the adapter by declared format, bounds the call
//! by the configured timeout, and checks the block-order invariant before
//! anything downstream sees the output.
//!
//! # Example
//!
//! ```no_run
//! use resume_ats::adapter::{AdapterRegistry, ExtractOptions};
//! use resume_ats::{DocumentFormat, RawDocument};
//!
//! fn main() -> resume_ats::Result<()> {
//!     let registry = AdapterRegistry::with_defaults();
//!     let bytes = std::fs::read("resume.docx")?;
//!     let doc = RawDocument::new(bytes, DocumentFormat::Docx);
//!
//!     let output = registry.extract(&doc, &ExtractOptions::default())?;
//!     for block in &output.blocks {
//!         println!("{:>3} {}", block.order_index, block.text);
//!     }
//!     Ok(())
//! }
//! ```

mod docx;
mod layout;
mod ooxml;
mod options;
mod pdf;
mod pptx;

pub use docx::DocxAdapter;
pub use options::{ErrorMode, ExtractOptions};
pub use pdf::PdfAdapter;
pub use pptx::PptxAdapter;

use crate::detect::DocumentFormat;
use crate::error::{Error, Result};
use crate::model::{AdapterOutput, RawDocument};
use crossbeam_channel::RecvTimeoutError;
use std::collections::HashMap;
use std::sync::Arc;

/// Trait for format adapters.
///
/// Implement this trait to add support for a new container format. An
/// adapter is a pure transform over the document bytes.
pub trait FormatAdapter: Send + Sync {
    /// Format handled by this adapter.
    fn format(&self) -> DocumentFormat;

    /// Get the name of this adapter.
    fn name(&self) -> &str;

    /// Extract blocks in reading order together with layout signals.
    fn extract(&self, doc: &RawDocument, options: &ExtractOptions) -> Result<AdapterOutput>;

    /// Check if this adapter handles the given format.
    fn supports(&self, format: DocumentFormat) -> bool {
        self.format() == format
    }
}

/// Fail with `UnsupportedFormat` when `doc` is not meant for `adapter`.
pub(crate) fn ensure_supported(adapter: &dyn FormatAdapter, doc: &RawDocument) -> Result<()> {
    if adapter.supports(doc.format()) {
        Ok(())
    } else {
        Err(Error::UnsupportedFormat(format!(
            "{} adapter cannot read declared format '{}'",
            adapter.name(),
            doc.format()
        )))
    }
}

/// Registry for format adapters.
pub struct AdapterRegistry {
    adapters: HashMap<DocumentFormat, Arc<dyn FormatAdapter>>,
}

impl AdapterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Create a registry with the PDF, DOCX and PPTX adapters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PdfAdapter::new()));
        registry.register(Arc::new(DocxAdapter::new()));
        registry.register(Arc::new(PptxAdapter::new()));
        registry
    }

    /// Register an adapter, replacing any previous one for its format.
    pub fn register(&mut self, adapter: Arc<dyn FormatAdapter>) {
        self.adapters.insert(adapter.format(), adapter);
    }

    /// Get the adapter for a format.
    pub fn get(&self, format: DocumentFormat) -> Option<Arc<dyn FormatAdapter>> {
        self.adapters.get(&format).cloned()
    }

    /// Check if a format is supported.
    pub fn supports(&self, format: DocumentFormat) -> bool {
        self.adapters.contains_key(&format)
    }

    /// Get all supported formats.
    pub fn formats(&self) -> Vec<DocumentFormat> {
        let mut formats: Vec<_> = self.adapters.keys().copied().collect();
        formats.sort();
        formats
    }

    /// Run the adapter for the document's declared format.
    ///
    /// The call is bounded by `options.timeout` and the output is checked
    /// for strictly increasing `order_index`.
    pub fn extract(&self, doc: &RawDocument, options: &ExtractOptions) -> Result<AdapterOutput> {
        let adapter = self.get(doc.format()).ok_or_else(|| {
            Error::UnsupportedFormat(format!("no adapter registered for '{}'", doc.format()))
        })?;
        ensure_supported(adapter.as_ref(), doc)?;

        log::debug!(
            "extracting {} bytes with {} adapter",
            doc.len(),
            adapter.name()
        );
        let output = run_bounded(adapter, doc.clone(), options)?;

        if let Some(pos) = output.first_order_violation() {
            return Err(Error::InvariantViolation(format!(
                "block {} has order_index {} after {}",
                pos,
                output.blocks[pos].order_index,
                output.blocks[pos - 1].order_index
            )));
        }
        log::debug!(
            "extracted {} blocks from {} page(s)",
            output.blocks.len(),
            output.signals.pages
        );
        Ok(output)
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Run an adapter, on a worker thread when a timeout is configured.
///
/// The worker also receives an armed deadline so that it stops between pages
/// once the caller has given up on it.
fn run_bounded(
    adapter: Arc<dyn FormatAdapter>,
    doc: RawDocument,
    options: &ExtractOptions,
) -> Result<AdapterOutput> {
    let Some(timeout) = options.timeout else {
        return adapter.extract(&doc, options);
    };

    let armed = options.armed();
    let (tx, rx) = crossbeam_channel::bounded(1);
    std::thread::Builder::new()
        .name(format!("{}-adapter", adapter.name()))
        .spawn(move || {
            // The receiver may already have timed out.
            let _ = tx.send(adapter.extract(&doc, &armed));
        })?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(Error::ExtractionTimeout {
            limit_ms: timeout.as_millis() as u64,
        }),
        Err(RecvTimeoutError::Disconnected) => Err(Error::InvariantViolation(
            "adapter worker exited without producing a result".to_string(),
        )),
    }
}
