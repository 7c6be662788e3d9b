//! # resume-ats
//!
//! Résumé analysis for Rust: extraction from PDF, DOCX and PPTX uploads,
//! ATS compliance scoring, and keyword matching against job descriptions.
//!
//! ## Quick Start
//!
//! ```no_run
//! use resume_ats::{analyze_file, render};
//!
//! fn main() -> resume_ats::Result<()> {
//!     let analysis = analyze_file("resume.pdf", Some("Senior Rust engineer, AWS, Kubernetes"))?;
//!
//!     println!("score: {}", analysis.report.overall_score);
//!     println!("{}", render::to_json(&analysis, render::JsonFormat::Pretty)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! Adapter → Normalizer → Segmenter/Extractor → (Scoring Engine, Job-Match Analyzer)
//!
//! - **Adapters** turn each container into ordered text blocks with style
//!   hints and layout signals (tables, images, columns, text boxes).
//! - **Normalizer** repairs encoding, rejoins hyphenated wraps and unifies
//!   bullet glyphs.
//! - **Extractor** detects section headings and fills a [`ResumeRecord`],
//!   tracing every field back to its source blocks.
//! - **Scorer** grades the record against a table-driven rubric.
//! - **Matcher** compares the record's skills with a job description.
//!
//! Lexicons and the rubric live in TOML rule tables ([`rules::RuleSet`]).

pub mod adapter;
pub mod cache;
pub mod detect;
pub mod error;
pub mod extract;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod render;
pub mod rules;
pub mod score;

// Re-export commonly used types
pub use adapter::{AdapterRegistry, ErrorMode, ExtractOptions, FormatAdapter};
pub use cache::BlockCache;
pub use detect::{detect_format_from_path, sniff_format, DocumentFormat};
pub use error::{Error, ErrorKind, Result};
pub use model::{
    AdapterOutput, Analysis, AtsReport, Certification, Contact, EducationEntry, EndDate,
    ExperienceEntry, Extraction, ExtractionWarning, JobMatchReport, LayoutSignals,
    NormalizedBlock, PartialDate, ProjectEntry, Provenance, RawDocument, ResumeRecord,
    ScoreBand, ScoreCategory, Section, SectionHeading, StyleHint, TextBlock,
};
pub use render::{JsonFormat, TextOptions};
pub use rules::RuleSet;
pub use score::Scorer;

use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Analyze an uploaded document with the built-in rules.
///
/// # Arguments
///
/// * `bytes` - Document content
/// * `format` - Declared format of the upload
/// * `job_description` - Optional job description to match against
///
/// # Example
///
/// ```no_run
/// use resume_ats::{analyze_bytes, DocumentFormat};
///
/// let data = std::fs::read("resume.docx").unwrap();
/// let analysis = analyze_bytes(&data, DocumentFormat::Docx, None).unwrap();
/// println!("{}", analysis.report.overall_score);
/// ```
pub fn analyze_bytes(
    bytes: &[u8],
    format: DocumentFormat,
    job_description: Option<&str>,
) -> Result<Analysis> {
    ResumeAts::new().analyze(bytes, format, job_description)
}

/// Analyze a file, taking the format from its extension.
///
/// # Example
///
/// ```no_run
/// use resume_ats::analyze_file;
///
/// let analysis = analyze_file("resume.pdf", None).unwrap();
/// for suggestion in &analysis.report.suggestions {
///     println!("- {}", suggestion);
/// }
/// ```
pub fn analyze_file<P: AsRef<Path>>(path: P, job_description: Option<&str>) -> Result<Analysis> {
    ResumeAts::new().analyze_file(path, job_description)
}

/// Extract normalized text blocks from a document.
pub fn extract_blocks(bytes: &[u8], format: DocumentFormat) -> Result<Vec<NormalizedBlock>> {
    let doc = RawDocument::new(bytes.to_vec(), format);
    ResumeAts::new().extract_blocks(&doc)
}

/// Extract the structured record from a document.
pub fn extract_record(bytes: &[u8], format: DocumentFormat) -> Result<Extraction> {
    let doc = RawDocument::new(bytes.to_vec(), format);
    let blocks = ResumeAts::new().extract_blocks(&doc)?;
    Ok(extract::extract(&blocks, RuleSet::builtin()))
}

/// Score a record with the built-in rubric.
pub fn score_record(record: &ResumeRecord, signals: &LayoutSignals) -> AtsReport {
    score::score(record, signals, RuleSet::builtin())
}

/// Match a record against a job description with the built-in lexicons.
pub fn match_job(record: &ResumeRecord, job_description: &str) -> JobMatchReport {
    matcher::match_job(record, job_description, RuleSet::builtin())
}

/// Configurable analysis pipeline.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use resume_ats::{ResumeAts, RuleSet};
///
/// let rules = RuleSet::from_path("rules.toml")?;
/// let ats = ResumeAts::new()
///     .with_rules(rules)
///     .with_timeout(Duration::from_secs(10))
///     .with_cache(64);
///
/// let analysis = ats.analyze_file("resume.pdf", Some("Python, AWS, Docker"))?;
/// println!("{} ({})", analysis.report.overall_score, analysis.report.band);
/// # Ok::<(), resume_ats::Error>(())
/// ```
pub struct ResumeAts {
    registry: AdapterRegistry,
    options: ExtractOptions,
    rules: Arc<RuleSet>,
    cache: Option<Arc<BlockCache>>,
}

impl ResumeAts {
    /// Create a pipeline with the default adapters and built-in rules.
    pub fn new() -> Self {
        Self {
            registry: AdapterRegistry::with_defaults(),
            options: ExtractOptions::default(),
            rules: Arc::new(RuleSet::builtin().clone()),
            cache: None,
        }
    }

    /// Use custom rule tables.
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = Arc::new(rules);
        self
    }

    /// Set adapter options.
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Bound each adapter call by a time limit.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.with_timeout(timeout);
        self
    }

    /// Enable lenient mode (skip unreadable pages).
    pub fn lenient(mut self) -> Self {
        self.options = self.options.lenient();
        self
    }

    /// Replace the adapter registry.
    pub fn with_registry(mut self, registry: AdapterRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Register an adapter, replacing the one for its format.
    pub fn register_adapter(mut self, adapter: Arc<dyn FormatAdapter>) -> Self {
        self.registry.register(adapter);
        self
    }

    /// Cache adapter output for up to `max_entries` documents.
    pub fn with_cache(mut self, max_entries: usize) -> Self {
        self.cache = Some(Arc::new(BlockCache::new(max_entries)));
        self
    }

    /// Share an existing cache.
    pub fn with_shared_cache(mut self, cache: Arc<BlockCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Rule tables in use.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Adapter options in use.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Run the adapter for a document, going through the cache if enabled.
    pub fn adapt(&self, doc: &RawDocument) -> Result<Arc<AdapterOutput>> {
        match &self.cache {
            Some(cache) => cache.get_or_extract(doc, || self.registry.extract(doc, &self.options)),
            None => self.registry.extract(doc, &self.options).map(Arc::new),
        }
    }

    /// Adapter output, normalized.
    pub fn extract_blocks(&self, doc: &RawDocument) -> Result<Vec<NormalizedBlock>> {
        let output = self.adapt(doc)?;
        Ok(normalize::normalize_all(&output.blocks))
    }

    /// Analyze uploaded bytes.
    pub fn analyze(
        &self,
        bytes: &[u8],
        format: DocumentFormat,
        job_description: Option<&str>,
    ) -> Result<Analysis> {
        let doc = RawDocument::new(bytes.to_vec(), format);
        self.analyze_document(&doc, job_description)
    }

    /// Analyze a file, taking the format from its extension and falling back
    /// to content sniffing.
    pub fn analyze_file<P: AsRef<Path>>(
        &self,
        path: P,
        job_description: Option<&str>,
    ) -> Result<Analysis> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let format =
            DocumentFormat::from_path(path).or_else(|e| sniff_format(&bytes).ok_or(e))?;
        let doc = RawDocument::new(bytes, format);
        self.analyze_document(&doc, job_description)
    }

    /// Run the whole pipeline on one document.
    pub fn analyze_document(
        &self,
        doc: &RawDocument,
        job_description: Option<&str>,
    ) -> Result<Analysis> {
        let output = self.adapt(doc)?;
        let blocks = normalize::normalize_all(&output.blocks);
        let Extraction {
            record,
            provenance,
            warnings,
        } = extract::extract(&blocks, &self.rules);
        for warning in &warnings {
            log::debug!("extraction warning: {}", warning);
        }

        let mut report = Scorer::new(&self.rules).score(&record, &output.signals);
        let job_match = job_description
            .filter(|job| !job.trim().is_empty())
            .map(|job| matcher::match_job(&record, job, &self.rules));
        if let Some(job) = &job_match {
            report = report.with_missing_keywords(job.gap_terms.clone());
        }

        Ok(Analysis {
            record,
            provenance,
            warnings,
            signals: output.signals.clone(),
            report,
            job_match,
        })
    }

    /// Analyze independent uploads in parallel.
    ///
    /// Results are returned in input order; one failing upload does not
    /// affect the others.
    pub fn analyze_batch(
        &self,
        docs: &[RawDocument],
        job_description: Option<&str>,
    ) -> Vec<Result<Analysis>> {
        docs.par_iter()
            .map(|doc| self.analyze_document(doc, job_description))
            .collect()
    }

    /// Run the pipeline on tokio's blocking pool.
    #[cfg(feature = "async")]
    pub async fn analyze_async(
        self: Arc<Self>,
        doc: RawDocument,
        job_description: Option<String>,
    ) -> Result<Analysis> {
        tokio::task::spawn_blocking(move || {
            self.analyze_document(&doc, job_description.as_deref())
        })
        .await
        .map_err(|e| Error::InvariantViolation(format!("analysis task failed: {}", e)))?
    }
}

impl Default for ResumeAts {
    fn default() -> Self {
        Self::new()
    }
}
