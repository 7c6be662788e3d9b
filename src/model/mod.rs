//! Data model shared by every pipeline stage.
//!
//! Each stage produces a fresh value from the previous stage's output:
//! [`RawDocument`] → [`TextBlock`]s → [`NormalizedBlock`]s → [`Extraction`]
//! → ([`AtsReport`], [`JobMatchReport`]), gathered into an [`Analysis`].
//! Nothing downstream mutates what an earlier stage produced.

mod block;
mod record;
mod report;

pub use block::{AdapterOutput, LayoutSignals, NormalizedBlock, RawDocument, StyleHint, TextBlock};
pub use record::{
    Certification, Contact, EducationEntry, EndDate, ExperienceEntry, Extraction,
    ExtractionWarning, PartialDate, ProjectEntry, Provenance, ResumeRecord, Section,
    SectionHeading,
};
pub use report::{Analysis, AtsReport, JobMatchReport, ScoreBand, ScoreCategory};
