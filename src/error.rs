//! Error types for resume-ats library.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias for resume-ats operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while analyzing a résumé.
///
/// Input errors (`UnsupportedFormat`, `CorruptDocument`, `NoExtractableText`,
/// `ExtractionTimeout`) are surfaced to callers as-is. Missing or ambiguous
/// résumé fields are never errors; they show up as extraction warnings.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The declared format is not one of the supported containers, or the
    /// selected adapter cannot handle it.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The container or content stream could not be parsed.
    #[error("Corrupt document: {0}")]
    CorruptDocument(String),

    /// The document has pages but no text layer (typically a scanned image).
    #[error("No extractable text: {pages} page(s) contain only images")]
    NoExtractableText {
        /// Number of image-only pages found.
        pages: u32,
    },

    /// The adapter did not finish within the configured time limit.
    #[error("Extraction timed out after {limit_ms} ms")]
    ExtractionTimeout {
        /// Configured limit in milliseconds.
        limit_ms: u64,
    },

    /// An adapter produced output that breaks a pipeline invariant.
    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),

    /// A rule table failed to load or validate.
    #[error("Rule table error: {0}")]
    RuleTable(String),

    /// Error during rendering (JSON, text).
    #[error("Rendering error: {0}")]
    Render(String),
}

/// Stable, machine-readable error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Io,
    UnsupportedFormat,
    CorruptDocument,
    NoExtractableText,
    ExtractionTimeout,
    InvariantViolation,
    RuleTable,
    Render,
}

impl ErrorKind {
    /// Snake-case identifier suitable for API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Io => "io",
            ErrorKind::UnsupportedFormat => "unsupported_format",
            ErrorKind::CorruptDocument => "corrupt_document",
            ErrorKind::NoExtractableText => "no_extractable_text",
            ErrorKind::ExtractionTimeout => "extraction_timeout",
            ErrorKind::InvariantViolation => "invariant_violation",
            ErrorKind::RuleTable => "rule_table",
            ErrorKind::Render => "render",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Get the stable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Error::CorruptDocument(_) => ErrorKind::CorruptDocument,
            Error::NoExtractableText { .. } => ErrorKind::NoExtractableText,
            Error::ExtractionTimeout { .. } => ErrorKind::ExtractionTimeout,
            Error::InvariantViolation(_) => ErrorKind::InvariantViolation,
            Error::RuleTable(_) => ErrorKind::RuleTable,
            Error::Render(_) => ErrorKind::Render,
        }
    }

    /// Whether the error was caused by the uploaded document itself.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::UnsupportedFormat
                | ErrorKind::CorruptDocument
                | ErrorKind::NoExtractableText
                | ErrorKind::ExtractionTimeout
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => {
                Error::CorruptDocument("PDF is encrypted and cannot be read".to_string())
            }
            _ => Error::CorruptDocument(format!("PDF: {}", err)),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => {
                Error::CorruptDocument(format!("container read failed: {}", e))
            }
            _ => Error::CorruptDocument(format!("container: {}", err)),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::CorruptDocument(format!("XML: {}", err))
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::RuleTable(err.to_string())
    }
}
