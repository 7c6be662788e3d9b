//! Document format tags, extension mapping and magic-byte sniffing.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

/// Container formats the pipeline can adapt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Pptx,
}

impl DocumentFormat {
    /// All supported formats.
    pub const ALL: [DocumentFormat; 3] =
        [DocumentFormat::Pdf, DocumentFormat::Docx, DocumentFormat::Pptx];

    /// Lowercase tag, also the canonical file extension.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Pptx => "pptx",
        }
    }

    /// MIME type of the container.
    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "application/pdf",
            DocumentFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            DocumentFormat::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
        }
    }

    /// Parse a declared format tag.
    ///
    /// Accepts tags (`pdf`, `.docx`), MIME types, and is case-insensitive.
    /// Legacy binary Office formats are rejected explicitly.
    pub fn from_tag(tag: &str) -> Result<Self> {
        let tag = tag.trim().trim_start_matches('.').to_ascii_lowercase();
        let format = match tag.as_str() {
            "pdf" | "application/pdf" => DocumentFormat::Pdf,
            "docx" => DocumentFormat::Docx,
            "pptx" => DocumentFormat::Pptx,
            "doc" | "ppt" | "application/msword" | "application/vnd.ms-powerpoint" => {
                return Err(Error::UnsupportedFormat(format!(
                    "legacy binary format '{}' is not supported; save it as docx or pptx",
                    tag
                )))
            }
            other if other == DocumentFormat::Docx.mime_type() => DocumentFormat::Docx,
            other if other == DocumentFormat::Pptx.mime_type() => DocumentFormat::Pptx,
            other => {
                return Err(Error::UnsupportedFormat(format!(
                    "unknown format tag '{}'",
                    other
                )))
            }
        };
        Ok(format)
    }

    /// Determine the format from a file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                Error::UnsupportedFormat(format!("'{}' has no file extension", path.display()))
            })?;
        Self::from_tag(ext)
    }
}

impl FromStr for DocumentFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_tag(s)
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
/// ZIP local file header.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Sniff the format from content bytes.
///
/// Returns `None` when the bytes are neither a PDF nor an OOXML package
/// this crate understands.
pub fn sniff_format(data: &[u8]) -> Option<DocumentFormat> {
    if data.starts_with(PDF_MAGIC) {
        return Some(DocumentFormat::Pdf);
    }
    if !data.starts_with(ZIP_MAGIC) {
        return None;
    }

    let archive = zip::ZipArchive::new(Cursor::new(data)).ok()?;
    let mut format = None;
    for name in archive.file_names() {
        match name {
            "word/document.xml" => format = Some(DocumentFormat::Docx),
            "ppt/presentation.xml" => format = Some(DocumentFormat::Pptx),
            _ => continue,
        }
        break;
    }
    format
}

/// Detect the format of a file, preferring content over the extension.
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<DocumentFormat> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    match sniff_format(&data) {
        Some(format) => Ok(format),
        None => DocumentFormat::from_path(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag_variants() {
        assert_eq!(DocumentFormat::from_tag("pdf").unwrap(), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_tag(".DOCX").unwrap(), DocumentFormat::Docx);
        assert_eq!(
            DocumentFormat::from_tag(
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            )
            .unwrap(),
            DocumentFormat::Pptx
        );
    }

    #[test]
    fn test_legacy_formats_rejected() {
        for tag in ["doc", "ppt", "application/msword"] {
            let err = DocumentFormat::from_tag(tag).unwrap_err();
            assert!(matches!(err, Error::UnsupportedFormat(_)), "{}", tag);
        }
    }

    #[test]
    fn test_unknown_tag() {
        assert!(matches!(
            "odt".parse::<DocumentFormat>(),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            DocumentFormat::from_path("cv/jane.PDF").unwrap(),
            DocumentFormat::Pdf
        );
        assert!(DocumentFormat::from_path("README").is_err());
    }

    #[test]
    fn test_sniff_pdf() {
        assert_eq!(sniff_format(b"%PDF-1.7\n%\xe2\xe3"), Some(DocumentFormat::Pdf));
        assert_eq!(sniff_format(b"<!DOCTYPE html>"), None);
        assert_eq!(sniff_format(b"PK\x03\x04garbage"), None);
    }

    #[test]
    fn test_display_roundtrip() {
        for format in DocumentFormat::ALL {
            assert_eq!(format.to_string().parse::<DocumentFormat>().unwrap(), format);
        }
    }
}
