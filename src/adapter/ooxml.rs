//! Shared helpers for OOXML packages (DOCX, PPTX).

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{Error, Result};

/// Upper bound for a single uncompressed XML part.
const MAX_PART_BYTES: u64 = 64 * 1024 * 1024;

/// Open a package from memory.
pub fn open_package(bytes: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>> {
    Ok(ZipArchive::new(Cursor::new(bytes))?)
}

/// Read a part as UTF-8 text; `None` when the part does not exist.
pub fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if file.size() > MAX_PART_BYTES {
        return Err(Error::CorruptDocument(format!(
            "part '{}' is implausibly large ({} bytes)",
            name,
            file.size()
        )));
    }
    let mut xml = String::with_capacity(file.size() as usize);
    file.read_to_string(&mut xml)
        .map_err(|e| Error::CorruptDocument(format!("part '{}' is unreadable: {}", name, e)))?;
    Ok(Some(xml))
}

/// Read a part that must exist.
pub fn require_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    read_part(archive, name)?
        .ok_or_else(|| Error::CorruptDocument(format!("missing required part '{}'", name)))
}

/// Attribute value by qualified name.
pub fn attr(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Whether an on/off property (`<w:b/>`, `b="1"`) is switched on.
pub fn is_on(value: Option<&str>) -> bool {
    !matches!(value, Some("0") | Some("false") | Some("off") | Some("none"))
}

/// Unescaped text content, falling back to lossy UTF-8.
pub fn text_of(t: &BytesText<'_>) -> String {
    match t.unescape() {
        Ok(s) => s.into_owned(),
        Err(_) => String::from_utf8_lossy(t).into_owned(),
    }
}

/// Parse a relationships part into `Id → Target`.
pub fn parse_relationships(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut rels = HashMap::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (attr(&e, b"Id"), attr(&e, b"Target")) {
                    rels.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(rels)
}

/// Resolve a relationship target against the directory of its source part.
pub fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            ".." => {
                parts.pop();
            }
            "." | "" => {}
            s => parts.push(s),
        }
    }
    parts.join("/")
}

/// Most frequent size in a glyph-weighted histogram.
pub fn dominant_size(histogram: &HashMap<u32, usize>) -> Option<u32> {
    histogram
        .iter()
        .max_by(|(ka, ca), (kb, cb)| ca.cmp(cb).then(kb.cmp(ka)))
        .map(|(k, _)| *k)
}
