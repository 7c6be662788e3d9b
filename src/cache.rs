//! Content-hash cache of adapter output.
//!
//! Re-analyzing the same upload (for example against several job
//! descriptions) skips the adapter. Entries are keyed by an MD5 fingerprint
//! of the bytes plus the declared format and are never mutated once stored.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use md5::{Digest, Md5};

use crate::detect::DocumentFormat;
use crate::error::Result;
use crate::model::{AdapterOutput, RawDocument};

/// Cache key: content fingerprint and declared format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    digest: [u8; 16],
    format: DocumentFormat,
}

impl CacheKey {
    /// Fingerprint a document.
    pub fn of(doc: &RawDocument) -> Self {
        let mut digest = [0u8; 16];
        digest.copy_from_slice(&Md5::digest(doc.bytes()));
        Self {
            digest,
            format: doc.format(),
        }
    }

    /// Hex form of the fingerprint.
    pub fn hex(&self) -> String {
        self.digest.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Bounded, thread-safe cache of [`AdapterOutput`]s.
#[derive(Debug)]
pub struct BlockCache {
    entries: RwLock<HashMap<CacheKey, Arc<AdapterOutput>>>,
    max_entries: usize,
}

impl BlockCache {
    /// Create a cache holding at most `max_entries` documents.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries,
        }
    }

    /// Cached output for a document.
    pub fn get(&self, doc: &RawDocument) -> Option<Arc<AdapterOutput>> {
        let key = CacheKey::of(doc);
        self.entries.read().ok()?.get(&key).cloned()
    }

    /// Store output for a document.
    ///
    /// When the cache is full the output is returned without being stored.
    pub fn insert(&self, doc: &RawDocument, output: AdapterOutput) -> Arc<AdapterOutput> {
        let key = CacheKey::of(doc);
        let output = Arc::new(output);
        if let Ok(mut entries) = self.entries.write() {
            if let Some(existing) = entries.get(&key) {
                return Arc::clone(existing);
            }
            if entries.len() < self.max_entries {
                entries.insert(key, Arc::clone(&output));
            } else {
                log::debug!("block cache full, not caching {}", key.hex());
            }
        }
        output
    }

    /// Cached output, or run `extract` and cache its result.
    ///
    /// Errors are never cached.
    pub fn get_or_extract<F>(&self, doc: &RawDocument, extract: F) -> Result<Arc<AdapterOutput>>
    where
        F: FnOnce() -> Result<AdapterOutput>,
    {
        if let Some(hit) = self.get(doc) {
            log::debug!("block cache hit");
            return Ok(hit);
        }
        Ok(self.insert(doc, extract()?))
    }

    /// Number of cached documents.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of cached documents.
    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Drop every entry.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}

impl Default for BlockCache {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::TextBlock;

    fn doc(bytes: &[u8], format: DocumentFormat) -> RawDocument {
        RawDocument::new(bytes.to_vec(), format)
    }

    fn output(text: &str) -> AdapterOutput {
        AdapterOutput {
            blocks: vec![TextBlock::new(text, 1, 0)],
            signals: Default::default(),
        }
    }

    #[test]
    fn test_key_depends_on_format() {
        let a = CacheKey::of(&doc(b"same", DocumentFormat::Docx));
        let b = CacheKey::of(&doc(b"same", DocumentFormat::Pptx));
        assert_ne!(a, b);
        assert_eq!(a.hex().len(), 32);
    }

    #[test]
    fn test_get_or_extract_runs_once() {
        let cache = BlockCache::new(4);
        let d = doc(b"resume", DocumentFormat::Pdf);
        let mut calls = 0;
        let first = cache
            .get_or_extract(&d, || {
                calls += 1;
                Ok(output("x"))
            })
            .unwrap();
        let second = cache
            .get_or_extract(&d, || {
                calls += 1;
                Ok(output("y"))
            })
            .unwrap();
        assert_eq!(calls, 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = BlockCache::new(4);
        let d = doc(b"bad", DocumentFormat::Pdf);
        let result = cache.get_or_extract(&d, || Err(Error::CorruptDocument("x".into())));
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_is_respected() {
        let cache = BlockCache::new(1);
        cache.insert(&doc(b"a", DocumentFormat::Pdf), output("a"));
        let b = doc(b"b", DocumentFormat::Pdf);
        let stored = cache.insert(&b, output("b"));
        assert_eq!(stored.blocks[0].text, "b");
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&b).is_none());
        cache.clear();
        assert!(cache.is_empty());
    }
}
