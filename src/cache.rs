//! Bounded memoisation of extraction results.
//!
//! Extraction is idempotent for identical (bytes, extension, language), so
//! repeated inputs are served from memory instead of running OCR again.
//! The cache is capped by bytes (input bytes + cached text) and evicts the
//! least recently used entry first. Only successful extractions are stored.

use crate::config::Language;
use crate::pipeline::input::FileKind;
use lru::LruCache;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    digest: u64,
    len: usize,
    kind: FileKind,
    language: Language,
}

impl CacheKey {
    fn new(bytes: &[u8], kind: FileKind, language: Language) -> Self {
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        Self {
            digest: hasher.finish(),
            len: bytes.len(),
            kind,
            language,
        }
    }
}

#[derive(Debug)]
struct Entry {
    // Kept to confirm a hit byte-for-byte; the digest alone is not trusted.
    source: Vec<u8>,
    text: String,
}

impl Entry {
    fn cost(&self) -> usize {
        self.source.len() + self.text.len()
    }
}

/// LRU cache of extracted text keyed by file content, extension and language.
///
/// The underlying [`LruCache`] is unbounded by count; the byte budget is
/// enforced here by popping the least recently used entries.
pub struct ExtractionCache {
    entries: LruCache<CacheKey, Entry>,
    capacity_bytes: usize,
    used_bytes: usize,
    hits: u64,
    misses: u64,
}

impl ExtractionCache {
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            entries: LruCache::unbounded(),
            capacity_bytes,
            used_bytes: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Look up a previous extraction of exactly these bytes.
    pub fn get(&mut self, bytes: &[u8], kind: FileKind, language: Language) -> Option<String> {
        let key = CacheKey::new(bytes, kind, language);
        match self.entries.get(&key) {
            Some(entry) if entry.source == bytes => {
                self.hits += 1;
                Some(entry.text.clone())
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store an extraction result, evicting least recently used entries until
    /// it fits. Entries larger than the whole capacity are not stored.
    pub fn insert(&mut self, bytes: &[u8], kind: FileKind, language: Language, text: String) {
        let key = CacheKey::new(bytes, kind, language);
        let cost = bytes.len() + text.len();
        if cost > self.capacity_bytes {
            debug!(
                "Not caching {} byte result (capacity {})",
                cost, self.capacity_bytes
            );
            return;
        }

        if let Some(old) = self.entries.pop(&key) {
            self.used_bytes -= old.cost();
        }

        while self.used_bytes + cost > self.capacity_bytes {
            match self.entries.pop_lru() {
                Some((_, evicted)) => {
                    self.used_bytes -= evicted.cost();
                    debug!("Evicted cached extraction ({} bytes)", evicted.cost());
                }
                None => break,
            }
        }

        self.used_bytes += cost;
        self.entries.put(
            key,
            Entry {
                source: bytes.to_vec(),
                text,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

impl std::fmt::Debug for ExtractionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionCache")
            .field("entries", &self.entries.len())
            .field("used_bytes", &self.used_bytes)
            .field("capacity_bytes", &self.capacity_bytes)
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}
