// ============================
// crates/backend-lib/src/cache.rs
// ============================
//! Content-addressed artifact cache for translations and synthesized audio.
//!
//! Keys are `<kind>:<sha256(content)>:<lang>`. A miss and a backend error
//! are indistinguishable to callers: both come back as `None` and the
//! caller falls through to the underlying generator. Errors are only ever
//! logged.

use async_trait::async_trait;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};

use crate::config::CacheSettings;

/// Artifact kinds with distinct TTLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Translated text, keyed by source content + target language.
    Translation,
    /// Synthesized audio, keyed by text + language.
    Tts,
}

impl ArtifactKind {
    fn prefix(self) -> &'static str {
        match self {
            ArtifactKind::Translation => "translation",
            ArtifactKind::Tts => "tts",
        }
    }
}

/// Build the content-addressed cache key for an artifact.
pub fn cache_key(kind: ArtifactKind, content: &str, lang: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    format!("{}:{}:{}", kind.prefix(), hex::encode(digest), lang)
}

/// Trait for cache backends
#[async_trait]
pub trait ArtifactCache: Send + Sync {
    async fn get(&self, kind: ArtifactKind, content: &str, lang: &str) -> Option<Vec<u8>>;
    async fn put(&self, kind: ArtifactKind, content: &str, lang: &str, value: Vec<u8>);
    async fn invalidate(&self, prefix: &str);
}

struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-memory implementation with per-kind TTLs.
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
    translation_ttl: Duration,
    tts_ttl: Duration,
}

impl MemoryCache {
    pub fn new(settings: &CacheSettings) -> Self {
        Self {
            entries: DashMap::new(),
            translation_ttl: Duration::from_secs(settings.translation_ttl_secs),
            tts_ttl: Duration::from_secs(settings.tts_ttl_secs),
        }
    }

    fn ttl(&self, kind: ArtifactKind) -> Duration {
        match kind {
            ArtifactKind::Translation => self.translation_ttl,
            ArtifactKind::Tts => self.tts_ttl,
        }
    }

    /// Drop expired entries. Called from a periodic background task.
    pub fn sweep_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl ArtifactCache for MemoryCache {
    async fn get(&self, kind: ArtifactKind, content: &str, lang: &str) -> Option<Vec<u8>> {
        let key = cache_key(kind, content, lang);
        let entry = self.entries.get(&key)?;
        if entry.expires_at <= Instant::now() {
            drop(entry);
            self.entries.remove(&key);
            tracing::debug!(%key, "cache entry expired");
            return None;
        }
        tracing::debug!(%key, "cache hit");
        Some(entry.value.clone())
    }

    async fn put(&self, kind: ArtifactKind, content: &str, lang: &str, value: Vec<u8>) {
        let key = cache_key(kind, content, lang);
        let expires_at = Instant::now() + self.ttl(kind);
        self.entries.insert(key, CacheEntry { value, expires_at });
    }

    async fn invalidate(&self, prefix: &str) {
        self.entries.retain(|key, _| !key.starts_with(prefix));
    }
}
