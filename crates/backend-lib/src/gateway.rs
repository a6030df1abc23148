// ============================
// crates/backend-lib/src/gateway.rs
// ============================
//! Cache-first orchestrators over the speech/translation provider.
//!
//! The gateway never retries and never fails the caller: translation
//! degrades to the original text with an error flag, transcription and
//! synthesis degrade to `None`. The coordinator decides what to do with
//! a degraded result.

use std::sync::Arc;

use crate::cache::{ArtifactCache, ArtifactKind};
use crate::provider::SpeechProvider;

/// Voice used when a language has no table entry.
const DEFAULT_VOICE: &str = "alloy";

/// Deterministic per-language voice selection.
fn voice_for_language(language: &str) -> &'static str {
    let primary = language
        .split(['-', '_'])
        .next()
        .unwrap_or(language)
        .to_ascii_lowercase();
    match primary.as_str() {
        "es" => "nova",
        "fr" => "shimmer",
        "de" => "onyx",
        "it" => "fable",
        "pt" => "echo",
        _ => DEFAULT_VOICE,
    }
}

/// Translation / STT / TTS front door used by the coordinator.
#[derive(Clone)]
pub struct Gateway {
    provider: Arc<dyn SpeechProvider>,
    cache: Arc<dyn ArtifactCache>,
}

impl Gateway {
    pub fn new(provider: Arc<dyn SpeechProvider>, cache: Arc<dyn ArtifactCache>) -> Self {
        Self { provider, cache }
    }

    /// Translate `text` into `target`. Returns `(translation, errored)`;
    /// on provider failure the original text comes back with the error
    /// flag set and the message still flows.
    pub async fn translate(
        &self,
        text: &str,
        target: &str,
        source: Option<&str>,
    ) -> (String, bool) {
        if let Some(bytes) = self
            .cache
            .get(ArtifactKind::Translation, text, target)
            .await
        {
            if let Ok(cached) = String::from_utf8(bytes) {
                metrics::counter!(crate::metrics::TRANSLATION_CACHE_HIT).increment(1);
                return (cached, false);
            }
        }

        match self.provider.translate(text, source, target).await {
            Ok(translation) => {
                self.cache
                    .put(
                        ArtifactKind::Translation,
                        text,
                        target,
                        translation.clone().into_bytes(),
                    )
                    .await;
                (translation, false)
            }
            Err(e) => {
                tracing::warn!(error = %e, %target, "translation degraded, passing original through");
                (text.to_string(), true)
            }
        }
    }

    /// Transcribe audio to text. `None` on provider failure or an empty
    /// transcript; the caller decides whether to abort.
    pub async fn transcribe(&self, audio: Vec<u8>, language: Option<&str>) -> Option<String> {
        metrics::counter!(crate::metrics::STT_REQUEST).increment(1);
        match self.provider.transcribe(audio, language).await {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => {
                tracing::warn!("transcription returned empty text");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "transcription failed");
                None
            }
        }
    }

    /// Render text to audio. Cache-first; `None` on provider failure.
    pub async fn synthesize(&self, text: &str, language: &str) -> Option<Vec<u8>> {
        if let Some(audio) = self.cache.get(ArtifactKind::Tts, text, language).await {
            metrics::counter!(crate::metrics::TTS_CACHE_HIT).increment(1);
            return Some(audio);
        }

        metrics::counter!(crate::metrics::TTS_REQUEST).increment(1);
        let voice = voice_for_language(language);
        match self.provider.synthesize(text, voice).await {
            Ok(audio) => {
                self.cache
                    .put(ArtifactKind::Tts, text, language, audio.clone())
                    .await;
                Some(audio)
            }
            Err(e) => {
                tracing::warn!(error = %e, %language, "synthesis failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::config::CacheSettings;
    use crate::provider::ProviderError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Counts calls and fails on demand.
    struct ScriptedProvider {
        fail: AtomicBool,
        translate_calls: AtomicUsize,
        synthesize_calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new() -> Self {
            Self {
                fail: AtomicBool::new(false),
                translate_calls: AtomicUsize::new(0),
                synthesize_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SpeechProvider for ScriptedProvider {
        async fn translate(
            &self,
            text: &str,
            _source: Option<&str>,
            target: &str,
        ) -> Result<String, ProviderError> {
            self.translate_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(ProviderError("scripted failure".to_string()));
            }
            Ok(format!("[{target}] {text}"))
        }

        async fn transcribe(
            &self,
            _audio: Vec<u8>,
            _language: Option<&str>,
        ) -> Result<String, ProviderError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ProviderError("scripted failure".to_string()));
            }
            Ok("transcribed".to_string())
        }

        async fn synthesize(&self, _text: &str, _voice: &str) -> Result<Vec<u8>, ProviderError> {
            self.synthesize_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(ProviderError("scripted failure".to_string()));
            }
            Ok(vec![1, 2, 3])
        }
    }

    fn gateway() -> (Gateway, Arc<ScriptedProvider>) {
        let provider = Arc::new(ScriptedProvider::new());
        let cache = Arc::new(MemoryCache::new(&CacheSettings {
            translation_ttl_secs: 3600,
            tts_ttl_secs: 3600,
        }));
        (Gateway::new(provider.clone(), cache), provider)
    }

    #[tokio::test]
    async fn translate_hits_cache_on_second_call() {
        let (gateway, provider) = gateway();

        let (first, errored) = gateway.translate("hello", "es", Some("en")).await;
        assert_eq!(first, "[es] hello");
        assert!(!errored);

        let (second, errored) = gateway.translate("hello", "es", Some("en")).await;
        assert_eq!(second, first);
        assert!(!errored);
        assert_eq!(provider.translate_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn translate_degrades_to_original_on_failure() {
        let (gateway, provider) = gateway();
        provider.fail.store(true, Ordering::SeqCst);

        let (text, errored) = gateway.translate("pain", "fr", Some("en")).await;
        assert_eq!(text, "pain");
        assert!(errored);
    }

    #[tokio::test]
    async fn failed_translations_are_not_cached() {
        let (gateway, provider) = gateway();
        provider.fail.store(true, Ordering::SeqCst);
        let _ = gateway.translate("pain", "fr", Some("en")).await;

        provider.fail.store(false, Ordering::SeqCst);
        let (text, errored) = gateway.translate("pain", "fr", Some("en")).await;
        assert_eq!(text, "[fr] pain");
        assert!(!errored);
    }

    #[tokio::test]
    async fn transcribe_maps_failure_and_empty_to_none() {
        let (gateway, provider) = gateway();
        assert_eq!(
            gateway.transcribe(vec![0], Some("en")).await.as_deref(),
            Some("transcribed")
        );

        provider.fail.store(true, Ordering::SeqCst);
        assert!(gateway.transcribe(vec![0], Some("en")).await.is_none());
    }

    #[tokio::test]
    async fn synthesize_is_cache_first() {
        let (gateway, provider) = gateway();

        assert_eq!(gateway.synthesize("hi", "en").await, Some(vec![1, 2, 3]));
        assert_eq!(gateway.synthesize("hi", "en").await, Some(vec![1, 2, 3]));
        assert_eq!(provider.synthesize_calls.load(Ordering::SeqCst), 1);

        provider.fail.store(true, Ordering::SeqCst);
        // still served from cache
        assert!(gateway.synthesize("hi", "en").await.is_some());
        // uncached text degrades to None
        assert!(gateway.synthesize("other", "en").await.is_none());
    }

    #[test]
    fn voices_are_deterministic_with_neutral_default() {
        assert_eq!(voice_for_language("es"), "nova");
        assert_eq!(voice_for_language("es-MX"), "nova");
        assert_eq!(voice_for_language("fr"), "shimmer");
        assert_eq!(voice_for_language("xx"), DEFAULT_VOICE);
        assert_eq!(voice_for_language("en"), DEFAULT_VOICE);
    }
}
