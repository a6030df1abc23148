// ============================
// crates/backend-lib/src/provider.rs
// ============================
//! HTTP adapter for the external LLM / ASR / TTS provider.
//!
//! One method per concern, one attempt per call, no retry policy. Two
//! client tiers with distinct deadlines: chat-completion translation is
//! quick, speech endpoints move audio and get a longer deadline.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use crate::config::ProviderSettings;

/// Single-variant provider failure; the gateway maps it to degradation.
#[derive(Error, Debug)]
#[error("provider call failed: {0}")]
pub struct ProviderError(pub String);

/// Trait for translation / speech providers
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Translate `text` into `target`. `source` is a hint; providers may
    /// detect the source language themselves.
    async fn translate(
        &self,
        text: &str,
        source: Option<&str>,
        target: &str,
    ) -> Result<String, ProviderError>;

    /// Transcribe raw audio bytes to text.
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        language: Option<&str>,
    ) -> Result<String, ProviderError>;

    /// Render text to audio bytes with the given voice.
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, ProviderError>;
}

/// Temperature for translation requests. Low, for consistency.
const TRANSLATE_TEMPERATURE: f64 = 0.3;

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct Transcription {
    text: String,
}

/// Provider implementation over an OpenAI-compatible HTTP API.
pub struct HttpProvider {
    base_url: String,
    api_key: String,
    chat_model: String,
    stt_model: String,
    tts_model: String,
    /// Short-deadline client for translation.
    chat_client: reqwest::Client,
    /// Longer-deadline client for audio transcription and synthesis.
    speech_client: reqwest::Client,
}

impl HttpProvider {
    pub fn new(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let chat_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.translate_timeout_secs))
            .build()
            .map_err(|e| ProviderError(format!("failed to build HTTP client: {e}")))?;
        let speech_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.speech_timeout_secs))
            .build()
            .map_err(|e| ProviderError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            chat_model: settings.chat_model.clone(),
            stt_model: settings.stt_model.clone(),
            tts_model: settings.tts_model.clone(),
            chat_client,
            speech_client,
        })
    }
}

#[async_trait]
impl SpeechProvider for HttpProvider {
    async fn translate(
        &self,
        text: &str,
        source: Option<&str>,
        target: &str,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let system = match source {
            Some(src) => format!(
                "You are a medical interpreter. Translate the user's message from {src} to {target}. \
                 Reply with the translation only."
            ),
            None => format!(
                "You are a medical interpreter. Translate the user's message to {target}. \
                 Reply with the translation only."
            ),
        };

        let response = self
            .chat_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.chat_model,
                "temperature": TRANSLATE_TEMPERATURE,
                "messages": [
                    { "role": "system", "content": system },
                    { "role": "user", "content": text },
                ],
            }))
            .send()
            .await
            .map_err(|e| ProviderError(format!("translation request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError(format!(
                "translation request returned {status}"
            )));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| ProviderError(format!("malformed translation response: {e}")))?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| ProviderError("translation response had no choices".to_string()))
    }

    async fn transcribe(
        &self,
        audio: Vec<u8>,
        language: Option<&str>,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/audio/transcriptions", self.base_url);

        let file = reqwest::multipart::Part::bytes(audio)
            .file_name("audio.webm")
            .mime_str("application/octet-stream")
            .map_err(|e| ProviderError(format!("failed to build audio part: {e}")))?;
        let mut form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("model", self.stt_model.clone());
        if let Some(lang) = language {
            form = form.text("language", lang.to_string());
        }

        let response = self
            .speech_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProviderError(format!("transcription request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError(format!(
                "transcription request returned {status}"
            )));
        }

        let transcription: Transcription = response
            .json()
            .await
            .map_err(|e| ProviderError(format!("malformed transcription response: {e}")))?;
        Ok(transcription.text)
    }

    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, ProviderError> {
        let url = format!("{}/audio/speech", self.base_url);

        let response = self
            .speech_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.tts_model,
                "voice": voice,
                "input": text,
            }))
            .send()
            .await
            .map_err(|e| ProviderError(format!("synthesis request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError(format!(
                "synthesis request returned {status}"
            )));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| ProviderError(format!("failed to read synthesis body: {e}")))
    }
}
