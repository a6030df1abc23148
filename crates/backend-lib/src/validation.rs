// ============================
// crates/backend-lib/src/validation.rs
// ============================
//! Payload validation for inbound socket events.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::error::AppError;

/// Maximum message body length in characters.
pub const MAX_CONTENT_CHARS: usize = 4_000;
/// Maximum text length accepted for synthesis.
pub const MAX_TTS_CHARS: usize = 4_000;
/// Maximum decoded audio upload size.
pub const MAX_AUDIO_BYTES: usize = 10 * 1024 * 1024;

static LANGUAGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{2,8})*$").unwrap());

/// Possible validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("content must not be empty")]
    EmptyContent,

    #[error("content exceeds {MAX_CONTENT_CHARS} characters")]
    ContentTooLong,

    #[error("invalid language code: {0}")]
    InvalidLanguage(String),

    #[error("audio upload exceeds {MAX_AUDIO_BYTES} bytes")]
    AudioTooLarge,
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::InvalidArgument(e.to_string())
    }
}

/// Reject empty / whitespace-only or oversized message content.
pub fn validate_content(content: &str) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(ValidationError::ContentTooLong);
    }
    Ok(())
}

/// Validate a BCP-47-ish short language code such as `en` or `pt-BR`.
pub fn validate_language(language: &str) -> Result<(), ValidationError> {
    if LANGUAGE_REGEX.is_match(language) {
        Ok(())
    } else {
        Err(ValidationError::InvalidLanguage(language.to_string()))
    }
}

/// Reject audio buffers beyond the upload cap.
pub fn validate_audio_size(len: usize) -> Result<(), ValidationError> {
    if len > MAX_AUDIO_BYTES {
        return Err(ValidationError::AudioTooLarge);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_whitespace_content_rejected() {
        assert!(validate_content("").is_err());
        assert!(validate_content("   \n\t ").is_err());
        assert!(validate_content("hello").is_ok());
    }

    #[test]
    fn oversized_content_rejected() {
        let long = "a".repeat(MAX_CONTENT_CHARS + 1);
        assert!(matches!(
            validate_content(&long),
            Err(ValidationError::ContentTooLong)
        ));
        let exactly = "a".repeat(MAX_CONTENT_CHARS);
        assert!(validate_content(&exactly).is_ok());
    }

    #[test]
    fn language_codes() {
        assert!(validate_language("en").is_ok());
        assert!(validate_language("es").is_ok());
        assert!(validate_language("pt-BR").is_ok());
        assert!(validate_language("yue").is_ok());
        assert!(validate_language("").is_err());
        assert!(validate_language("english language").is_err());
        assert!(validate_language("e").is_err());
    }

    #[test]
    fn audio_size_cap() {
        assert!(validate_audio_size(1024).is_ok());
        assert!(validate_audio_size(MAX_AUDIO_BYTES).is_ok());
        assert!(validate_audio_size(MAX_AUDIO_BYTES + 1).is_err());
    }
}
