// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The translation backend boundary.

use async_trait::async_trait;
use isk_core::TranslateError;

/// Language codes the lightweight MT backends commonly support, ISO 639-1.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "en", "es", "fr", "de", "it", "pt", "ru", "zh", "ja", "ko", "ar", "hi", "tr", "pl", "nl", "sv",
    "da", "fi", "no", "cs", "ro", "hu", "bg", "hr", "sk", "sl", "et", "lv", "lt", "el",
];

/// A machine-translation backend.
///
/// The job processor and handler only see this trait; the worker pool is
/// the production implementation. Callers enforce their own deadlines by
/// wrapping calls — dropping the future releases any acquired worker.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate text between two backend-form (lowercase ISO 639-1)
    /// language codes.
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslateError>;

    /// Verify the backend is ready by running one synthetic translation.
    async fn check_health(&self) -> Result<(), TranslateError>;

    /// Language codes this backend supports.
    fn supported_languages(&self) -> Vec<String> {
        SUPPORTED_LANGUAGES.iter().map(|s| s.to_string()).collect()
    }
}
