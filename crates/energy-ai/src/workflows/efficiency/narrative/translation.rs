use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::prompt::translation_prompt;
use super::provider::{OllamaGenerator, ProviderError, TextGenerator};
use crate::config::TranslationConfig;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TranslationError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("translation returned no text")]
    Empty,
}

/// Second generation pass rendering reports in another language.
#[derive(Clone)]
pub struct Translator {
    generator: Arc<dyn TextGenerator>,
    language: String,
    max_chars: usize,
    timeout: Duration,
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("provider", &self.generator.kind())
            .field("language", &self.language)
            .field("max_chars", &self.max_chars)
            .finish()
    }
}

impl Translator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        language: impl Into<String>,
        max_chars: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            language: language.into(),
            max_chars: max_chars.max(1),
            timeout,
        }
    }

    /// Ollama-backed translator built from configuration.
    pub fn from_config(config: &TranslationConfig, timeout: Duration) -> Result<Self, ProviderError> {
        let generator = OllamaGenerator::for_translation(&config.ollama, timeout)?;
        Ok(Self::new(
            Arc::new(generator),
            config.language.clone(),
            config.max_chars,
            timeout,
        ))
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub async fn translate(&self, text: &str) -> Result<String, TranslationError> {
        if text.trim().chars().count() < 3 {
            return Ok(text.to_string());
        }

        let chunks = chunk_paragraphs(text, self.max_chars);
        debug!(chunks = chunks.len(), language = %self.language, "translating text");

        let mut translated = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let prompt = translation_prompt(&self.language, &chunk);
            let output = tokio::time::timeout(self.timeout, self.generator.generate(&prompt))
                .await
                .map_err(|_| ProviderError::Timeout {
                    provider: self.generator.kind(),
                    after: self.timeout,
                })??;
            translated.push(output.trim().to_string());
        }

        let joined = translated.join("\n\n").trim().to_string();
        if joined.is_empty() {
            Err(TranslationError::Empty)
        } else {
            Ok(joined)
        }
    }
}

/// Groups paragraphs into chunks of at most `max_chars` characters; a single paragraph
/// longer than the limit forms its own chunk.
pub(crate) fn chunk_paragraphs(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0;

    for paragraph in text.split("\n\n") {
        let paragraph_len = paragraph.chars().count() + 2;
        if !current.is_empty() && current_len + paragraph_len > max_chars {
            chunks.push(current.join("\n\n"));
            current.clear();
            current_len = 0;
        }
        current.push(paragraph);
        current_len += paragraph_len;
    }

    if !current.is_empty() {
        chunks.push(current.join("\n\n"));
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        assert_eq!(chunk_paragraphs("one\n\ntwo", 100), vec!["one\n\ntwo"]);
    }

    #[test]
    fn paragraphs_are_grouped_under_the_limit() {
        let text = "aaaa\n\nbbbb\n\ncccc";
        assert_eq!(chunk_paragraphs(text, 12), vec!["aaaa\n\nbbbb", "cccc"]);
    }

    #[test]
    fn oversized_paragraph_stands_alone() {
        let text = "short\n\nthis paragraph is much longer than the limit\n\nend";
        let chunks = chunk_paragraphs(text, 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1], "this paragraph is much longer than the limit");
    }
}
