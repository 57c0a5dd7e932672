use async_trait::async_trait;

use crate::config::Lang;
use crate::error::Result;

/// Describes a translation backend
#[derive(Debug, Clone)]
pub struct TranslatorInfo {
    /// Human-readable name
    pub name: &'static str,
    /// Model behind the backend, when it serves more than one
    pub model: Option<String>,
    /// Whether `auto` is accepted as the source language
    pub supports_auto_detect: bool,
}

impl TranslatorInfo {
    /// Identity used in cache keys. Two models of one backend never share
    /// cached translations.
    pub fn cache_identity(&self) -> String {
        match &self.model {
            Some(model) => format!("{}/{}", self.name, model),
            None => self.name.to_string(),
        }
    }
}

/// Trait for translation backends
///
/// `text` holds whole paragraphs separated by newlines. Implementations must
/// return exactly one line per input line, in the same order, blank lines
/// included: the reply is split back into paragraphs on those newlines.
#[async_trait]
pub trait Translator: Send + Sync {
    fn info(&self) -> TranslatorInfo;

    fn name(&self) -> &'static str {
        self.info().name
    }

    /// Translate newline-separated paragraphs into the target language
    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String>;
}
