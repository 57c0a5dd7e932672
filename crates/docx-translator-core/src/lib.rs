//! DOCX Translator Core Library
//!
//! This library provides the core functionality for translating Word documents:
//! - Loading and saving `.docx` packages
//! - Paragraph extraction in document order
//! - Translation via OpenAI-compatible APIs
//! - Aligning the translation with the paragraphs it came from
//! - Rewriting the document, translated-only or bilingual
//! - Caching (memory and disk)

pub mod align;
pub mod cache;
pub mod config;
pub mod docx;
pub mod error;
pub mod translator;
pub mod util;

pub use align::{align, PARAGRAPH_MARKER};
pub use cache::{CacheKey, TranslationCache};
pub use config::{
    AppConfig, CacheConfig, Lang, TranslatorConfig, DEFAULT_SOURCE_LANG, DEFAULT_TARGET_LANG,
};
pub use docx::{DocumentRewriter, DocxDocument, Paragraph, ParagraphExtractor, RenderMode};
pub use error::{Error, ErrorKind, Result};
pub use translator::{create_translator, OpenAiTranslator, Translator};
pub use util::{clear_translation_cache, translated_file_name};

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// High-level document translator that combines all components.
///
/// Meant to be built per request: the provider and cache are handed in
/// explicitly rather than looked up globally.
pub struct DocxTranslator {
    translator: Arc<dyn Translator>,
    cache: TranslationCache,
    config: AppConfig,
}

/// Result of translating a document
#[derive(Debug, Clone)]
pub struct TranslatedDocument {
    /// The rewritten `.docx` bytes
    pub bytes: Vec<u8>,
    /// Paragraphs found in the source document
    pub paragraph_count: usize,
    /// How the translation was applied
    pub mode: RenderMode,
    /// Whether the translated text came from the cache
    pub from_cache: bool,
}

impl DocxTranslator {
    /// Create a new document translator with the given configuration
    pub fn new(config: AppConfig) -> Result<Self> {
        let translator = create_translator(&config.translator)?;
        let cache = TranslationCache::new(&config.cache)?;

        Ok(Self {
            translator,
            cache,
            config,
        })
    }

    /// Create with a custom translator
    pub fn with_translator(translator: Arc<dyn Translator>, config: AppConfig) -> Result<Self> {
        let cache = TranslationCache::new(&config.cache)?;

        Ok(Self {
            translator,
            cache,
            config,
        })
    }

    /// Create from already constructed parts
    pub fn from_parts(
        translator: Arc<dyn Translator>,
        cache: TranslationCache,
        config: AppConfig,
    ) -> Self {
        Self {
            translator,
            cache,
            config,
        }
    }

    /// Translate a document using the configured target language and mode
    pub async fn translate_document(&self, bytes: &[u8]) -> Result<TranslatedDocument> {
        self.translate_document_with(bytes, &self.config.target_lang, self.config.render_mode)
            .await
    }

    /// Translate a document: extract, translate, align, rewrite, serialize.
    ///
    /// Either the whole document is rewritten or an error is returned; no
    /// partially translated document is ever produced.
    pub async fn translate_document_with(
        &self,
        bytes: &[u8],
        target: &Lang,
        mode: RenderMode,
    ) -> Result<TranslatedDocument> {
        let mut doc = DocxDocument::load(bytes)?;

        let paragraphs = ParagraphExtractor::new(&doc).extract();
        let paragraph_count = paragraphs.len();

        if paragraphs.iter().all(|p| p.text.trim().is_empty()) {
            debug!("No text in {} paragraph(s), nothing to translate", paragraph_count);
            return Ok(TranslatedDocument {
                bytes: doc.serialize()?,
                paragraph_count,
                mode,
                from_cache: false,
            });
        }

        info!(
            "Translating {} paragraphs to {} with {} ({})",
            paragraph_count,
            target,
            self.translator.name(),
            mode
        );

        let joined = docx::join_paragraphs(&paragraphs);
        let (translated, from_cache) = self.translate_text(&joined, target).await?;

        let translations = align(&translated, paragraph_count)?;
        DocumentRewriter::new(&mut doc).rewrite(&paragraphs, &translations, mode)?;

        Ok(TranslatedDocument {
            bytes: doc.serialize()?,
            paragraph_count,
            mode,
            from_cache,
        })
    }

    /// One provider round trip for the joined text, through the cache and
    /// bounded by the configured timeout.
    async fn translate_text(&self, text: &str, target: &Lang) -> Result<(String, bool)> {
        let source = &self.config.source_lang;
        let info = self.translator.info();
        if source.is_auto() && !info.supports_auto_detect {
            return Err(Error::ConfigInvalid {
                field: "source_lang".to_string(),
                reason: format!("{} needs an explicit source language", info.name),
            });
        }

        let key = CacheKey::new(text, &info.cache_identity(), source, target);

        if let Some(cached) = self.cache.get(&key).await {
            debug!("Cache hit for {}", key);
            return Ok((cached, true));
        }

        let timeout = Duration::from_secs(self.config.translator.timeout_secs);
        let translated = tokio::time::timeout(timeout, self.translator.translate(text, source, target))
            .await
            .map_err(|_| Error::TranslationTimeout)??;

        // Only replies that line up are worth keeping
        if align(&translated, text.split(PARAGRAPH_MARKER).count()).is_ok() {
            self.cache.insert(&key, &translated).await;
        }

        Ok((translated, false))
    }

    pub const fn config(&self) -> &AppConfig {
        &self.config
    }
}
