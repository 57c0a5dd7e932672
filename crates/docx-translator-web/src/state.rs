use anyhow::Result;
use docx_translator_core::{
    create_translator, AppConfig, DocxTranslator, Lang, RenderMode, TranslationCache, Translator,
    TranslatorConfig,
};
use std::sync::Arc;

/// Builds the translation provider for a request
pub type TranslatorFactory = Arc<
    dyn Fn(&TranslatorConfig) -> docx_translator_core::Result<Arc<dyn Translator>> + Send + Sync,
>;

/// Global application state
///
/// Nothing here is request specific: every request gets its own
/// `DocxTranslator` built from this base configuration.
pub struct AppState {
    /// Base configuration (contains OpenAI settings in translator field)
    pub config: AppConfig,
    /// Shared across requests so repeated uploads hit the cache
    cache: TranslationCache,
    translator_factory: TranslatorFactory,
}

impl AppState {
    /// Create state backed by the OpenAI-compatible provider.
    ///
    /// Opens the translation cache, so this fails fast if another process
    /// holds the disk cache lock.
    pub fn new(config: AppConfig) -> Result<Self> {
        let cache = TranslationCache::new(&config.cache)
            .map_err(|e| anyhow::anyhow!("Failed to open translation cache: {e}"))?;

        Ok(Self::with_parts(config, cache, Arc::new(create_translator)))
    }

    pub fn with_parts(
        config: AppConfig,
        cache: TranslationCache,
        translator_factory: TranslatorFactory,
    ) -> Self {
        Self {
            config,
            cache,
            translator_factory,
        }
    }

    /// Create a document translator for one request.
    pub fn create_translator(
        &self,
        target_lang: Lang,
        render_mode: RenderMode,
    ) -> docx_translator_core::Result<DocxTranslator> {
        let mut config = self.config.clone();
        config.target_lang = target_lang;
        config.render_mode = render_mode;

        let translator = (self.translator_factory)(&config.translator)?;
        Ok(DocxTranslator::from_parts(
            translator,
            self.cache.clone(),
            config,
        ))
    }
}
