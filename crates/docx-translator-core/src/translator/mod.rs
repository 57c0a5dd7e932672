//! Translation backends.
//!
//! The pipeline only sees [`Translator`]; backends are built from
//! [`TranslatorConfig`] by [`create_translator`].

mod openai;
mod traits;

pub use openai::OpenAiTranslator;
pub use traits::{Translator, TranslatorInfo};

use crate::config::TranslatorConfig;
use crate::error::{Error, Result};
use std::sync::Arc;

/// Build the OpenAI-compatible backend described by `config`.
pub fn create_translator(config: &TranslatorConfig) -> Result<Arc<dyn Translator>> {
    if config.api_base.trim().is_empty() {
        return Err(Error::ConfigInvalid {
            field: "translator.api_base".to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    if config.model.trim().is_empty() {
        return Err(Error::ConfigInvalid {
            field: "translator.model".to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    let translator = OpenAiTranslator::new(
        config.api_base.clone(),
        config.api_key.clone().filter(|key| !key.trim().is_empty()),
        config.model.clone(),
        config.retry_count,
        config.retry_delay_ms,
    )?;

    Ok(Arc::new(translator))
}
