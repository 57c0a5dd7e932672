use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::config::Lang;
use crate::error::{Error, Result};
use super::traits::{Translator, TranslatorInfo};

/// Default number of attempts (no retry)
pub const DEFAULT_RETRY_COUNT: u32 = 1;
/// Default delay between retries in milliseconds
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Per-attempt HTTP timeout. Whole documents go out in one request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// OpenAI-compatible API translator
/// Works with: llama.cpp server, Ollama, DeepSeek, OpenAI, etc.
pub struct OpenAiTranslator {
    client: Client,
    /// Base URL for the API (e.g., "http://localhost:8080/v1")
    pub api_base: String,
    /// Optional API key for authentication
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    /// Number of retry attempts
    pub retry_count: u32,
    /// Delay between retries in milliseconds
    pub retry_delay_ms: u64,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

impl OpenAiTranslator {
    /// Create a new OpenAI translator with all options.
    pub fn new(
        api_base: String,
        api_key: Option<String>,
        model: String,
        retry_count: u32,
        retry_delay_ms: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::TranslationRequest(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base,
            api_key,
            model,
            retry_count: retry_count.max(1),
            retry_delay_ms,
        })
    }

    /// Create a new OpenAI translator with default retry settings.
    pub fn with_defaults(api_base: String, api_key: Option<String>, model: String) -> Result<Self> {
        Self::new(api_base, api_key, model, DEFAULT_RETRY_COUNT, DEFAULT_RETRY_DELAY_MS)
    }

    /// System instructions: translate line by line, keep the line structure
    fn system_prompt(source: &Lang, target: &Lang) -> String {
        let source_hint = if source.is_auto() {
            String::new()
        } else {
            format!(" from {}", language_name(source))
        };
        format!(
            "You translate documents{} into {}. The user message is a document with one \
             paragraph per line. Translate each line separately and reply with exactly the \
             same number of lines, in the same order. Keep empty lines empty. Never merge, \
             split, add or drop lines. Output only the translation, no explanations.",
            source_hint,
            language_name(target),
        )
    }

    /// Make API request with retry logic
    async fn request_with_retry(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: Self::system_prompt(source, target),
                },
                Message {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            temperature: Some(0.3), // Lower temperature for more consistent translations
            max_tokens: None,
        };

        let mut last_error = None;

        for attempt in 0..self.retry_count {
            debug!(
                "Translation request attempt {}/{} to {}",
                attempt + 1,
                self.retry_count,
                url
            );

            let mut req = self.client.post(&url).json(&request);

            // Add API key if configured
            if let Some(ref key) = self.api_key {
                req = req.header("Authorization", format!("Bearer {key}"));
            }

            match req.send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        match response.json::<ChatResponse>().await {
                            Ok(chat_response) => {
                                if let Some(choice) = chat_response.choices.first() {
                                    return Ok(clean_response(&choice.message.content, text));
                                }
                                last_error = Some(Error::TranslationInvalidResponse(
                                    "No choices in response".to_string(),
                                ));
                            }
                            Err(e) => {
                                warn!("Failed to parse response: {}", e);
                                last_error = Some(Error::TranslationInvalidResponse(e.to_string()));
                            }
                        }
                    } else if response.status().as_u16() == 401 {
                        warn!("API rejected credentials");
                        return Err(Error::TranslationMissingApiKey);
                    } else if response.status().as_u16() == 429 {
                        // Rate limited
                        let retry_after = response
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse().ok());

                        warn!("Rate limited, retry after {:?}s", retry_after);
                        last_error = Some(Error::TranslationRateLimited { retry_after });

                        // Wait longer on rate limit
                        if attempt + 1 < self.retry_count {
                            let wait_time = retry_after.unwrap_or(5) * 1000;
                            tokio::time::sleep(Duration::from_millis(wait_time)).await;
                        }
                        continue;
                    } else {
                        let status = response.status();
                        let body = response.text().await.unwrap_or_default();
                        warn!("API error: {} - {}", status, body);
                        last_error = Some(Error::TranslationRequest(format!(
                            "HTTP {status}: {body}"
                        )));
                    }
                }
                Err(e) => {
                    warn!("Request failed: {}", e);
                    if e.is_timeout() {
                        last_error = Some(Error::TranslationTimeout);
                    } else {
                        last_error = Some(Error::TranslationRequest(e.to_string()));
                    }
                }
            }

            // Wait before retry
            if attempt + 1 < self.retry_count {
                tokio::time::sleep(Duration::from_millis(self.retry_delay_ms)).await;
            }
        }

        error!("Translation failed after {} attempts", self.retry_count);
        Err(last_error.unwrap_or(Error::TranslationMaxRetriesExceeded))
    }
}

#[async_trait]
impl Translator for OpenAiTranslator {
    fn info(&self) -> TranslatorInfo {
        TranslatorInfo {
            name: "OpenAI Compatible",
            model: Some(self.model.clone()),
            supports_auto_detect: true,
        }
    }

    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        // Blank documents have nothing to translate, line structure included
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        // Skip if source and target are the same
        if source.as_str() == target.as_str() && !source.is_auto() {
            return Ok(text.to_string());
        }

        self.request_with_retry(text, source, target).await
    }
}

/// Tidy a model reply without touching its line structure.
///
/// Trailing spaces go, and a pair of quotes wrapping the whole reply is
/// removed unless the source itself was quoted. Newlines are left alone so the
/// aligner sees exactly what the model produced.
fn clean_response(content: &str, source: &str) -> String {
    let mut out = content.trim_end_matches([' ', '\t']);
    let source_quoted = source.starts_with('"') && source.ends_with('"');
    if !source_quoted && out.len() >= 2 && out.starts_with('"') && out.ends_with('"') {
        out = &out[1..out.len() - 1];
    }
    out.to_string()
}

/// Convert language code to human-readable name for prompts
fn language_name(lang: &Lang) -> &'static str {
    match lang.as_str() {
        "en" => "English",
        "zh-CN" => "Simplified Chinese",
        "zh-TW" => "Traditional Chinese",
        "ja" => "Japanese",
        "ko" => "Korean",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "ru" => "Russian",
        "ar" => "Arabic",
        "hi" => "Hindi",
        "th" => "Thai",
        "vi" => "Vietnamese",
        // For unknown languages, the LLM should still understand most ISO codes
        _ => "the specified language",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_language_name() {
        assert_eq!(language_name(&Lang::new("en")), "English");
        assert_eq!(language_name(&Lang::new("zh-CN")), "Simplified Chinese");
        assert_eq!(language_name(&Lang::new("unknown")), "the specified language");
    }

    #[test]
    fn test_clean_response_keeps_lines() {
        assert_eq!(clean_response("Bonjour\n\nMonde  ", "Hello\n\nWorld"), "Bonjour\n\nMonde");
        assert_eq!(clean_response("a\n", "x\ny"), "a\n");
    }

    #[test]
    fn test_clean_response_quotes() {
        assert_eq!(clean_response("\"Bonjour\"", "Hello"), "Bonjour");
        assert_eq!(clean_response("\"Bonjour\"", "\"Hello\""), "\"Bonjour\"");
        assert_eq!(clean_response("\"", "Hello"), "\"");
    }

    #[test]
    fn test_system_prompt_mentions_languages() {
        let prompt = OpenAiTranslator::system_prompt(&Lang::new("fr"), &Lang::new("de"));
        assert!(prompt.contains("from French"));
        assert!(prompt.contains("into German"));

        let auto = OpenAiTranslator::system_prompt(&Lang::new("auto"), &Lang::new("en"));
        assert!(!auto.contains(" from "));
    }

    #[tokio::test]
    async fn test_blank_text_skips_request() {
        // Unroutable base: any request would fail
        let translator =
            OpenAiTranslator::with_defaults("http://127.0.0.1:9".into(), None, "m".into()).unwrap();
        let out = translator
            .translate("\n\n", &Lang::new("auto"), &Lang::new("fr"))
            .await
            .unwrap();
        assert_eq!(out, "\n\n");
    }
}
