//! DOCX Translator Web - HTTP service for translating Word documents.

mod helpers;
mod routes;
mod state;

use anyhow::{Context, Result};
use clap::Parser;
use docx_translator_core::{AppConfig, CacheConfig, RenderMode, TranslatorConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter, prelude::*};

use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "docx-translator-web")]
#[command(author, version, about = "DOCX Translator Web Server", long_about = None)]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind to
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// OpenAI API base URL
    #[arg(long, env = "OPENAI_API_BASE")]
    api_base: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY")]
    api_key: Option<String>,

    /// Model name for OpenAI-compatible API
    #[arg(long, env = "OPENAI_MODEL")]
    model: Option<String>,

    /// Target language used when a request does not name one
    #[arg(long, env = "DOCX_TARGET_LANG")]
    target_lang: Option<String>,

    /// Render bilingual documents when a request does not say
    #[arg(long)]
    bilingual: bool,

    /// Upper bound for one provider call, in seconds
    #[arg(long, env = "TRANSLATION_TIMEOUT")]
    timeout: Option<u64>,

    /// Config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Disable the translation cache
    #[arg(long)]
    no_cache: bool,

    /// Clear translation cache on startup
    #[arg(long)]
    clear_cache: bool,

    /// Maximum upload size in megabytes
    #[arg(long, default_value = "50")]
    max_upload_mb: usize,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// Config file (or defaults), overridden by flags and environment
    fn app_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => AppConfig::load(),
        };

        let translator = &mut config.translator;
        if let Some(api_base) = &self.api_base {
            translator.api_base.clone_from(api_base);
        }
        if self.api_key.is_some() {
            translator.api_key.clone_from(&self.api_key);
        }
        if let Some(model) = &self.model {
            translator.model.clone_from(model);
        }
        if let Some(timeout) = self.timeout {
            translator.timeout_secs = timeout;
        }
        if let Some(target) = &self.target_lang {
            config.target_lang = target.as_str().into();
        }
        if self.bilingual {
            config.render_mode = RenderMode::Bilingual;
        }
        if self.no_cache {
            config.cache = CacheConfig::disabled();
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_level},sled=warn")));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Clear cache if requested
    if args.clear_cache {
        match docx_translator_core::clear_translation_cache() {
            Ok(count) => info!("Cleared {} cached translations", count),
            Err(e) => tracing::warn!("Failed to clear cache: {}", e),
        }
    }

    let config = args.app_config()?;
    log_provider(&config.translator);

    // Create application state (opens cache - fails fast if locked)
    let state = Arc::new(
        AppState::new(config).context("Failed to initialize application state")?,
    );

    let app = routes::router(state, args.max_upload_mb * 1024 * 1024);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn log_provider(config: &TranslatorConfig) {
    info!(
        "Provider: {} (model {}, timeout {}s{})",
        config.api_base,
        config.model,
        config.timeout_secs,
        if config.api_key.is_some() { ", with API key" } else { "" }
    );
}
