//! DOCX Translator CLI - Command line tool for translating Word documents.

use anyhow::{Context, Result};
use clap::Parser;
use docx_translator_core::{
    translated_file_name, AppConfig, CacheConfig, DocxTranslator, Lang, RenderMode,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "docx-translate")]
#[command(author, version, about = "Translate Word documents", long_about = None)]
struct Args {
    /// Input .docx file
    #[arg(required = true)]
    input: PathBuf,

    /// Output .docx file (default: input-<target>.docx)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Source language code (default: from config, else "auto")
    #[arg(short = 's', long)]
    source: Option<String>,

    /// Target language code (default: from config, else "en")
    #[arg(short = 't', long)]
    target: Option<String>,

    /// Keep the original paragraphs and add each translation below them
    #[arg(short, long)]
    bilingual: bool,

    /// OpenAI API base URL
    #[arg(long, env = "OPENAI_API_BASE")]
    api_base: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY")]
    api_key: Option<String>,

    /// Model name for OpenAI-compatible API
    #[arg(long, env = "OPENAI_MODEL")]
    model: Option<String>,

    /// Upper bound for the provider call, in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable caching
    #[arg(long)]
    no_cache: bool,
}

impl Args {
    /// Apply the flags that were given on top of the loaded config
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(source) = &self.source {
            config.source_lang = Lang::new(source);
        }
        if let Some(target) = &self.target {
            config.target_lang = Lang::new(target);
        }
        if self.bilingual {
            config.render_mode = RenderMode::Bilingual;
        }
        if self.no_cache {
            config.cache = CacheConfig::disabled();
        }

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
    }
}

/// Where the translated document goes when `--output` is not given
fn default_output(input: &Path, target: &Lang, mode: RenderMode) -> PathBuf {
    let name = input
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    input.with_file_name(translated_file_name(name, target, mode))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Load or create config
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    // Override config with CLI arguments
    args.apply_overrides(&mut config);

    // Load input document
    info!("Loading document: {}", args.input.display());
    let input = std::fs::read(&args.input)
        .context(format!("Failed to read input: {}", args.input.display()))?;

    let mode = config.render_mode;
    let target = config.target_lang.clone();

    let translator = DocxTranslator::new(config).context("Failed to initialize translator")?;

    // One provider round trip, so a spinner rather than a bar
    let pb = ProgressBar::new_spinner();
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("Translating to {target} ({mode})"));

    let result = translator
        .translate_document(&input)
        .await
        .context(format!("Failed to translate {}", args.input.display()));

    let result = match result {
        Ok(result) => {
            pb.finish_with_message(format!(
                "Translated {} paragraphs{}",
                result.paragraph_count,
                if result.from_cache { " (cached)" } else { "" }
            ));
            result
        }
        Err(e) => {
            pb.abandon_with_message("Translation failed");
            return Err(e);
        }
    };

    // Determine output path
    let output_path = args
        .output
        .unwrap_or_else(|| default_output(&args.input, &target, mode));

    // Save output
    std::fs::write(&output_path, &result.bytes)
        .context(format!("Failed to write output: {}", output_path.display()))?;

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        println!("Translated document saved to: {}", output_path.display());
    }

    Ok(())
}
