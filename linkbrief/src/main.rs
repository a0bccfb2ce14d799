/*
linkbrief - main.rs
This binary loads the configuration, wires the summarization pipeline and runs the Telegram bot.
*/

use anyhow::Result;
use clap::Parser;
use common::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use linkbrief::llm::gemini::GeminiProvider;
use linkbrief::pipeline::Pipeline;
use linkbrief::preferences::PreferenceStore;
use linkbrief::scraping::WebArticleFetcher;
use linkbrief::telegram::TelegramBot;

#[derive(Parser, Debug)]
#[command(name = "linkbrief", about = "Telegram bot that summarizes linked articles")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI args
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // Secrets usually come from a .env file next to the binary
    if let Ok(path) = dotenv::dotenv() {
        info!(path = ?path, "loaded environment file");
    }

    let config = match load_config(args.config).await {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %format!("{:#}", e), "failed to load configuration");
            return Err(e);
        }
    };
    info!(
        allowed_users = config.telegram.allowed_users.len(),
        model = %config.llm.model,
        "configuration loaded"
    );

    let fetcher = WebArticleFetcher::from_config(&config.fetch)?;
    let llm = GeminiProvider::from_config(&config.llm);
    let preferences = Arc::new(PreferenceStore::new());

    let pipeline = Pipeline::new(
        config.allowed_user_set(),
        preferences,
        Arc::new(fetcher),
        Arc::new(llm),
    )
    .with_min_content_chars(config.fetch.min_content_chars);

    TelegramBot::new(&config.telegram.token, Arc::new(pipeline))
        .run()
        .await?;

    Ok(())
}

/// Resolve config files, merge them, apply environment overrides and validate.
async fn load_config(explicit: Option<PathBuf>) -> Result<Config> {
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = explicit {
        if !p.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let mut config = Config::load_with_defaults(
        if default_path.exists() { Some(default_path.as_path()) } else { None },
        override_path.as_deref(),
    )
    .await?;
    info!(default_file = ?default_path, override_file = ?override_path, "configuration files resolved");

    config.apply_process_env()?;
    config.validate()?;
    Ok(config)
}
