use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vibe_news::app::{App, AppState};
use vibe_news::config::{Config, API_KEY_ENV, APP_NAME};
use vibe_news::feeds::newsapi::NewsApiFetcher;
use vibe_news::storage::{self, FileStore, KeyValueStore};
use vibe_news::topics::TopicStore;

#[derive(Parser, Debug)]
#[command(name = "vibe-news", version, about = "Headlines for the topics you follow")]
struct Cli {
    /// Path to config file (default: ~/.config/vibe-news/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for persisted topics, cache and log
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Articles requested per topic (5 or 10)
    #[arg(long)]
    page_size: Option<usize>,

    /// Write a default config file and exit
    #[arg(long)]
    init_config: bool,
}

fn init_logging(config: &Config, data_dir: &Path) -> Result<()> {
    let log_path = data_dir.join(format!("{}.log", APP_NAME));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let directives = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .parse_lossy(directives),
        )
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .or_else(Config::default_path)
        .context("could not determine config directory")?;

    if cli.init_config {
        Config::write_default(&config_path)?;
        println!("Wrote default config to {}", config_path.display());
        return Ok(());
    }

    let mut config = Config::load(&config_path)?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }
    if let Some(page_size) = cli.page_size {
        config.page_size = page_size;
    }

    let data_dir = config.data_dir();
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;
    init_logging(&config, &data_dir)?;

    tracing::info!(
        config = %config_path.display(),
        data_dir = %data_dir.display(),
        "starting vibe-news"
    );

    let api_key = config.api_key(std::env::var(API_KEY_ENV).ok());
    if api_key.is_none() {
        tracing::warn!("no api key configured; searches will fail");
    }

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&data_dir));
    let topics = TopicStore::load(store.as_ref(), &config.default_topics);
    let cache = storage::load_cache(store.as_ref());
    let fetcher = Arc::new(NewsApiFetcher::new(
        &config.base_url,
        api_key.clone().unwrap_or_default(),
        config.page_size(),
        config.request_timeout(),
    ));

    let mut state = AppState::new(topics, cache, config.cooldown());
    if api_key.is_none() {
        state.status = Some(format!("No API key: set {} or api_key in config", API_KEY_ENV));
    }
    let mut app = App::new(state, store, fetcher);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.run(&mut terminal).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        tracing::error!("exited with error: {:#}", e);
    }
    tracing::info!("shutting down");
    result
}
