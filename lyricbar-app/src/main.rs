mod cli;
mod snippet;

use crate::cli::Cli;
use clap::Parser;
use lyricbar_core::config::LyricsProviderType;
use lyricbar_core::{
    CoreError, InstanceLock, JsonLineSink, LyricbarConfig, LyricsCache, LyricsFetcher,
    LyricsProvider, PlaybackSource, Renderer, SyncEngine,
};
use lyricbar_lyrics_lrclib::LrclibProvider;
use lyricbar_mpris::MprisSource;
use std::fs::OpenOptions;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.init {
        println!("{}", snippet::render("lyricbar"));
        return ExitCode::SUCCESS;
    }

    // Load config or create template on first run; logging is not up yet, so
    // problems are reported once the subscriber is installed
    let config_path = cli.config_path();
    let (mut config, config_error) = match LyricbarConfig::load_or_create(&config_path) {
        Ok(config) => (config, None),
        Err(e) => (LyricbarConfig::default(), Some(e)),
    };
    cli.apply(&mut config);

    init_tracing(config.logging.file.as_deref());

    if let Some(e) = config_error {
        match e {
            CoreError::ConfigWriteFailed { .. } => warn!("{e}; using defaults"),
            e => {
                error!("Invalid config {}: {e}", config_path.display());
                return ExitCode::FAILURE;
            }
        }
    }
    if let Err(e) = config.validate() {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.toggle {
        return report(runtime.block_on(toggle(&config)));
    }
    if cli.forget {
        return report(runtime.block_on(forget(&config)));
    }

    // Only one engine may write to the bar
    let lock = match InstanceLock::try_acquire(&lyricbar_core::lock_path()) {
        Ok(Some(lock)) => lock,
        Ok(None) => {
            info!("Another lyricbar instance is running, exiting");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            error!("Failed to acquire instance lock: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Set up Ctrl+C / SIGTERM handler to trigger graceful shutdown
    let cancel_token = CancellationToken::new();
    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received termination signal, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    let result = runtime.block_on(run(&config, cancel_token));
    drop(lock);
    report(result)
}

fn report(result: lyricbar_core::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &LyricbarConfig, cancel: CancellationToken) -> lyricbar_core::Result<()> {
    let source = MprisSource::connect(config.music.player.clone()).await?;
    let cache = config.lyrics.cache_enabled.then(LyricsCache::new);
    let fetcher = LyricsFetcher::new(cache, create_providers(config));

    info!(
        "Initialized {} lyrics provider(s): {:?}",
        fetcher.provider_names().len(),
        fetcher.provider_names()
    );

    let mut engine = SyncEngine::new(
        source,
        JsonLineSink::stdout(),
        fetcher,
        Renderer::new(&config.display),
        config.heartbeat(),
    );
    engine.run(cancel).await
}

async fn toggle(config: &LyricbarConfig) -> lyricbar_core::Result<()> {
    let mut source = MprisSource::connect(config.music.player.clone()).await?;
    source.play_pause().await?;
    info!("Toggled playback on {}", source.player_name().unwrap_or_default());
    Ok(())
}

async fn forget(config: &LyricbarConfig) -> lyricbar_core::Result<()> {
    let mut source = MprisSource::connect(config.music.player.clone()).await?;
    let state = source.snapshot().await?;
    let removed = LyricsCache::new().invalidate(&state.identity).await?;
    if removed {
        info!("Forgot cached lyrics for {}", state.display_title());
    } else {
        info!("No cached lyrics for {}", state.display_title());
    }
    Ok(())
}

/// Create lyrics providers based on config
fn create_providers(config: &LyricbarConfig) -> Vec<Box<dyn LyricsProvider>> {
    let mut providers: Vec<Box<dyn LyricsProvider>> = Vec::new();

    for provider_type in &config.lyrics.providers {
        match provider_type {
            LyricsProviderType::Lrclib => {
                match LrclibProvider::with_options(
                    config.provider_timeout(),
                    config.lyrics.max_retries,
                ) {
                    Ok(provider) => providers.push(Box::new(provider)),
                    Err(e) => error!("Failed to create LRCLIB provider: {}", e),
                }
            }
        }
    }

    if providers.is_empty() {
        warn!("No lyrics providers configured; only cached lyrics will be shown");
    }

    providers
}

/// Initialize tracing on stderr (stdout carries the bar payloads) and optional file logging
fn init_tracing(log_file: Option<&Path>) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,zbus=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if let Some(log_path) = log_file {
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match OpenOptions::new().create(true).append(true).open(log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to open log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: stderr only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
