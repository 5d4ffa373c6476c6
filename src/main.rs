//! # Flagwatch — CTF agenda bot
//!
//! Tracks CTF competitions from a CTFtime-style catalog and pings a single
//! Discord channel at four lifecycle milestones per event, exactly once
//! each, restarts included.
//!
//! Usage:
//!   flagwatch                          # Run with ~/.flagwatch/config.toml
//!   flagwatch --config ./dev.toml      # Custom config
//!   flagwatch --interval 30            # Faster milestone scans

mod bot;
mod commands;
mod render;

use std::sync::Arc;

use anyhow::Result;
use chrono::FixedOffset;
use clap::Parser;
use futures::StreamExt;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use flagwatch_agenda::{EventStore, Scheduler};
use flagwatch_catalog::CatalogClient;
use flagwatch_channels::DiscordChannel;
use flagwatch_core::FlagwatchConfig;

#[derive(Parser)]
#[command(name = "flagwatch", version, about = "🚩 Flagwatch — CTF agenda bot")]
struct Cli {
    /// Config file path (default: ~/.flagwatch/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Data directory for events.json (overrides config)
    #[arg(long)]
    data_dir: Option<String>,

    /// Milestone scan interval in seconds (overrides config)
    #[arg(long)]
    interval: Option<u64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn expand_path(p: &str) -> String {
    shellexpand::tilde(p).to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "flagwatch=debug,flagwatch_agenda=debug,flagwatch_channels=debug,flagwatch_catalog=debug"
    } else {
        "flagwatch=info,flagwatch_agenda=info,flagwatch_channels=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let mut config = match &cli.config {
        Some(path) => {
            let path = expand_path(path);
            FlagwatchConfig::load_from(std::path::Path::new(&path))?
        }
        None => FlagwatchConfig::load()?,
    };
    config.apply_env_overrides();

    if config.discord.bot_token.is_empty() {
        anyhow::bail!("No Discord bot token. Set DISCORD_TOKEN or discord.bot_token in config.");
    }
    if config.discord.channel_id.is_empty() {
        anyhow::bail!(
            "No audience channel. Set DISCORD_CHANNEL_ID or discord.channel_id in config."
        );
    }

    let display_offset = FixedOffset::east_opt(config.agenda.display_offset_hours * 3600)
        .ok_or_else(|| anyhow::anyhow!("display_offset_hours out of range"))?;
    let tick_interval = cli.interval.unwrap_or(config.agenda.tick_interval_secs).max(1);

    let data_dir = cli
        .data_dir
        .clone()
        .or_else(|| {
            (!config.agenda.data_dir.is_empty()).then(|| config.agenda.data_dir.clone())
        })
        .map(|p| std::path::PathBuf::from(expand_path(&p)))
        .unwrap_or_else(EventStore::default_path);

    let store = Arc::new(Mutex::new(EventStore::open(&data_dir)));
    let catalog = CatalogClient::new(&config.catalog)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    let channel = Arc::new(
        DiscordChannel::new(config.discord.clone()).map_err(|e| anyhow::anyhow!("{e}"))?,
    );

    channel.connect().await.map_err(|e| anyhow::anyhow!("{e}"))?;
    tracing::info!(
        "🚩 Flagwatch v{} — watching channel {} ({} event(s) tracked, scan every {tick_interval}s)",
        env!("CARGO_PKG_VERSION"),
        config.discord.channel_id,
        store.lock().await.len()
    );

    let bot = bot::Bot::new(
        channel.clone(),
        store.clone(),
        catalog,
        display_offset,
    );
    bot.greet().await;

    // Milestone scan loop, independent of command handling.
    let scheduler = Scheduler::new(
        store.clone(),
        channel.clone(),
        config.discord.channel_id.clone(),
        display_offset,
    );
    tokio::spawn(scheduler.run(tick_interval));

    // Command loop: poll the audience channel until ctrl-c.
    let mut messages = (*channel).clone().start_polling();
    loop {
        tokio::select! {
            maybe_message = messages.next() => {
                match maybe_message {
                    Some(message) => bot.handle(message).await,
                    None => {
                        tracing::warn!("⚠️ Message stream closed");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("👋 Shutting down");
                break;
            }
        }
    }

    Ok(())
}
