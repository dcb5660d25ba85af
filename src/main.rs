mod config;
mod data;
mod engine;
mod monitoring;
mod notify;
mod state;

use anyhow::{bail, Result};
use clap::Parser;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::{Config, EnvConfig};
use data::gamma_api::GammaApiClient;
use engine::report::ReportBuilder;
use engine::rules::AlertRuleEngine;
use engine::scanner::Scanner;
use engine::types::ScanMode;
use monitoring::logger::AlertJournal;
use notify::console::ConsoleNotifier;
use notify::telegram::{TelegramConfig, TelegramNotifier};
use notify::Notifier;
use state::BaselineStore;

/// Polls Polymarket and alerts on new, volatile or heavily traded markets.
#[derive(Debug, Parser)]
#[command(name = "market-radar", version)]
struct Cli {
    /// Run a single scan and exit
    #[arg(long)]
    once: bool,

    /// Send a ranked digest (top volume / top gainers) instead of per-market alerts
    #[arg(long)]
    daily: bool,

    /// Push messages to Telegram (otherwise they are printed)
    #[arg(long)]
    telegram: bool,

    /// Telegram bot token (overrides TELEGRAM_BOT_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Telegram chat id (overrides TELEGRAM_CHAT_ID)
    #[arg(long)]
    chat_id: Option<String>,

    /// Baseline file path
    #[arg(long)]
    history_path: Option<String>,

    /// Seconds between scans in continuous mode
    #[arg(long)]
    interval_secs: Option<u64>,

    /// TOML config file; missing file means defaults
    #[arg(long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.system.log_level)),
        )
        .init();

    let env_config = EnvConfig::load();

    info!("🚀 Market radar starting...");

    let notifier = build_notifier(&cli, &config, &env_config)?;
    let scanner = build_scanner(&cli, &config, &env_config, notifier)?;

    if cli.once {
        info!("🔍 Single scan mode");
        scanner.run_scan().await?;
        return Ok(());
    }

    let interval_secs = cli.interval_secs.unwrap_or(config.system.interval_secs).max(1);
    run_continuous(&scanner, Duration::from_secs(interval_secs)).await;

    info!("👋 Shutting down...");
    Ok(())
}

fn build_notifier(cli: &Cli, config: &Config, env_config: &EnvConfig) -> Result<Box<dyn Notifier>> {
    if !(cli.telegram || config.monitoring.telegram_enabled) {
        info!("Telegram disabled, messages will be printed");
        return Ok(Box::new(ConsoleNotifier));
    }

    let bot_token = cli.token.clone().or_else(|| env_config.telegram_bot_token.clone());
    let chat_id = cli.chat_id.clone().or_else(|| env_config.telegram_chat_id.clone());

    match (bot_token, chat_id) {
        (Some(bot_token), Some(chat_id)) => {
            info!("Telegram enabled for chat {}", chat_id);
            Ok(Box::new(TelegramNotifier::new(TelegramConfig { bot_token, chat_id })?))
        }
        _ => bail!(
            "Telegram push requires a bot token and chat id \
             (set TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID, or pass --token and --chat-id)"
        ),
    }
}

fn build_scanner(
    cli: &Cli,
    config: &Config,
    env_config: &EnvConfig,
    notifier: Box<dyn Notifier>,
) -> Result<Scanner> {
    let history_path = cli
        .history_path
        .clone()
        .unwrap_or_else(|| config.system.history_path.clone());
    let mode = if cli.daily || config.system.digest_mode {
        ScanMode::Digest
    } else {
        ScanMode::Alerts
    };

    info!("Baseline file: {}", history_path);
    info!("Mode: {:?}", mode);
    info!(
        "Thresholds: high_volume=${:.0}, volatility={:.1}%, increment={:.1}%",
        config.alerts.high_volume_threshold,
        config.alerts.volatility_threshold,
        config.alerts.increment_threshold
    );

    let source = GammaApiClient::new(env_config.polymarket_gamma_url.clone())?;

    let scanner = Scanner::new(
        Box::new(source),
        notifier,
        BaselineStore::new(history_path),
        AlertRuleEngine::new(config.alerts.clone()),
        ReportBuilder::new(config.report.clone(), config.system.market_url_base.clone()),
        mode,
        config.system.market_url_base.clone(),
    );

    if config.monitoring.csv_logging {
        info!("Alert journal: {}", config.monitoring.csv_log_path);
        return Ok(scanner.with_journal(AlertJournal::new(config.monitoring.csv_log_path.clone())?));
    }

    Ok(scanner)
}

/// Scan immediately, then once per interval until Ctrl-C.
/// A scan always runs to completion before the signal is observed.
async fn run_continuous(scanner: &Scanner, interval: Duration) {
    info!("⏰ Scanning every {}s, press Ctrl+C to stop", interval.as_secs());

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Polled first on every pass so the handler is installed before the first scan.
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }

        if let Err(e) = scanner.run_scan().await {
            error!("🔴 {:#}", e);
        }
    }
}
