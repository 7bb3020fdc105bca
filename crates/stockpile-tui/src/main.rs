//! `stockpile-tui`: interactive terminal client for the Stockpile API.
//!
//! Built on [ratatui](https://ratatui.rs). Starts on a landing screen
//! that checks the session, then shows either the login form or the
//! product list. All reads go through the `stockpile-core` query cache;
//! writes invalidate it and the data bridge refetches what is on screen.
//!
//! Logs go to a file (default: `stockpile-tui.log` in the data dir) so
//! they never corrupt the terminal. The session cookie lives in memory
//! only; every launch starts from the landing check.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod forms;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use stockpile_core::Client;

use crate::app::App;

/// Terminal UI for managing your Stockpile products.
#[derive(Parser, Debug)]
#[command(name = "stockpile-tui", version, about)]
struct Cli {
    /// API base URL (overrides config file and STOCKPILE_API_URL)
    #[arg(short = 'u', long)]
    api_url: Option<String>,

    /// Config file path
    #[arg(long, env = "STOCKPILE_CONFIG")]
    config: Option<PathBuf>,

    /// Accept invalid TLS certificates
    #[arg(short = 'k', long)]
    insecure: bool,

    /// Log file path (defaults to stockpile-tui.log in the data directory)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-only tracing. Nothing may reach stdout/stderr while the TUI owns
/// the terminal. Hold the returned guard until exit so logs flush.
fn setup_tracing(cli: &Cli) -> Result<WorkerGuard> {
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "stockpile_tui={level},stockpile_core={level},stockpile_api={level}"
        ))
    });

    let log_file = cli
        .log_file
        .clone()
        .unwrap_or_else(|| stockpile_config::data_dir().join("stockpile-tui.log"));
    let dir = log_file.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;
    let name = log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("stockpile-tui.log"));

    let appender = tracing_appender::rolling::never(dir, name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    Ok(guard)
}

/// Config file + env, then flag overrides.
fn build_client(cli: &Cli) -> Result<Client> {
    let path = cli.config.clone().unwrap_or_else(stockpile_config::config_path);
    let mut cfg = stockpile_config::load_config_from(&path)?;
    if let Some(ref url) = cli.api_url {
        cfg.api_url.clone_from(url);
    }
    if cli.insecure {
        cfg.insecure = true;
    }
    Ok(Client::new(cfg.to_client_config()?)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks BEFORE entering the terminal
    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli)?;

    // Config errors print as a normal report, before raw mode.
    let client = build_client(&cli)?;
    info!(url = %client.config().url, "starting stockpile-tui");

    let mut app = App::new(client);
    app.run().await
}
