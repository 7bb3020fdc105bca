//! CLI configuration: thin wrapper around `stockpile_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--api-url, --timeout, --insecure, --config, --session-file).

use std::path::PathBuf;

use stockpile_config::{Config, SessionStore, config_path, load_config_from};
use stockpile_core::ClientConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The config file this invocation reads.
pub fn active_config_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// The session file this invocation reads and writes.
pub fn session_store(global: &GlobalOpts) -> SessionStore {
    match global.session_file {
        Some(ref path) => SessionStore::new(path.clone()),
        None => SessionStore::default_location(),
    }
}

/// Load file + env, then apply CLI flag overrides (flag > env > file).
pub fn resolve(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = load_config_from(&active_config_path(global))?;

    if let Some(ref url) = global.api_url {
        cfg.api_url.clone_from(url);
    }
    if global.timeout.is_some() {
        cfg.timeout_secs = global.timeout;
    }
    if global.insecure {
        cfg.insecure = true;
    }
    Ok(cfg)
}

/// Resolve and translate into the core's runtime configuration.
pub fn client_config(global: &GlobalOpts) -> Result<(Config, ClientConfig), CliError> {
    let cfg = resolve(global)?;
    let client = cfg.to_client_config()?;
    Ok((cfg, client))
}
