//! Command handlers.

pub mod auth;
pub mod config_cmd;
pub mod health;
pub mod products;
pub mod util;

use stockpile_config::SessionStore;
use stockpile_core::Client;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Where the session cookie for this invocation is persisted.
pub struct SessionContext {
    pub store: SessionStore,
    pub api_url: String,
}

/// Dispatch an API-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: &Client,
    session: &SessionContext,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Auth(args) => auth::handle(client, args, session, global).await,
        Command::Products(args) => products::handle(client, args, global).await,
        Command::Health => health::handle(client, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
