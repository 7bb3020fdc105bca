mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use stockpile_core::Client;

use crate::cli::{Cli, Command};
use crate::commands::SessionContext;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't touch the API
        Command::Config(ref args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(ref args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "stockpile", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let (cfg, client_config) = config::client_config(&cli.global)?;
            let session = SessionContext {
                store: config::session_store(&cli.global),
                api_url: cfg.api_url,
            };
            let cookie = session.store.load(&session.api_url)?;

            tracing::debug!(command = ?cmd, url = %client_config.url, "dispatching command");
            let global = &cli.global;
            Client::oneshot(client_config, cookie.as_deref(), |client| async move {
                commands::dispatch(cmd, &client, &session, global).await
            })
            .await
        }
    }
}
