//! Config subcommand handlers.

use serde::Serialize;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct Paths {
    config: String,
    session: String,
}

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = config::resolve(global)?;
            // Same checks an API-bound command runs.
            cfg.to_client_config()?;
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_default(),
                |c| c.api_url.clone(),
            )?;
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            let paths = Paths {
                config: config::active_config_path(global).display().to_string(),
                session: config::session_store(global).path().display().to_string(),
            };
            let out = output::render_single(
                &global.output,
                &paths,
                |p| {
                    output::detail_block(&[
                        ("config", p.config.clone()),
                        ("session", p.session.clone()),
                    ])
                },
                |p| p.config.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
