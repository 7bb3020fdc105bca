//! Backend liveness probe.

use serde::Serialize;

use stockpile_core::Client;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct Health {
    url: String,
    status: String,
}

pub async fn handle(client: &Client, global: &GlobalOpts) -> Result<(), CliError> {
    let status = client.health().await?;
    let health = Health {
        url: client.config().url.to_string(),
        status,
    };
    let out = output::render_single(
        &global.output,
        &health,
        |h| format!("{} {}", h.url, h.status),
        |h| h.status.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
