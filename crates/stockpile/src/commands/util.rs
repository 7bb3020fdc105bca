//! Shared helpers for command handlers.

use std::io::IsTerminal;

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to ask on, refuses rather than guessing.
pub fn confirm(action: &str, message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Use the given password, or read one from the terminal without echo.
pub fn password_or_prompt(given: Option<String>) -> Result<String, CliError> {
    if let Some(password) = given {
        return Ok(password);
    }
    Ok(rpassword::prompt_password("Password: ")?)
}

/// Required-field check run before any request is sent.
pub fn require(values: &[&str], message: &str) -> Result<(), CliError> {
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(CliError::Required {
            message: message.into(),
        });
    }
    Ok(())
}
