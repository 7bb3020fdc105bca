//! Session command handlers: register, login, logout, me.

use stockpile_core::{Client, Credentials, User};

use crate::cli::{AuthArgs, AuthCommand, CredentialArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::{SessionContext, util};

fn user_detail(u: &User) -> String {
    let mut pairs = vec![("ID", u.id.clone()), ("Email", u.email.clone())];
    if !u.role.is_empty() {
        pairs.push(("Role", u.role.clone()));
    }
    if !u.created_at.is_empty() {
        pairs.push(("Created", u.created_at.clone()));
    }
    output::detail_block(&pairs)
}

fn credentials(args: CredentialArgs) -> Result<Credentials, CliError> {
    let password = util::password_or_prompt(args.password)?;
    util::require(
        &[args.email.as_str(), password.as_str()],
        "Email and password are required",
    )?;
    Ok(Credentials::new(args.email.trim(), password))
}

/// Write whatever session cookie the backend just set.
fn persist_session(client: &Client, session: &SessionContext) -> Result<(), CliError> {
    match client.session_cookie() {
        Some(cookie) => session.store.save(&session.api_url, &cookie)?,
        None => tracing::warn!("backend did not set a session cookie"),
    }
    Ok(())
}

pub async fn handle(
    client: &Client,
    args: AuthArgs,
    session: &SessionContext,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        AuthCommand::Register(args) => {
            let creds = credentials(args)?;
            let message = client.register(&creds).await?;
            persist_session(client, session)?;
            output::success(global, &message.message);
            Ok(())
        }

        AuthCommand::Login(args) => {
            let creds = credentials(args)?;
            let message = client.login(&creds).await?;
            persist_session(client, session)?;
            output::success(global, &message.message);
            Ok(())
        }

        AuthCommand::Logout => {
            let message = client.logout().await?;
            session.store.clear()?;
            output::success(global, &message.message);
            Ok(())
        }

        AuthCommand::Me => {
            let user = client.me().await?;
            let out = output::render_single(&global.output, user.as_ref(), user_detail, |u| {
                u.email.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
