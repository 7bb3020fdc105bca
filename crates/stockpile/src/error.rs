//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use stockpile_config::ConfigError;
use stockpile_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const RATE_LIMITED: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the API at {url}")]
    #[diagnostic(
        code(stockpile::connection_failed),
        help(
            "Check that the backend is running and reachable.\n\
             Reason: {reason}\n\
             Try: stockpile health --api-url <URL>"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(stockpile::not_authenticated),
        help("Sign in with: stockpile auth login --email <EMAIL>")
    )]
    NotAuthenticated { message: String },

    #[error("{message}")]
    #[diagnostic(code(stockpile::forbidden))]
    Forbidden { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(stockpile::not_found),
        help("Run: stockpile products list to see your products")
    )]
    NotFound { message: String },

    #[error("{message}")]
    #[diagnostic(code(stockpile::conflict))]
    Conflict { message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(stockpile::validation_failed))]
    ValidationFailed {
        message: String,
        #[help]
        fields: Option<String>,
    },

    #[error("{message}")]
    #[diagnostic(
        code(stockpile::rate_limited),
        help("Too many attempts. Wait a moment and try again.")
    )]
    RateLimited { message: String },

    #[error("{message}")]
    #[diagnostic(code(stockpile::api_error))]
    ApiError { status: u16, message: String },

    // ── Local validation ─────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(stockpile::required))]
    Required { message: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(stockpile::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(stockpile::config),
        help("Inspect the resolved settings with: stockpile config show")
    )]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(stockpile::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Internal ────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    #[diagnostic(code(stockpile::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NotAuthenticated { .. } => exit_code::AUTH,
            Self::Forbidden { .. } => exit_code::PERMISSION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::RateLimited { .. } => exit_code::RATE_LIMITED,
            Self::Required { .. }
            | Self::Validation { .. }
            | Self::ValidationFailed { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::ApiError { .. } | Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                exit_code::GENERAL
            }
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = err.message();
        match err {
            CoreError::Unauthorized { .. } => CliError::NotAuthenticated { message },
            CoreError::ConnectionFailed { url, reason } => {
                CliError::ConnectionFailed { url, reason }
            }
            CoreError::Validation { message } => CliError::Required { message },
            CoreError::Config { message } => CliError::Validation {
                field: "api_url".into(),
                reason: message,
            },
            CoreError::Internal(detail) => {
                tracing::debug!(%detail, "internal error");
                CliError::Internal(message)
            }
            CoreError::Api { status, ref error } => match status {
                403 => CliError::Forbidden { message },
                404 => CliError::NotFound { message },
                409 => CliError::Conflict { message },
                422 => CliError::ValidationFailed {
                    message,
                    fields: describe_fields(&error.fields),
                },
                429 => CliError::RateLimited { message },
                _ => CliError::ApiError { status, message },
            },
        }
    }
}

fn describe_fields(fields: &[stockpile_core::FieldError]) -> Option<String> {
    if fields.is_empty() {
        return None;
    }
    Some(
        fields
            .iter()
            .map(|f| format!("{}: {}", f.field, f.message))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

#[cfg(test)]
mod tests {
    use stockpile_core::{ApiError, FieldError};

    use super::*;

    fn api(status: u16, error: ApiError) -> CliError {
        CoreError::Api { status, error }.into()
    }

    #[test]
    fn statuses_pick_exit_codes() {
        assert_eq!(api(404, ApiError::new("not found")).exit_code(), 4);
        assert_eq!(api(409, ApiError::new("taken")).exit_code(), 6);
        assert_eq!(api(429, ApiError::new("slow down")).exit_code(), 8);
        assert_eq!(api(500, ApiError::new("boom")).exit_code(), 1);
    }

    #[test]
    fn unauthorized_is_auth_exit() {
        let err: CliError = CoreError::Unauthorized {
            error: ApiError::new("unauthorized"),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::AUTH);
        assert_eq!(err.to_string(), "unauthorized");
    }

    #[test]
    fn validation_fields_become_help() {
        let error = ApiError {
            error: "validation failed".into(),
            fields: vec![FieldError {
                field: "price".into(),
                message: "must be positive".into(),
            }],
        };
        match api(422, error) {
            CliError::ValidationFailed { message, fields } => {
                assert_eq!(message, "validation failed");
                assert_eq!(fields.as_deref(), Some("price: must be positive"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn connection_failure_keeps_url() {
        let err: CliError = CoreError::ConnectionFailed {
            url: "http://localhost:8080/".into(),
            reason: "refused".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::CONNECTION);
        assert!(err.to_string().contains("http://localhost:8080/"));
    }
}
