// ── Core error types ──
//
// What views and commands see. Backend failures keep the normalized
// `{error, fields}` body so it can be shown verbatim; transport-level
// failures collapse to the generic fallback message. `Clone` so one
// settled query result can be handed to every waiter.

use stockpile_api::{ApiError, FieldError};
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Backend errors ───────────────────────────────────────────────
    /// 401 from the backend: there is no valid session.
    #[error("Not authenticated: {}", .error.error)]
    Unauthorized { error: ApiError },

    #[error("API error (HTTP {status}): {error}")]
    Api { status: u16, error: ApiError },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach API at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    // ── Local errors ─────────────────────────────────────────────────
    /// A required field was left empty; no request was sent.
    #[error("{message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// The text a view displays for this failure.
    ///
    /// Backend errors yield their `error` string verbatim. Anything that
    /// never got a readable backend answer yields the generic fallback.
    pub fn message(&self) -> String {
        match self {
            Self::Unauthorized { error } | Self::Api { error, .. } => error.error.clone(),
            Self::Validation { message } => message.clone(),
            Self::Config { message } => message.clone(),
            Self::ConnectionFailed { .. } | Self::Internal(_) => {
                stockpile_api::FALLBACK_ERROR.to_owned()
            }
        }
    }

    /// Per-field validation messages from a 422, if any.
    pub fn fields(&self) -> &[FieldError] {
        match self {
            Self::Unauthorized { error } | Self::Api { error, .. } => &error.fields,
            _ => &[],
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Returns `true` for failures worth retrying on a read: no answer at
    /// all, or a 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<stockpile_api::Error> for CoreError {
    fn from(err: stockpile_api::Error) -> Self {
        match err {
            stockpile_api::Error::Api { status: 401, body } => {
                CoreError::Unauthorized { error: body }
            }
            stockpile_api::Error::Api { status, body } => CoreError::Api {
                status,
                error: body,
            },
            stockpile_api::Error::Transport(ref e) => CoreError::ConnectionFailed {
                url: e
                    .url()
                    .map_or_else(|| "<unknown>".into(), ToString::to_string),
                reason: e.to_string(),
            },
            stockpile_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            stockpile_api::Error::InvalidId(id) => CoreError::Validation {
                message: format!("Invalid product id: {id:?}"),
            },
            stockpile_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            stockpile_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_from_401() {
        let err: CoreError = stockpile_api::Error::Api {
            status: 401,
            body: ApiError::new("unauthorized"),
        }
        .into();
        assert!(err.is_unauthorized());
        assert_eq!(err.message(), "unauthorized");
        assert!(!err.is_transient());
    }

    #[test]
    fn validation_fields_survive() {
        let err: CoreError = stockpile_api::Error::Api {
            status: 422,
            body: ApiError {
                error: "validation failed".into(),
                fields: vec![FieldError {
                    field: "Name".into(),
                    message: "this field is required".into(),
                }],
            },
        }
        .into();
        assert_eq!(err.message(), "validation failed");
        assert_eq!(err.fields().len(), 1);
        assert_eq!(err.status(), Some(422));
    }

    #[test]
    fn server_errors_are_transient() {
        let err = CoreError::Api {
            status: 503,
            error: ApiError::fallback(),
        };
        assert!(err.is_transient());
        assert_eq!(err.message(), "Something went wrong");
    }

    #[test]
    fn local_validation_message_is_verbatim() {
        let err = CoreError::validation("Name and price are required");
        assert_eq!(err.to_string(), "Name and price are required");
        assert_eq!(err.message(), "Name and price are required");
    }

    #[test]
    fn unusable_product_id_is_a_local_validation_error() {
        let err: CoreError = stockpile_api::Error::InvalidId("..".into()).into();
        assert!(matches!(err, CoreError::Validation { .. }));
        assert_eq!(err.message(), "Invalid product id: \"..\"");
        assert!(!err.is_transient());
    }
}
