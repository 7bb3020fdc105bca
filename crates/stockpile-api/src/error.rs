use thiserror::Error;

use crate::models::ApiError;

/// Top-level error type for the `stockpile-api` crate.
///
/// Every non-2xx response becomes [`Error::Api`] carrying the backend's
/// error body (or the generic fallback). `stockpile-core` maps these into
/// the errors views display.
#[derive(Debug, Error)]
pub enum Error {
    // ── Backend ─────────────────────────────────────────────────────
    /// Non-2xx response, normalized into the `{error, fields}` shape.
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: ApiError },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A resource id that cannot stand as a single path segment.
    #[error("Invalid resource id: {0:?}")]
    InvalidId(String),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// The uniform `{error, fields}` shape for this failure.
    ///
    /// Backend errors keep their body verbatim; everything else collapses
    /// to the generic fallback message.
    pub fn normalized(&self) -> ApiError {
        match self {
            Self::Api { body, .. } => body.clone(),
            _ => ApiError::fallback(),
        }
    }

    /// HTTP status of a backend error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` for a 401 from the backend.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Returns `true` if the request never got an HTTP answer.
    pub fn is_connection(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldError;

    #[test]
    fn api_error_keeps_body() {
        let body = ApiError {
            error: "validation failed".into(),
            fields: vec![FieldError {
                field: "name".into(),
                message: "required".into(),
            }],
        };
        let err = Error::Api {
            status: 422,
            body: body.clone(),
        };
        assert_eq!(err.normalized(), body);
        assert_eq!(err.status(), Some(422));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn non_backend_errors_use_fallback() {
        let err = Error::Tls("bad pem".into());
        assert_eq!(err.normalized(), ApiError::fallback());
        assert_eq!(err.status(), None);
    }
}
