// ── Runtime client configuration ──
//
// How to reach the API and how reads are cached. Never touches disk:
// the CLI/TUI load settings through `stockpile-config` and hand a
// `ClientConfig` in.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// Upper bound on the delay between query retries.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (local self-signed backends).
    DangerAcceptInvalid,
}

/// Cache behavior applied to every read unless a query overrides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryDefaults {
    /// How long a settled value is served without refetching.
    pub stale_time: Duration,
    /// Retries after a transient read failure.
    pub retry: u32,
    /// Base delay, doubled on each retry and capped at [`MAX_RETRY_DELAY`].
    pub retry_delay: Duration,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            stale_time: Duration::ZERO,
            retry: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Configuration for talking to one backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL (e.g. `http://localhost:8080`).
    pub url: Url,
    pub tls: TlsVerification,
    /// Overall request timeout. `None` keeps the transport default.
    pub timeout: Option<Duration>,
    pub query: QueryDefaults,
}

impl ClientConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            tls: TlsVerification::default(),
            timeout: None,
            query: QueryDefaults::default(),
        }
    }
}
