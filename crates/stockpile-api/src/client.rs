// Stockpile API HTTP client
//
// Wraps `reqwest::Client` with base-URL construction, envelope unwrapping
// and error normalization. The endpoint groups (auth, products, health)
// are inherent methods in separate files so this module stays focused on
// transport mechanics.

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{ApiError, Envelope};
use crate::transport::TransportConfig;

/// Path prefix shared by every versioned endpoint.
pub const API_PREFIX: &str = "/api/v1";

/// Raw HTTP client for the Stockpile REST API.
///
/// Every request carries the cookies in the client's jar. Success bodies
/// have their `{ data }` envelope stripped before the caller sees them;
/// any non-2xx response becomes [`Error::Api`] with the backend's
/// `{error, fields}` body, or the generic fallback when that body is
/// missing or unreadable.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    /// Cookie jar reference for exporting and restoring the session cookie.
    cookie_jar: Option<Arc<Jar>>,
}

impl ApiClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// If the config doesn't already include a cookie jar, one is created
    /// automatically (the session lives in a cookie).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let cookie_jar = config.cookie_jar.clone();
        let http = config.build_client()?;
        Ok(Self {
            http,
            base_url,
            cookie_jar,
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    ///
    /// Cookie export is unavailable since the jar isn't known.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            cookie_jar: None,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Cookies ──────────────────────────────────────────────────────

    /// The `Cookie` header value the jar would send to the backend
    /// (e.g. `"auth_token=abc123"`), if any cookie is held.
    pub fn cookie_header(&self) -> Option<String> {
        let jar = self.cookie_jar.as_ref()?;
        let cookies = jar.cookies(&self.base_url)?;
        cookies
            .to_str()
            .ok()
            .filter(|s| !s.is_empty())
            .map(String::from)
    }

    /// Load a previously exported `Cookie` header back into the jar.
    ///
    /// Returns `false` when the client has no jar to seed.
    pub fn seed_cookie(&self, header: &str) -> bool {
        let Some(jar) = self.cookie_jar.as_ref() else {
            return false;
        };
        for pair in header.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            jar.add_cookie_str(&format!("{pair}; Path=/"), &self.base_url);
        }
        trace!("session cookie seeded");
        true
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an absolute path: `{base}{path}`.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Build a versioned endpoint URL: `{base}/api/v1/{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        self.url(&format!("{API_PREFIX}/{}", path.trim_start_matches('/')))
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and unwrap the envelope.
    pub async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await?;
        Self::parse_envelope(resp).await
    }

    /// Send a POST request with a JSON body and unwrap the envelope.
    pub async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {}", url);

        let resp = self.http.post(url).json(body).send().await?;
        Self::parse_envelope(resp).await
    }

    /// Send a body-less POST request and unwrap the envelope.
    pub async fn post_empty<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("POST {}", url);

        let resp = self.http.post(url).send().await?;
        Self::parse_envelope(resp).await
    }

    /// Send a PUT request with a JSON body and unwrap the envelope.
    pub async fn put<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("PUT {}", url);

        let resp = self.http.put(url).json(body).send().await?;
        Self::parse_envelope(resp).await
    }

    /// Send a DELETE request and unwrap the envelope.
    pub async fn delete<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("DELETE {}", url);

        let resp = self.http.delete(url).send().await?;
        Self::parse_envelope(resp).await
    }

    /// Send a DELETE request, checking only the status. Any body is discarded.
    pub async fn delete_empty(&self, url: Url) -> Result<(), Error> {
        debug!("DELETE {}", url);

        let resp = self.http.delete(url).send().await?;
        Self::check_status(resp).await.map(drop)
    }

    /// Send a GET request and return the raw text body (no envelope).
    pub async fn text(&self, url: Url) -> Result<String, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await?;
        let resp = Self::check_status(resp).await?;
        Ok(resp.text().await?)
    }

    // ── Response handling ────────────────────────────────────────────

    /// Turn any non-2xx response into the normalized [`Error::Api`].
    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let body = ApiError::from_body(&body);
        debug!(status = status.as_u16(), error = %body.error, "request failed");
        Err(Error::Api {
            status: status.as_u16(),
            body,
        })
    }

    /// Parse the `{ data }` envelope, returning `data` on success.
    async fn parse_envelope<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let resp = Self::check_status(resp).await?;
        let body = resp.text().await?;

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })?;

        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        let url = Url::parse(base).expect("valid url");
        ApiClient::new(url, &TransportConfig::default()).expect("client")
    }

    #[test]
    fn urls_join_cleanly() {
        let c = client("http://localhost:8080/");
        assert_eq!(
            c.api_url("products").expect("url").as_str(),
            "http://localhost:8080/api/v1/products"
        );
        assert_eq!(
            c.url("/health").expect("url").as_str(),
            "http://localhost:8080/health"
        );
    }

    #[test]
    fn seeded_cookie_is_exported() {
        let c = client("http://localhost:8080");
        assert_eq!(c.cookie_header(), None);
        assert!(c.seed_cookie("auth_token=abc"));
        assert_eq!(c.cookie_header().as_deref(), Some("auth_token=abc"));
    }

    #[test]
    fn with_client_has_no_jar() {
        let url = Url::parse("http://localhost:8080").expect("valid url");
        let c = ApiClient::with_client(reqwest::Client::new(), url);
        assert!(!c.seed_cookie("auth_token=abc"));
        assert_eq!(c.cookie_header(), None);
    }
}
