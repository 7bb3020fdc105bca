// ── Client facade ──
//
// The single entry point for front ends. Reads are keyed queries served
// through the `QueryCache`; writes go straight to the API and apply
// their invalidation rule only after the backend reports success.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info};

use stockpile_api::transport::{TlsMode, TransportConfig};
use stockpile_api::{ApiClient, CreateProduct, Credentials, Message, Product, UpdateProduct, User};

use crate::cache::{QueryCache, QueryKey, QueryOptions, QueryState};
use crate::config::{ClientConfig, TlsVerification};
use crate::error::CoreError;
use crate::route::{Route, resolve_landing};

/// Cheaply cloneable handle over one API connection and its cache.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    /// Shared with in-flight fetches, which must not keep the cache alive.
    api: Arc<ApiClient>,
    cache: QueryCache,
}

impl Client {
    /// Build the transport and an empty cache. Does no I/O.
    pub fn new(config: ClientConfig) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let api = ApiClient::new(config.url.clone(), &transport)?;
        Ok(Self::with_api(config, api))
    }

    /// Wrap an already-built API client.
    pub fn with_api(config: ClientConfig, api: ApiClient) -> Self {
        let cache = QueryCache::new(config.query);
        Self {
            inner: Arc::new(ClientInner {
                config,
                api: Arc::new(api),
                cache,
            }),
        }
    }

    /// Run one operation against a fresh client, restoring `session`
    /// (an exported cookie header) first. Used by single CLI invocations.
    pub async fn oneshot<F, Fut, T, E>(
        config: ClientConfig,
        session: Option<&str>,
        f: F,
    ) -> Result<T, E>
    where
        F: FnOnce(Client) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<CoreError>,
    {
        let client = Client::new(config)?;
        if let Some(cookie) = session {
            client.restore_session(cookie);
        }
        f(client).await
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    // ── Session ──────────────────────────────────────────────────────

    /// The current user. Never retried: a 401 is a definitive "signed out".
    pub async fn me(&self) -> Result<Arc<User>, CoreError> {
        let options = self.inner.cache.options().no_retry();
        self.read(QueryKey::auth_me(), options, |api| async move { api.me().await })
            .await
    }

    pub fn me_state(&self) -> QueryState<User> {
        self.inner.cache.state(&QueryKey::auth_me())
    }

    /// Decide where a front end lands, from the current-session read.
    pub async fn landing_route(&self) -> Route {
        let session = self.me().await;
        let route = resolve_landing(&session);
        debug!(%route, "landing resolved");
        route
    }

    /// Create an account (which also signs in), then refetch the session.
    pub async fn register(&self, credentials: &Credentials) -> Result<Message, CoreError> {
        let message = self.inner.api.register(credentials).await?;
        info!(email = %credentials.email, "registered");
        self.inner.cache.invalidate(&QueryKey::auth_me());
        Ok(message)
    }

    /// Sign in, then refetch the session.
    pub async fn login(&self, credentials: &Credentials) -> Result<Message, CoreError> {
        let message = self.inner.api.login(credentials).await?;
        info!(email = %credentials.email, "logged in");
        self.inner.cache.invalidate(&QueryKey::auth_me());
        Ok(message)
    }

    /// Sign out and drop every cached read, since the next session may
    /// belong to someone else.
    pub async fn logout(&self) -> Result<Message, CoreError> {
        let message = self.inner.api.logout().await?;
        info!("logged out");
        self.inner.cache.clear();
        Ok(message)
    }

    /// The session cookie header, for persisting between processes.
    pub fn session_cookie(&self) -> Option<String> {
        self.inner.api.cookie_header()
    }

    /// Load a cookie header exported by [`session_cookie`](Self::session_cookie).
    pub fn restore_session(&self, cookie: &str) -> bool {
        self.inner.api.seed_cookie(cookie)
    }

    // ── Products ─────────────────────────────────────────────────────

    pub async fn products(&self) -> Result<Arc<Vec<Product>>, CoreError> {
        let options = self.inner.cache.options();
        self.read(QueryKey::products(), options, |api| async move {
            api.list_products().await
        })
        .await
    }

    pub fn products_state(&self) -> QueryState<Vec<Product>> {
        self.inner.cache.state(&QueryKey::products())
    }

    pub async fn product(&self, id: &str) -> Result<Arc<Product>, CoreError> {
        let options = self.inner.cache.options();
        let id = id.to_owned();
        self.read(QueryKey::product(&id), options, move |api| {
            let id = id.clone();
            async move { api.get_product(&id).await }
        })
        .await
    }

    pub fn product_state(&self, id: &str) -> QueryState<Product> {
        self.inner.cache.state(&QueryKey::product(id))
    }

    pub async fn create_product(&self, product: &CreateProduct) -> Result<Product, CoreError> {
        let created = self.inner.api.create_product(product).await?;
        info!(id = %created.id, name = %created.name, "product created");
        self.invalidate_products();
        Ok(created)
    }

    pub async fn update_product(
        &self,
        id: &str,
        update: &UpdateProduct,
    ) -> Result<Product, CoreError> {
        let updated = self.inner.api.update_product(id, update).await?;
        info!(id, "product updated");
        self.invalidate_products();
        Ok(updated)
    }

    pub async fn delete_product(&self, id: &str) -> Result<(), CoreError> {
        self.inner.api.delete_product(id).await?;
        info!(id, "product deleted");
        self.invalidate_products();
        Ok(())
    }

    // ── Misc ─────────────────────────────────────────────────────────

    /// Backend liveness probe. Not cached.
    pub async fn health(&self) -> Result<String, CoreError> {
        Ok(self.inner.api.health().await?)
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// List, order or aggregates may all have changed: refetch the family.
    fn invalidate_products(&self) {
        self.inner.cache.invalidate(&QueryKey::products());
    }

    async fn read<T, F, Fut>(
        &self,
        key: QueryKey,
        options: QueryOptions,
        call: F,
    ) -> Result<Arc<T>, CoreError>
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<ApiClient>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, stockpile_api::Error>> + Send + 'static,
    {
        let api = Arc::clone(&self.inner.api);
        self.inner
            .cache
            .fetch(key, options, move || {
                let request = call(Arc::clone(&api));
                async move { request.await.map_err(CoreError::from) }
            })
            .await
    }
}

fn build_transport(config: &ClientConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
        cookie_jar: None, // ApiClient::new adds one automatically
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
