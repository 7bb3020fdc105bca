//! Data bridge: connects the query cache to TUI actions.
//!
//! Runs as a background task. Whenever the visible route changes, or a
//! cache event touches a query that route shows, the affected read is
//! refetched through the [`Client`] and its result forwarded as an
//! [`Action`]. Reads are spawned so the loop never blocks on the network;
//! the cache's single-flight collapses overlapping ones.

use tokio::sync::{broadcast::error::RecvError, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use stockpile_core::{CacheEvent, Client, QueryKey, Route};

use crate::action::Action;

/// Observe `route_rx` and the cache until `cancel` fires.
pub async fn spawn_data_bridge(
    client: Client,
    mut route_rx: watch::Receiver<Route>,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut events = client.cache().invalidations();

    let route = *route_rx.borrow_and_update();
    refresh_view(&client, route, &action_tx);

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            changed = route_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let route = *route_rx.borrow_and_update();
                debug!(%route, "route changed");
                refresh_view(&client, route, &action_tx);
            }

            event = events.recv() => match event {
                // Logout: the rows belong to a session that no longer exists.
                // Nothing is refetched; the next protected view loads fresh.
                Ok(CacheEvent::Cleared) => {
                    let _ = action_tx.send(Action::CacheCleared);
                }
                Ok(event) => {
                    let route = *route_rx.borrow();
                    refetch_affected(&client, route, &event, &action_tx);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "cache events lagged, refreshing view");
                    let route = *route_rx.borrow();
                    refresh_view(&client, route, &action_tx);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    debug!("data bridge stopped");
}

/// A read a view renders.
#[derive(Debug, Clone, Copy)]
enum Query {
    Products,
    Session,
}

impl Query {
    fn key(self) -> QueryKey {
        match self {
            Self::Products => QueryKey::products(),
            Self::Session => QueryKey::auth_me(),
        }
    }
}

/// The reads a route renders.
fn observed(route: Route) -> &'static [Query] {
    match route {
        Route::Products => &[Query::Products, Query::Session],
        Route::Landing | Route::Login | Route::Register => &[],
    }
}

fn refresh_view(client: &Client, route: Route, tx: &mpsc::UnboundedSender<Action>) {
    for &query in observed(route) {
        fetch(client, query, tx);
    }
}

fn refetch_affected(
    client: &Client,
    route: Route,
    event: &CacheEvent,
    tx: &mpsc::UnboundedSender<Action>,
) {
    for &query in observed(route) {
        if event.affects(&query.key()) {
            debug!(?query, "refetching invalidated query");
            fetch(client, query, tx);
        }
    }
}

fn fetch(client: &Client, query: Query, tx: &mpsc::UnboundedSender<Action>) {
    let client = client.clone();
    let tx = tx.clone();

    match query {
        Query::Products => {
            let _ = tx.send(Action::ProductsLoading);
            tokio::spawn(async move {
                let action = match client.products().await {
                    Ok(products) => Action::ProductsLoaded(products),
                    Err(e) if e.is_unauthorized() => Action::SessionExpired,
                    Err(e) => {
                        warn!(error = %e, "failed to load products");
                        Action::ProductsFailed(e.message())
                    }
                };
                let _ = tx.send(action);
            });
        }
        Query::Session => {
            tokio::spawn(async move {
                match client.me().await {
                    Ok(user) => {
                        let _ = tx.send(Action::SessionResolved(user));
                    }
                    Err(e) if e.is_unauthorized() => {
                        let _ = tx.send(Action::SessionExpired);
                    }
                    Err(e) => warn!(error = %e, "failed to load current user"),
                }
            });
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use stockpile_core::{ClientConfig, QueryDefaults};
    use tokio::time::timeout;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> Client {
        let config = ClientConfig {
            query: QueryDefaults {
                retry: 0,
                ..QueryDefaults::default()
            },
            ..ClientConfig::new(server.uri().parse().unwrap())
        };
        Client::new(config).unwrap()
    }

    fn product_body() -> serde_json::Value {
        json!({ "data": [{
            "id": "p-1",
            "user_id": "u-1",
            "name": "Widget",
            "description": { "String": "", "Valid": false },
            "price": "9.99",
            "stock": 3,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }]})
    }

    async fn mount_session(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "id": "u-1", "email": "a@b.co", "role": "user",
                          "created_at": "", "updated_at": "" }
            })))
            .mount(server)
            .await;
    }

    /// Next action that isn't a loading marker, within a second.
    async fn next_settled(rx: &mut mpsc::UnboundedReceiver<Action>) -> Action {
        loop {
            let action = timeout(Duration::from_secs(1), rx.recv())
                .await
                .unwrap()
                .unwrap();
            if !matches!(action, Action::ProductsLoading) {
                return action;
            }
        }
    }

    async fn products_loaded(rx: &mut mpsc::UnboundedReceiver<Action>) -> usize {
        loop {
            if let Action::ProductsLoaded(products) = next_settled(rx).await {
                return products.len();
            }
        }
    }

    #[tokio::test]
    async fn products_route_loads_and_refetches_after_invalidation() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(product_body()))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let (_route_tx, route_rx) = watch::channel(Route::Products);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let bridge = tokio::spawn(spawn_data_bridge(
            client.clone(),
            route_rx,
            tx,
            cancel.clone(),
        ));

        assert_eq!(products_loaded(&mut rx).await, 1);

        client.cache().invalidate(&QueryKey::products());
        assert_eq!(products_loaded(&mut rx).await, 1);

        cancel.cancel();
        bridge.await.unwrap();
    }

    #[tokio::test]
    async fn public_routes_observe_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(product_body()))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let (_route_tx, route_rx) = watch::channel(Route::Login);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let bridge = tokio::spawn(spawn_data_bridge(
            client.clone(),
            route_rx,
            tx,
            cancel.clone(),
        ));

        client.cache().invalidate(&QueryKey::products());
        assert!(
            timeout(Duration::from_millis(200), rx.recv()).await.is_err(),
            "no action expected on the login route"
        );

        cancel.cancel();
        bridge.await.unwrap();
    }

    #[tokio::test]
    async fn navigating_to_products_fetches_and_clear_is_forwarded() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(product_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let (route_tx, route_rx) = watch::channel(Route::Landing);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let bridge = tokio::spawn(spawn_data_bridge(
            client.clone(),
            route_rx,
            tx,
            cancel.clone(),
        ));

        route_tx.send_replace(Route::Products);
        assert_eq!(products_loaded(&mut rx).await, 1);

        client.cache().clear();
        loop {
            if matches!(next_settled(&mut rx).await, Action::CacheCleared) {
                break;
            }
        }

        cancel.cancel();
        bridge.await.unwrap();
    }

    #[tokio::test]
    async fn unauthorized_read_expires_the_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "error": "Unauthorized" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let (_route_tx, route_rx) = watch::channel(Route::Products);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let bridge = tokio::spawn(spawn_data_bridge(client, route_rx, tx, cancel.clone()));

        assert!(matches!(next_settled(&mut rx).await, Action::SessionExpired));

        cancel.cancel();
        bridge.await.unwrap();
    }
}
