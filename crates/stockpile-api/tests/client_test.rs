#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stockpile_api::{
    ApiClient, CreateProduct, Credentials, Error, NullEncoding, TransportConfig, UpdateProduct,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = ApiClient::new(base_url, &TransportConfig::default()).unwrap();
    (server, client)
}

fn product(id: &str, name: &str, price: &str, stock: i32) -> serde_json::Value {
    json!({
        "id": id,
        "user_id": "u-1",
        "name": name,
        "price": price,
        "stock": stock,
        "created_at": "2025-03-01T12:00:00Z",
        "updated_at": "2025-03-01T12:00:00Z"
    })
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_stores_cookie_for_later_requests() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(body_json(json!({"email": "a@b.co", "password": "secret123"})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "auth_token=tok-1; Path=/; HttpOnly")
                .set_body_json(json!({"data": {"message": "logged in successfully"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .and(header("cookie", "auth_token=tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "u-1",
                "email": "a@b.co",
                "role": "user",
                "created_at": "2025-03-01T12:00:00Z",
                "updated_at": "2025-03-01T12:00:00Z"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let msg = client
        .login(&Credentials::new("a@b.co", "secret123"))
        .await
        .unwrap();
    assert_eq!(msg.message, "logged in successfully");
    assert_eq!(client.cookie_header().as_deref(), Some("auth_token=tok-1"));

    let me = client.me().await.unwrap();
    assert_eq!(me.email, "a@b.co");
    assert_eq!(me.role, "user");
}

#[tokio::test]
async fn test_register_created() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/register"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"data": {"message": "registered successfully"}})),
        )
        .mount(&server)
        .await;

    let msg = client
        .register(&Credentials::new("new@b.co", "secret123"))
        .await
        .unwrap();
    assert_eq!(msg.message, "registered successfully");
}

#[tokio::test]
async fn test_me_unauthorized() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "unauthorized"})))
        .mount(&server)
        .await;

    let err = client.me().await.unwrap_err();
    assert!(err.is_unauthorized(), "expected 401, got: {err:?}");
    assert_eq!(err.normalized().error, "unauthorized");
}

#[tokio::test]
async fn test_logout_sends_no_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/logout"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "auth_token=; Path=/; Max-Age=0")
                .set_body_json(json!({"data": {"message": "logged out"}})),
        )
        .mount(&server)
        .await;

    client.seed_cookie("auth_token=tok-1");
    let msg = client.logout().await.unwrap();
    assert_eq!(msg.message, "logged out");
    assert_eq!(client.cookie_header(), None);
}

// ── Error normalization tests ───────────────────────────────────────

#[tokio::test]
async fn test_validation_error_keeps_fields() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/products"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "error": "validation failed",
            "fields": [{"field": "Price", "message": "this field is required"}]
        })))
        .mount(&server)
        .await;

    let err = client
        .create_product(&CreateProduct {
            name: "A".into(),
            description: None,
            price: String::new(),
            stock: 0,
        })
        .await
        .unwrap_err();

    match err {
        Error::Api { status, body } => {
            assert_eq!(status, 422);
            assert_eq!(body.error, "validation failed");
            assert_eq!(body.fields.len(), 1);
            assert_eq!(body.fields[0].field, "Price");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_unreadable_error_body_uses_fallback() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/products"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let err = client.list_products().await.unwrap_err();
    assert_eq!(err.status(), Some(502));
    assert_eq!(err.normalized().error, "Something went wrong");
}

#[tokio::test]
async fn test_rate_limited_is_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({"error": "too many requests"})),
        )
        .mount(&server)
        .await;

    let err = client
        .login(&Credentials::new("a@b.co", "secret123"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(429));
    assert_eq!(err.normalized().error, "too many requests");
}

#[tokio::test]
async fn test_connection_refused_normalizes_to_fallback() {
    let base = Url::parse("http://127.0.0.1:9").unwrap();
    let client = ApiClient::new(base, &TransportConfig::default()).unwrap();

    let err = client.list_products().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got: {err:?}");
    assert_eq!(err.normalized().error, "Something went wrong");
}

#[tokio::test]
async fn test_malformed_success_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/products/p-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"nope\":1}"))
        .mount(&server)
        .await;

    let err = client.get_product("p-1").await.unwrap_err();
    assert!(
        matches!(err, Error::Deserialization { .. }),
        "expected Deserialization, got: {err:?}"
    );
}

// ── Product tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_list_products_preserves_fields() {
    let (server, client) = setup().await;

    let mut with_pair = product("p-2", "B", "10.00", 0);
    with_pair["description"] = json!({"String": "Boxed", "Valid": true});

    Mock::given(method("GET"))
        .and(path("/api/v1/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [product("p-1", "A", "9.99", 3), with_pair]
        })))
        .mount(&server)
        .await;

    let products = client.list_products().await.unwrap();

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].name, "A");
    assert_eq!(products[0].price, "9.99");
    assert_eq!(products[0].stock, 3);
    assert_eq!(products[0].description.as_deref(), None);
    assert_eq!(products[1].price, "10.00");
    assert_eq!(products[1].description.as_deref(), Some("Boxed"));
    assert_eq!(products[1].description.encoding(), NullEncoding::Pair);
}

#[tokio::test]
async fn test_list_products_null_data_is_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": null})))
        .mount(&server)
        .await;

    assert!(client.list_products().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_product_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/products"))
        .and(body_json(json!({"name": "A", "price": "9.99", "stock": 3})))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"data": product("p-1", "A", "9.99", 3)})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let created = client
        .create_product(&CreateProduct {
            name: "A".into(),
            description: None,
            price: "9.99".into(),
            stock: 3,
        })
        .await
        .unwrap();

    assert_eq!(created.id, "p-1");
    assert_eq!(created.price, "9.99");
}

#[tokio::test]
async fn test_update_product_sends_only_set_fields() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/products/p-1"))
        .and(body_json(json!({"price": "12.50"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": product("p-1", "A", "12.50", 3)})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let updated = client
        .update_product(
            "p-1",
            &UpdateProduct {
                price: Some("12.50".into()),
                ..UpdateProduct::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.price, "12.50");
}

#[tokio::test]
async fn test_delete_product_ignores_body() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/products/p-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/products/p-2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_product("p-1").await.unwrap();
    client.delete_product("p-2").await.unwrap();
}

#[tokio::test]
async fn test_product_id_stays_one_path_segment() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/auth/me"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/products/..%2Fauth%2Fme"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "not found"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/products/a%3Fx=1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": product("a?x=1", "A", "1.00", 1)})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client.delete_product("../auth/me").await.unwrap_err();
    assert_eq!(err.status(), Some(404));

    let fetched = client.get_product("a?x=1").await.unwrap();
    assert_eq!(fetched.id, "a?x=1");
}

#[tokio::test]
async fn test_dot_product_ids_are_rejected_before_sending() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    for id in ["", ".", ".."] {
        let err = client.get_product(id).await.unwrap_err();
        assert!(matches!(err, Error::InvalidId(ref bad) if bad == id));
    }
}

#[tokio::test]
async fn test_delete_missing_product() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/products/gone"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "product not found"})),
        )
        .mount(&server)
        .await;

    let err = client.delete_product("gone").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.normalized().error, "product not found");
}

// ── Health tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_plain_text() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    assert_eq!(client.health().await.unwrap(), "ok");
}
