// stockpile-api: Async Rust client for the Stockpile inventory REST API
//
// One cookie-bearing transport, typed resource clients for the auth and
// product endpoints, and the wire models they exchange. Every non-2xx
// response is normalized into `ApiError` here and nowhere else.

pub mod auth;
pub mod client;
pub mod error;
pub mod health;
pub mod models;
pub mod products;
pub mod transport;

pub use client::ApiClient;
pub use error::Error;
pub use models::{
    ApiError, CreateProduct, Credentials, Description, Envelope, FieldError, Message,
    NullEncoding, Product, UpdateProduct, User, EMPTY_PLACEHOLDER, FALLBACK_ERROR,
};
pub use transport::{TlsMode, TransportConfig};
