//! Data-sync layer between `stockpile-api` and the front ends (CLI / TUI).
//!
//! - **[`Client`]**: cheaply cloneable facade. Reads go through the
//!   [`QueryCache`]; writes call the API and, once the backend has
//!   answered with success, invalidate the affected keys (or clear the
//!   cache on logout).
//!
//! - **[`QueryCache`]**: keyed, single-flight read cache. At most one
//!   request per key is in flight; every other reader of that key awaits
//!   the same result. Change notification via `watch` (version) and
//!   `broadcast` ([`CacheEvent`]).
//!
//! - **[`Route`]** / [`resolve_landing`]: where a front end starts,
//!   decided by the current-session read.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod route;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{CacheEvent, QueryCache, QueryKey, QueryOptions, QueryState};
pub use client::Client;
pub use config::{ClientConfig, QueryDefaults, TlsVerification};
pub use error::CoreError;
pub use route::{Route, resolve_landing};

// Wire types the front ends render and build.
pub use stockpile_api::{
    ApiError, CreateProduct, Credentials, Description, EMPTY_PLACEHOLDER, FieldError, Message,
    Product, UpdateProduct, User,
};
