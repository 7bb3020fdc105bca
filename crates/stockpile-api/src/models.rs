// Wire models for the Stockpile REST API
//
// Success bodies share the `{ "data": T }` envelope; failures share the
// `{ "error": "...", "fields": [...] }` shape. Product descriptions are
// nullable on the backend and have been emitted in two encodings, so
// `Description` remembers which one it was read in and writes it back
// the same way.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::de::Deserializer;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

/// Placeholder shown wherever a product has no description.
pub const EMPTY_PLACEHOLDER: &str = "—";

/// Message used when a failed response carries no usable error body.
pub const FALLBACK_ERROR: &str = "Something went wrong";

// ── Envelopes ────────────────────────────────────────────────────────

/// The `{ "data": T }` wrapper every success response shares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn into_inner(self) -> T {
        self.data
    }
}

/// Payload of the auth mutations (`{ "message": "logged in successfully" }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

/// A single per-field validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// The normalized error shape for every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl ApiError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            fields: Vec::new(),
        }
    }

    /// The generic error used when the backend body is missing or unreadable.
    pub fn fallback() -> Self {
        Self::new(FALLBACK_ERROR)
    }

    /// Parse a raw error body, falling back to the generic message.
    ///
    /// A body that parses but has an empty `error` string is treated as
    /// unusable too.
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Self>(body) {
            Ok(parsed) if !parsed.error.trim().is_empty() => parsed,
            _ => Self::fallback(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.error)?;
        for field in &self.fields {
            write!(f, "; {}: {}", field.field, field.message)?;
        }
        Ok(())
    }
}

// ── Users ────────────────────────────────────────────────────────────

/// The session subject returned by `GET /auth/me`.
///
/// Some backend builds answer with only `{ "user_id": ... }`, so every
/// field other than the id defaults to empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "user_id")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Email/password pair for register and login.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl Serialize for Credentials {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Credentials", 2)?;
        state.serialize_field("email", &self.email)?;
        state.serialize_field("password", self.password.expose_secret())?;
        state.end()
    }
}

// ── Products ─────────────────────────────────────────────────────────

/// How a description was (or will be) written on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NullEncoding {
    /// Field absent from the body.
    #[default]
    Missing,
    /// `"text"` or `null`.
    Plain,
    /// `{ "String": "text", "Valid": true }`.
    Pair,
}

/// A nullable product description plus the encoding it travelled in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Description {
    value: Option<String>,
    encoding: NullEncoding,
    /// Text carried by a `"Valid": false` pair, written back unchanged.
    invalid_text: String,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DescriptionWire {
    Pair {
        #[serde(rename = "String")]
        string: String,
        #[serde(rename = "Valid")]
        valid: bool,
    },
    Plain(Option<String>),
}

impl Description {
    pub fn new(value: Option<String>, encoding: NullEncoding) -> Self {
        Self {
            value,
            encoding,
            invalid_text: String::new(),
        }
    }

    /// A present description in the plain encoding.
    pub fn text(value: impl Into<String>) -> Self {
        Self::new(Some(value.into()), NullEncoding::Plain)
    }

    /// An explicit `null` in the plain encoding.
    pub fn null() -> Self {
        Self::new(None, NullEncoding::Plain)
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn encoding(&self) -> NullEncoding {
        self.encoding
    }

    pub fn is_missing(&self) -> bool {
        self.encoding == NullEncoding::Missing
    }

    /// The description text, or `placeholder` when there is none.
    pub fn display_or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        self.value.as_deref().unwrap_or(placeholder)
    }

    pub fn into_option(self) -> Option<String> {
        self.value
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_or(EMPTY_PLACEHOLDER))
    }
}

impl Serialize for Description {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self.encoding {
            NullEncoding::Missing | NullEncoding::Plain => {
                DescriptionWire::Plain(self.value.clone())
            }
            NullEncoding::Pair => DescriptionWire::Pair {
                string: self
                    .value
                    .clone()
                    .unwrap_or_else(|| self.invalid_text.clone()),
                valid: self.value.is_some(),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Description {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match DescriptionWire::deserialize(deserializer)? {
            DescriptionWire::Pair { string, valid: true } => {
                Self::new(Some(string), NullEncoding::Pair)
            }
            DescriptionWire::Pair {
                string,
                valid: false,
            } => Self {
                invalid_text: string,
                ..Self::new(None, NullEncoding::Pair)
            },
            DescriptionWire::Plain(value) => Self::new(value, NullEncoding::Plain),
        })
    }
}

/// Accepts the price as a decimal string or, from numeric-column builds,
/// as a bare JSON number. Either way the digits are kept verbatim.
fn price_from_wire<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Price {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Price::deserialize(deserializer)? {
        Price::Text(s) => s,
        Price::Number(n) => n.to_string(),
    })
}

/// A product owned by the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Description::is_missing")]
    pub description: Description,
    #[serde(deserialize_with = "price_from_wire")]
    pub price: String,
    pub stock: i32,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Body for `POST /products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateProduct {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: String,
    pub stock: i32,
}

/// Body for `PUT /products/:id`. Only the fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateProduct {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i32>,
}

impl UpdateProduct {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.stock.is_none()
    }
}
