// ── Query keys ──
//
// Structured identifiers for cached reads. Keys form families by prefix:
// `["products"]` names the list and is also the prefix of every
// `["products", id]` detail key, so invalidating it covers both.

use std::fmt;

const AUTH: &str = "auth";
const ME: &str = "me";
const PRODUCTS: &str = "products";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// `("auth", "me")`: the current-session read.
    pub fn auth_me() -> Self {
        Self::new([AUTH, ME])
    }

    /// `("products")`: the product list, and the whole product family.
    pub fn products() -> Self {
        Self::new([PRODUCTS])
    }

    /// `("products", id)`: one product.
    pub fn product(id: &str) -> Self {
        Self::new([PRODUCTS, id])
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// Whether `self` belongs to the family named by `prefix`.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}
