//! Request body construction.
//!
//! Write endpoints treat a missing key differently from a key set to `null`
//! or a default, so bodies must only carry the fields the caller actually
//! provided. [`PayloadBuilder`] records which fields were provided and
//! serializes exactly those.

use serde_json::{Map, Value};

/// Builds a JSON object from required and optional fields.
///
/// # Examples
///
/// ```
/// use commerce_mcp_bridge::payload::PayloadBuilder;
/// use serde_json::json;
///
/// let description: Option<&str> = None;
/// let body = PayloadBuilder::new()
///     .field("name", "Shoes")
///     .optional("parent_id", Some(2))
///     .optional("description", description)
///     .wrap("category");
///
/// assert_eq!(body, json!({"category": {"name": "Shoes", "parent_id": 2}}));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayloadBuilder {
    fields: Map<String, Value>,
}

impl PayloadBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field unconditionally.
    #[must_use]
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_owned(), value.into());
        self
    }

    /// Sets a field only when a value was provided.
    #[must_use]
    pub fn optional<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.fields.insert(key.to_owned(), value.into());
        }
        self
    }

    /// The JSON object.
    #[must_use]
    pub fn build(self) -> Value {
        Value::Object(self.fields)
    }

    /// The JSON object wrapped as `{root: {...}}`, the shape write endpoints expect.
    #[must_use]
    pub fn wrap(self, root: &str) -> Value {
        let mut outer = Map::new();
        outer.insert(root.to_owned(), self.build());
        Value::Object(outer)
    }
}
