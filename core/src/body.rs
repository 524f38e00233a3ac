//! Decoded response bodies.

use std::fmt;
use std::ops::Index;

use serde::de::DeserializeOwned;
use serde_json::Value;

static NULL: Value = Value::Null;

/// A decoded response body, looked up by string key.
///
/// JSON responses hold the parsed document; anything else holds the raw
/// text as a JSON string. Indexing a missing key (or a non-object body)
/// yields `null` rather than panicking, matching `serde_json::Value`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body(Value);

impl Body {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// RFC 6901 lookup, e.g. `/user/name`.
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.0.pointer(pointer)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }

    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.0)
    }
}

impl Index<&str> for Body {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.get(key).unwrap_or(&NULL)
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl PartialEq<Value> for Body {
    fn eq(&self, other: &Value) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[test]
    fn string_key_lookup() {
        let body = Body::new(json!({ "id": 7, "user": { "name": "ann" } }));
        assert_eq!(body["id"], 7);
        assert_eq!(body.get("user").and_then(|u| u.get("name")), Some(&json!("ann")));
        assert_eq!(body.pointer("/user/name"), Some(&json!("ann")));
        assert!(body.contains_key("id"));
        assert!(!body.contains_key("missing"));
    }

    #[test]
    fn missing_key_indexes_to_null() {
        let body = Body::new(json!("plain text"));
        assert!(body["anything"].is_null());
        assert!(body.get("anything").is_none());
    }

    #[test]
    fn typed_access() {
        #[derive(Deserialize)]
        struct User {
            name: String,
        }
        let body = Body::new(json!({ "name": "ann", "extra": true }));
        let user: User = body.deserialize().unwrap();
        assert_eq!(user.name, "ann");
    }
}
