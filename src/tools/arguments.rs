//! Typed access to tool call arguments.

use std::collections::BTreeMap;

use crate::error::{EchoError, Result};

/// Wrapper around tool call arguments providing typed extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// An empty argument object.
    pub fn empty() -> Self {
        Self::new(serde_json::Value::Object(serde_json::Map::new()))
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| EchoError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Get an optional string argument.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

}

impl From<BTreeMap<String, String>> for ToolArguments {
    fn from(pairs: BTreeMap<String, String>) -> Self {
        let map = pairs
            .into_iter()
            .map(|(k, v)| (k, serde_json::Value::String(v)))
            .collect();
        Self::new(serde_json::Value::Object(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_pairs_become_a_json_object() {
        let mut pairs = BTreeMap::new();
        pairs.insert("keyword".to_string(), "rust".to_string());
        pairs.insert("lang".to_string(), "en".to_string());

        let args = ToolArguments::from(pairs);
        assert_eq!(args.raw(), &json!({"keyword": "rust", "lang": "en"}));
        assert_eq!(args.get_str("keyword").unwrap(), "rust");
    }

    #[test]
    fn missing_string_is_invalid_argument() {
        let args = ToolArguments::empty();
        let err = args.get_str("title").unwrap_err();
        assert!(matches!(err, EchoError::InvalidArgument(msg) if msg.contains("title")));
        assert_eq!(args.get_str_opt("lang"), None);
    }
}
