//! Raw message payloads.

use indexmap::IndexMap;
use serde_json::Value;

/// A request or response payload.
///
/// The payload is kept as raw text; it is only parsed when a schema actually
/// needs to inspect it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    raw: String,
}

impl Body {
    /// Wraps a textual payload.
    pub fn from_string(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Wraps a binary payload, replacing invalid UTF-8 sequences.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            raw: String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    /// The raw payload text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the payload is empty or whitespace only.
    pub fn is_empty(&self) -> bool {
        self.raw.trim().is_empty()
    }

    /// Parses the payload as JSON.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.raw)
    }

    /// Decodes an `application/x-www-form-urlencoded` payload into ordered
    /// name -> values pairs.
    pub fn to_form_fields(&self) -> IndexMap<String, Vec<String>> {
        let mut fields: IndexMap<String, Vec<String>> = IndexMap::new();
        for (name, value) in url::form_urlencoded::parse(self.raw.as_bytes()) {
            fields
                .entry(name.into_owned())
                .or_default()
                .push(value.into_owned());
        }
        fields
    }
}

impl From<&str> for Body {
    fn from(raw: &str) -> Self {
        Body::from_string(raw)
    }
}

impl From<String> for Body {
    fn from(raw: String) -> Self {
        Body::from_string(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_parsing() {
        let body = Body::from(r#"{"id": 1}"#);
        assert_eq!(body.to_json().unwrap(), json!({"id": 1}));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(Body::from("{not json").to_json().is_err());
    }

    #[test]
    fn test_form_fields_group_repeated_names() {
        let body = Body::from("tag=a&name=Rex+Dog&tag=b");
        let fields = body.to_form_fields();
        assert_eq!(fields["tag"], vec!["a", "b"]);
        assert_eq!(fields["name"], vec!["Rex Dog"]);
    }

    #[test]
    fn test_whitespace_only_body_is_empty() {
        assert!(Body::from("  \n").is_empty());
    }
}
