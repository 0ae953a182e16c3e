#![deny(missing_docs)]

//! # Contract Shims
//!
//! Generic structures acting as an Intermediate Deserialization Layer.
//! These structs map directly to the OpenAPI 3.x objects the validator reads;
//! everything else in the document is ignored.
//!
//! Schemas are kept as raw `serde_json::Value` so they can be rewritten for
//! validation. Objects that may be replaced by a `$ref` use `utoipa`'s `RefOr`.
//!
//! Note: shims must be deserialized with `serde_yaml` (which also reads JSON).
//! `RefOr` is an untagged enum, and buffering numbers through
//! `serde_json`'s `arbitrary_precision` representation corrupts them.
//! Path items and responses are first read as `serde_yaml::Value` so that
//! extension keys and integer status codes can be handled.

use indexmap::IndexMap;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use utoipa::openapi::RefOr;

/// A Security Requirement Object: scheme name -> scopes.
pub type ShimSecurityRequirement = IndexMap<String, Vec<String>>;

/// Schema for the root document.
#[derive(Debug, Clone, Deserialize)]
pub struct ShimOpenApi {
    /// OpenAPI version (e.g. "3.0.3").
    #[serde(default, deserialize_with = "deserialize_scalar")]
    pub openapi: Option<String>,

    /// Swagger version (e.g. "2.0"), read only to reject legacy documents.
    #[serde(default, deserialize_with = "deserialize_scalar")]
    pub swagger: Option<String>,

    /// Server configuration.
    #[serde(default)]
    pub servers: Vec<ShimServer>,

    /// Path items, in document order.
    #[serde(default)]
    pub paths: ShimPaths,

    /// Components section used for reference resolution.
    #[serde(default)]
    pub components: Option<ShimComponents>,

    /// Global security requirements.
    #[serde(default)]
    pub security: Option<Vec<ShimSecurityRequirement>>,
}

/// Represents the Paths Object, dropping specification extensions.
#[derive(Debug, Clone, Default)]
pub struct ShimPaths {
    /// Parsed path items keyed by path template, in document order.
    pub items: IndexMap<String, ShimPathItem>,
}

impl<'de> Deserialize<'de> for ShimPaths {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = IndexMap::<String, serde_yaml::Value>::deserialize(deserializer)?;
        let mut items = IndexMap::new();

        for (key, value) in raw {
            if key.starts_with("x-") {
                continue;
            }
            let item: ShimPathItem = serde_yaml::from_value(value).map_err(|e| {
                DeError::custom(format!("Failed to parse path item '{}': {}", key, e))
            })?;
            items.insert(key, item);
        }

        Ok(Self { items })
    }
}

/// A Server Object.
#[derive(Debug, Clone, Deserialize)]
pub struct ShimServer {
    /// Server URL, possibly templated with `{variables}`.
    pub url: Option<String>,
    /// Variable substitutions for the URL template.
    #[serde(default)]
    pub variables: IndexMap<String, ShimServerVariable>,
}

/// A Server Variable Object.
#[derive(Debug, Clone, Deserialize)]
pub struct ShimServerVariable {
    /// Default substitution value.
    #[serde(default, deserialize_with = "deserialize_scalar")]
    pub default: Option<String>,
    /// Allowed values.
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<serde_yaml::Value>>,
}

/// A Path Item Object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShimPathItem {
    /// Reference to a reusable path item.
    #[serde(rename = "$ref")]
    pub ref_path: Option<String>,
    /// Parameters shared by every operation on this path.
    #[serde(default)]
    pub parameters: Vec<RefOr<ShimParameter>>,
    /// `GET` operation.
    pub get: Option<ShimOperation>,
    /// `PUT` operation.
    pub put: Option<ShimOperation>,
    /// `POST` operation.
    pub post: Option<ShimOperation>,
    /// `DELETE` operation.
    pub delete: Option<ShimOperation>,
    /// `OPTIONS` operation.
    pub options: Option<ShimOperation>,
    /// `HEAD` operation.
    pub head: Option<ShimOperation>,
    /// `PATCH` operation.
    pub patch: Option<ShimOperation>,
    /// `TRACE` operation.
    pub trace: Option<ShimOperation>,
}

/// An Operation Object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShimOperation {
    /// Unique operation identifier.
    #[serde(rename = "operationId")]
    pub operation_id: Option<String>,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Operation-level parameters (override path-level ones).
    #[serde(default)]
    pub parameters: Vec<RefOr<ShimParameter>>,
    /// Request body.
    #[serde(rename = "requestBody")]
    pub request_body: Option<RefOr<ShimRequestBody>>,
    /// Responses keyed by status code, status range (`4XX`) or `default`.
    #[serde(default, deserialize_with = "deserialize_responses")]
    pub responses: IndexMap<String, RefOr<ShimResponse>>,
    /// Security requirements overriding the global ones.
    pub security: Option<Vec<ShimSecurityRequirement>>,
    /// Whether the operation is deprecated.
    #[serde(default)]
    pub deprecated: bool,
}

/// A Parameter Object.
#[derive(Debug, Clone, Deserialize)]
pub struct ShimParameter {
    /// Parameter name.
    pub name: String,
    /// Location (path, query, header, cookie).
    #[serde(rename = "in")]
    pub parameter_in: String,
    /// Whether the parameter is required.
    #[serde(default)]
    pub required: bool,
    /// Schema definition.
    pub schema: Option<Value>,
    /// Content map, mutually exclusive with `schema`.
    pub content: Option<IndexMap<String, ShimMediaType>>,
    /// Serialization style.
    pub style: Option<String>,
    /// Explode modifier.
    pub explode: Option<bool>,
}

/// A Request Body Object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShimRequestBody {
    /// Media type -> schema.
    #[serde(default)]
    pub content: IndexMap<String, ShimMediaType>,
    /// Whether a body must be sent.
    #[serde(default)]
    pub required: bool,
}

/// A Media Type Object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShimMediaType {
    /// Schema for payloads of this media type.
    pub schema: Option<Value>,
}

/// A Response Object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShimResponse {
    /// Description.
    pub description: Option<String>,
    /// Response headers.
    #[serde(default)]
    pub headers: IndexMap<String, RefOr<ShimHeader>>,
    /// Media type -> schema.
    #[serde(default)]
    pub content: IndexMap<String, ShimMediaType>,
}

/// A Header Object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShimHeader {
    /// Whether the header must be present.
    #[serde(default)]
    pub required: bool,
    /// Schema definition.
    pub schema: Option<Value>,
    /// Content map, mutually exclusive with `schema`.
    pub content: Option<IndexMap<String, ShimMediaType>>,
}

/// Components object holding reusable definitions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShimComponents {
    /// Named schemas, reachable through `#/components/schemas/{name}`.
    #[serde(default)]
    pub schemas: IndexMap<String, Value>,
    /// Reusable parameters.
    #[serde(default)]
    pub parameters: IndexMap<String, RefOr<ShimParameter>>,
    /// Reusable request bodies.
    #[serde(rename = "requestBodies", default)]
    pub request_bodies: IndexMap<String, RefOr<ShimRequestBody>>,
    /// Reusable responses.
    #[serde(default)]
    pub responses: IndexMap<String, RefOr<ShimResponse>>,
    /// Reusable headers.
    #[serde(default)]
    pub headers: IndexMap<String, RefOr<ShimHeader>>,
    /// Security schemes.
    #[serde(rename = "securitySchemes", default)]
    pub security_schemes: IndexMap<String, ShimSecurityScheme>,
}

/// Strict definition of Security Schemes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ShimSecurityScheme {
    /// API Key.
    #[serde(rename = "apiKey")]
    ApiKey(ShimApiKey),
    /// HTTP Authentication (Basic, Bearer).
    #[serde(rename = "http")]
    Http(ShimHttpAuth),
    /// OAuth2.
    #[serde(rename = "oauth2")]
    OAuth2(ShimOpaqueScheme),
    /// OpenID Connect.
    #[serde(rename = "openIdConnect")]
    OpenIdConnect(ShimOpaqueScheme),
    /// Mutual TLS.
    #[serde(rename = "mutualTLS")]
    MutualTls(ShimOpaqueScheme),
}

/// API Key definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShimApiKey {
    /// Parameter name (header/query/cookie name).
    pub name: String,
    /// Location (query, header, cookie).
    #[serde(rename = "in")]
    pub in_loc: String,
}

/// HTTP Authentication definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShimHttpAuth {
    /// Scheme name (basic, bearer, ...).
    pub scheme: String,
    /// Bearer token format hint.
    #[serde(rename = "bearerFormat")]
    pub bearer_format: Option<String>,
}

/// A scheme whose details the validator does not inspect.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShimOpaqueScheme {
    /// Description.
    pub description: Option<String>,
}

/// Responses keys may be written as bare integers in YAML (`200:`).
fn deserialize_responses<'de, D>(
    deserializer: D,
) -> Result<IndexMap<String, RefOr<ShimResponse>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = IndexMap::<serde_yaml::Value, serde_yaml::Value>::deserialize(deserializer)?;
    let mut responses = IndexMap::new();

    for (key, value) in raw {
        let key = scalar_to_string(&key)
            .ok_or_else(|| DeError::custom("Response keys must be scalars"))?;
        if key.starts_with("x-") {
            continue;
        }
        let response = serde_yaml::from_value(value).map_err(|e| {
            DeError::custom(format!("Failed to parse response '{}': {}", key, e))
        })?;
        responses.insert(key, response);
    }

    Ok(responses)
}

/// Accepts unquoted scalars (`openapi: 3.1`, `default: 1.1`) as strings.
fn deserialize_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(scalar_to_string))
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
