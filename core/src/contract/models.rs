#![deny(missing_docs)]

//! # Contract Models
//!
//! Resolved representation of the operations in a contract.
//!
//! Everything reachable through `$ref` (parameters, request bodies, responses,
//! headers, security schemes) is inlined while the contract is loaded, so the
//! validators never chase references except inside JSON schemas.

use crate::error::{AppError, AppResult};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamSource {
    /// Templated path segment (`/pets/{id}`).
    Path,
    /// Query string.
    Query,
    /// Request header.
    Header,
    /// Cookie.
    Cookie,
}

impl ParamSource {
    /// The `in` value used by OpenAPI.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamSource::Path => "path",
            ParamSource::Query => "query",
            ParamSource::Header => "header",
            ParamSource::Cookie => "cookie",
        }
    }
}

impl FromStr for ParamSource {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s {
            "path" => Ok(ParamSource::Path),
            "query" => Ok(ParamSource::Query),
            "header" => Ok(ParamSource::Header),
            "cookie" => Ok(ParamSource::Cookie),
            other => Err(AppError::Contract(format!(
                "Unknown parameter location '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ParamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialization style of a parameter (OAS `style`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamStyle {
    /// `form` (query/cookie default).
    Form,
    /// `simple` (path/header default).
    Simple,
    /// `matrix` path style.
    Matrix,
    /// `label` path style.
    Label,
    /// `spaceDelimited` query arrays.
    SpaceDelimited,
    /// `pipeDelimited` query arrays.
    PipeDelimited,
    /// `deepObject` query objects.
    DeepObject,
}

impl ParamStyle {
    /// The style OpenAPI assumes when none is declared.
    pub fn default_for(source: ParamSource) -> Self {
        match source {
            ParamSource::Query | ParamSource::Cookie => ParamStyle::Form,
            ParamSource::Path | ParamSource::Header => ParamStyle::Simple,
        }
    }

    /// Delimiter between array items in a single serialized value.
    pub fn array_delimiter(&self) -> char {
        match self {
            ParamStyle::SpaceDelimited => ' ',
            ParamStyle::PipeDelimited => '|',
            ParamStyle::Matrix => ';',
            ParamStyle::Label => '.',
            _ => ',',
        }
    }
}

impl FromStr for ParamStyle {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s {
            "form" => Ok(ParamStyle::Form),
            "simple" => Ok(ParamStyle::Simple),
            "matrix" => Ok(ParamStyle::Matrix),
            "label" => Ok(ParamStyle::Label),
            "spaceDelimited" => Ok(ParamStyle::SpaceDelimited),
            "pipeDelimited" => Ok(ParamStyle::PipeDelimited),
            "deepObject" => Ok(ParamStyle::DeepObject),
            other => Err(AppError::Contract(format!(
                "Unknown parameter style '{}'",
                other
            ))),
        }
    }
}

/// A parameter after `$ref` resolution and path/operation merging.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDefinition {
    /// Parameter name (header names keep their declared case).
    pub name: String,
    /// Location.
    pub source: ParamSource,
    /// Whether the parameter must be present.
    pub required: bool,
    /// Schema (from `schema`, or the first `content` entry).
    pub schema: Option<Value>,
    /// Serialization style.
    pub style: ParamStyle,
    /// Whether arrays are sent as repeated values.
    pub explode: bool,
}

/// A request body definition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestBodyDefinition {
    /// Whether a body must be sent.
    pub required: bool,
    /// Declared media types (document order) and their schemas.
    pub content: IndexMap<String, Option<Value>>,
}

/// A response header definition.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderDefinition {
    /// Header name as declared.
    pub name: String,
    /// Whether the header must be present.
    pub required: bool,
    /// Schema for the header value.
    pub schema: Option<Value>,
}

/// A response definition for one status key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponseDefinition {
    /// Declared headers.
    pub headers: Vec<HeaderDefinition>,
    /// Declared media types (document order) and their schemas.
    pub content: IndexMap<String, Option<Value>>,
}

/// Classification of the security scheme logic.
#[derive(Debug, Clone, PartialEq)]
pub enum SecuritySchemeKind {
    /// API Key (Header, Query, Cookie).
    ApiKey {
        /// Parameter name.
        name: String,
        /// Location.
        in_loc: ParamSource,
    },
    /// HTTP Authentication (Basic, Bearer, etc.).
    Http {
        /// Scheme (basic, bearer), lowercased.
        scheme: String,
    },
    /// OAuth2 Flows.
    OAuth2,
    /// OpenID Connect.
    OpenIdConnect,
    /// Mutual TLS.
    MutualTls,
}

/// One scheme inside a security requirement.
#[derive(Debug, Clone, PartialEq)]
pub struct SecuritySchemeRef {
    /// Name of the security scheme in components.
    pub scheme_name: String,
    /// Required scopes (for OAuth2/OIDC).
    pub scopes: Vec<String>,
    /// Resolved scheme details.
    pub kind: SecuritySchemeKind,
}

/// A single security requirement: all schemes must be satisfied (AND).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SecurityRequirement {
    /// Schemes of this requirement. Empty means anonymous access is allowed.
    pub schemes: Vec<SecuritySchemeRef>,
}

/// A fully resolved operation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OperationDefinition {
    /// `operationId`, if declared.
    pub operation_id: Option<String>,
    /// Tags.
    pub tags: Vec<String>,
    /// Path-level parameters merged with operation-level ones.
    pub parameters: Vec<ParameterDefinition>,
    /// Request body.
    pub request_body: Option<RequestBodyDefinition>,
    /// Responses keyed by `200`, `2XX` or `default`.
    pub responses: IndexMap<String, ResponseDefinition>,
    /// Alternative security requirements (OR). Empty means unsecured.
    pub security: Vec<SecurityRequirement>,
    /// Whether the operation is deprecated.
    pub deprecated: bool,
}

impl OperationDefinition {
    /// Parameters declared for `source`.
    pub fn parameters_in(&self, source: ParamSource) -> impl Iterator<Item = &ParameterDefinition> {
        self.parameters.iter().filter(move |p| p.source == source)
    }

    /// The response definition for `status`: exact code, then `NXX`, then `default`.
    pub fn response_for(&self, status: u16) -> Option<&ResponseDefinition> {
        let exact = status.to_string();
        if let Some(r) = self.responses.get(&exact) {
            return Some(r);
        }
        let range = format!("{}XX", status / 100);
        self.responses
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(&range))
            .map(|(_, r)| r)
            .or_else(|| self.responses.get("default"))
    }

    /// Every media type declared across the responses, in document order.
    pub fn response_media_types(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for response in self.responses.values() {
            for media_type in response.content.keys() {
                if !out.contains(media_type) {
                    out.push(media_type.clone());
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op_with(keys: &[&str]) -> OperationDefinition {
        let mut op = OperationDefinition::default();
        for k in keys {
            let mut r = ResponseDefinition::default();
            r.content.insert(format!("application/{}", k), None);
            op.responses.insert((*k).to_string(), r);
        }
        op
    }

    #[test]
    fn test_response_for_prefers_exact_then_range_then_default() {
        let op = op_with(&["200", "2XX", "default"]);
        let exact = op.response_for(200).unwrap();
        assert!(exact.content.contains_key("application/200"));
        let range = op.response_for(201).unwrap();
        assert!(range.content.contains_key("application/2XX"));
        assert!(op
            .response_for(500)
            .unwrap()
            .content
            .contains_key("application/default"));
    }

    #[test]
    fn test_response_for_range_is_case_insensitive() {
        let op = op_with(&["4xx"]);
        assert!(op.response_for(404).is_some());
        assert!(op.response_for(500).is_none());
    }

    #[test]
    fn test_param_style_defaults() {
        assert_eq!(
            ParamStyle::default_for(ParamSource::Query),
            ParamStyle::Form
        );
        assert_eq!(
            ParamStyle::default_for(ParamSource::Path),
            ParamStyle::Simple
        );
        assert_eq!(ParamStyle::PipeDelimited.array_delimiter(), '|');
    }

    #[test]
    fn test_param_source_parse() {
        assert_eq!(
            "cookie".parse::<ParamSource>().unwrap(),
            ParamSource::Cookie
        );
        assert!("body".parse::<ParamSource>().is_err());
    }
}
