#![deny(missing_docs)]

//! # Interaction Fixtures
//!
//! A fixture is a YAML (or JSON) file describing one exchange:
//!
//! ```yaml
//! request:
//!   method: POST
//!   path: /api/v3/pets?dryRun=true
//!   headers:
//!     Content-Type: application/json
//!     X-Tags: [a, b]
//!   body:
//!     name: Rex
//! response:
//!   status: 201
//!   headers:
//!     Content-Type: application/json
//!   body: '{"id": 1, "name": "Rex"}'
//! ```
//!
//! A string body is sent verbatim; any other body is serialized to JSON.
//! `response` is optional.

use crate::error::{CliError, CliResult};
use cdd_validator::{Method, Request, Response};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

/// A parsed fixture file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InteractionFixture {
    /// The request side.
    pub request: RequestFixture,
    /// The response side, when one should be validated.
    #[serde(default)]
    pub response: Option<ResponseFixture>,
}

/// The request side of a fixture.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestFixture {
    /// HTTP method, any case.
    pub method: String,
    /// Path, optionally with a query string.
    pub path: String,
    /// Header name -> value(s).
    #[serde(default)]
    pub headers: IndexMap<String, OneOrMany>,
    /// Extra query parameters, appended after those in `path`.
    #[serde(default)]
    pub query: IndexMap<String, OneOrMany>,
    /// Payload.
    #[serde(default)]
    pub body: Option<serde_yaml::Value>,
}

/// The response side of a fixture.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseFixture {
    /// Status code.
    pub status: u16,
    /// Header name -> value(s).
    #[serde(default)]
    pub headers: IndexMap<String, OneOrMany>,
    /// Payload.
    #[serde(default)]
    pub body: Option<serde_yaml::Value>,
}

/// A single scalar or a list of scalars.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    /// `X-Header: [a, b]`
    Many(Vec<serde_yaml::Value>),
    /// `X-Header: value`
    One(serde_yaml::Value),
}

impl OneOrMany {
    fn values(&self) -> CliResult<Vec<String>> {
        match self {
            OneOrMany::Many(items) => items.iter().map(scalar_text).collect(),
            OneOrMany::One(value) => scalar_text(value).map(|v| vec![v]),
        }
    }
}

fn scalar_text(value: &serde_yaml::Value) -> CliResult<String> {
    match value {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(CliError::Fixture(format!(
            "Header and query values must be scalars, found {:?}",
            other
        ))),
    }
}

fn body_text(body: &serde_yaml::Value) -> CliResult<String> {
    match body {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        other => serde_json::to_string(other)
            .map_err(|e| CliError::Fixture(format!("Failed to encode body as JSON: {}", e))),
    }
}

impl InteractionFixture {
    /// Parses fixture text. JSON fixtures are accepted as YAML.
    pub fn parse(content: &str) -> CliResult<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| CliError::Fixture(format!("Failed to parse interaction: {}", e)))
    }

    /// Reads and parses a fixture file.
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Builds the core request.
    pub fn to_request(&self) -> CliResult<Request> {
        let fixture = &self.request;
        let method: Method = fixture
            .method
            .to_ascii_uppercase()
            .parse()
            .map_err(|e| CliError::Fixture(format!("{}", e)))?;

        let mut builder = Request::builder(method, fixture.path.clone());
        for (name, value) in &fixture.headers {
            for v in value.values()? {
                builder = builder.with_header(name.clone(), v);
            }
        }
        for (name, value) in &fixture.query {
            for v in value.values()? {
                builder = builder.with_query_param(name.clone(), v);
            }
        }
        if let Some(body) = &fixture.body {
            builder = builder.with_body(body_text(body)?);
        }
        Ok(builder.build())
    }

    /// Builds the core response, if the fixture has one.
    pub fn to_response(&self) -> CliResult<Option<Response>> {
        let Some(fixture) = &self.response else {
            return Ok(None);
        };
        let mut builder = Response::builder(fixture.status);
        for (name, value) in &fixture.headers {
            for v in value.values()? {
                builder = builder.with_header(name.clone(), v);
            }
        }
        if let Some(body) = &fixture.body {
            builder = builder.with_body(body_text(body)?);
        }
        Ok(Some(builder.build()))
    }
}
