//! The request side of an interaction.

use crate::model::{Body, Headers, Method};
use indexmap::IndexMap;

/// A framework-neutral HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    path: String,
    method: Method,
    headers: Headers,
    query: IndexMap<String, Vec<String>>,
    body: Option<Body>,
}

impl Request {
    /// Starts building a request. A query string on `path` is split off into
    /// query parameters.
    pub fn builder(method: Method, path: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(method, path.into())
    }

    /// Request path without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// HTTP method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Query parameters, in order of first appearance.
    pub fn query_params(&self) -> &IndexMap<String, Vec<String>> {
        &self.query
    }

    /// All values for a query parameter. Empty when absent.
    pub fn query_values(&self, name: &str) -> &[String] {
        self.query.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The payload, if one was sent.
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Whether a non-empty payload was sent.
    pub fn has_body(&self) -> bool {
        self.body.as_ref().is_some_and(|b| !b.is_empty())
    }

    /// The `Content-Type` header value.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.first("Content-Type")
    }

    /// Cookies sent in `Cookie` headers, name -> values.
    pub fn cookies(&self) -> IndexMap<String, Vec<String>> {
        let mut cookies: IndexMap<String, Vec<String>> = IndexMap::new();
        for header in self.headers.get_all("Cookie") {
            for pair in header.split(';') {
                let pair = pair.trim();
                if pair.is_empty() {
                    continue;
                }
                let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
                cookies
                    .entry(name.trim().to_string())
                    .or_default()
                    .push(value.trim().to_string());
            }
        }
        cookies
    }
}

/// Builder for [`Request`].
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    fn new(method: Method, path: String) -> Self {
        let (path, query) = match path.split_once('?') {
            Some((p, q)) => (p.to_string(), Some(q.to_string())),
            None => (path, None),
        };
        let mut builder = Self {
            request: Request {
                path,
                method,
                headers: Headers::new(),
                query: IndexMap::new(),
                body: None,
            },
        };
        if let Some(query) = query {
            for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
                builder = builder.with_query_param(name.into_owned(), value.into_owned());
            }
        }
        builder
    }

    /// Adds a header value.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.headers.append(name, value);
        self
    }

    /// Adds a query parameter value.
    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request
            .query
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Sets the `Content-Type` header.
    pub fn with_content_type(self, content_type: impl Into<String>) -> Self {
        self.with_header("Content-Type", content_type)
    }

    /// Sets the `Accept` header.
    pub fn with_accept(self, accept: impl Into<String>) -> Self {
        self.with_header("Accept", accept)
    }

    /// Sets the payload.
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.request.body = Some(body.into());
        self
    }

    /// Finishes the request.
    pub fn build(self) -> Request {
        self.request
    }
}
