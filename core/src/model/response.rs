//! The response side of an interaction.

use crate::model::{Body, Headers};

/// A framework-neutral HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: Headers,
    body: Option<Body>,
}

impl Response {
    /// Starts building a response with the given status code.
    pub fn builder(status: u16) -> ResponseBuilder {
        ResponseBuilder {
            response: Response {
                status,
                headers: Headers::new(),
                body: None,
            },
        }
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
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
}

/// Builder for [`Response`].
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    response: Response,
}

impl ResponseBuilder {
    /// Adds a header value.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.response.headers.append(name, value);
        self
    }

    /// Sets the `Content-Type` header.
    pub fn with_content_type(self, content_type: impl Into<String>) -> Self {
        self.with_header("Content-Type", content_type)
    }

    /// Sets the payload.
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.response.body = Some(body.into());
        self
    }

    /// Finishes the response.
    pub fn build(self) -> Response {
        self.response
    }
}
