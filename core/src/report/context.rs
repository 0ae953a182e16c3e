//! Metadata attached to messages after validation completes.

use crate::model::Method;
use crate::path::ApiOperation;
use serde::Serialize;

/// Which side of the interaction a message concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageLocation {
    /// The request.
    Request,
    /// The response.
    Response,
}

/// JSON Pointers locating a schema finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pointers {
    /// Pointer into the validated instance, e.g. `/tags/0`.
    pub instance: String,
    /// Pointer to the failing keyword in the validation schema.
    pub schema: String,
}

/// Denormalized context for a `Message`.
///
/// Contexts are only ever enriched: [`MessageContext::enriched_with`] fills
/// fields that are still empty and never replaces a value already set.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<MessageLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_method: Option<Method>,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_operation: Option<ApiOperation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pointers: Option<Pointers>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema_entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied_whitelist_rule: Option<String>,
}

impl MessageContext {
    /// Context for a request-side finding.
    pub fn request(path: impl Into<String>, method: Method) -> Self {
        Self {
            location: Some(MessageLocation::Request),
            request_path: Some(path.into()),
            request_method: Some(method),
            ..Self::default()
        }
    }

    /// Context for a response-side finding.
    pub fn response(path: impl Into<String>, method: Method, status: u16) -> Self {
        Self {
            location: Some(MessageLocation::Response),
            request_path: Some(path.into()),
            request_method: Some(method),
            response_status: Some(status),
            ..Self::default()
        }
    }

    /// Sets the resolved operation.
    pub fn with_api_operation(mut self, operation: ApiOperation) -> Self {
        self.api_operation = Some(operation);
        self
    }

    /// Sets the response status.
    pub fn with_response_status(mut self, status: u16) -> Self {
        self.response_status = Some(status);
        self
    }

    /// Sets the parameter or header name the finding concerns.
    pub fn with_parameter(mut self, name: impl Into<String>) -> Self {
        self.parameter = Some(name.into());
        self
    }

    /// Sets instance/schema pointers.
    pub fn with_pointers(mut self, instance: impl Into<String>, schema: impl Into<String>) -> Self {
        self.pointers = Some(Pointers {
            instance: instance.into(),
            schema: schema.into(),
        });
        self
    }

    /// Sets the named schema (`components.schemas` entry) the finding lives in.
    pub fn with_schema_entity(mut self, entity: Option<String>) -> Self {
        self.schema_entity = entity;
        self
    }

    pub(crate) fn with_applied_whitelist_rule(mut self, rule: impl Into<String>) -> Self {
        self.applied_whitelist_rule = Some(rule.into());
        self
    }

    /// Returns a copy with every empty field filled from `other`.
    pub fn enriched_with(self, other: &MessageContext) -> Self {
        Self {
            location: self.location.or(other.location),
            request_path: self.request_path.or_else(|| other.request_path.clone()),
            request_method: self.request_method.or(other.request_method),
            api_operation: self.api_operation.or_else(|| other.api_operation.clone()),
            response_status: self.response_status.or(other.response_status),
            parameter: self.parameter.or_else(|| other.parameter.clone()),
            pointers: self.pointers.or_else(|| other.pointers.clone()),
            schema_entity: self.schema_entity.or_else(|| other.schema_entity.clone()),
            applied_whitelist_rule: self
                .applied_whitelist_rule
                .or_else(|| other.applied_whitelist_rule.clone()),
        }
    }

    /// Request or response side.
    pub fn location(&self) -> Option<MessageLocation> {
        self.location
    }

    /// The incoming request path.
    pub fn request_path(&self) -> Option<&str> {
        self.request_path.as_deref()
    }

    /// The incoming request method.
    pub fn request_method(&self) -> Option<Method> {
        self.request_method
    }

    /// The operation the request resolved to.
    pub fn api_operation(&self) -> Option<&ApiOperation> {
        self.api_operation.as_ref()
    }

    /// Response status, for response-side findings.
    pub fn response_status(&self) -> Option<u16> {
        self.response_status
    }

    /// Parameter or header name.
    pub fn parameter(&self) -> Option<&str> {
        self.parameter.as_deref()
    }

    /// Instance/schema pointers for schema findings.
    pub fn pointers(&self) -> Option<&Pointers> {
        self.pointers.as_ref()
    }

    /// Innermost named schema the failing keyword belongs to.
    pub fn schema_entity(&self) -> Option<&str> {
        self.schema_entity.as_deref()
    }

    /// Name of the whitelist rule that demoted this finding.
    pub fn applied_whitelist_rule(&self) -> Option<&str> {
        self.applied_whitelist_rule.as_deref()
    }
}
