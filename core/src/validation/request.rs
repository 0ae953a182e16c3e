//! Request-side validation of a resolved operation.

use crate::content::{most_specific_match, MediaType};
use crate::model::Request;
use crate::path::ApiOperation;
use crate::report::{Message, MessageContext, ValidationReport};
use crate::schema::{SchemaValidator, ValidationSide};
use crate::validation::body::validate_body;
use crate::validation::custom::CustomRequestValidator;
use crate::validation::parameters::validate_parameters;
use crate::validation::security::validate_security;
use std::fmt;
use std::sync::Arc;

const BODY_PREFIX: &str = "validation.request.body";

/// Validates requests against the operation they resolved to.
#[derive(Clone)]
pub struct RequestValidator {
    schema_validator: SchemaValidator,
    custom: Vec<Arc<dyn CustomRequestValidator>>,
}

impl RequestValidator {
    /// Creates a validator without custom checks.
    pub fn new(schema_validator: SchemaValidator) -> Self {
        Self {
            schema_validator,
            custom: Vec::new(),
        }
    }

    /// Registers a custom check, run after the built-in ones in registration order.
    pub fn with_custom_validator(
        mut self,
        validator: impl CustomRequestValidator + 'static,
    ) -> Self {
        self.custom.push(Arc::new(validator));
        self
    }

    pub(crate) fn with_shared_validators(
        mut self,
        validators: impl IntoIterator<Item = Arc<dyn CustomRequestValidator>>,
    ) -> Self {
        self.custom.extend(validators);
        self
    }

    /// Runs every request check and tags the findings with request context.
    pub fn validate(&self, request: &Request, operation: &ApiOperation) -> ValidationReport {
        let definition = operation.definition();

        let report = validate_security(request, definition)
            .merge(validate_parameters(
                request,
                operation,
                &self.schema_validator,
            ))
            .merge(self.validate_body(request, operation))
            .merge(validate_accept(request, operation))
            .merge(
                self.custom
                    .iter()
                    .map(|v| v.validate(request, operation))
                    .collect(),
            );

        report.with_additional_context(
            &MessageContext::request(request.path(), request.method())
                .with_api_operation(operation.clone()),
        )
    }

    fn validate_body(&self, request: &Request, operation: &ApiOperation) -> ValidationReport {
        let method = operation.method();
        let api_path = operation.api_path().original();

        let Some(body_definition) = &operation.definition().request_body else {
            if request.has_body() {
                return ValidationReport::singleton(Message::new(
                    format!("{}.unexpected", BODY_PREFIX),
                    format!(
                        "No request body is expected for {} on path '{}'.",
                        method, api_path
                    ),
                ));
            }
            return ValidationReport::empty();
        };

        let body = match request.body() {
            Some(body) if !body.is_empty() => body,
            _ => {
                if body_definition.required {
                    return ValidationReport::singleton(Message::new(
                        format!("{}.missing", BODY_PREFIX),
                        format!(
                            "A request body is required but none found for {} on path '{}'.",
                            method, api_path
                        ),
                    ));
                }
                return ValidationReport::empty();
            }
        };

        if body_definition.content.is_empty() {
            return ValidationReport::empty();
        }
        let declared: Vec<&str> = body_definition.content.keys().map(String::as_str).collect();

        // Without a Content-Type the payload is read as the first declared type.
        let content_type = match request.content_type() {
            Some(ct) => ct,
            None => declared[0],
        };
        if MediaType::parse(content_type).is_none() {
            return ValidationReport::singleton(Message::new(
                "validation.request.contentType.invalid",
                format!(
                    "Request Content-Type header '{}' is not a valid media type.",
                    content_type
                ),
            ));
        }
        let Some(media_type) = most_specific_match(content_type, declared.iter().copied()) else {
            return ValidationReport::singleton(Message::new(
                "validation.request.contentType.notAllowed",
                format!(
                    "Request Content-Type header '{}' does not match any allowed types. Must be one of: {:?}.",
                    content_type, declared
                ),
            ));
        };

        let schema = body_definition
            .content
            .get(&media_type)
            .and_then(Option::as_ref);
        validate_body(
            &self.schema_validator,
            body,
            content_type,
            schema,
            ValidationSide::Request,
            BODY_PREFIX,
        )
    }
}

impl fmt::Debug for RequestValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestValidator")
            .field("schema_validator", &self.schema_validator)
            .field("custom_validators", &self.custom.len())
            .finish()
    }
}

/// Checks the `Accept` header against the media types the operation can return.
fn validate_accept(request: &Request, operation: &ApiOperation) -> ValidationReport {
    let Some(accept) = request.headers().first("Accept") else {
        return ValidationReport::empty();
    };
    let declared = operation.definition().response_media_types();
    if declared.is_empty() {
        return ValidationReport::empty();
    }

    let ranges: Vec<&str> = accept
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .collect();
    if ranges.is_empty() || ranges.iter().any(|r| MediaType::parse(r).is_none()) {
        return ValidationReport::singleton(Message::new(
            "validation.request.accept.invalid",
            format!(
                "Request Accept header '{}' is not a valid media type.",
                accept
            ),
        ));
    }

    let acceptable = declared.iter().any(|produced| {
        most_specific_match(produced, ranges.iter().copied()).is_some()
            || ranges
                .iter()
                .any(|r| most_specific_match(r, [produced.as_str()]).is_some())
    });
    if acceptable {
        return ValidationReport::empty();
    }

    ValidationReport::singleton(Message::new(
        "validation.request.accept.notAllowed",
        format!(
            "Request Accept header '{}' does not match any defined response types. Must be one of: {:?}.",
            accept, declared
        ),
    ))
}
