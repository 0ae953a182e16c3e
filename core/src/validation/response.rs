//! Response-side validation of a resolved operation.

use crate::content::{most_specific_match, MediaType};
use crate::contract::ResponseDefinition;
use crate::model::Response;
use crate::path::ApiOperation;
use crate::report::{Message, MessageContext, ValidationReport};
use crate::schema::{SchemaValidator, ValidationSide};
use crate::validation::body::validate_body;
use crate::validation::custom::CustomResponseValidator;
use std::fmt;
use std::sync::Arc;

const BODY_PREFIX: &str = "validation.response.body";
const HEADER_PREFIX: &str = "validation.response.header";

/// Validates responses against the operation their request resolved to.
#[derive(Clone)]
pub struct ResponseValidator {
    schema_validator: SchemaValidator,
    custom: Vec<Arc<dyn CustomResponseValidator>>,
}

impl ResponseValidator {
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
        validator: impl CustomResponseValidator + 'static,
    ) -> Self {
        self.custom.push(Arc::new(validator));
        self
    }

    pub(crate) fn with_shared_validators(
        mut self,
        validators: impl IntoIterator<Item = Arc<dyn CustomResponseValidator>>,
    ) -> Self {
        self.custom.extend(validators);
        self
    }

    /// Runs every response check and tags the findings with response context.
    pub fn validate(&self, response: &Response, operation: &ApiOperation) -> ValidationReport {
        let report = match operation.definition().response_for(response.status()) {
            Some(definition) => self
                .validate_body(response, operation, definition)
                .merge(validate_content_type(response, definition))
                .merge(self.validate_headers(response, definition)),
            None => ValidationReport::singleton(Message::new(
                "validation.response.status.unknown",
                format!(
                    "Response status {} not defined for path '{}'.",
                    response.status(),
                    operation.api_path().original()
                ),
            )),
        };

        let report = report.merge(
            self.custom
                .iter()
                .map(|v| v.validate(response, operation))
                .collect(),
        );

        report.with_additional_context(
            &MessageContext::response(
                operation.request_path().raw(),
                operation.method(),
                response.status(),
            )
            .with_api_operation(operation.clone()),
        )
    }

    fn validate_body(
        &self,
        response: &Response,
        operation: &ApiOperation,
        definition: &ResponseDefinition,
    ) -> ValidationReport {
        let method = operation.method();
        let api_path = operation.api_path().original();
        let status = response.status();

        if definition.content.is_empty() {
            if response.has_body() {
                return ValidationReport::singleton(Message::new(
                    format!("{}.unexpected", BODY_PREFIX),
                    format!(
                        "No response body is expected for {} on path '{}' with status {}.",
                        method, api_path, status
                    ),
                ));
            }
            return ValidationReport::empty();
        }

        let body = match response.body() {
            Some(body) if !body.is_empty() => body,
            _ => {
                return ValidationReport::singleton(Message::new(
                    format!("{}.missing", BODY_PREFIX),
                    format!(
                        "A response body is expected for {} on path '{}' with status {} but none found.",
                        method, api_path, status
                    ),
                ));
            }
        };

        let declared: Vec<&str> = definition.content.keys().map(String::as_str).collect();
        let Some(content_type) = response.content_type().or(declared.first().copied()) else {
            return ValidationReport::empty();
        };
        // Unknown or malformed types are reported by the Content-Type check.
        let Some(media_type) = most_specific_match(content_type, declared.iter().copied()) else {
            return ValidationReport::empty();
        };

        let schema = definition.content.get(&media_type).and_then(Option::as_ref);
        validate_body(
            &self.schema_validator,
            body,
            content_type,
            schema,
            ValidationSide::Response,
            BODY_PREFIX,
        )
    }

    fn validate_headers(
        &self,
        response: &Response,
        definition: &ResponseDefinition,
    ) -> ValidationReport {
        definition
            .headers
            .iter()
            .filter(|h| !h.name.eq_ignore_ascii_case("content-type"))
            .map(|header| {
                let values = response.headers().get_all(&header.name);
                if values.is_empty() {
                    if header.required {
                        return ValidationReport::singleton(Message::new(
                            format!("{}.missing", HEADER_PREFIX),
                            format!(
                                "Header '{}' is expected on response but not found.",
                                header.name
                            ),
                        ));
                    }
                    return ValidationReport::empty();
                }
                match &header.schema {
                    Some(schema) => values
                        .iter()
                        .map(|value| {
                            self.schema_validator.validate_string(
                                value,
                                schema,
                                Some(ValidationSide::Response),
                                HEADER_PREFIX,
                            )
                        })
                        .collect(),
                    None => ValidationReport::empty(),
                }
            })
            .collect()
    }
}

impl fmt::Debug for ResponseValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseValidator")
            .field("schema_validator", &self.schema_validator)
            .field("custom_validators", &self.custom.len())
            .finish()
    }
}

fn validate_content_type(response: &Response, definition: &ResponseDefinition) -> ValidationReport {
    let Some(content_type) = response.content_type() else {
        return ValidationReport::empty();
    };
    if MediaType::parse(content_type).is_none() {
        return ValidationReport::singleton(Message::new(
            "validation.response.contentType.invalid",
            format!(
                "Response Content-Type header '{}' is not a valid media type.",
                content_type
            ),
        ));
    }

    let declared: Vec<&str> = definition.content.keys().map(String::as_str).collect();
    if declared.is_empty() || declared.contains(&"*/*") {
        return ValidationReport::empty();
    }
    if most_specific_match(content_type, declared.iter().copied()).is_some() {
        return ValidationReport::empty();
    }
    ValidationReport::singleton(Message::new(
        "validation.response.contentType.notAllowed",
        format!(
            "Response Content-Type header '{}' is not allowed. Must be one of: {:?}.",
            content_type, declared
        ),
    ))
}
