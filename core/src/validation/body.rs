//! Structural validation of request and response payloads.

use crate::content::{is_form, is_json};
use crate::model::Body;
use crate::report::ValidationReport;
use crate::schema::coercion::form_to_json;
use crate::schema::{SchemaValidator, ValidationSide};
use serde_json::Value;

/// Validates `body` when `content_type` is JSON or a urlencoded form; other
/// payloads are not structurally validated.
pub(crate) fn validate_body(
    validator: &SchemaValidator,
    body: &Body,
    content_type: &str,
    schema: Option<&Value>,
    side: ValidationSide,
    prefix: &str,
) -> ValidationReport {
    if is_json(content_type) {
        validator.validate_lazy(
            || body.to_json().map_err(|e| e.to_string()),
            schema,
            Some(side),
            prefix,
        )
    } else if is_form(content_type) {
        validator.validate_lazy(
            || {
                let fields = body.to_form_fields();
                Ok(schema
                    .map(|s| form_to_json(&fields, s, validator.definitions()))
                    .unwrap_or(Value::Null))
            },
            schema,
            Some(side),
            prefix,
        )
    } else {
        ValidationReport::empty()
    }
}
