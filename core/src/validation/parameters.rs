//! Path, query, header and cookie parameter checks.

use crate::contract::{ParamSource, ParamStyle, ParameterDefinition};
use crate::model::Request;
use crate::path::ApiOperation;
use crate::report::{Message, MessageContext, ValidationReport};
use crate::schema::coercion::form_to_json;
use crate::schema::{SchemaValidator, ValidationSide};
use indexmap::IndexMap;

const PARAMETER_PREFIX: &str = "validation.request.parameter";

/// Header parameters OpenAPI ignores: they are described elsewhere.
const IGNORED_HEADERS: &[&str] = &["accept", "content-type", "authorization"];

pub(crate) fn validate_parameters(
    request: &Request,
    operation: &ApiOperation,
    validator: &SchemaValidator,
) -> ValidationReport {
    let api_path = operation.api_path().original();
    let cookies = request.cookies();

    operation
        .definition()
        .parameters
        .iter()
        .map(|param| {
            if param.source == ParamSource::Query && param.style == ParamStyle::DeepObject {
                return validate_deep_object(request, param, api_path, validator);
            }

            let values: Vec<String> = match param.source {
                ParamSource::Path => operation
                    .path_param(&param.name)
                    .map(|v| vec![v.to_string()])
                    .unwrap_or_default(),
                ParamSource::Query => request.query_values(&param.name).to_vec(),
                ParamSource::Header => {
                    if IGNORED_HEADERS.contains(&param.name.to_ascii_lowercase().as_str()) {
                        return ValidationReport::empty();
                    }
                    request.headers().get_all(&param.name).to_vec()
                }
                ParamSource::Cookie => cookies.get(&param.name).cloned().unwrap_or_default(),
            };

            let report = if values.is_empty() {
                missing(param, api_path)
            } else {
                match &param.schema {
                    Some(schema) => validator.validate_values(
                        &values,
                        schema,
                        param.style,
                        param.explode,
                        Some(ValidationSide::Request),
                        PARAMETER_PREFIX,
                    ),
                    None => ValidationReport::empty(),
                }
            };
            report.with_additional_context(&MessageContext::default().with_parameter(&param.name))
        })
        .collect()
}

fn missing(param: &ParameterDefinition, api_path: &str) -> ValidationReport {
    if !param.required {
        return ValidationReport::empty();
    }
    let (kind, label) = match param.source {
        ParamSource::Path => ("path", "Path"),
        ParamSource::Query => ("query", "Query"),
        ParamSource::Header => ("header", "Header"),
        ParamSource::Cookie => ("cookie", "Cookie"),
    };
    ValidationReport::singleton(Message::new(
        format!("{}.{}.missing", PARAMETER_PREFIX, kind),
        format!(
            "{} parameter '{}' is required on path '{}' but not found in request.",
            label, param.name, api_path
        ),
    ))
}

/// `?filter[name]=rex&filter[age]=3` style objects.
fn validate_deep_object(
    request: &Request,
    param: &ParameterDefinition,
    api_path: &str,
    validator: &SchemaValidator,
) -> ValidationReport {
    let prefix = format!("{}[", param.name);
    let fields: IndexMap<String, Vec<String>> = request
        .query_params()
        .iter()
        .filter_map(|(key, values)| {
            let property = key.strip_prefix(&prefix)?.strip_suffix(']')?;
            Some((property.to_string(), values.clone()))
        })
        .collect();

    let report = if fields.is_empty() {
        missing(param, api_path)
    } else {
        match &param.schema {
            Some(schema) => validator.validate(
                &form_to_json(&fields, schema, validator.definitions()),
                schema,
                Some(ValidationSide::Request),
                PARAMETER_PREFIX,
            ),
            None => ValidationReport::empty(),
        }
    };
    report.with_additional_context(&MessageContext::default().with_parameter(&param.name))
}
