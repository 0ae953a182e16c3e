//! Security requirement checks.
//!
//! Requirements are alternatives: one satisfied requirement is enough. All
//! schemes inside a requirement must be satisfied.

use crate::contract::{
    OperationDefinition, ParamSource, SecurityRequirement, SecuritySchemeKind, SecuritySchemeRef,
};
use crate::model::Request;
use crate::report::{Message, ValidationReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Outcome {
    Satisfied,
    Missing,
    Invalid,
}

pub(crate) fn validate_security(
    request: &Request,
    operation: &OperationDefinition,
) -> ValidationReport {
    if operation.security.is_empty() {
        return ValidationReport::empty();
    }

    let outcomes: Vec<Outcome> = operation
        .security
        .iter()
        .map(|requirement| check_requirement(request, requirement))
        .collect();
    if outcomes.contains(&Outcome::Satisfied) {
        return ValidationReport::empty();
    }

    let alternatives = operation
        .security
        .iter()
        .map(describe)
        .collect::<Vec<_>>()
        .join(", ");

    let message = if outcomes.contains(&Outcome::Invalid) {
        Message::new(
            "validation.request.security.invalid",
            format!(
                "Credentials were supplied but do not satisfy any security requirement: {}.",
                alternatives
            ),
        )
    } else {
        Message::new(
            "validation.request.security.missing",
            format!(
                "No credentials were supplied for any security requirement: {}.",
                alternatives
            ),
        )
    };
    ValidationReport::singleton(message)
}

fn check_requirement(request: &Request, requirement: &SecurityRequirement) -> Outcome {
    requirement
        .schemes
        .iter()
        .map(|scheme| check_scheme(request, scheme))
        .max()
        .unwrap_or(Outcome::Satisfied)
}

fn check_scheme(request: &Request, scheme: &SecuritySchemeRef) -> Outcome {
    match &scheme.kind {
        SecuritySchemeKind::ApiKey { name, in_loc } => {
            let present = match in_loc {
                ParamSource::Header => {
                    request.headers().first(name).is_some_and(|v| !v.is_empty())
                }
                ParamSource::Query => request.query_values(name).iter().any(|v| !v.is_empty()),
                ParamSource::Cookie => request
                    .cookies()
                    .get(name)
                    .is_some_and(|values| values.iter().any(|v| !v.is_empty())),
                ParamSource::Path => false,
            };
            if present {
                Outcome::Satisfied
            } else {
                Outcome::Missing
            }
        }
        SecuritySchemeKind::Http { scheme } => authorization(request, scheme),
        SecuritySchemeKind::OAuth2 | SecuritySchemeKind::OpenIdConnect => {
            authorization(request, "bearer")
        }
        SecuritySchemeKind::MutualTls => Outcome::Satisfied,
    }
}

/// `Authorization: <scheme> <credentials>`, scheme compared case-insensitively.
fn authorization(request: &Request, scheme: &str) -> Outcome {
    let Some(value) = request.headers().first("Authorization") else {
        return Outcome::Missing;
    };
    let mut parts = value.trim().splitn(2, ' ');
    let actual = parts.next().unwrap_or_default();
    let credentials = parts.next().unwrap_or_default().trim();
    if actual.eq_ignore_ascii_case(scheme) && !credentials.is_empty() {
        Outcome::Satisfied
    } else {
        Outcome::Invalid
    }
}

fn describe(requirement: &SecurityRequirement) -> String {
    let names: Vec<&str> = requirement
        .schemes
        .iter()
        .map(|s| s.scheme_name.as_str())
        .collect();
    format!("[{}]", names.join(" + "))
}
