//! Whitelist rule tree and its leaf predicates.

use crate::error::AppResult;
use crate::model::{Method, Request, Response};
use crate::path::ApiOperation;
use crate::report::{Message, MessageLocation};
use regex::Regex;
use std::fmt;

/// What a leaf rule inspects. Each predicate reads one side of the finding.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// The finding was raised inside this `components.schemas` entity.
    IsEntity(String),
    /// The message key equals this key.
    MessageHasKey(String),
    /// The message text matches this regex.
    MessageContains(Regex),
    /// The request path contains this substring.
    PathContains(String),
    /// The request path matches this regex.
    PathMatches(Regex),
    /// A request header value contains this substring.
    HeaderContains {
        /// Header name, case-insensitive.
        name: String,
        /// Substring searched in every value.
        value: String,
    },
    /// A request header value matches this regex.
    HeaderMatches {
        /// Header name, case-insensitive.
        name: String,
        /// Pattern tried on every value.
        pattern: Regex,
    },
    /// The request method.
    MethodIs(Method),
    /// The response status code.
    ResponseStatusIs(u16),
    /// The finding concerns the request.
    IsRequest,
    /// The finding concerns the response.
    IsResponse,
    /// The resolved operation has this `operationId`.
    OperationIdIs(String),
    /// The resolved operation's path template, as declared.
    ApiPathIs(String),
}

impl Predicate {
    fn test(
        &self,
        message: &Message,
        operation: Option<&ApiOperation>,
        request: Option<&Request>,
        response: Option<&Response>,
    ) -> bool {
        let context = message.context();
        match self {
            Predicate::IsEntity(name) => context
                .and_then(|c| c.schema_entity())
                .is_some_and(|entity| entity == name),
            Predicate::MessageHasKey(key) => message.key() == key,
            Predicate::MessageContains(pattern) => pattern.is_match(message.message()),
            Predicate::PathContains(needle) => {
                request.is_some_and(|r| r.path().contains(needle.as_str()))
            }
            Predicate::PathMatches(pattern) => request.is_some_and(|r| pattern.is_match(r.path())),
            Predicate::HeaderContains { name, value } => request.is_some_and(|r| {
                r.headers()
                    .get_all(name)
                    .iter()
                    .any(|v| v.contains(value.as_str()))
            }),
            Predicate::HeaderMatches { name, pattern } => request.is_some_and(|r| {
                r.headers()
                    .get_all(name)
                    .iter()
                    .any(|v| pattern.is_match(v))
            }),
            Predicate::MethodIs(method) => request.is_some_and(|r| r.method() == *method),
            Predicate::ResponseStatusIs(status) => response.is_some_and(|r| r.status() == *status),
            Predicate::IsRequest => {
                context.and_then(|c| c.location()) == Some(MessageLocation::Request)
            }
            Predicate::IsResponse => {
                context.and_then(|c| c.location()) == Some(MessageLocation::Response)
            }
            Predicate::OperationIdIs(id) => {
                operation.and_then(ApiOperation::operation_id) == Some(id.as_str())
            }
            Predicate::ApiPathIs(template) => {
                operation.is_some_and(|op| op.api_path().original() == template)
            }
        }
    }
}

/// A composable predicate over a finding and the interaction it came from.
#[derive(Debug, Clone)]
pub enum WhitelistRule {
    /// Matches when every child matches. Empty matches everything.
    All(Vec<WhitelistRule>),
    /// Matches when any child matches. Empty matches nothing.
    Any(Vec<WhitelistRule>),
    /// A single predicate with its human readable description.
    Atomic {
        /// The check.
        predicate: Predicate,
        /// Rendered by `Display`.
        description: String,
    },
}

impl WhitelistRule {
    /// Evaluates the rule, short-circuiting on the first deciding child.
    pub fn matches(
        &self,
        message: &Message,
        operation: Option<&ApiOperation>,
        request: Option<&Request>,
        response: Option<&Response>,
    ) -> bool {
        match self {
            WhitelistRule::All(rules) => rules
                .iter()
                .all(|r| r.matches(message, operation, request, response)),
            WhitelistRule::Any(rules) => rules
                .iter()
                .any(|r| r.matches(message, operation, request, response)),
            WhitelistRule::Atomic { predicate, .. } => {
                predicate.test(message, operation, request, response)
            }
        }
    }

    /// Both rules must match. Flattens nested `All`s.
    pub fn and(self, other: WhitelistRule) -> WhitelistRule {
        match self {
            WhitelistRule::All(mut rules) => {
                rules.push(other);
                WhitelistRule::All(rules)
            }
            rule => WhitelistRule::All(vec![rule, other]),
        }
    }

    /// Either rule may match. Flattens nested `Any`s.
    pub fn or(self, other: WhitelistRule) -> WhitelistRule {
        match self {
            WhitelistRule::Any(mut rules) => {
                rules.push(other);
                WhitelistRule::Any(rules)
            }
            rule => WhitelistRule::Any(vec![rule, other]),
        }
    }
}

impl fmt::Display for WhitelistRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (rules, joiner) = match self {
            WhitelistRule::Atomic { description, .. } => return f.write_str(description),
            WhitelistRule::All(rules) => (rules, " and "),
            WhitelistRule::Any(rules) => (rules, " or "),
        };
        f.write_str("(")?;
        for (i, rule) in rules.iter().enumerate() {
            if i > 0 {
                f.write_str(joiner)?;
            }
            write!(f, "{}", rule)?;
        }
        f.write_str(")")
    }
}

fn atomic(predicate: Predicate, description: String) -> WhitelistRule {
    WhitelistRule::Atomic {
        predicate,
        description,
    }
}

/// Every rule must match.
pub fn all_of(rules: impl IntoIterator<Item = WhitelistRule>) -> WhitelistRule {
    WhitelistRule::All(rules.into_iter().collect())
}

/// At least one rule must match.
pub fn any_of(rules: impl IntoIterator<Item = WhitelistRule>) -> WhitelistRule {
    WhitelistRule::Any(rules.into_iter().collect())
}

/// The finding was raised inside the named `components.schemas` entity.
pub fn is_entity(name: impl Into<String>) -> WhitelistRule {
    let name = name.into();
    atomic(
        Predicate::IsEntity(name.clone()),
        format!("entity is '{}'", name),
    )
}

/// The message key is exactly `key`.
pub fn message_has_key(key: impl Into<String>) -> WhitelistRule {
    let key = key.into();
    atomic(
        Predicate::MessageHasKey(key.clone()),
        format!("message key is '{}'", key),
    )
}

/// The message text matches `pattern`.
pub fn message_contains(pattern: &str) -> AppResult<WhitelistRule> {
    Ok(atomic(
        Predicate::MessageContains(Regex::new(pattern)?),
        format!("message matches '{}'", pattern),
    ))
}

/// The request path contains `needle`.
pub fn path_contains(needle: impl Into<String>) -> WhitelistRule {
    let needle = needle.into();
    atomic(
        Predicate::PathContains(needle.clone()),
        format!("path contains '{}'", needle),
    )
}

/// The request path matches `pattern`.
pub fn path_matches(pattern: &str) -> AppResult<WhitelistRule> {
    Ok(atomic(
        Predicate::PathMatches(Regex::new(pattern)?),
        format!("path matches '{}'", pattern),
    ))
}

/// A value of request header `name` contains `value`.
pub fn header_contains(name: impl Into<String>, value: impl Into<String>) -> WhitelistRule {
    let (name, value) = (name.into(), value.into());
    let description = format!("header '{}' contains '{}'", name, value);
    atomic(Predicate::HeaderContains { name, value }, description)
}

/// A value of request header `name` matches `pattern`.
pub fn header_matches(name: impl Into<String>, pattern: &str) -> AppResult<WhitelistRule> {
    let name = name.into();
    let description = format!("header '{}' matches '{}'", name, pattern);
    Ok(atomic(
        Predicate::HeaderMatches {
            name,
            pattern: Regex::new(pattern)?,
        },
        description,
    ))
}

/// The request method is `method`.
pub fn method_is(method: Method) -> WhitelistRule {
    atomic(Predicate::MethodIs(method), format!("method is {}", method))
}

/// The response status is `status`.
pub fn response_status_is(status: u16) -> WhitelistRule {
    atomic(
        Predicate::ResponseStatusIs(status),
        format!("response status is {}", status),
    )
}

/// The finding concerns the request.
pub fn is_request() -> WhitelistRule {
    atomic(Predicate::IsRequest, "is request".to_string())
}

/// The finding concerns the response.
pub fn is_response() -> WhitelistRule {
    atomic(Predicate::IsResponse, "is response".to_string())
}

/// The resolved operation's `operationId` is `id`.
pub fn operation_id_is(id: impl Into<String>) -> WhitelistRule {
    let id = id.into();
    atomic(
        Predicate::OperationIdIs(id.clone()),
        format!("operationId is '{}'", id),
    )
}

/// The resolved operation was declared under `template`.
pub fn api_path_is(template: impl Into<String>) -> WhitelistRule {
    let template = template.into();
    atomic(
        Predicate::ApiPathIs(template.clone()),
        format!("api path is '{}'", template),
    )
}
