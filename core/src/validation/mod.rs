//! # Interaction Checks
//!
//! Request and response validation against a resolved operation.
//!
//! - **request** / **response**: the built-in checks, in a fixed order.
//! - **custom**: user-supplied checks run after the built-in ones.
//! - **parameters**, **security**, **body**: shared building blocks.

mod body;
pub mod custom;
mod parameters;
mod request;
mod response;
mod security;

pub use custom::{CustomRequestValidator, CustomResponseValidator};
pub use request::RequestValidator;
pub use response::ResponseValidator;

use crate::model::Method;
use crate::path::OperationMatch;
use crate::report::{Message, MessageContext, ValidationReport};

/// The report for a request that did not resolve to an operation.
///
/// Empty when `resolution` found an operation.
pub(crate) fn resolution_failure(
    resolution: &OperationMatch,
    path: &str,
    method: Method,
) -> ValidationReport {
    let message = match resolution {
        OperationMatch::Found(_) => return ValidationReport::empty(),
        OperationMatch::PathNotFound => Message::new(
            "validation.request.path.missing",
            format!("No API path found that matches request '{}'.", path),
        ),
        OperationMatch::MethodNotAllowed { api_path, allowed } => {
            let allowed: Vec<&str> = allowed.iter().map(Method::as_str).collect();
            Message::new(
                "validation.request.operation.notAllowed",
                format!("{} operation not allowed on path '{}'.", method, api_path),
            )
            .with_additional_info(format!("Allowed operations: {}", allowed.join(", ")))
        }
    };
    ValidationReport::singleton(message)
        .with_additional_context(&MessageContext::request(path, method))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::Contract;
    use crate::path::OperationResolver;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[test]
    fn test_path_not_found() {
        let report = resolution_failure(&OperationMatch::PathNotFound, "/nowhere", Method::Get);
        let message = &report.messages()[0];
        assert_eq!(message.key(), "validation.request.path.missing");
        assert_eq!(
            message.message(),
            "No API path found that matches request '/nowhere'."
        );
        assert_eq!(message.context().unwrap().request_path(), Some("/nowhere"));
    }

    #[test]
    fn test_found_operation_has_no_failure() {
        let contract = Contract::from_yaml(
            "openapi: 3.0.3\npaths:\n  /pets:\n    get:\n      responses: {}\n",
        )
        .unwrap();
        let operations = Arc::clone(contract.operations());
        let resolver = OperationResolver::new(operations, "/", false).unwrap();
        let found = resolver.resolve("/pets", Method::Get);
        assert!(found.operation().is_some());
        assert!(resolution_failure(&found, "/pets", Method::Get).is_empty());
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        let resolution = OperationMatch::MethodNotAllowed {
            api_path: "/pets".to_string(),
            allowed: vec![Method::Get, Method::Post],
        };
        let report = resolution_failure(&resolution, "/pets", Method::Delete);
        let message = &report.messages()[0];
        assert_eq!(message.key(), "validation.request.operation.notAllowed");
        assert_eq!(
            message.message(),
            "DELETE operation not allowed on path '/pets'."
        );
        assert_eq!(message.additional_info(), ["Allowed operations: GET, POST"]);
        assert_eq!(
            message.context().unwrap().request_method(),
            Some(Method::Delete)
        );
    }
}
