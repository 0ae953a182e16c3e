//! # Interaction Validator
//!
//! The entry point: built once from a [`Contract`], then shared across
//! threads to validate requests, responses or complete interactions.
//!
//! Every call resolves the operation, runs the request and/or response
//! checks, then classifies the findings: levels first, whitelist last.

use crate::contract::Contract;
use crate::error::AppResult;
use crate::model::{Method, Request, Response};
use crate::path::{OperationMatch, OperationResolver};
use crate::report::{LevelResolver, ValidationReport};
use crate::schema::{FormatChecker, FormatRegistry, SchemaValidator};
use crate::validation::{
    resolution_failure, CustomRequestValidator, CustomResponseValidator, RequestValidator,
    ResponseValidator,
};
use crate::whitelist::Whitelist;
use std::sync::Arc;
use tracing::debug;

/// Validates HTTP interactions against a contract.
#[derive(Debug, Clone)]
pub struct InteractionValidator {
    resolver: OperationResolver,
    requests: RequestValidator,
    responses: ResponseValidator,
    levels: LevelResolver,
    whitelist: Whitelist,
}

impl InteractionValidator {
    /// Starts configuring a validator for `contract`.
    pub fn builder(contract: Contract) -> InteractionValidatorBuilder {
        InteractionValidatorBuilder::new(contract)
    }

    /// A validator with the default configuration.
    pub fn new(contract: Contract) -> AppResult<Self> {
        Self::builder(contract).build()
    }

    /// The base path stripped from request paths before matching.
    pub fn base_path(&self) -> &str {
        self.resolver.base_path()
    }

    /// Resolves a request path and method to a declared operation.
    pub fn resolve(&self, path: &str, method: Method) -> OperationMatch {
        self.resolver.resolve(path, method)
    }

    /// Validates a request on its own.
    pub fn validate_request(&self, request: &Request) -> ValidationReport {
        let report = match self.resolve(request.path(), request.method()) {
            OperationMatch::Found(operation) => self.requests.validate(request, &operation),
            unresolved => resolution_failure(&unresolved, request.path(), request.method()),
        };
        self.finalize(report, Some(request), None)
    }

    /// Validates a response to a request for `path` and `method`.
    pub fn validate_response(
        &self,
        path: &str,
        method: Method,
        response: &Response,
    ) -> ValidationReport {
        let report = match self.resolve(path, method) {
            OperationMatch::Found(operation) => self.responses.validate(response, &operation),
            unresolved => resolution_failure(&unresolved, path, method),
        };
        self.finalize(report, None, Some(response))
    }

    /// Validates a request and the response it received.
    ///
    /// The request findings come first. When the request does not resolve,
    /// only the resolution failure is reported.
    pub fn validate(&self, request: &Request, response: &Response) -> ValidationReport {
        let report = match self.resolve(request.path(), request.method()) {
            OperationMatch::Found(operation) => self
                .requests
                .validate(request, &operation)
                .merge(self.responses.validate(response, &operation)),
            unresolved => resolution_failure(&unresolved, request.path(), request.method()),
        };
        self.finalize(report, Some(request), Some(response))
    }

    fn finalize(
        &self,
        report: ValidationReport,
        request: Option<&Request>,
        response: Option<&Response>,
    ) -> ValidationReport {
        let report = self
            .whitelist
            .apply(self.levels.apply(report), request, response);
        debug!(
            messages = report.messages().len(),
            has_errors = report.has_errors(),
            "Validated interaction"
        );
        report
    }
}

/// Configuration for an [`InteractionValidator`].
pub struct InteractionValidatorBuilder {
    contract: Contract,
    base_path: Option<String>,
    strict_paths: bool,
    enforce_additional_properties: bool,
    levels: LevelResolver,
    whitelist: Whitelist,
    formats: FormatRegistry,
    request_validators: Vec<Arc<dyn CustomRequestValidator>>,
    response_validators: Vec<Arc<dyn CustomResponseValidator>>,
}

impl InteractionValidatorBuilder {
    fn new(contract: Contract) -> Self {
        Self {
            contract,
            base_path: None,
            strict_paths: false,
            enforce_additional_properties: false,
            levels: LevelResolver::default(),
            whitelist: Whitelist::default(),
            formats: FormatRegistry::default(),
            request_validators: Vec::new(),
            response_validators: Vec::new(),
        }
    }

    /// Overrides the base path derived from the contract's first server.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    /// Treats `/a/` and `/a` as different paths.
    pub fn with_strict_path_matching(mut self, strict: bool) -> Self {
        self.strict_paths = strict;
        self
    }

    /// Rejects object properties the schema does not declare.
    pub fn with_additional_properties_enforced(mut self, enforce: bool) -> Self {
        self.enforce_additional_properties = enforce;
        self
    }

    /// Sets the severity configuration.
    pub fn with_level_resolver(mut self, levels: LevelResolver) -> Self {
        self.levels = levels;
        self
    }

    /// Sets the whitelist.
    pub fn with_whitelist(mut self, whitelist: Whitelist) -> Self {
        self.whitelist = whitelist;
        self
    }

    /// Registers (or replaces) the checker for a `format` value.
    pub fn with_format_checker(
        mut self,
        format: impl Into<String>,
        checker: impl FormatChecker + 'static,
    ) -> Self {
        self.formats = self.formats.with_checker(format, checker);
        self
    }

    /// Adds a custom request check.
    pub fn with_request_validator(
        mut self,
        validator: impl CustomRequestValidator + 'static,
    ) -> Self {
        self.request_validators.push(Arc::new(validator));
        self
    }

    /// Adds a custom response check.
    pub fn with_response_validator(
        mut self,
        validator: impl CustomResponseValidator + 'static,
    ) -> Self {
        self.response_validators.push(Arc::new(validator));
        self
    }

    /// Builds the validator.
    ///
    /// # Errors
    ///
    /// Fails when a path template cannot be compiled.
    pub fn build(self) -> AppResult<InteractionValidator> {
        let contract = self.contract;
        let base_path = self
            .base_path
            .unwrap_or_else(|| contract.base_path().to_string());

        let resolver = OperationResolver::new(
            Arc::clone(contract.operations()),
            &base_path,
            self.strict_paths,
        )?;
        let schema_validator =
            SchemaValidator::new(contract.draft(), Arc::clone(contract.schemas()))
                .with_formats(self.formats)
                .with_additional_properties_enforced(self.enforce_additional_properties);

        debug!(
            version = contract.version(),
            base_path = resolver.base_path(),
            operations = contract.operations().len(),
            "Built interaction validator"
        );

        Ok(InteractionValidator {
            resolver,
            requests: RequestValidator::new(schema_validator.clone())
                .with_shared_validators(self.request_validators),
            responses: ResponseValidator::new(schema_validator)
                .with_shared_validators(self.response_validators),
            levels: self.levels,
            whitelist: self.whitelist,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Level, Message};
    use crate::whitelist::{is_response, message_has_key};
    use pretty_assertions::assert_eq;

    const CONTRACT: &str = r#"
openapi: 3.0.3
servers:
  - url: https://api.example.com/v1
paths:
  /pets:
    get:
      operationId: listPets
      responses:
        '200':
          description: ok
          content:
            application/json:
              schema:
                type: array
                items: { $ref: '#/components/schemas/Pet' }
components:
  schemas:
    Pet:
      type: object
      required: [name]
      properties:
        name: { type: string }
"#;

    fn validator() -> InteractionValidatorBuilder {
        InteractionValidator::builder(Contract::from_yaml(CONTRACT).unwrap())
    }

    fn keys(report: &ValidationReport) -> Vec<&str> {
        report.messages().iter().map(|m| m.key()).collect()
    }

    #[test]
    fn test_base_path_from_servers_and_override() {
        assert_eq!(validator().build().unwrap().base_path(), "/v1");
        let overridden = validator().with_base_path("/").build().unwrap();
        assert!(overridden
            .validate_request(&Request::builder(Method::Get, "/pets").build())
            .is_empty());
    }

    #[test]
    fn test_resolution_failures_short_circuit() {
        let v = validator().build().unwrap();
        let request = Request::builder(Method::Get, "/v1/owners").build();
        let response = Response::builder(200).with_body("not json").build();
        assert_eq!(
            keys(&v.validate(&request, &response)),
            vec!["validation.request.path.missing"]
        );

        let post = Request::builder(Method::Post, "/v1/pets").build();
        assert_eq!(
            keys(&v.validate_request(&post)),
            vec!["validation.request.operation.notAllowed"]
        );
    }

    #[test]
    fn test_full_interaction() {
        let v = validator().build().unwrap();
        let request = Request::builder(Method::Get, "/v1/pets").build();
        let response = Response::builder(200)
            .with_content_type("application/json")
            .with_body(r#"[{"name": "Rex"}, {"age": 3}]"#)
            .build();
        let report = v.validate(&request, &response);
        assert_eq!(
            keys(&report),
            vec!["validation.response.body.schema.required"]
        );
        assert!(report.messages()[0].message().starts_with("[Path '/1'] "));
        assert!(report.has_errors());
    }

    #[test]
    fn test_levels_then_whitelist() {
        let levels = LevelResolver::new()
            .with_level("validation.response", Level::Warn);
        let no_status = message_has_key("validation.response.status.unknown")
            .and(is_response());
        let whitelist = Whitelist::new().with_rule("no status checks", no_status);
        let v = validator()
            .with_level_resolver(levels)
            .with_whitelist(whitelist)
            .build()
            .unwrap();
        let response = Response::builder(418).build();
        let report = v.validate_response("/v1/pets", Method::Get, &response);
        let message = &report.messages()[0];
        assert_eq!(message.level(), Level::Ignore);
        assert_eq!(
            message.context().unwrap().applied_whitelist_rule(),
            Some("no status checks")
        );

        let bad_body = Response::builder(200)
            .with_content_type("application/json")
            .with_body("{}")
            .build();
        let report = v.validate_response("/v1/pets", Method::Get, &bad_body);
        assert_eq!(report.messages()[0].level(), Level::Warn);
        assert!(!report.has_errors());
    }

    #[test]
    fn test_custom_validators_and_format_checkers() {
        let v = validator()
            .with_request_validator(|request: &Request, _: &crate::path::ApiOperation| {
                if request.headers().contains("X-Api-Version") {
                    ValidationReport::empty()
                } else {
                    let missing = Message::new("custom.version.missing", "no version");
                    ValidationReport::singleton(missing)
                }
            })
            .with_response_validator(|_: &Response, _: &crate::path::ApiOperation| {
                let audit = Message::new("custom.audit", "seen").with_level(Level::Info);
                ValidationReport::singleton(audit)
            })
            .build()
            .unwrap();
        let request = Request::builder(Method::Get, "/v1/pets").build();
        let response = Response::builder(200)
            .with_content_type("application/json")
            .with_body("[]")
            .build();
        assert_eq!(
            keys(&v.validate(&request, &response)),
            vec!["custom.version.missing", "custom.audit"]
        );
    }

    #[test]
    fn test_validator_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InteractionValidator>();
    }
}
