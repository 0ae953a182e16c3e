#![deny(missing_docs)]

//! # CDD Validator
//!
//! Validates HTTP requests and responses against an OpenAPI 3.x contract.
//!
//! ```
//! use cdd_validator::{Contract, InteractionValidator, Method, Request};
//!
//! let contract = Contract::from_yaml(
//!     r#"
//! openapi: 3.0.3
//! paths:
//!   /pets/{id}:
//!     get:
//!       parameters:
//!         - { name: id, in: path, required: true, schema: { type: integer } }
//!       responses:
//!         '200': { description: ok }
//! "#,
//! )
//! .unwrap();
//! let validator = InteractionValidator::new(contract).unwrap();
//!
//! let report = validator.validate_request(&Request::builder(Method::Get, "/pets/rex").build());
//! assert_eq!(report.messages()[0].key(), "validation.request.parameter.schema.type");
//! ```

/// Shared error types.
pub mod error;

/// Framework-neutral requests and responses.
pub mod model;

/// Validation reports, message context and severity levels.
pub mod report;

/// OpenAPI document parsing.
pub mod contract;

/// Request path to operation resolution.
pub mod path;

/// Media type parsing and negotiation.
pub mod content;

/// Schema rewriting, format checks and execution.
pub mod schema;

/// Request and response checks.
pub mod validation;

/// Rules demoting findings to `IGNORE`.
pub mod whitelist;

/// The validator façade.
pub mod interaction;

pub use contract::{Contract, SchemaDraft};
pub use error::{AppError, AppResult};
pub use interaction::{InteractionValidator, InteractionValidatorBuilder};
pub use model::{Body, Headers, Method, Request, Response};
pub use path::{ApiOperation, OperationMatch};
pub use report::{Level, LevelResolver, Message, MessageContext, ValidationReport};
pub use whitelist::{Whitelist, WhitelistRule};
