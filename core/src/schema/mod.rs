//! # Schema Validation
//!
//! Contract schemas are rewritten per validation call ([`transform`]), run
//! through the `jsonschema` engine and then through the registered
//! [`formats`] checkers.

pub(crate) mod coercion;
pub mod formats;
pub mod transform;
mod validator;

pub use formats::{Base64Checker, DoubleChecker, FormatChecker, FormatRegistry, FormatViolation};
pub use transform::{
    SchemaTransformPipeline, SchemaTransformationContext, SchemaTransformer, ValidationSide,
};
pub use validator::SchemaValidator;
