//! Extension points for checks the contract cannot express.

use crate::model::{Request, Response};
use crate::path::ApiOperation;
use crate::report::ValidationReport;

/// An additional request check, run after the contract checks.
///
/// Closures with the same signature implement this trait.
pub trait CustomRequestValidator: Send + Sync {
    /// Validates `request`, which resolved to `operation`.
    fn validate(&self, request: &Request, operation: &ApiOperation) -> ValidationReport;
}

impl<F> CustomRequestValidator for F
where
    F: Fn(&Request, &ApiOperation) -> ValidationReport + Send + Sync,
{
    fn validate(&self, request: &Request, operation: &ApiOperation) -> ValidationReport {
        self(request, operation)
    }
}

/// An additional response check, run after the contract checks.
pub trait CustomResponseValidator: Send + Sync {
    /// Validates `response` to a request that resolved to `operation`.
    fn validate(&self, response: &Response, operation: &ApiOperation) -> ValidationReport;
}

impl<F> CustomResponseValidator for F
where
    F: Fn(&Response, &ApiOperation) -> ValidationReport + Send + Sync,
{
    fn validate(&self, response: &Response, operation: &ApiOperation) -> ValidationReport {
        self(response, operation)
    }
}
