//! Request path + method -> declared operation.

use crate::contract::{OperationDefinition, OperationTable};
use crate::error::AppResult;
use crate::model::Method;
use crate::path::api_path::{ApiPath, NormalisedPath};
use indexmap::IndexMap;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Outcome of resolving a request against the operation table.
#[derive(Debug, Clone)]
pub enum OperationMatch {
    /// A single operation was selected.
    Found(ApiOperation),
    /// No template matches the path.
    PathNotFound,
    /// A template matches but does not declare the method.
    MethodNotAllowed {
        /// The best matching template.
        api_path: String,
        /// Methods declared on that template.
        allowed: Vec<Method>,
    },
}

impl OperationMatch {
    /// The operation, if one was found.
    pub fn operation(&self) -> Option<&ApiOperation> {
        match self {
            OperationMatch::Found(op) => Some(op),
            _ => None,
        }
    }
}

/// Resolves incoming requests to operations.
///
/// Templates are bucketed by part count; inside a bucket they keep document
/// order, which decides ties between equally specific templates.
#[derive(Debug, Clone)]
pub struct OperationResolver {
    table: Arc<OperationTable>,
    base_path: String,
    strict: bool,
    buckets: HashMap<usize, Vec<Arc<ApiPath>>>,
}

impl OperationResolver {
    /// Parses every template of `table` once.
    pub fn new(
        table: Arc<OperationTable>,
        base_path: impl Into<String>,
        strict: bool,
    ) -> AppResult<Self> {
        let mut buckets: HashMap<usize, Vec<Arc<ApiPath>>> = HashMap::new();
        for template in table.paths() {
            let api_path = ApiPath::new(template, strict)?;
            buckets
                .entry(api_path.part_count())
                .or_default()
                .push(Arc::new(api_path));
        }

        Ok(Self {
            table,
            base_path: base_path.into(),
            strict,
            buckets,
        })
    }

    /// The base path stripped from request paths.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Finds the operation serving `path` (query string allowed) and `method`.
    pub fn resolve(&self, path: &str, method: Method) -> OperationMatch {
        let Some(request_path) = NormalisedPath::new(path, &self.base_path, self.strict) else {
            debug!(path, base_path = %self.base_path, "Request path is outside the base path");
            return OperationMatch::PathNotFound;
        };

        let candidates: Vec<&Arc<ApiPath>> = self
            .buckets
            .get(&request_path.part_count())
            .map(|bucket| bucket.iter().filter(|p| p.matches(&request_path)).collect())
            .unwrap_or_default();

        if candidates.is_empty() {
            debug!(path, "No path template matches");
            return OperationMatch::PathNotFound;
        }

        let with_method: Vec<&Arc<ApiPath>> = candidates
            .iter()
            .copied()
            .filter(|p| self.table.get(p.original(), method).is_some())
            .collect();

        let Some(best) = most_specific(&with_method, &request_path) else {
            let api_path = most_specific(&candidates, &request_path)
                .map(|p| p.original().to_string())
                .unwrap_or_default();
            let allowed = self
                .table
                .operations(&api_path)
                .map(|ops| ops.keys().copied().collect())
                .unwrap_or_default();
            debug!(path, %method, api_path = %api_path, "Method not allowed");
            return OperationMatch::MethodNotAllowed { api_path, allowed };
        };

        let Some(definition) = self.table.get(best.original(), method) else {
            return OperationMatch::PathNotFound;
        };
        debug!(path, %method, api_path = best.original(), "Resolved operation");

        let path_params = best.extract_params(&request_path).into_iter().collect();
        OperationMatch::Found(ApiOperation {
            inner: Arc::new(ApiOperationInner {
                api_path: Arc::clone(best),
                method,
                request_path,
                definition: Arc::clone(definition),
                path_params,
            }),
        })
    }
}

/// Exact (case-insensitive) template match first, then the highest
/// specificity; the first template in document order wins ties.
fn most_specific<'a>(
    candidates: &[&'a Arc<ApiPath>],
    request_path: &NormalisedPath,
) -> Option<&'a Arc<ApiPath>> {
    if let Some(exact) = candidates.iter().find(|p| p.is_exact(request_path)) {
        return Some(*exact);
    }
    let mut best: Option<&'a Arc<ApiPath>> = None;
    for candidate in candidates {
        match best {
            Some(current) if current.specificity() >= candidate.specificity() => {}
            _ => best = Some(*candidate),
        }
    }
    best
}

struct ApiOperationInner {
    api_path: Arc<ApiPath>,
    method: Method,
    request_path: NormalisedPath,
    definition: Arc<OperationDefinition>,
    path_params: IndexMap<String, String>,
}

/// A request bound to the operation that serves it. Cheap to clone.
#[derive(Clone)]
pub struct ApiOperation {
    inner: Arc<ApiOperationInner>,
}

impl ApiOperation {
    /// The matched template.
    pub fn api_path(&self) -> &ApiPath {
        &self.inner.api_path
    }

    /// The HTTP method.
    pub fn method(&self) -> Method {
        self.inner.method
    }

    /// The request path after base-path removal.
    pub fn request_path(&self) -> &NormalisedPath {
        &self.inner.request_path
    }

    /// The operation definition.
    pub fn definition(&self) -> &OperationDefinition {
        &self.inner.definition
    }

    /// `operationId`, if declared.
    pub fn operation_id(&self) -> Option<&str> {
        self.inner.definition.operation_id.as_deref()
    }

    /// Path parameter values extracted from the request path.
    pub fn path_params(&self) -> &IndexMap<String, String> {
        &self.inner.path_params
    }

    /// A single path parameter value.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.inner.path_params.get(name).map(String::as_str)
    }
}

impl fmt::Debug for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiOperation")
            .field("api_path", &self.api_path().original())
            .field("method", &self.method())
            .field("operation_id", &self.operation_id())
            .field("path_params", self.path_params())
            .finish()
    }
}

impl Serialize for ApiOperation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ApiOperation", 3)?;
        state.serialize_field("apiPath", self.api_path().original())?;
        state.serialize_field("method", &self.method())?;
        state.serialize_field("operationId", &self.operation_id())?;
        state.end()
    }
}
