#![deny(missing_docs)]

//! # Contract
//!
//! Loading of an OpenAPI 3.x document into the immutable model the validators
//! share: the operation table, the named schemas, the base path and the JSON
//! Schema dialect the document's schemas are written in.

use crate::error::{AppError, AppResult};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

pub mod models;
pub mod operations;
pub(crate) mod refs;
pub(crate) mod servers;
pub mod shims;

pub use models::{
    HeaderDefinition, OperationDefinition, ParamSource, ParamStyle, ParameterDefinition,
    RequestBodyDefinition, ResponseDefinition, SecurityRequirement, SecuritySchemeKind,
    SecuritySchemeRef,
};
pub use operations::OperationTable;

/// JSON Schema dialect used to execute contract schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaDraft {
    /// OpenAPI 3.0 schemas (a Draft 4 superset).
    Draft4,
    /// OpenAPI 3.1+ schemas.
    Draft202012,
}

impl SchemaDraft {
    /// The `$schema` URI of the dialect.
    pub fn uri(&self) -> &'static str {
        match self {
            SchemaDraft::Draft4 => "http://json-schema.org/draft-04/schema#",
            SchemaDraft::Draft202012 => "https://json-schema.org/draft/2020-12/schema",
        }
    }

    fn for_version(version: &str) -> Self {
        if version.starts_with("3.0") {
            SchemaDraft::Draft4
        } else {
            SchemaDraft::Draft202012
        }
    }
}

/// A parsed, fully resolved contract. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Contract {
    version: String,
    draft: SchemaDraft,
    base_path: String,
    operations: Arc<OperationTable>,
    schemas: Arc<IndexMap<String, Value>>,
}

impl Contract {
    /// Parses a YAML document.
    pub fn from_yaml(yaml_content: &str) -> AppResult<Self> {
        let doc: shims::ShimOpenApi = serde_yaml::from_str(yaml_content)
            .map_err(|e| AppError::Contract(format!("Failed to parse contract: {}", e)))?;
        Self::from_shim(doc)
    }

    /// Parses a JSON document.
    ///
    /// JSON is read through the YAML parser, which accepts every JSON document.
    pub fn from_json(json_content: &str) -> AppResult<Self> {
        Self::from_yaml(json_content)
    }

    fn from_shim(doc: shims::ShimOpenApi) -> AppResult<Self> {
        let version = match (&doc.openapi, &doc.swagger) {
            (Some(v), _) if v.starts_with("3.") => v.clone(),
            (Some(v), _) => {
                return Err(AppError::Contract(format!(
                    "Unsupported OpenAPI version '{}' (expected 3.x)",
                    v
                )))
            }
            (None, Some(v)) => {
                return Err(AppError::Contract(format!(
                    "Swagger {} documents are not supported; convert to OpenAPI 3.x first",
                    v
                )))
            }
            (None, None) => {
                return Err(AppError::Contract(
                    "Document has no 'openapi' version field".into(),
                ))
            }
        };

        let operations = OperationTable::build(&doc)?;
        let schemas = doc
            .components
            .as_ref()
            .map(|c| c.schemas.clone())
            .unwrap_or_default();

        Ok(Self {
            draft: SchemaDraft::for_version(&version),
            base_path: servers::base_path(&doc.servers),
            version,
            operations: Arc::new(operations),
            schemas: Arc::new(schemas),
        })
    }

    /// The declared `openapi` version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The schema dialect derived from the version.
    pub fn draft(&self) -> SchemaDraft {
        self.draft
    }

    /// Base path derived from the first server (`/` when none).
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// The operation table.
    pub fn operations(&self) -> &Arc<OperationTable> {
        &self.operations
    }

    /// `components.schemas`, by name.
    pub fn schemas(&self) -> &Arc<IndexMap<String, Value>> {
        &self.schemas
    }
}
