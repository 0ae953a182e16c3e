//! # Operation Table
//!
//! Builds the immutable `(path template, method) -> OperationDefinition` table
//! from the parsed shims, resolving every reusable component once.

use crate::contract::models::{
    HeaderDefinition, OperationDefinition, ParamSource, ParamStyle, ParameterDefinition,
    RequestBodyDefinition, ResponseDefinition, SecurityRequirement, SecuritySchemeKind,
    SecuritySchemeRef,
};
use crate::contract::refs::resolve_component;
use crate::contract::shims::{
    ShimComponents, ShimHeader, ShimMediaType, ShimOpenApi, ShimOperation, ShimParameter,
    ShimPathItem, ShimSecurityRequirement, ShimSecurityScheme,
};
use crate::error::{AppError, AppResult};
use crate::model::Method;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Operations of a contract keyed by path template, then method.
///
/// Both levels keep document order, which is the tie-break order used when
/// several templates match a request equally well.
#[derive(Debug, Clone, Default)]
pub struct OperationTable {
    paths: IndexMap<String, IndexMap<Method, Arc<OperationDefinition>>>,
}

impl OperationTable {
    /// Builds the table, failing on dangling references.
    pub(crate) fn build(doc: &ShimOpenApi) -> AppResult<Self> {
        let empty = ShimComponents::default();
        let components = doc.components.as_ref().unwrap_or(&empty);
        let mut paths = IndexMap::new();

        for (template, item) in &doc.paths.items {
            if let Some(r) = &item.ref_path {
                return Err(AppError::Contract(format!(
                    "Path item '{}' uses an unsupported reference '{}'",
                    template, r
                )));
            }

            let mut methods = IndexMap::new();
            for (method, operation) in path_operations(item) {
                let definition =
                    build_operation(item, operation, components, doc.security.as_deref())
                        .map_err(|e| match e {
                            AppError::Contract(msg) => AppError::Contract(format!(
                                "{} {}: {}",
                                method, template, msg
                            )),
                            other => other,
                        })?;
                methods.insert(method, Arc::new(definition));
            }
            paths.insert(template.clone(), methods);
        }

        Ok(Self { paths })
    }

    /// Declared path templates in document order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }

    /// Operations declared on `template`.
    pub fn operations(
        &self,
        template: &str,
    ) -> Option<&IndexMap<Method, Arc<OperationDefinition>>> {
        self.paths.get(template)
    }

    /// The operation for `template` and `method`.
    pub fn get(&self, template: &str, method: Method) -> Option<&Arc<OperationDefinition>> {
        self.paths.get(template).and_then(|ops| ops.get(&method))
    }

    /// Number of operations across all paths.
    pub fn len(&self) -> usize {
        self.paths.values().map(IndexMap::len).sum()
    }

    /// True if the contract declares no operation.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn path_operations(item: &ShimPathItem) -> impl Iterator<Item = (Method, &ShimOperation)> {
    [
        (Method::Get, item.get.as_ref()),
        (Method::Put, item.put.as_ref()),
        (Method::Post, item.post.as_ref()),
        (Method::Delete, item.delete.as_ref()),
        (Method::Options, item.options.as_ref()),
        (Method::Head, item.head.as_ref()),
        (Method::Patch, item.patch.as_ref()),
        (Method::Trace, item.trace.as_ref()),
    ]
    .into_iter()
    .filter_map(|(m, op)| op.map(|op| (m, op)))
}

fn build_operation(
    item: &ShimPathItem,
    op: &ShimOperation,
    components: &ShimComponents,
    global_security: Option<&[ShimSecurityRequirement]>,
) -> AppResult<OperationDefinition> {
    let mut parameters: Vec<ParameterDefinition> = Vec::new();
    for raw in item.parameters.iter().chain(op.parameters.iter()) {
        let param = resolve_component(raw, &components.parameters, "parameters")?;
        let definition = build_parameter(param)?;
        // Operation-level parameters override path-level ones by (name, in).
        match parameters
            .iter_mut()
            .find(|p| p.name == definition.name && p.source == definition.source)
        {
            Some(existing) => *existing = definition,
            None => parameters.push(definition),
        }
    }

    let request_body = match &op.request_body {
        Some(raw) => {
            let body = resolve_component(raw, &components.request_bodies, "requestBodies")?;
            Some(RequestBodyDefinition {
                required: body.required,
                content: media_schemas(&body.content),
            })
        }
        None => None,
    };

    let mut responses = IndexMap::new();
    for (status, raw) in &op.responses {
        let response = resolve_component(raw, &components.responses, "responses")?;
        let mut headers = Vec::new();
        for (name, raw_header) in &response.headers {
            let header = resolve_component(raw_header, &components.headers, "headers")?;
            headers.push(build_header(name, header));
        }
        responses.insert(
            status.clone(),
            ResponseDefinition {
                headers,
                content: media_schemas(&response.content),
            },
        );
    }

    let requirements = op.security.as_deref().or(global_security).unwrap_or(&[]);
    let security = requirements
        .iter()
        .map(|r| build_requirement(r, components))
        .collect::<AppResult<Vec<_>>>()?;

    Ok(OperationDefinition {
        operation_id: op.operation_id.clone(),
        tags: op.tags.clone(),
        parameters,
        request_body,
        responses,
        security,
        deprecated: op.deprecated,
    })
}

fn build_parameter(param: &ShimParameter) -> AppResult<ParameterDefinition> {
    let source: ParamSource = param.parameter_in.parse()?;
    let style = match &param.style {
        Some(s) => s.parse()?,
        None => ParamStyle::default_for(source),
    };
    let explode = param.explode.unwrap_or(style == ParamStyle::Form);

    Ok(ParameterDefinition {
        name: param.name.clone(),
        source,
        // Path parameters are always required.
        required: param.required || source == ParamSource::Path,
        schema: schema_of(param.schema.as_ref(), param.content.as_ref()),
        style,
        explode,
    })
}

fn build_header(name: &str, header: &ShimHeader) -> HeaderDefinition {
    HeaderDefinition {
        name: name.to_string(),
        required: header.required,
        schema: schema_of(header.schema.as_ref(), header.content.as_ref()),
    }
}

fn schema_of(
    schema: Option<&Value>,
    content: Option<&IndexMap<String, ShimMediaType>>,
) -> Option<Value> {
    schema.cloned().or_else(|| {
        content
            .and_then(|c| c.values().next())
            .and_then(|m| m.schema.clone())
    })
}

fn media_schemas(content: &IndexMap<String, ShimMediaType>) -> IndexMap<String, Option<Value>> {
    content
        .iter()
        .map(|(k, v)| (k.clone(), v.schema.clone()))
        .collect()
}

fn build_requirement(
    requirement: &ShimSecurityRequirement,
    components: &ShimComponents,
) -> AppResult<SecurityRequirement> {
    let mut schemes = Vec::new();
    for (name, scopes) in requirement {
        let scheme = components.security_schemes.get(name).ok_or_else(|| {
            AppError::Contract(format!("Unknown security scheme '{}'", name))
        })?;
        let kind = match scheme {
            ShimSecurityScheme::ApiKey(key) => SecuritySchemeKind::ApiKey {
                name: key.name.clone(),
                in_loc: key.in_loc.parse()?,
            },
            ShimSecurityScheme::Http(http) => SecuritySchemeKind::Http {
                scheme: http.scheme.to_ascii_lowercase(),
            },
            ShimSecurityScheme::OAuth2(_) => SecuritySchemeKind::OAuth2,
            ShimSecurityScheme::OpenIdConnect(_) => SecuritySchemeKind::OpenIdConnect,
            ShimSecurityScheme::MutualTls(_) => SecuritySchemeKind::MutualTls,
        };
        schemes.push(SecuritySchemeRef {
            scheme_name: name.clone(),
            scopes: scopes.clone(),
            kind,
        });
    }
    Ok(SecurityRequirement { schemes })
}
