#![deny(missing_docs)]

//! # Schema Transform Pipeline
//!
//! Rewrites a contract schema fragment into a self-contained schema the JSON
//! Schema engine can execute for one side of an interaction.
//!
//! The pipeline works on a deep copy: contract schemas are shared between
//! concurrent validations and are never mutated. Every step is idempotent.

use crate::contract::refs::extract_component_name;
use crate::contract::SchemaDraft;
use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::fmt;

/// Which half of the interaction a schema is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationSide {
    /// Request bodies and parameters.
    Request,
    /// Response bodies and headers.
    Response,
}

/// Per-call configuration of the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct SchemaTransformationContext<'a> {
    /// Side being validated; `None` disables read/write-only handling.
    pub side: Option<ValidationSide>,
    /// Whether undeclared object properties are rejected.
    pub enforce_additional_properties: bool,
    /// `components.schemas`, by name.
    pub definitions: &'a IndexMap<String, Value>,
}

/// One rewrite step.
pub trait SchemaTransformer: Send + Sync {
    /// Short name used in debug output.
    fn name(&self) -> &'static str;

    /// Rewrites `schema` in place.
    fn transform(&self, schema: &mut Value, ctx: &SchemaTransformationContext<'_>);
}

/// Ordered chain of [`SchemaTransformer`]s.
pub struct SchemaTransformPipeline {
    steps: Vec<Box<dyn SchemaTransformer>>,
}

impl SchemaTransformPipeline {
    /// An empty pipeline.
    pub fn empty() -> Self {
        Self { steps: Vec::new() }
    }

    /// The default chain: definitions, nullable normalization,
    /// additional properties, required fields, metaschema.
    pub fn standard(draft: SchemaDraft) -> Self {
        Self::empty()
            .with_step(DefinitionsInjector)
            .with_step(NullableNormalizer { draft })
            .with_step(AdditionalPropertiesInjector)
            .with_step(RequiredFieldAdjuster)
            .with_step(MetaschemaInjector { draft })
    }

    /// Appends a step.
    pub fn with_step(mut self, step: impl SchemaTransformer + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Returns the transformed copy of `schema`.
    pub fn transform(&self, schema: &Value, ctx: &SchemaTransformationContext<'_>) -> Value {
        let mut out = schema.clone();
        for step in &self.steps {
            step.transform(&mut out, ctx);
        }
        out
    }
}

impl fmt::Debug for SchemaTransformPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.steps.iter().map(|s| s.name()))
            .finish()
    }
}

/// Keywords holding a single subschema.
const SCHEMA_KEYWORDS: &[&str] = &[
    "items",
    "not",
    "additionalProperties",
    "contains",
    "propertyNames",
    "if",
    "then",
    "else",
    "unevaluatedProperties",
    "unevaluatedItems",
];

/// Keywords holding an array of subschemas.
const SCHEMA_ARRAY_KEYWORDS: &[&str] = &["allOf", "anyOf", "oneOf", "prefixItems"];

/// Keywords holding a map of subschemas.
const SCHEMA_MAP_KEYWORDS: &[&str] = &["properties", "patternProperties", "dependentSchemas"];

/// Calls `f` on every direct subschema of `map`, with the keyword it sits under.
fn for_each_subschema(map: &mut Map<String, Value>, mut f: impl FnMut(&str, &mut Value)) {
    for (key, value) in map.iter_mut() {
        let key = key.as_str();
        if SCHEMA_KEYWORDS.contains(&key) {
            if value.is_object() {
                f(key, value);
            } else if let Value::Array(items) = value {
                // Draft 4 tuple form of `items`.
                for v in items.iter_mut() {
                    f(key, v);
                }
            }
        } else if SCHEMA_ARRAY_KEYWORDS.contains(&key) {
            if let Value::Array(items) = value {
                for v in items.iter_mut() {
                    f(key, v);
                }
            }
        } else if SCHEMA_MAP_KEYWORDS.contains(&key) {
            if let Value::Object(entries) = value {
                for v in entries.values_mut() {
                    f(key, v);
                }
            }
        }
    }
}

fn definitions_of(schema: &mut Value) -> Option<&mut Map<String, Value>> {
    schema
        .get_mut("components")
        .and_then(|c| c.get_mut("schemas"))
        .and_then(Value::as_object_mut)
}

/// Embeds `components.schemas` so local `$ref`s resolve without a loader.
#[derive(Debug, Clone, Copy)]
pub struct DefinitionsInjector;

impl SchemaTransformer for DefinitionsInjector {
    fn name(&self) -> &'static str {
        "definitions"
    }

    fn transform(&self, schema: &mut Value, ctx: &SchemaTransformationContext<'_>) {
        if let Value::Bool(flag) = schema {
            *schema = bool_schema_replacement(*flag);
        }
        let Value::Object(map) = schema else {
            return;
        };

        // Keywords next to a `$ref` are ignored by Draft 4, so keep the
        // reference in a branch of its own.
        if map.contains_key("$ref") && !map.contains_key("allOf") {
            let original = Value::Object(std::mem::take(map));
            map.insert("allOf".to_string(), Value::Array(vec![original]));
        }

        if ctx.definitions.is_empty() || map.contains_key("components") {
            return;
        }
        let schemas: Map<String, Value> = ctx
            .definitions
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        map.insert("components".to_string(), json!({ "schemas": schemas }));
    }
}

/// Rewrites `nullable` / `x-nullable` into JSON Schema null unions.
///
/// OpenAPI 3.0 uses `nullable: true` (and Swagger 2.0 often uses `x-nullable: true`).
/// JSON Schema encodes nullability via `type: [T, "null"]`, or an `anyOf`
/// when no explicit `type` is present. Draft 4 has no boolean schemas, so
/// those are replaced with equivalent object schemas too.
#[derive(Debug, Clone, Copy)]
pub struct NullableNormalizer {
    /// Dialect the schema is executed with.
    pub draft: SchemaDraft,
}

impl SchemaTransformer for NullableNormalizer {
    fn name(&self) -> &'static str {
        "nullable"
    }

    fn transform(&self, schema: &mut Value, _ctx: &SchemaTransformationContext<'_>) {
        normalize_nullable_schemas(schema);
        if self.draft == SchemaDraft::Draft4 {
            normalize_boolean_subschemas(schema);
        }
    }
}

fn normalize_nullable_schemas(value: &mut Value) {
    if let Value::Object(map) = value {
        if let Some(replacement) = apply_nullable_flag(map) {
            *value = replacement;
        }
    }

    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                if matches!(key.as_str(), "example" | "examples" | "default" | "enum") {
                    continue;
                }
                normalize_nullable_schemas(v);
            }
        }
        Value::Array(items) => {
            for v in items.iter_mut() {
                normalize_nullable_schemas(v);
            }
        }
        _ => {}
    }
}

fn apply_nullable_flag(map: &mut Map<String, Value>) -> Option<Value> {
    let nullable = map
        .get("nullable")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
        || map
            .get("x-nullable")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

    if !nullable {
        return None;
    }

    map.remove("nullable");
    map.remove("x-nullable");

    if let Some(Value::Array(values)) = map.get_mut("enum") {
        if !values.contains(&Value::Null) {
            values.push(Value::Null);
        }
    }

    if let Some(type_val) = map.get_mut("type") {
        match type_val {
            Value::String(s) => {
                if s != "null" {
                    *type_val = Value::Array(vec![
                        Value::String(s.clone()),
                        Value::String("null".to_string()),
                    ]);
                }
            }
            Value::Array(arr) => {
                let has_null = arr.iter().any(|v| v.as_str() == Some("null"));
                if !has_null {
                    arr.push(Value::String("null".to_string()));
                }
            }
            _ => {}
        }
        return None;
    }

    let original = Value::Object(map.clone());
    Some(json!({ "anyOf": [original, { "type": "null" }] }))
}

fn normalize_boolean_subschemas(value: &mut Value) {
    match value {
        Value::Bool(flag) => *value = bool_schema_replacement(*flag),
        Value::Object(map) => {
            for_each_subschema(map, |key, v| {
                // `additionalProperties: false` is valid in every dialect.
                if key != "additionalProperties" {
                    normalize_boolean_subschemas(v);
                }
            });
            if let Some(defs) = definitions_of(value) {
                for v in defs.values_mut() {
                    normalize_boolean_subschemas(v);
                }
            }
        }
        _ => {}
    }
}

fn bool_schema_replacement(flag: bool) -> Value {
    if flag {
        Value::Object(Map::new())
    } else {
        json!({ "not": {} })
    }
}

/// Section holding the open copies of definitions used as `allOf` branches.
const OPEN_SCHEMAS: &str = "openSchemas";

/// The definition name behind a local schema reference, open copies included.
pub(crate) fn schema_component_name(reference: &str) -> Option<String> {
    extract_component_name(reference, "schemas")
        .or_else(|| extract_component_name(reference, OPEN_SCHEMAS))
}

/// Closes object schemas with `additionalProperties: false`.
///
/// A node is closed when it declares `properties` without stating its own
/// `additionalProperties` or a `discriminator`. Inline `allOf` branches stay
/// open; the composing node is closed instead, declaring every branch
/// property as `{}`. Definitions referenced from an `allOf` branch are
/// redirected to an open copy under `components.openSchemas`, so the
/// definition itself stays closed wherever it is referenced directly.
#[derive(Debug, Clone, Copy)]
pub struct AdditionalPropertiesInjector;

impl SchemaTransformer for AdditionalPropertiesInjector {
    fn name(&self) -> &'static str {
        "additionalProperties"
    }

    fn transform(&self, schema: &mut Value, ctx: &SchemaTransformationContext<'_>) {
        if !ctx.enforce_additional_properties {
            return;
        }

        let mut composed = HashSet::new();
        collect_all_of_refs(schema, &mut composed);
        let copies: Map<String, Value> = match schema.pointer("/components/schemas") {
            Some(Value::Object(defs)) => composed
                .iter()
                .filter_map(|name| defs.get(name).map(|d| (name.clone(), d.clone())))
                .collect(),
            _ => Map::new(),
        };
        if !copies.is_empty() {
            if let Some(components) = schema.get_mut("components").and_then(Value::as_object_mut) {
                let open = components
                    .entry(OPEN_SCHEMAS)
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(open) = open {
                    for (name, copy) in copies {
                        open.entry(name).or_insert(copy);
                    }
                }
            }
            redirect_all_of_refs(schema);
        }

        close_objects(schema, false, ctx);
        if let Some(defs) = definitions_of(schema) {
            for v in defs.values_mut() {
                close_objects(v, false, ctx);
            }
        }
        if let Some(open) = schema
            .get_mut("components")
            .and_then(|c| c.get_mut(OPEN_SCHEMAS))
            .and_then(Value::as_object_mut)
        {
            for v in open.values_mut() {
                close_objects(v, true, ctx);
            }
        }
    }
}

fn collect_all_of_refs(value: &Value, out: &mut HashSet<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Array(branches)) = map.get("allOf") {
                for branch in branches {
                    if let Some(name) = branch
                        .get("$ref")
                        .and_then(Value::as_str)
                        .and_then(schema_component_name)
                    {
                        out.insert(name);
                    }
                }
            }
            for v in map.values() {
                collect_all_of_refs(v, out);
            }
        }
        Value::Array(items) => {
            for v in items {
                collect_all_of_refs(v, out);
            }
        }
        _ => {}
    }
}

/// Points `$ref`s sitting directly in `allOf` branches at the open copies.
fn redirect_all_of_refs(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Array(branches)) = map.get_mut("allOf") {
                for branch in branches.iter_mut() {
                    if let Some(Value::String(reference)) = branch.get_mut("$ref") {
                        if let Some(name) = reference.strip_prefix("#/components/schemas/") {
                            let redirected = format!("#/components/{}/{}", OPEN_SCHEMAS, name);
                            *reference = redirected;
                        }
                    }
                }
            }
            for v in map.values_mut() {
                redirect_all_of_refs(v);
            }
        }
        Value::Array(items) => {
            for v in items.iter_mut() {
                redirect_all_of_refs(v);
            }
        }
        _ => {}
    }
}

fn close_objects(value: &mut Value, open: bool, ctx: &SchemaTransformationContext<'_>) {
    let Value::Object(map) = value else {
        return;
    };

    let states_policy =
        map.contains_key("additionalProperties") || map.contains_key("discriminator");
    if !open && !states_policy {
        if map.contains_key("allOf") {
            let mut names = Vec::new();
            let mut visited = HashSet::new();
            collect_property_names(&Value::Object(map.clone()), ctx, &mut visited, &mut names);
            if !names.is_empty() {
                let props = map
                    .entry("properties")
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(props) = props {
                    for name in names {
                        props
                            .entry(name)
                            .or_insert_with(|| Value::Object(Map::new()));
                    }
                }
                map.insert("additionalProperties".to_string(), Value::Bool(false));
            }
        } else if map.contains_key("properties") {
            map.insert("additionalProperties".to_string(), Value::Bool(false));
        }
    }

    for_each_subschema(map, |key, child| {
        close_objects(child, key == "allOf", ctx);
    });
}

/// Property names declared by a node and, through `allOf`, by its branches.
fn collect_property_names(
    node: &Value,
    ctx: &SchemaTransformationContext<'_>,
    visited: &mut HashSet<String>,
    out: &mut Vec<String>,
) {
    if let Some(name) = node
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(schema_component_name)
    {
        if visited.insert(name.clone()) {
            if let Some(target) = ctx.definitions.get(&name) {
                collect_property_names(target, ctx, visited, out);
            }
        }
        return;
    }

    if let Some(Value::Object(props)) = node.get("properties") {
        for name in props.keys() {
            if !out.contains(name) {
                out.push(name.clone());
            }
        }
    }
    if let Some(Value::Array(branches)) = node.get("allOf") {
        for branch in branches {
            collect_property_names(branch, ctx, visited, out);
        }
    }
}

/// Drops `readOnly` fields from `required` on the request side and
/// `writeOnly` fields on the response side.
#[derive(Debug, Clone, Copy)]
pub struct RequiredFieldAdjuster;

impl SchemaTransformer for RequiredFieldAdjuster {
    fn name(&self) -> &'static str {
        "required"
    }

    fn transform(&self, schema: &mut Value, ctx: &SchemaTransformationContext<'_>) {
        let flag = match ctx.side {
            Some(ValidationSide::Request) => "readOnly",
            Some(ValidationSide::Response) => "writeOnly",
            None => return,
        };
        adjust_required(schema, flag, ctx);
    }
}

fn adjust_required(value: &mut Value, flag: &str, ctx: &SchemaTransformationContext<'_>) {
    match value {
        Value::Object(map) => {
            let dropped: Vec<String> = match (map.get("required"), map.get("properties")) {
                (Some(Value::Array(required)), Some(Value::Object(props))) => required
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|name| {
                        props
                            .get(*name)
                            .is_some_and(|p| has_flag(p, flag, ctx, &mut HashSet::new()))
                    })
                    .map(str::to_string)
                    .collect(),
                _ => Vec::new(),
            };

            if !dropped.is_empty() {
                if let Some(Value::Array(required)) = map.get_mut("required") {
                    required.retain(|v| !dropped.iter().any(|d| v.as_str() == Some(d.as_str())));
                    if required.is_empty() {
                        map.remove("required");
                    }
                }
            }

            for v in map.values_mut() {
                adjust_required(v, flag, ctx);
            }
        }
        Value::Array(items) => {
            for v in items.iter_mut() {
                adjust_required(v, flag, ctx);
            }
        }
        _ => {}
    }
}

fn has_flag(
    property: &Value,
    flag: &str,
    ctx: &SchemaTransformationContext<'_>,
    visited: &mut HashSet<String>,
) -> bool {
    if property.get(flag).and_then(Value::as_bool) == Some(true) {
        return true;
    }
    let Some(name) = property
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(schema_component_name)
    else {
        return false;
    };
    if !visited.insert(name.clone()) {
        return false;
    }
    ctx.definitions
        .get(&name)
        .is_some_and(|target| has_flag(target, flag, ctx, visited))
}

/// Stamps `$schema` with the dialect the schema is executed with.
#[derive(Debug, Clone, Copy)]
pub struct MetaschemaInjector {
    /// Dialect the schema is executed with.
    pub draft: SchemaDraft,
}

impl SchemaTransformer for MetaschemaInjector {
    fn name(&self) -> &'static str {
        "metaschema"
    }

    fn transform(&self, schema: &mut Value, _ctx: &SchemaTransformationContext<'_>) {
        if let Value::Object(map) = schema {
            map.insert(
                "$schema".to_string(),
                Value::String(self.draft.uri().to_string()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx<'a>(
        side: Option<ValidationSide>,
        enforce: bool,
        definitions: &'a IndexMap<String, Value>,
    ) -> SchemaTransformationContext<'a> {
        SchemaTransformationContext {
            side,
            enforce_additional_properties: enforce,
            definitions,
        }
    }

    fn defs(pairs: &[(&str, Value)]) -> IndexMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_input_is_not_mutated() {
        let definitions = IndexMap::new();
        let schema = json!({ "type": "object", "properties": { "a": { "type": "string" } } });
        let before = schema.clone();
        let pipeline = SchemaTransformPipeline::standard(SchemaDraft::Draft4);
        let out = pipeline.transform(&schema, &ctx(None, true, &definitions));
        assert_eq!(schema, before);
        assert_eq!(out["additionalProperties"], json!(false));
        assert_eq!(
            out["$schema"],
            json!("http://json-schema.org/draft-04/schema#")
        );
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let definitions = defs(&[(
            "Pet",
            json!({
                "type": "object",
                "properties": { "id": { "type": "integer", "readOnly": true } },
                "required": ["id"]
            }),
        )]);
        let schema = json!({ "$ref": "#/components/schemas/Pet" });
        let pipeline = SchemaTransformPipeline::standard(SchemaDraft::Draft4);
        let c = ctx(Some(ValidationSide::Request), true, &definitions);
        let once = pipeline.transform(&schema, &c);
        let twice = pipeline.transform(&once, &c);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_root_ref_is_wrapped_and_definitions_embedded() {
        let definitions = defs(&[("Pet", json!({ "type": "object" }))]);
        let mut schema = json!({ "$ref": "#/components/schemas/Pet" });
        DefinitionsInjector.transform(&mut schema, &ctx(None, false, &definitions));
        assert_eq!(
            schema,
            json!({
                "allOf": [{ "$ref": "#/components/schemas/Pet" }],
                "components": { "schemas": { "Pet": { "type": "object" } } }
            })
        );
    }

    #[test]
    fn test_nullable_becomes_type_union() {
        let definitions = IndexMap::new();
        let mut schema = json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "nullable": true },
                "tag": { "$ref": "#/components/schemas/Tag", "nullable": true },
                "kind": { "type": "string", "enum": ["a", "b"], "nullable": true }
            }
        });
        let normalizer = NullableNormalizer {
            draft: SchemaDraft::Draft4,
        };
        normalizer.transform(&mut schema, &ctx(None, false, &definitions));
        assert_eq!(
            schema["properties"]["name"],
            json!({ "type": ["string", "null"] })
        );
        assert_eq!(
            schema["properties"]["tag"],
            json!({ "anyOf": [{ "$ref": "#/components/schemas/Tag" }, { "type": "null" }] })
        );
        assert_eq!(
            schema["properties"]["kind"]["enum"],
            json!(["a", "b", null])
        );
    }

    #[test]
    fn test_additional_properties_never_overwritten() {
        let definitions = IndexMap::new();
        let mut schema = json!({
            "type": "object",
            "properties": {
                "open": { "type": "object", "properties": {}, "additionalProperties": true },
                "poly": {
                    "type": "object",
                    "properties": {},
                    "discriminator": { "propertyName": "t" }
                },
                "list": {
                    "type": "array",
                    "items": { "type": "object", "properties": { "x": {} } }
                }
            }
        });
        AdditionalPropertiesInjector.transform(&mut schema, &ctx(None, true, &definitions));
        assert_eq!(schema["additionalProperties"], json!(false));
        assert_eq!(
            schema["properties"]["open"]["additionalProperties"],
            json!(true)
        );
        let poly = &schema["properties"]["poly"];
        assert!(poly.get("additionalProperties").is_none());
        assert_eq!(
            schema["properties"]["list"]["items"]["additionalProperties"],
            json!(false)
        );
    }

    #[test]
    fn test_additional_properties_disabled() {
        let definitions = IndexMap::new();
        let mut schema = json!({ "properties": { "a": {} } });
        AdditionalPropertiesInjector.transform(&mut schema, &ctx(None, false, &definitions));
        assert!(schema.get("additionalProperties").is_none());
    }

    #[test]
    fn test_all_of_branches_stay_open_and_composition_is_closed() {
        let definitions = defs(&[
            (
                "Base",
                json!({ "type": "object", "properties": { "id": {} } }),
            ),
            (
                "Node",
                json!({
                    "type": "object",
                    "properties": { "child": { "$ref": "#/components/schemas/Node" } }
                }),
            ),
        ]);
        let schema = json!({
            "allOf": [
                { "$ref": "#/components/schemas/Base" },
                { "type": "object", "properties": { "name": {} } }
            ]
        });
        let pipeline = SchemaTransformPipeline::empty()
            .with_step(DefinitionsInjector)
            .with_step(AdditionalPropertiesInjector);
        let out = pipeline.transform(&schema, &ctx(None, true, &definitions));

        assert_eq!(out["additionalProperties"], json!(false));
        assert_eq!(out["properties"], json!({ "id": {}, "name": {} }));
        assert!(out["allOf"][1].get("additionalProperties").is_none());
        assert_eq!(
            out["allOf"][0]["$ref"],
            json!("#/components/openSchemas/Base")
        );
        assert!(out["components"]["openSchemas"]["Base"]
            .get("additionalProperties")
            .is_none());
        assert_eq!(
            out["components"]["schemas"]["Base"]["additionalProperties"],
            json!(false)
        );
        assert_eq!(
            out["components"]["schemas"]["Node"]["additionalProperties"],
            json!(false)
        );
    }

    #[test]
    fn test_composed_definition_stays_closed_when_referenced_directly() {
        let definitions = defs(&[
            (
                "Pet",
                json!({ "type": "object", "properties": { "name": { "type": "string" } } }),
            ),
            (
                "Dog",
                json!({
                    "allOf": [
                        { "$ref": "#/components/schemas/Pet" },
                        { "type": "object", "properties": { "bark": {} } }
                    ]
                }),
            ),
        ]);
        let schema = json!({ "type": "array", "items": { "$ref": "#/components/schemas/Pet" } });
        let pipeline = SchemaTransformPipeline::empty()
            .with_step(DefinitionsInjector)
            .with_step(AdditionalPropertiesInjector);
        let out = pipeline.transform(&schema, &ctx(None, true, &definitions));

        assert_eq!(out["items"]["$ref"], json!("#/components/schemas/Pet"));
        assert_eq!(
            out["components"]["schemas"]["Pet"]["additionalProperties"],
            json!(false)
        );
        let dog = &out["components"]["schemas"]["Dog"];
        assert_eq!(
            dog["allOf"][0]["$ref"],
            json!("#/components/openSchemas/Pet")
        );
        assert_eq!(dog["properties"], json!({ "name": {}, "bark": {} }));
        assert_eq!(dog["additionalProperties"], json!(false));
    }

    #[test]
    fn test_cyclic_all_of_terminates() {
        let definitions = defs(&[
            (
                "A",
                json!({
                    "allOf": [{ "$ref": "#/components/schemas/B" }],
                    "properties": { "a": {} }
                }),
            ),
            (
                "B",
                json!({
                    "allOf": [{ "$ref": "#/components/schemas/A" }],
                    "properties": { "b": {} }
                }),
            ),
        ]);
        let mut schema = json!({ "allOf": [{ "$ref": "#/components/schemas/A" }] });
        AdditionalPropertiesInjector.transform(&mut schema, &ctx(None, true, &definitions));
        assert_eq!(schema["properties"], json!({ "a": {}, "b": {} }));
    }

    #[test]
    fn test_read_only_dropped_on_request_only() {
        let definitions = defs(&[("Id", json!({ "type": "integer", "readOnly": true }))]);
        let schema = json!({
            "type": "object",
            "required": ["id", "ref_id", "name"],
            "properties": {
                "id": { "type": "integer", "readOnly": true },
                "ref_id": { "$ref": "#/components/schemas/Id" },
                "name": { "type": "string" },
                "secret": { "type": "string", "writeOnly": true }
            }
        });

        let mut request = schema.clone();
        RequiredFieldAdjuster.transform(
            &mut request,
            &ctx(Some(ValidationSide::Request), false, &definitions),
        );
        assert_eq!(request["required"], json!(["name"]));

        let mut response = schema.clone();
        RequiredFieldAdjuster.transform(
            &mut response,
            &ctx(Some(ValidationSide::Response), false, &definitions),
        );
        assert_eq!(response["required"], json!(["id", "ref_id", "name"]));
    }

    #[test]
    fn test_empty_required_removed() {
        let definitions = IndexMap::new();
        let mut schema = json!({
            "required": ["secret"],
            "properties": { "secret": { "writeOnly": true } }
        });
        RequiredFieldAdjuster.transform(
            &mut schema,
            &ctx(Some(ValidationSide::Response), false, &definitions),
        );
        assert!(schema.get("required").is_none());
    }

    #[test]
    fn test_boolean_schemas_rewritten_for_draft4() {
        let definitions = IndexMap::new();
        let mut schema = json!({
            "properties": { "any": true, "never": false },
            "additionalProperties": false
        });
        let normalizer = NullableNormalizer {
            draft: SchemaDraft::Draft4,
        };
        normalizer.transform(&mut schema, &ctx(None, false, &definitions));
        assert_eq!(schema["properties"]["any"], json!({}));
        assert_eq!(schema["properties"]["never"], json!({ "not": {} }));
        assert_eq!(schema["additionalProperties"], json!(false));
    }
}
