//! Executes transformed contract schemas with the `jsonschema` engine and the
//! registered format checkers.

use crate::contract::refs::decode_pointer_segment;
use crate::contract::{ParamStyle, SchemaDraft};
use crate::report::{Message, MessageContext, ValidationReport};
use crate::schema::coercion::coerce_values;
use crate::schema::formats::FormatRegistry;
use crate::schema::transform::{
    schema_component_name, SchemaTransformPipeline, SchemaTransformationContext, ValidationSide,
};
use dashmap::DashMap;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// A transformed schema with its compiled engine validator.
struct CompiledSchema {
    transformed: Value,
    validator: jsonschema::Validator,
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("transformed", &self.transformed)
            .finish_non_exhaustive()
    }
}

/// Compiled schemas keyed by contract schema text and side.
type CompiledCache = DashMap<(String, Option<ValidationSide>), Arc<CompiledSchema>>;

/// Validates JSON values and raw strings against contract schemas.
///
/// Engine errors become `<prefix>.schema.<keyword>` messages, format checker
/// violations `<prefix>.schema.<format key>`.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    draft: SchemaDraft,
    pipeline: Arc<SchemaTransformPipeline>,
    formats: FormatRegistry,
    definitions: Arc<IndexMap<String, Value>>,
    enforce_additional_properties: bool,
    compiled: Arc<CompiledCache>,
}

impl SchemaValidator {
    /// A validator using the standard pipeline and the default format checkers.
    pub fn new(draft: SchemaDraft, definitions: Arc<IndexMap<String, Value>>) -> Self {
        Self {
            draft,
            pipeline: Arc::new(SchemaTransformPipeline::standard(draft)),
            formats: FormatRegistry::default(),
            definitions,
            enforce_additional_properties: false,
            compiled: Arc::default(),
        }
    }

    /// Replaces the format checker registry.
    pub fn with_formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = formats;
        self
    }

    /// Replaces the transform pipeline.
    pub fn with_pipeline(mut self, pipeline: SchemaTransformPipeline) -> Self {
        self.pipeline = Arc::new(pipeline);
        self.compiled = Arc::default();
        self
    }

    /// Rejects undeclared object properties.
    pub fn with_additional_properties_enforced(mut self, enforce: bool) -> Self {
        self.enforce_additional_properties = enforce;
        self.compiled = Arc::default();
        self
    }

    /// `components.schemas`, by name.
    pub fn definitions(&self) -> &IndexMap<String, Value> {
        &self.definitions
    }

    /// Validates `value` against `schema`.
    pub fn validate(
        &self,
        value: &Value,
        schema: &Value,
        side: Option<ValidationSide>,
        prefix: &str,
    ) -> ValidationReport {
        let compiled = match self.compile(schema, side) {
            Ok(compiled) => compiled,
            Err(e) => {
                warn!(error = %e, prefix, "Failed to compile validation schema");
                return ValidationReport::singleton(Message::new(
                    format!("{}.schema.processingError", prefix),
                    format!("Unable to compile schema: {}", e),
                ));
            }
        };
        let transformed = &compiled.transformed;

        let mut messages: Vec<Message> = compiled
            .validator
            .iter_errors(value)
            .map(|error| {
                let instance = display_pointer(&error.instance_path.to_string());
                let schema_pointer = error.schema_path.to_string();
                Message::new(
                    format!("{}.schema.{}", prefix, keyword_of(&schema_pointer)),
                    format!("[Path '{}'] {}", instance, error),
                )
                .with_context(
                    MessageContext::default()
                        .with_schema_entity(schema_entity(transformed, &schema_pointer))
                        .with_pointers(instance, schema_pointer),
                )
            })
            .collect();

        let mut walk = FormatWalk {
            root: transformed,
            formats: &self.formats,
            prefix,
            visited: HashSet::new(),
            messages: Vec::new(),
        };
        walk.walk(transformed, value, "", "", None);
        messages.extend(walk.messages);

        ValidationReport::from_messages(messages)
    }

    /// Transforms and compiles `schema` for `side`, once per validator.
    fn compile(
        &self,
        schema: &Value,
        side: Option<ValidationSide>,
    ) -> Result<Arc<CompiledSchema>, String> {
        let key = (schema.to_string(), side);
        if let Some(hit) = self.compiled.get(&key) {
            return Ok(Arc::clone(hit.value()));
        }

        let ctx = SchemaTransformationContext {
            side,
            enforce_additional_properties: self.enforce_additional_properties,
            definitions: &self.definitions,
        };
        let transformed = self.pipeline.transform(schema, &ctx);
        let validator = jsonschema::options()
            .with_draft(engine_draft(self.draft))
            .should_validate_formats(true)
            .build(&transformed)
            .map_err(|e| e.to_string())?;

        let compiled = Arc::new(CompiledSchema {
            transformed,
            validator,
        });
        self.compiled.insert(key, Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Validates a value produced on demand.
    ///
    /// `value` is only called when `schema` constrains anything; an error from
    /// it is reported as `<prefix>.schema.invalidJson`.
    pub fn validate_lazy<F>(
        &self,
        value: F,
        schema: Option<&Value>,
        side: Option<ValidationSide>,
        prefix: &str,
    ) -> ValidationReport
    where
        F: FnOnce() -> Result<Value, String>,
    {
        let Some(schema) = schema.filter(|s| !is_trivial(s)) else {
            return ValidationReport::empty();
        };
        match value() {
            Ok(value) => self.validate(&value, schema, side, prefix),
            Err(e) => ValidationReport::singleton(Message::new(
                format!("{}.schema.invalidJson", prefix),
                format!("Unable to parse JSON: {}", e),
            )),
        }
    }

    /// Validates a single raw header or parameter value.
    pub fn validate_string(
        &self,
        raw: &str,
        schema: &Value,
        side: Option<ValidationSide>,
        prefix: &str,
    ) -> ValidationReport {
        self.validate_values(
            std::slice::from_ref(&raw.to_string()),
            schema,
            ParamStyle::Simple,
            false,
            side,
            prefix,
        )
    }

    /// Validates every raw value sent for a parameter or header.
    ///
    /// Values are typed after the schema; arrays are split on the style's
    /// delimiter, or collected from repeated values when `explode` is set.
    pub fn validate_values(
        &self,
        values: &[String],
        schema: &Value,
        style: ParamStyle,
        explode: bool,
        side: Option<ValidationSide>,
        prefix: &str,
    ) -> ValidationReport {
        if is_trivial(schema) {
            return ValidationReport::empty();
        }
        let delimiter = style.array_delimiter();
        coerce_values(values, schema, delimiter, explode, &self.definitions)
            .iter()
            .map(|value| self.validate(value, schema, side, prefix))
            .collect()
    }
}

fn engine_draft(draft: SchemaDraft) -> jsonschema::Draft {
    match draft {
        SchemaDraft::Draft4 => jsonschema::Draft::Draft4,
        SchemaDraft::Draft202012 => jsonschema::Draft::Draft202012,
    }
}

/// `{}` and `true` accept everything.
fn is_trivial(schema: &Value) -> bool {
    match schema {
        Value::Bool(true) => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn display_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}

fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// The last non-index segment of a schema pointer (`/properties/a/type` -> `type`).
fn keyword_of(schema_pointer: &str) -> String {
    schema_pointer
        .rsplit('/')
        .find(|s| !s.is_empty() && !s.chars().all(|c| c.is_ascii_digit()))
        .map(decode_pointer_segment)
        .unwrap_or_else(|| "invalid".to_string())
}

/// The innermost `components.schemas` entry reached while following
/// `schema_pointer` through the transformed schema.
fn schema_entity(root: &Value, schema_pointer: &str) -> Option<String> {
    let mut node = root;
    let mut entity = None;

    for raw in schema_pointer.split('/').filter(|s| !s.is_empty()) {
        let segment = decode_pointer_segment(raw);
        if segment == "$ref" {
            let reference = node.get("$ref").and_then(Value::as_str)?;
            if let Some(name) = schema_component_name(reference) {
                entity = Some(name);
            }
            node = match reference.strip_prefix('#').and_then(|p| root.pointer(p)) {
                Some(target) => target,
                None => break,
            };
            continue;
        }
        let mut next = child(node, &segment);
        if next.is_none() {
            // Some engine paths skip the `$ref` hop; follow it implicitly.
            if let Some(reference) = node.get("$ref").and_then(Value::as_str) {
                if let Some(target) = reference.strip_prefix('#').and_then(|p| root.pointer(p)) {
                    if let Some(name) = schema_component_name(reference) {
                        entity = Some(name);
                    }
                    next = child(target, &segment);
                }
            }
        }
        match next {
            Some(next) => node = next,
            None => break,
        }
    }

    entity
}

fn child<'v>(node: &'v Value, segment: &str) -> Option<&'v Value> {
    match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Runs format checkers over an instance, following the schema alongside.
///
/// Walks `properties`, `additionalProperties`, `items`, `allOf` and local
/// `$ref`s. `anyOf`/`oneOf` branches are not walked.
struct FormatWalk<'a> {
    root: &'a Value,
    formats: &'a FormatRegistry,
    prefix: &'a str,
    // (reference, instance pointer) pairs already expanded
    visited: HashSet<(String, String)>,
    messages: Vec<Message>,
}

impl<'a> FormatWalk<'a> {
    fn walk(
        &mut self,
        schema: &'a Value,
        instance: &Value,
        pointer: &str,
        schema_pointer: &str,
        entity: Option<&str>,
    ) {
        let Value::Object(node) = schema else {
            return;
        };

        if let Some(reference) = node.get("$ref").and_then(Value::as_str) {
            let root = self.root;
            if self
                .visited
                .insert((reference.to_string(), pointer.to_string()))
            {
                if let Some(target) = reference.strip_prefix('#').and_then(|p| root.pointer(p)) {
                    let name = schema_component_name(reference);
                    self.walk(
                        target,
                        instance,
                        pointer,
                        &format!("{}/$ref", schema_pointer),
                        name.as_deref().or(entity),
                    );
                }
            }
        }

        if let Some(format) = node.get("format").and_then(Value::as_str) {
            if let Some(checker) = self.formats.get(format) {
                if let Err(violation) = checker.check(instance) {
                    let shown = display_pointer(pointer);
                    self.messages.push(
                        Message::new(
                            format!("{}.schema.{}", self.prefix, violation.key),
                            format!("[Path '{}'] {}", shown, violation.message),
                        )
                        .with_context(
                            MessageContext::default()
                                .with_pointers(shown, format!("{}/format", schema_pointer))
                                .with_schema_entity(entity.map(str::to_string)),
                        ),
                    );
                }
            }
        }

        if let Some(Value::Array(branches)) = node.get("allOf") {
            for (idx, branch) in branches.iter().enumerate() {
                self.walk(
                    branch,
                    instance,
                    pointer,
                    &format!("{}/allOf/{}", schema_pointer, idx),
                    entity,
                );
            }
        }

        match instance {
            Value::Object(fields) => {
                let properties = node.get("properties").and_then(Value::as_object);
                for (name, field) in fields {
                    let child = format!("{}/{}", pointer, escape_segment(name));
                    if let Some(sub) = properties.and_then(|p| p.get(name)) {
                        let at = format!("{}/properties/{}", schema_pointer, escape_segment(name));
                        self.walk(sub, field, &child, &at, entity);
                    } else if let Some(additional) =
                        node.get("additionalProperties").filter(|a| a.is_object())
                    {
                        let at = format!("{}/additionalProperties", schema_pointer);
                        self.walk(additional, field, &child, &at, entity);
                    }
                }
            }
            Value::Array(items) => match node.get("items") {
                Some(item_schema @ Value::Object(_)) => {
                    let at = format!("{}/items", schema_pointer);
                    for (idx, item) in items.iter().enumerate() {
                        let child = format!("{}/{}", pointer, idx);
                        self.walk(item_schema, item, &child, &at, entity);
                    }
                }
                Some(Value::Array(tuple)) => {
                    for (idx, (item_schema, item)) in tuple.iter().zip(items).enumerate() {
                        let at = format!("{}/items/{}", schema_pointer, idx);
                        let child = format!("{}/{}", pointer, idx);
                        self.walk(item_schema, item, &child, &at, entity);
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }
}
