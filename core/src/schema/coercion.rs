//! Conversion of raw text (parameters, headers, form fields) into JSON values
//! typed after the schema that will validate them.

use crate::contract::refs::extract_component_name;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Upper bound on `$ref -> $ref` chains followed while looking up a type.
const MAX_REF_DEPTH: usize = 32;

/// Follows local schema references until a non-reference schema is reached.
pub(crate) fn dereference<'a>(
    schema: &'a Value,
    definitions: &'a IndexMap<String, Value>,
) -> &'a Value {
    let mut current = schema;
    for _ in 0..MAX_REF_DEPTH {
        let Some(target) = current
            .get("$ref")
            .and_then(Value::as_str)
            .and_then(|r| extract_component_name(r, "schemas"))
            .and_then(|name| definitions.get(&name))
        else {
            return current;
        };
        current = target;
    }
    current
}

/// The first non-null `type` of a schema, after dereferencing.
pub(crate) fn schema_type<'a>(
    schema: &'a Value,
    definitions: &'a IndexMap<String, Value>,
) -> Option<&'a str> {
    let schema = dereference(schema, definitions);
    match schema.get("type") {
        Some(Value::String(t)) => Some(t.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        _ => schema
            .get("allOf")
            .and_then(Value::as_array)
            .and_then(|branches| branches.iter().find_map(|b| schema_type(b, definitions))),
    }
}

/// Converts one raw value.
///
/// Text that does not fit the declared type is kept as a string so the schema
/// engine reports the mismatch.
pub(crate) fn coerce_scalar(
    raw: &str,
    schema: &Value,
    delimiter: char,
    definitions: &IndexMap<String, Value>,
) -> Value {
    match schema_type(schema, definitions) {
        Some("integer") | Some("number") => match serde_json::from_str::<Value>(raw.trim()) {
            Ok(number @ Value::Number(_)) => number,
            _ => Value::String(raw.to_string()),
        },
        Some("boolean") => match raw.trim() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(raw.to_string()),
        },
        Some("null") if raw.is_empty() || raw == "null" => Value::Null,
        Some("array") => {
            let items = items_schema(schema, definitions);
            let parts = if raw.is_empty() {
                Vec::new()
            } else {
                raw.split(delimiter).collect()
            };
            Value::Array(
                parts
                    .into_iter()
                    .map(|p| coerce_scalar(p, &items, delimiter, definitions))
                    .collect(),
            )
        }
        Some("object") => match serde_json::from_str::<Value>(raw) {
            Ok(object @ Value::Object(_)) => object,
            _ => Value::String(raw.to_string()),
        },
        _ => Value::String(raw.to_string()),
    }
}

/// Converts every value sent for a parameter into the instance to validate.
///
/// Arrays are built from the repeated values, one item each, when `explode` is
/// set, otherwise by splitting the first value on `delimiter`. Other types are
/// returned one value per entry.
pub(crate) fn coerce_values(
    values: &[String],
    schema: &Value,
    delimiter: char,
    explode: bool,
    definitions: &IndexMap<String, Value>,
) -> Vec<Value> {
    if schema_type(schema, definitions) == Some("array") {
        if explode {
            if values.is_empty() {
                return Vec::new();
            }
            let items = items_schema(schema, definitions);
            let array = values
                .iter()
                .map(|v| coerce_scalar(v, &items, delimiter, definitions))
                .collect();
            return vec![Value::Array(array)];
        }
        return values
            .first()
            .map(|v| vec![coerce_scalar(v, schema, delimiter, definitions)])
            .unwrap_or_default();
    }
    values
        .iter()
        .map(|v| coerce_scalar(v, schema, delimiter, definitions))
        .collect()
}

/// Builds a JSON object from `application/x-www-form-urlencoded` fields.
pub(crate) fn form_to_json(
    fields: &IndexMap<String, Vec<String>>,
    schema: &Value,
    definitions: &IndexMap<String, Value>,
) -> Value {
    let object_schema = dereference(schema, definitions);
    let empty = Value::Object(Map::new());
    let mut out = Map::new();

    for (name, values) in fields {
        let property = object_schema
            .get("properties")
            .and_then(|p| p.get(name))
            .unwrap_or(&empty);
        let value = if schema_type(property, definitions) == Some("array") {
            let items = items_schema(property, definitions);
            Value::Array(
                values
                    .iter()
                    .map(|v| coerce_scalar(v, &items, ',', definitions))
                    .collect(),
            )
        } else {
            values
                .first()
                .map(|v| coerce_scalar(v, property, ',', definitions))
                .unwrap_or(Value::Null)
        };
        out.insert(name.clone(), value);
    }

    Value::Object(out)
}

fn items_schema(schema: &Value, definitions: &IndexMap<String, Value>) -> Value {
    dereference(schema, definitions)
        .get("items")
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_coercion_by_type() {
        let defs = IndexMap::new();
        let integer = json!({"type": "integer"});
        let boolean = json!({"type": "boolean"});
        let array = json!({"type": "array", "items": {"type": "integer"}});
        assert_eq!(coerce_scalar("42", &integer, ',', &defs), json!(42));
        assert_eq!(coerce_scalar("4x", &integer, ',', &defs), json!("4x"));
        assert_eq!(coerce_scalar("true", &boolean, ',', &defs), json!(true));
        assert_eq!(coerce_scalar("abc", &json!({}), ',', &defs), json!("abc"));
        assert_eq!(coerce_scalar("1|2", &array, '|', &defs), json!([1, 2]));
    }

    #[test]
    fn test_type_found_through_ref_and_nullable_union() {
        let mut defs = IndexMap::new();
        defs.insert("Count".to_string(), json!({"type": ["integer", "null"]}));
        let schema = json!({"$ref": "#/components/schemas/Count"});
        assert_eq!(schema_type(&schema, &defs), Some("integer"));
        assert_eq!(coerce_scalar("7", &schema, ',', &defs), json!(7));
    }

    #[test]
    fn test_exploded_array_values() {
        let defs = IndexMap::new();
        let schema = json!({"type": "array", "items": {"type": "integer"}});
        let values = vec!["1".to_string(), "2".to_string()];
        assert_eq!(
            coerce_values(&values, &schema, ',', true, &defs),
            vec![json!([1, 2])]
        );

        let single = vec!["3,4".to_string()];
        assert_eq!(
            coerce_values(&single, &schema, ',', false, &defs),
            vec![json!([3, 4])]
        );
    }

    #[test]
    fn test_exploded_single_value_is_not_split() {
        let defs = IndexMap::new();
        let schema = json!({"type": "array", "items": {"type": "string"}});
        let single = vec!["a,b".to_string()];
        assert_eq!(
            coerce_values(&single, &schema, ',', true, &defs),
            vec![json!(["a,b"])]
        );
        assert!(coerce_values(&[], &schema, ',', true, &defs).is_empty());
    }

    #[test]
    fn test_non_array_values_are_independent() {
        let defs = IndexMap::new();
        let values = vec!["1".to_string(), "x".to_string()];
        assert_eq!(
            coerce_values(&values, &json!({"type": "integer"}), ',', true, &defs),
            vec![json!(1), json!("x")]
        );
    }

    #[test]
    fn test_form_fields_to_json() {
        let defs = IndexMap::new();
        let schema = json!({
            "type": "object",
            "properties": {
                "age": {"type": "integer"},
                "tags": {"type": "array", "items": {"type": "string"}}
            }
        });
        let mut fields = IndexMap::new();
        fields.insert("age".to_string(), vec!["30".to_string()]);
        fields.insert("tags".to_string(), vec!["a".to_string(), "b".to_string()]);
        fields.insert("note".to_string(), vec!["hi".to_string()]);
        assert_eq!(
            form_to_json(&fields, &schema, &defs),
            json!({"age": 30, "tags": ["a", "b"], "note": "hi"})
        );
    }
}
