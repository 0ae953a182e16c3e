use cdd_validator::model::Response;
use cdd_validator::report::Level;
use cdd_validator::whitelist::{message_has_key, method_is, path_contains, Whitelist};
use cdd_validator::{
    Contract, InteractionValidator, LevelResolver, Message, Method, OperationMatch, Request,
    ValidationReport,
};
use pretty_assertions::assert_eq;

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");

fn contract() -> Contract {
    Contract::from_yaml(PETSTORE).unwrap()
}

fn validator() -> InteractionValidator {
    InteractionValidator::new(contract()).unwrap()
}

fn keys(report: &ValidationReport) -> Vec<&str> {
    report.messages().iter().map(|m| m.key()).collect()
}

fn operation_id(v: &InteractionValidator, path: &str, method: Method) -> Option<String> {
    v.resolve(path, method)
        .operation()
        .and_then(|op| op.operation_id().map(str::to_string))
}

#[test]
fn test_base_path_from_server_variables() {
    assert_eq!(validator().base_path(), "/api/v3");
}

#[test]
fn test_exact_match_beats_parameterized_match() {
    let v = validator();
    assert_eq!(
        operation_id(&v, "/api/v3/pets/mine", Method::Get).as_deref(),
        Some("listMyPets")
    );
    assert_eq!(
        operation_id(&v, "/API/v3/PETS/Mine", Method::Get).as_deref(),
        Some("listMyPets")
    );
    assert_eq!(
        operation_id(&v, "/api/v3/pets/7", Method::Get).as_deref(),
        Some("getPet")
    );
}

#[test]
fn test_composite_template_is_more_specific() {
    let v = validator();
    assert_eq!(
        operation_id(&v, "/api/v3/files/foo.json", Method::Get).as_deref(),
        Some("getFileJson")
    );
    assert_eq!(
        operation_id(&v, "/api/v3/files/foo.txt", Method::Get).as_deref(),
        Some("getFile")
    );
}

#[test]
fn test_resolution_is_method_specific() {
    let v = validator();
    assert_eq!(
        operation_id(&v, "/api/v3/update/id", Method::Post).as_deref(),
        Some("replaceThing")
    );
    assert_eq!(
        operation_id(&v, "/api/v3/update/id", Method::Patch).as_deref(),
        Some("patchThing")
    );
}

#[test]
fn test_method_not_allowed_and_path_not_found() {
    let v = validator();
    match v.resolve("/api/v3/delete", Method::Get) {
        OperationMatch::MethodNotAllowed { api_path, allowed } => {
            assert_eq!(api_path, "/delete");
            assert_eq!(allowed, vec![Method::Delete]);
        }
        other => panic!("expected MethodNotAllowed, got {:?}", other),
    }
    for method in [Method::Get, Method::Post, Method::Delete] {
        assert!(matches!(
            v.resolve("/api/v3/not/a/match", method),
            OperationMatch::PathNotFound
        ));
    }
}

#[test]
fn test_trailing_slash_handling() {
    let lenient = validator();
    assert!(lenient
        .resolve("/api/v3/path/without/trailing/slash/", Method::Get)
        .operation()
        .is_some());

    let strict = InteractionValidator::builder(contract())
        .with_strict_path_matching(true)
        .build()
        .unwrap();
    assert!(matches!(
        strict.resolve("/api/v3/path/without/trailing/slash/", Method::Get),
        OperationMatch::PathNotFound
    ));
    assert!(strict
        .resolve("/api/v3/path/without/trailing/slash", Method::Get)
        .operation()
        .is_some());
}

#[test]
fn test_read_only_fields_by_side() {
    let v = validator();
    let request = Request::builder(Method::Post, "/api/v3/pets")
        .with_header("api_key", "secret")
        .with_content_type("application/json")
        .with_body(r#"{"name": "Rex"}"#)
        .build();
    assert!(v.validate_request(&request).is_empty());

    let response = Response::builder(201)
        .with_content_type("application/json")
        .with_body(r#"{"name": "Rex"}"#)
        .build();
    let report = v.validate(&request, &response);
    assert_eq!(
        keys(&report),
        vec!["validation.response.body.schema.required"]
    );
    let context = report.messages()[0].context().unwrap();
    assert_eq!(context.response_status(), Some(201));
    assert_eq!(context.schema_entity(), Some("Pet"));
}

#[test]
fn test_nullable_and_byte_format() {
    let v = validator();
    let ok = Response::builder(200)
        .with_content_type("application/json")
        .with_body(r#"{"id": 1, "name": "Rex", "tag": null, "photo": "QQ=="}"#)
        .build();
    let report = v.validate_response("/api/v3/pets/1", Method::Get, &ok);
    assert!(report.is_empty(), "{}", report);

    let bad = Response::builder(200)
        .with_content_type("application/json")
        .with_body(r#"{"id": 1, "name": "Rex", "photo": "QQ$="}"#)
        .build();
    let report = v.validate_response("/api/v3/pets/1", Method::Get, &bad);
    assert_eq!(
        keys(&report),
        vec!["validation.response.body.schema.format.base64.illegalChars"]
    );
    assert!(report.messages()[0].message().contains("index 2"));
}

#[test]
fn test_problem_response_from_range() {
    let v = validator();
    let response = Response::builder(404)
        .with_content_type("application/problem+json")
        .with_body(r#"{"detail": "gone"}"#)
        .build();
    let report = v.validate_response("/api/v3/pets/1", Method::Get, &response);
    assert_eq!(
        keys(&report),
        vec!["validation.response.body.schema.required"]
    );
}

#[test]
fn test_query_parameters() {
    let v = validator();
    let ok = Request::builder(Method::Get, "/api/v3/pets?limit=10&tags=a,b").build();
    assert!(v.validate_request(&ok).is_empty());

    let bad = Request::builder(Method::Get, "/api/v3/pets?limit=1000").build();
    let report = v.validate_request(&bad);
    assert_eq!(
        keys(&report),
        vec!["validation.request.parameter.schema.maximum"]
    );
    assert_eq!(
        report.messages()[0].context().unwrap().parameter(),
        Some("limit")
    );
}

#[test]
fn test_security_requirements() {
    let v = validator();
    let anonymous = Request::builder(Method::Get, "/api/v3/store/inventory").build();
    assert_eq!(
        keys(&v.validate_request(&anonymous)),
        vec!["validation.request.security.missing"]
    );

    let keyed = Request::builder(Method::Get, "/api/v3/store/inventory")
        .with_header("api_key", "secret")
        .build();
    assert!(v.validate_request(&keyed).is_empty());

    let wrong_scheme = Request::builder(Method::Post, "/api/v3/measurements")
        .with_header("Authorization", "Basic dTpw")
        .with_content_type("application/json")
        .with_body(r#"{"value": 1.5}"#)
        .build();
    assert_eq!(
        keys(&v.validate_request(&wrong_scheme)),
        vec!["validation.request.security.invalid"]
    );
}

#[test]
fn test_double_format() {
    let v = validator();
    let measure = |body: &str| {
        let request = Request::builder(Method::Post, "/api/v3/measurements")
            .with_header("Authorization", "Bearer token")
            .with_content_type("application/json")
            .with_body(body.to_string())
            .build();
        v.validate_request(&request)
    };
    assert!(measure(r#"{"value": 0.1, "note": null}"#).is_empty());
    let lossy = measure(r#"{"value": 3.14159265358979323846}"#);
    assert_eq!(lossy.messages().len(), 1);
    assert_eq!(
        lossy.messages()[0].key(),
        "validation.request.body.schema.format.double.notRepresentable"
    );
}

#[test]
fn test_all_of_with_additional_properties_enforced() {
    let v = InteractionValidator::builder(contract())
        .with_additional_properties_enforced(true)
        .build()
        .unwrap();
    let order = |body: &str| {
        let request = Request::builder(Method::Post, "/api/v3/store/orders")
            .with_header("api_key", "secret")
            .with_content_type("application/json")
            .with_body(body.to_string())
            .build();
        v.validate_request(&request)
    };
    let placed = order(r#"{"id": 1, "quantity": 2, "status": "placed"}"#);
    assert!(placed.is_empty(), "{}", placed);
    assert_eq!(
        keys(&order(r#"{"id": 1, "quantity": 2, "colour": "red"}"#)),
        vec!["validation.request.body.schema.additionalProperties"]
    );

    let lenient = validator();
    let request = Request::builder(Method::Post, "/api/v3/store/orders")
        .with_header("api_key", "secret")
        .with_content_type("application/json")
        .with_body(r#"{"id": 1, "quantity": 2, "colour": "red"}"#)
        .build();
    assert!(lenient.validate_request(&request).is_empty());
}

#[test]
fn test_level_prefix_demotes_response_findings() {
    let levels = LevelResolver::new()
        .with_level("validation.response", Level::Warn);
    let v = InteractionValidator::builder(contract())
        .with_level_resolver(levels)
        .build()
        .unwrap();
    let response = Response::builder(500).build();
    let report = v.validate_response("/api/v3/pets/mine", Method::Get, &response);
    assert_eq!(keys(&report), vec!["validation.response.status.unknown"]);
    assert_eq!(report.messages()[0].level(), Level::Warn);
    assert!(!report.has_errors());
}

#[test]
fn test_whitelist_requires_every_predicate() {
    let whitelist = Whitelist::new().with_rule(
        "inventory is public",
        message_has_key("validation.request.security.missing")
            .and(path_contains("/store/inventory"))
            .and(method_is(Method::Get)),
    );
    let v = InteractionValidator::builder(contract())
        .with_whitelist(whitelist)
        .build()
        .unwrap();

    let request = Request::builder(Method::Get, "/api/v3/store/inventory")
        .build();
    let inventory = v.validate_request(&request);
    let message = &inventory.messages()[0];
    assert_eq!(message.key(), "validation.request.security.missing");
    assert_eq!(message.level(), Level::Ignore);
    assert_eq!(
        message.context().unwrap().applied_whitelist_rule(),
        Some("inventory is public")
    );
    assert!(!inventory.has_errors());

    let pet = v.validate_request(&Request::builder(Method::Get, "/api/v3/pets/1").build());
    let message = &pet.messages()[0];
    assert_eq!(message.key(), "validation.request.security.missing");
    assert_eq!(message.level(), Level::Error);
    assert_eq!(message.context().unwrap().applied_whitelist_rule(), None);
}

#[test]
fn test_merge_is_associative_and_order_preserving() {
    let report = |keys: &[&str]| {
        ValidationReport::from_messages(keys.iter().map(|k| Message::new(*k, *k)).collect())
    };
    let left = report(&["a"])
        .merge(report(&["b", "c"]))
        .merge(report(&["d"]));
    let right = report(&["a"]).merge(report(&["b", "c"]).merge(report(&["d"])));
    assert_eq!(keys(&left), keys(&right));
    assert_eq!(keys(&left), vec!["a", "b", "c", "d"]);
}

#[test]
fn test_reports_serialize_to_json() {
    let v = validator();
    let report = v.validate_request(&Request::builder(Method::Get, "/api/v3/pets/abc").build());
    let json = serde_json::to_value(&report).unwrap();
    let message = &json["messages"][0];
    assert_eq!(message["key"], "validation.request.security.missing");
    assert_eq!(message["level"], "ERROR");
    assert_eq!(message["context"]["location"], "request");
    assert_eq!(message["context"]["apiOperation"]["operationId"], "getPet");
    assert_eq!(
        json["messages"][1]["key"],
        "validation.request.parameter.schema.type"
    );
}
