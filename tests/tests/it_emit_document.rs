//! End-to-end tests for declaring operations and emitting OpenAPI documents.

use serde_json::{Value, json};
use specforge::{
    BuilderError, EmitError, Emitter, OperationSet, OutputFormat, Schema, SecurityRequirements,
    openapi::{License, SecurityScheme},
    operation,
    schema::{array, integer, object, string},
};
use testlib::{assert_schema_accepts, assert_schema_rejects};

fn emit_json(emitter: &Emitter, operations: &OperationSet<()>) -> Value {
    let doc = emitter.emit(operations).expect("document should emit");
    serde_json::to_value(&doc).expect("document should serialize")
}

#[test]
fn emit_get_with_path_params_describes_path_parameter_and_response() {
    //* Given
    let get_user = operation::get("/users/{id}")
        .with_params(object([("id", string().required())]))
        .with_response(object([("id", string()), ("name", string())]))
        .handler(())
        .expect("operation should compile");

    //* When
    let doc = emit_json(
        &Emitter::new("Users", "1.0.0"),
        &OperationSet::new().with(get_user),
    );

    //* Then
    let get = &doc["paths"]["/users/{id}"]["get"];
    assert_eq!(
        get["parameters"],
        json!([{"name": "id", "in": "path", "required": true, "schema": {"type": "string"}}])
    );
    let schema = &get["responses"]["200"]["content"]["application/json"]["schema"];
    assert_eq!(schema["type"], "object");
    assert_eq!(schema["properties"]["id"], json!({"type": "string"}));
    assert_eq!(schema["properties"]["name"], json!({"type": "string"}));
}

#[test]
fn emit_post_with_body_marks_body_and_properties_required() {
    //* Given
    let create_user = operation::post("/users")
        .with_body(object([
            ("name", string().required()),
            ("email", string().email().required()),
        ]))
        .with_created(object([("id", string().uuid())]))
        .handler(())
        .expect("operation should compile");

    //* When
    let doc = emit_json(
        &Emitter::new("Users", "1.0.0"),
        &OperationSet::new().with(create_user),
    );

    //* Then
    let body = &doc["paths"]["/users"]["post"]["requestBody"];
    assert_eq!(body["required"], true);
    let schema = &body["content"]["application/json"]["schema"];
    let mut required: Vec<&str> = schema["required"]
        .as_array()
        .expect("required list")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    required.sort_unstable();
    assert_eq!(required, vec!["email", "name"]);
    assert_eq!(schema["properties"]["email"]["format"], "email");

    assert_schema_accepts(schema, &json!({"name": "Ada", "email": "ada@example.com"}));
    assert_schema_rejects(schema, &json!({"name": "Ada"}));
}

#[test]
fn emit_with_create_errors_registers_every_error_code() {
    //* Given
    let create = operation::post("/orders")
        .with_created(object([("id", string())]))
        .with_create_errors()
        .handler(())
        .expect("operation should compile");

    //* When
    let doc = emit_json(
        &Emitter::new("Orders", "1.0.0"),
        &OperationSet::new().with(create),
    );

    //* Then
    let responses = doc["paths"]["/orders"]["post"]["responses"]
        .as_object()
        .expect("responses object");
    for code in ["201", "400", "401", "403", "409", "422", "500"] {
        assert!(responses.contains_key(code), "missing response {code}");
    }
    let error_body = &responses["409"]["content"]["application/json"]["schema"];
    assert_schema_accepts(error_body, &json!({"error": "conflict"}));
    assert_schema_rejects(error_body, &json!({"details": "no error field"}));
}

#[test]
fn emit_with_license_identifier_and_url_fails() {
    //* Given
    let emitter = Emitter::new("Licensed", "1.0.0").license(
        License::new("MIT")
            .identifier("MIT")
            .url("https://opensource.org/licenses/MIT"),
    );

    //* When
    let result = emitter.emit(&OperationSet::<()>::new());

    //* Then
    assert!(matches!(result, Err(EmitError::InvalidLicense(_))));
}

#[test]
fn emit_with_invalid_component_keys_fails() {
    //* Given
    let bad_schema = Emitter::new("Api", "1.0.0").schema_component("User Profile", string());
    let bad_scheme =
        Emitter::new("Api", "1.0.0").security_scheme("bearer/auth", SecurityScheme::bearer());

    //* Then
    for emitter in [bad_schema, bad_scheme] {
        let result = emitter.emit(&OperationSet::<()>::new());
        assert!(
            matches!(result, Err(EmitError::InvalidComponentKey { .. })),
            "expected invalid key error, got {result:?}"
        );
    }
}

#[test]
fn handler_with_uncovered_placeholder_fails() {
    //* When
    let result = operation::get("/orgs/{org}/users/{id}")
        .with_params(object([("org", string().required())]))
        .handler(());

    //* Then
    assert_eq!(
        result.err(),
        Some(BuilderError::UncoveredPlaceholder {
            path: "/orgs/{org}/users/{id}".to_string(),
            placeholder: "id".to_string(),
        })
    );
}

#[test]
fn response_code_ranges_accept_only_their_classes() {
    //* Then
    for code in [100u16, 199, 200, 204, 299, 300, 399, 400, 404, 500, 599] {
        let success = operation::get("/x")
            .with_success_response(code, None::<Schema>, "response")
            .handler(());
        assert_eq!(
            success.is_ok(),
            (200..300).contains(&code),
            "success response {code}"
        );

        let error = operation::get("/x")
            .with_error_response(code, None::<Schema>, "response")
            .handler(());
        assert_eq!(error.is_ok(), code >= 400, "error response {code}");
    }
}

#[test]
fn emit_with_security_and_query_describes_both() {
    //* Given
    let list = operation::get("/items")
        .with_query(object([
            ("limit", integer().min(1).max(100)),
            ("tags", array(string())),
        ]))
        .with_ok(array(object([("id", string())])))
        .with_security(SecurityRequirements::new().require("oauth", ["items:read"]))
        .handler(())
        .expect("operation should compile");
    let emitter = Emitter::new("Items", "2.0.0")
        .security_scheme("oauth", SecurityScheme::bearer())
        .security(SecurityRequirements::new().require("oauth", Vec::<String>::new()));

    //* When
    let doc = emit_json(&emitter, &OperationSet::new().with(list));

    //* Then
    let get = &doc["paths"]["/items"]["get"];
    assert_eq!(get["security"], json!([{"oauth": ["items:read"]}]));
    assert_eq!(doc["security"], json!([{"oauth": []}]));

    let limit = get["parameters"]
        .as_array()
        .expect("parameters")
        .iter()
        .find(|param| param["name"] == "limit")
        .expect("limit parameter");
    assert_eq!(limit["in"], "query");
    assert_eq!(limit["required"], false);
    assert_schema_accepts(&limit["schema"], &json!(10));
    assert_schema_rejects(&limit["schema"], &json!(101));
}

#[test]
fn serialize_document_as_yaml_round_trips_through_json() {
    //* Given
    let op = operation::get("/health")
        .with_ok(object([("status", string())]))
        .handler(())
        .expect("operation should compile");
    let doc = Emitter::new("Health", "1.0.0")
        .emit(&OperationSet::new().with(op))
        .expect("document should emit");

    //* When
    let yaml = OutputFormat::Yaml
        .serialize(&doc)
        .expect("document should serialize");

    //* Then
    let parsed: Value = serde_norway::from_str(&yaml).expect("YAML should parse");
    assert_eq!(parsed["openapi"], "3.1.0");
    assert!(parsed["paths"]["/health"]["get"]["responses"]["200"].is_object());
    assert!(yaml.contains("'200':") || yaml.contains("\"200\":"));
}
