//! Shared fixtures for the integration tests.

use std::path::{Path, PathBuf};

use serde_json::{Value, json};

/// A minimal OpenAPI 3.1 document with the given paths.
pub fn service_document(title: &str, paths: Value) -> Value {
    json!({
        "openapi": "3.1.0",
        "info": {"title": title, "version": "1.0.0"},
        "paths": paths
    })
}

/// An operation answering 200 with a JSON body.
pub fn ok_operation(summary: &str, tags: &[&str]) -> Value {
    json!({
        "summary": summary,
        "tags": tags,
        "responses": {
            "200": {
                "description": "OK",
                "content": {"application/json": {"schema": {"type": "object"}}}
            }
        }
    })
}

/// Writes `document` as YAML to `dir/name` and returns the path.
pub fn write_yaml(dir: &Path, name: &str, document: &Value) -> PathBuf {
    let path = dir.join(name);
    let text = serde_norway::to_string(document).expect("fixture should serialize as YAML");
    std::fs::write(&path, text).expect("fixture should be written");
    path
}

/// Writes `document` as JSON to `dir/name` and returns the path.
pub fn write_json(dir: &Path, name: &str, document: &Value) -> PathBuf {
    let path = dir.join(name);
    let text = serde_json::to_string_pretty(document).expect("fixture should serialize as JSON");
    std::fs::write(&path, text).expect("fixture should be written");
    path
}

/// Reads a YAML or JSON document written by the code under test.
pub fn read_document(path: &Path) -> Value {
    let text = std::fs::read_to_string(path).expect("document should be readable");
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&text).expect("document should be valid JSON"),
        _ => serde_norway::from_str(&text).expect("document should be valid YAML"),
    }
}

/// Asserts that `schema` (an emitted JSON schema without `$ref`s) accepts `instance`.
pub fn assert_schema_accepts(schema: &Value, instance: &Value) {
    let validator = jsonschema::validator_for(schema).expect("should compile JSON schema");
    let errors: Vec<String> = validator
        .iter_errors(instance)
        .map(|err| format!("- {}: {}", err.instance_path, err))
        .collect();
    if !errors.is_empty() {
        panic!(
            "schema {schema} rejects {instance}:\n{}",
            errors.join("\n")
        );
    }
}

/// Asserts that `schema` rejects `instance`.
pub fn assert_schema_rejects(schema: &Value, instance: &Value) {
    let validator = jsonschema::validator_for(schema).expect("should compile JSON schema");
    assert!(
        !validator.is_valid(instance),
        "schema {schema} should reject {instance}"
    );
}
