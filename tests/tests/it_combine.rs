//! End-to-end tests for combining service documents read from disk.

use std::path::Path;

use serde_json::{Value, json};
use specforge::OutputFormat;
use specforge_combine::{
    CombineError, Combiner, CombinerConfig, LoadError, ServicesConfig, SourceSpec,
    ValidationError,
};
use testlib::{ok_operation, read_document, service_document, write_json, write_yaml};

fn config_in(dir: &Path) -> CombinerConfig {
    CombinerConfig {
        output_file: dir.join("combined-api.yaml"),
        ..Default::default()
    }
}

fn tags_of(operation: &Value) -> Vec<&str> {
    operation["tags"]
        .as_array()
        .expect("tags list")
        .iter()
        .filter_map(Value::as_str)
        .collect()
}

#[test]
fn combine_two_services_prefixes_paths_and_tags_operations() {
    //* Given
    let dir = tempfile::tempdir().expect("should create temp dir");
    let user = write_yaml(
        dir.path(),
        "user-service.yaml",
        &service_document(
            "Users",
            json!({"/users": {"get": ok_operation("List users", &["users"])}}),
        ),
    );
    let order = write_yaml(
        dir.path(),
        "order-service.yaml",
        &service_document(
            "Orders",
            json!({"/orders": {"post": ok_operation("Create order", &["orders"])}}),
        ),
    );
    let config = CombinerConfig {
        base_url: "/api".to_string(),
        ..config_in(dir.path())
    }
    .prefix("user", "/v1")
    .prefix("order", "/v2");

    //* When
    let mut combiner = Combiner::new(config).expect("config should be valid");
    combiner
        .load_specs([&user, &order])
        .expect("sources should load");
    let combined = combiner.run().expect("combine should succeed");

    //* Then
    let paths = combined["paths"].as_object().expect("paths object");
    assert_eq!(
        paths.keys().collect::<Vec<_>>(),
        vec!["/api/v1/users", "/api/v2/orders"]
    );
    assert_eq!(
        tags_of(&combined["paths"]["/api/v1/users"]["get"]),
        vec!["service:user", "users"]
    );
    assert_eq!(
        tags_of(&combined["paths"]["/api/v2/orders"]["post"]),
        vec!["service:order", "orders"]
    );

    let stats = combiner.stats();
    assert_eq!(stats.services, 2);
    assert_eq!(stats.operations, 2);
    assert_eq!(stats.conflicts, 0);

    let written = read_document(&dir.path().join("combined-api.yaml"));
    assert_eq!(written, combined);
    assert_eq!(written["info"]["title"], "Combined API");
}

#[test]
fn combine_colliding_operations_keeps_later_service_and_warns() {
    //* Given
    let dir = tempfile::tempdir().expect("should create temp dir");
    let a = write_yaml(
        dir.path(),
        "a.yaml",
        &service_document(
            "A",
            json!({"/users": {"get": ok_operation("Users from a", &[])}}),
        ),
    );
    let b = write_yaml(
        dir.path(),
        "b.yaml",
        &service_document(
            "B",
            json!({"/users": {"get": ok_operation("Users from b", &[])}}),
        ),
    );
    let config = CombinerConfig {
        verbose: true,
        ..config_in(dir.path())
    };

    //* When
    let mut combiner = Combiner::new(config).expect("config should be valid");
    combiner.load_specs([a, b]).expect("sources should load");
    let combined = combiner.combine_specs().expect("combine should succeed");

    //* Then
    let get = &combined["paths"]["/users"]["get"];
    assert_eq!(get["summary"], "Users from b");
    assert_eq!(tags_of(get), vec!["service:b"]);
    assert!(
        combiner
            .warnings()
            .iter()
            .any(|warning| warning.contains("Overriding get /users (previously from a)")),
        "missing override warning in {:?}",
        combiner.warnings()
    );
    assert_eq!(combiner.stats().conflicts, 1);
}

#[test]
fn combine_own_output_again_does_not_duplicate_service_tag() {
    //* Given
    let dir = tempfile::tempdir().expect("should create temp dir");
    let mut billing = service_document(
        "Billing",
        json!({"/invoices": {"get": ok_operation("List invoices", &["invoices"])}}),
    );
    billing["security"] = json!([{"bearer": []}]);
    let source = write_yaml(dir.path(), "billing.yaml", &billing);
    let mut first = Combiner::new(config_in(dir.path())).expect("config should be valid");
    first.load_specs([&source]).expect("source should load");
    let once = first.combine_specs().expect("combine should succeed");

    //* When
    let mut second = Combiner::new(config_in(dir.path())).expect("config should be valid");
    second.add_source(SourceSpec::new("billing", once.clone()));
    let twice = second.combine_specs().expect("combine should succeed");

    //* Then
    assert_eq!(twice["paths"], once["paths"]);
    let get = &once["paths"]["/invoices"]["get"];
    assert_eq!(tags_of(get), vec!["service:billing", "invoices"]);
    // Document-level security moves onto the operations on the first pass.
    assert_eq!(get["security"], json!([{"bearer": []}]));
}

#[test]
fn combine_with_schema_referring_to_divergent_schema_keeps_each_service_graph() {
    //* Given
    let dir = tempfile::tempdir().expect("should create temp dir");
    let order = json!({
        "type": "object",
        "properties": {"buyer": {"$ref": "#/components/schemas/User"}}
    });
    let order_response = json!({
        "responses": {"200": {
            "description": "OK",
            "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Order"}}}
        }}
    });
    let mut shop = service_document("Shop", json!({"/orders": {"get": order_response.clone()}}));
    shop["components"] = json!({"schemas": {
        "User": {"type": "object", "properties": {"id": {"type": "string"}}},
        "Order": order.clone()
    }});
    let mut market = service_document("Market", json!({"/orders": {"get": order_response}}));
    market["components"] = json!({"schemas": {
        "User": {"type": "object", "properties": {"id": {"type": "integer"}}},
        "Order": order
    }});
    let shop = write_yaml(dir.path(), "shop.yaml", &shop);
    let market = write_yaml(dir.path(), "market.yaml", &market);
    let config = config_in(dir.path()).prefix("shop", "/shop").prefix("market", "/market");

    //* When
    let mut combiner = Combiner::new(config).expect("config should be valid");
    combiner.load_specs([shop, market]).expect("sources should load");
    let combined = combiner.run().expect("combine should succeed");

    //* Then
    let schemas = &combined["components"]["schemas"];
    let ref_of = |path: &str| {
        combined["paths"][path]["get"]["responses"]["200"]["content"]["application/json"]
            ["schema"]["$ref"]
            .clone()
    };
    assert_eq!(ref_of("/shop/orders"), "#/components/schemas/Order");
    assert_eq!(ref_of("/market/orders"), "#/components/schemas/market.Order");
    assert_eq!(
        schemas["Order"]["properties"]["buyer"]["$ref"],
        "#/components/schemas/User"
    );
    assert_eq!(
        schemas["market.Order"]["properties"]["buyer"]["$ref"],
        "#/components/schemas/market.User"
    );
    assert_eq!(schemas["User"]["properties"]["id"]["type"], "string");
    assert_eq!(schemas["market.User"]["properties"]["id"]["type"], "integer");
    assert_eq!(combiner.stats().merged_schemas, 0);
}

#[test]
fn combine_with_slashes_in_prefix_and_base_url_normalizes_paths() {
    //* Given
    let dir = tempfile::tempdir().expect("should create temp dir");
    let source = write_json(
        dir.path(),
        "catalog-api.json",
        &service_document(
            "Catalog",
            json!({"/items/{id}": {"get": ok_operation("Get item", &[])}}),
        ),
    );
    let config = CombinerConfig {
        base_url: "/api/".to_string(),
        ..config_in(dir.path())
    }
    .prefix("catalog", "/v3/");

    //* When
    let mut combiner = Combiner::new(config).expect("config should be valid");
    combiner.load_specs([source]).expect("source should load");
    let combined = combiner.combine_specs().expect("combine should succeed");

    //* Then
    let paths = combined["paths"].as_object().expect("paths object");
    assert_eq!(paths.keys().collect::<Vec<_>>(), vec!["/api/v3/items/{id}"]);
}

#[test]
fn combine_with_include_and_exclude_tags_keeps_only_allowed_operations() {
    //* Given
    let dir = tempfile::tempdir().expect("should create temp dir");
    let source = write_yaml(
        dir.path(),
        "shop-service.yaml",
        &service_document(
            "Shop",
            json!({
                "/products": {
                    "get": ok_operation("List products", &["public"]),
                    "post": ok_operation("Create product", &["public", "admin"])
                },
                "/reports": {"get": ok_operation("Reports", &["internal"])}
            }),
        ),
    );
    let config = CombinerConfig {
        include_tags: vec!["public".to_string()],
        exclude_tags: vec!["admin".to_string()],
        ..config_in(dir.path())
    };

    //* When
    let mut combiner = Combiner::new(config).expect("config should be valid");
    combiner.load_specs([source]).expect("source should load");
    let combined = combiner.combine_specs().expect("combine should succeed");

    //* Then
    let paths = combined["paths"].as_object().expect("paths object");
    assert_eq!(paths.keys().collect::<Vec<_>>(), vec!["/products"]);
    let products = paths["/products"].as_object().expect("path item");
    assert!(products.contains_key("get"));
    assert!(!products.contains_key("post"));
}

#[test]
fn combine_services_config_skips_disabled_services_and_resolves_relative_files() {
    //* Given
    let dir = tempfile::tempdir().expect("should create temp dir");
    let specs = dir.path().join("specs");
    std::fs::create_dir_all(&specs).expect("should create specs dir");
    write_yaml(
        &specs,
        "user.yaml",
        &service_document(
            "Users",
            json!({"/users": {"get": ok_operation("List users", &[])}}),
        ),
    );
    let config_path = dir.path().join("services.yaml");
    std::fs::write(
        &config_path,
        r#"
title: Platform API
version: 2.0.0
base_url: /api
services:
  - name: user
    spec_file: specs/user.yaml
    path_prefix: /users-svc
    description: User accounts
    version: 1.4.0
  - name: legacy
    spec_file: specs/does-not-exist.yaml
    enabled: false
"#,
    )
    .expect("should write services config");

    //* When
    let services = ServicesConfig::from_file(&config_path).expect("config should load");
    let mut config = config_in(dir.path());
    config.apply_services_config(&services);
    let mut combiner = Combiner::new(config).expect("config should be valid");
    combiner
        .load_services(&services)
        .expect("enabled services should load");
    let combined = combiner.combine_specs().expect("combine should succeed");

    //* Then
    assert_eq!(combiner.sources().len(), 1);
    assert_eq!(combined["info"]["title"], "Platform API");
    assert_eq!(combined["info"]["version"], "2.0.0");
    assert!(combined["paths"]["/api/users-svc/users"]["get"].is_object());
    assert_eq!(
        combined["tags"],
        json!([{
            "name": "service:user",
            "description": "User accounts",
            "x-service-version": "1.4.0"
        }])
    );
}

#[test]
fn run_with_json_format_writes_json_output() {
    //* Given
    let dir = tempfile::tempdir().expect("should create temp dir");
    let source = write_yaml(
        dir.path(),
        "user-service.yaml",
        &service_document(
            "Users",
            json!({"/users": {"get": ok_operation("List users", &[])}}),
        ),
    );
    let output = dir.path().join("out").join("combined.json");
    let config = CombinerConfig {
        output_file: output.clone(),
        format: OutputFormat::Json,
        ..Default::default()
    };

    //* When
    let mut combiner = Combiner::new(config).expect("config should be valid");
    combiner.load_specs([source]).expect("source should load");
    let combined = combiner.run().expect("run should succeed");

    //* Then
    let text = std::fs::read_to_string(&output).expect("output should exist");
    let written: Value = serde_json::from_str(&text).expect("output should be JSON");
    assert_eq!(written, combined);
    assert_eq!(written["openapi"], "3.1.0");
}

#[test]
fn run_with_operation_without_responses_fails_validation() {
    //* Given
    let dir = tempfile::tempdir().expect("should create temp dir");
    let source = write_yaml(
        dir.path(),
        "broken.yaml",
        &service_document("Broken", json!({"/broken": {"get": {"summary": "No responses"}}})),
    );
    let output = dir.path().join("combined-api.yaml");

    //* When
    let mut combiner = Combiner::new(config_in(dir.path())).expect("config should be valid");
    combiner.load_specs([source]).expect("source should load");
    let result = combiner.run();

    //* Then
    assert!(matches!(
        result,
        Err(CombineError::Validation(ValidationError::NoResponses { .. }))
    ));
    assert!(!output.exists());
}

#[test]
fn load_specs_with_unparseable_file_fails() {
    //* Given
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("garbage.txt");
    std::fs::write(&path, "{ this: [is not").expect("should write file");

    //* When
    let mut combiner = Combiner::new(config_in(dir.path())).expect("config should be valid");
    let result = combiner.load_specs([&path]);

    //* Then
    assert!(
        matches!(result, Err(LoadError::Unrecognized { .. })),
        "expected unrecognized input, got {result:?}"
    );
}

#[test]
fn load_specs_with_missing_file_fails() {
    //* Given
    let dir = tempfile::tempdir().expect("should create temp dir");

    //* When
    let mut combiner = Combiner::new(config_in(dir.path())).expect("config should be valid");
    let result = combiner.load_specs([dir.path().join("absent.yaml")]);

    //* Then
    assert!(matches!(result, Err(LoadError::Missing(_))));
}
