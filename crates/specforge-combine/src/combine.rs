//! The combine pipeline.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    path::Path,
};

use serde_json::{Map, Value};
use specforge::{
    OutputError,
    openapi::OPENAPI_VERSION,
    output::write_document,
};
use tracing::{debug, info, warn};

use crate::{
    config::{CombinerConfig, ConflictStrategy, ServicesConfig},
    error::{CombineError, ConfigError, LoadError, ValidationError},
    load::SourceSpec,
    service::{TagFilter, join_path, service_from_tags, service_tag},
    stats::CombineStats,
    validate::{is_method, validate_document},
};

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";
const SCHEMAS: &str = "schemas";

/// Merges the documents of several services into one.
///
/// Sources are combined in the order they were added. When two sources define the
/// same operation the later one wins, unless the conflict strategy is
/// [`ConflictStrategy::Error`].
#[derive(Debug)]
pub struct Combiner {
    config: CombinerConfig,
    filter: TagFilter,
    sources: Vec<SourceSpec>,
    warnings: Vec<String>,
    stats: CombineStats,
}

impl Combiner {
    pub fn new(config: CombinerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let filter = TagFilter::new(config.include_tags.clone(), config.exclude_tags.clone());
        Ok(Self {
            config,
            filter,
            sources: Vec::new(),
            warnings: Vec::new(),
            stats: CombineStats::default(),
        })
    }

    pub fn config(&self) -> &CombinerConfig {
        &self.config
    }

    pub fn add_source(&mut self, source: SourceSpec) {
        self.sources.push(source);
    }

    /// Loads every file in `paths`, naming each service after its file stem.
    pub fn load_specs<P: AsRef<Path>>(
        &mut self,
        paths: impl IntoIterator<Item = P>,
    ) -> Result<(), LoadError> {
        for path in paths {
            let source = SourceSpec::from_file(path.as_ref())?;
            debug!(service = %source.service, path = %source.origin.display(), "added source");
            self.sources.push(source);
        }
        Ok(())
    }

    /// Loads the spec file of every enabled service of a services configuration.
    pub fn load_services(&mut self, services: &ServicesConfig) -> Result<(), LoadError> {
        for service in &services.services {
            if !service.enabled {
                debug!(service = %service.name, "skipping disabled service");
                continue;
            }
            self.sources.push(SourceSpec::from_service(service)?);
        }
        Ok(())
    }

    pub fn sources(&self) -> &[SourceSpec] {
        &self.sources
    }

    /// Warnings recorded by the last [`combine_specs`](Self::combine_specs) call.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Statistics of the last [`combine_specs`](Self::combine_specs) call.
    pub fn stats(&self) -> &CombineStats {
        &self.stats
    }

    /// Builds the combined document from the loaded sources.
    pub fn combine_specs(&mut self) -> Result<Value, CombineError> {
        if self.sources.is_empty() {
            return Err(CombineError::NoInputs);
        }

        let mut merge = Merge::new(&self.config, &self.filter);
        let result = self
            .sources
            .iter()
            .try_for_each(|source| merge.add(source));
        self.warnings = std::mem::take(&mut merge.warnings);
        result?;

        let services: BTreeSet<&str> = self
            .sources
            .iter()
            .map(|source| source.service.as_str())
            .collect();
        merge.stats.input_files = self.sources.len();
        merge.stats.services = services.len();
        merge.stats.paths = merge.paths.len();
        merge.stats.operations = merge
            .paths
            .iter()
            .map(|(_, item)| item.keys().filter(|key| is_method(key)).count())
            .sum();
        self.stats = std::mem::take(&mut merge.stats);

        info!(
            services = self.stats.services,
            paths = self.stats.paths,
            operations = self.stats.operations,
            "combined service documents"
        );
        Ok(merge.into_document())
    }

    pub fn validate_output(&self, document: &Value) -> Result<(), ValidationError> {
        validate_document(document)
    }

    /// Writes `document` to the configured output file in the configured format.
    pub fn write_output(&self, document: &Value) -> Result<(), OutputError> {
        write_document(&self.config.output_file, self.config.format, document)?;
        info!(path = %self.config.output_file.display(), "wrote combined document");
        Ok(())
    }

    /// Combines, validates when enabled, and writes the output file. Nothing is
    /// written when any step fails.
    pub fn run(&mut self) -> Result<Value, CombineError> {
        let document = self.combine_specs()?;
        if self.config.validate_output {
            self.validate_output(&document)?;
        }
        self.write_output(&document)?;
        Ok(document)
    }
}

/// Accumulated state of one combine run.
struct Merge<'a> {
    config: &'a CombinerConfig,
    filter: &'a TagFilter,
    paths: Vec<(String, Map<String, Value>)>,
    path_index: HashMap<String, usize>,
    components: Map<String, Value>,
    owners: HashMap<(String, String), String>,
    tags: Vec<Value>,
    warnings: Vec<String>,
    stats: CombineStats,
}

impl<'a> Merge<'a> {
    fn new(config: &'a CombinerConfig, filter: &'a TagFilter) -> Self {
        Self {
            config,
            filter,
            paths: Vec::new(),
            path_index: HashMap::new(),
            components: Map::new(),
            owners: HashMap::new(),
            tags: Vec::new(),
            warnings: Vec::new(),
            stats: CombineStats::default(),
        }
    }

    fn add(&mut self, source: &SourceSpec) -> Result<(), CombineError> {
        debug!(service = %source.service, "combining source");
        let mut document = source.document.clone();
        self.merge_components(source, &mut document)?;
        self.merge_paths(source, &document)?;
        self.merge_tags(source, &document);
        Ok(())
    }

    fn warn(&mut self, message: String) {
        if self.config.verbose {
            warn!("{message}");
        } else {
            debug!("{message}");
        }
        self.warnings.push(message);
    }

    fn merge_components(
        &mut self,
        source: &SourceSpec,
        document: &mut Value,
    ) -> Result<(), CombineError> {
        let renames = self.schema_renames(source, document)?;
        if !renames.is_empty() {
            rewrite_schema_refs(document, &renames);
        }

        let Some(components) = document.get("components").and_then(Value::as_object) else {
            return Ok(());
        };
        for (kind, section) in components {
            let Some(section) = section.as_object() else {
                continue;
            };
            for (key, value) in section {
                let key = match renames.get(key) {
                    Some(renamed) if kind == SCHEMAS => renamed.clone(),
                    _ => key.clone(),
                };
                self.insert_component(kind, key, value.clone(), &source.service)?;
            }
        }
        Ok(())
    }

    /// Decides which schemas of `source` are namespaced as `<service>.<Name>`.
    ///
    /// A schema is compared with its rewritten form, so one that refers to a renamed
    /// schema diverges as well. Decisions repeat until no further schema is renamed.
    fn schema_renames(
        &mut self,
        source: &SourceSpec,
        document: &Value,
    ) -> Result<BTreeMap<String, String>, CombineError> {
        let mut renames = BTreeMap::new();
        let Some(schemas) = document
            .get("components")
            .and_then(|components| components.get(SCHEMAS))
            .and_then(Value::as_object)
        else {
            return Ok(renames);
        };
        if !self.config.merge_schemas {
            return Ok(schemas
                .keys()
                .map(|name| (name.clone(), format!("{}.{name}", source.service)))
                .collect());
        }

        loop {
            let mut merged = 0;
            let mut renamed = false;
            for (name, schema) in schemas {
                if renames.contains_key(name) {
                    continue;
                }
                let mut candidate = schema.clone();
                rewrite_schema_refs(&mut candidate, &renames);
                let same = self
                    .components
                    .get(SCHEMAS)
                    .and_then(|section| section.get(name))
                    .map(|existing| *existing == candidate);
                match same {
                    None => {}
                    Some(true) => merged += 1,
                    Some(false) => {
                        let namespaced = format!("{}.{name}", source.service);
                        let previous = self.owner(SCHEMAS, name);
                        if self.config.conflict_strategy == ConflictStrategy::Error {
                            return Err(CombineError::Conflict {
                                kind: "schema",
                                key: name.clone(),
                                service: source.service.clone(),
                                previous,
                            });
                        }
                        self.stats.conflicts += 1;
                        self.warn(format!(
                            "Renaming schema {name} from {} to {namespaced} (conflicts with {previous})",
                            source.service
                        ));
                        renames.insert(name.clone(), namespaced);
                        renamed = true;
                    }
                }
            }
            if !renamed {
                self.stats.merged_schemas += merged;
                return Ok(renames);
            }
        }
    }

    fn insert_component(
        &mut self,
        kind: &str,
        key: String,
        value: Value,
        service: &str,
    ) -> Result<(), CombineError> {
        let existing = self
            .components
            .get(kind)
            .and_then(|section| section.get(&key))
            .map(|existing| *existing == value);
        match existing {
            Some(true) => return Ok(()),
            Some(false) => {
                let previous = self.owner(kind, &key);
                if self.config.conflict_strategy == ConflictStrategy::Error {
                    return Err(CombineError::Conflict {
                        kind: "component",
                        key: format!("{kind}/{key}"),
                        service: service.to_string(),
                        previous,
                    });
                }
                self.stats.conflicts += 1;
                self.warn(format!(
                    "Overriding {kind} component {key} (previously from {previous})"
                ));
            }
            None => {}
        }

        let section = self
            .components
            .entry(kind.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(section) = section {
            section.insert(key.clone(), value);
        }
        self.owners
            .insert((kind.to_string(), key), service.to_string());
        Ok(())
    }

    fn owner(&self, kind: &str, key: &str) -> String {
        self.owners
            .get(&(kind.to_string(), key.to_string()))
            .cloned()
            .unwrap_or_else(|| "unknown".to_string())
    }

    fn merge_paths(&mut self, source: &SourceSpec, document: &Value) -> Result<(), CombineError> {
        let Some(paths) = document.get("paths").and_then(Value::as_object) else {
            return Ok(());
        };
        let config = self.config;
        let prefix = config
            .service_prefix
            .get(&source.service)
            .map(String::as_str)
            .unwrap_or("");
        let security = document
            .get("security")
            .filter(|security| security.as_array().is_some_and(|list| !list.is_empty()));

        for (path, item) in paths {
            let Some(item) = item.as_object() else {
                continue;
            };
            let final_path = join_path(&config.base_url, prefix, path);

            let mut retained = Vec::new();
            for (method, operation) in item.iter().filter(|(key, _)| is_method(key)) {
                let tags = operation_tags(operation);
                if !self.filter.allows(tags.iter().copied()) {
                    debug!(%method, path = %final_path, "operation filtered out by tags");
                    continue;
                }
                retained.push((method, prepare_operation(source, operation, security)));
            }
            if retained.is_empty() {
                continue;
            }

            for (key, value) in item.iter().filter(|(key, _)| !is_method(key)) {
                self.path_item(&final_path).insert(key.clone(), value.clone());
            }
            for (method, operation) in retained {
                let previous = self
                    .path_item(&final_path)
                    .get(method)
                    .map(|existing| {
                        service_from_tags(operation_tags(existing))
                            .unwrap_or("unknown")
                            .to_string()
                    });
                if let Some(previous) = previous {
                    if config.conflict_strategy == ConflictStrategy::Error {
                        return Err(CombineError::Conflict {
                            kind: "operation",
                            key: format!("{method} {final_path}"),
                            service: source.service.clone(),
                            previous,
                        });
                    }
                    self.stats.conflicts += 1;
                    self.warn(format!(
                        "Overriding {method} {final_path} (previously from {previous})"
                    ));
                }
                self.path_item(&final_path)
                    .insert(method.clone(), operation);
            }
        }
        Ok(())
    }

    fn path_item(&mut self, path: &str) -> &mut Map<String, Value> {
        let index = match self.path_index.get(path) {
            Some(&index) => index,
            None => {
                self.paths.push((path.to_string(), Map::new()));
                self.path_index
                    .insert(path.to_string(), self.paths.len() - 1);
                self.paths.len() - 1
            }
        };
        &mut self.paths[index].1
    }

    fn merge_tags(&mut self, source: &SourceSpec, document: &Value) {
        let declared = document
            .get("tags")
            .and_then(Value::as_array)
            .into_iter()
            .flatten();
        for tag in declared {
            if let Some(name) = tag.get("name").and_then(Value::as_str) {
                if !self.has_tag(name) {
                    self.tags.push(tag.clone());
                }
            }
        }

        if source.has_metadata() {
            let name = service_tag(&source.service);
            let mut tag = Map::new();
            tag.insert("name".to_string(), Value::String(name.clone()));
            if let Some(description) = &source.description {
                tag.insert("description".to_string(), description.clone().into());
            }
            if let Some(version) = &source.version {
                tag.insert("x-service-version".to_string(), version.clone().into());
            }
            if let Some(health_check) = &source.health_check {
                tag.insert("x-health-check".to_string(), health_check.clone().into());
            }
            self.tags
                .retain(|existing| existing.get("name").and_then(Value::as_str) != Some(name.as_str()));
            self.tags.push(Value::Object(tag));
        }
    }

    fn has_tag(&self, name: &str) -> bool {
        self.tags
            .iter()
            .any(|tag| tag.get("name").and_then(Value::as_str) == Some(name))
    }

    fn into_document(self) -> Value {
        let mut info = Map::new();
        info.insert("title".to_string(), self.config.title.clone().into());
        info.insert("version".to_string(), self.config.version.clone().into());
        if let Some(description) = &self.config.description {
            info.insert("description".to_string(), description.clone().into());
        }

        let mut document = Map::new();
        document.insert("openapi".to_string(), OPENAPI_VERSION.into());
        document.insert("info".to_string(), Value::Object(info));
        let paths: Map<String, Value> = self
            .paths
            .into_iter()
            .map(|(path, item)| (path, Value::Object(item)))
            .collect();
        document.insert("paths".to_string(), Value::Object(paths));

        let components: Map<String, Value> = self
            .components
            .into_iter()
            .filter(|(_, section)| section.as_object().is_some_and(|map| !map.is_empty()))
            .collect();
        if !components.is_empty() {
            document.insert("components".to_string(), Value::Object(components));
        }
        if !self.tags.is_empty() {
            document.insert("tags".to_string(), Value::Array(self.tags));
        }
        Value::Object(document)
    }
}

fn operation_tags(operation: &Value) -> Vec<&str> {
    operation
        .get("tags")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .collect()
}

/// Clones `operation`, appending the configured service tags and putting the
/// `service:<name>` tag first. Document-level security is copied onto operations
/// that declare none, since it no longer applies once documents are merged.
fn prepare_operation(source: &SourceSpec, operation: &Value, security: Option<&Value>) -> Value {
    let mut operation = operation.clone();
    let Value::Object(fields) = &mut operation else {
        return operation;
    };

    let mut tags: Vec<String> = fields
        .get("tags")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();
    for tag in &source.tags {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }
    let service = service_tag(&source.service);
    if !tags.contains(&service) {
        tags.insert(0, service);
    }
    fields.insert(
        "tags".to_string(),
        Value::Array(tags.into_iter().map(Value::String).collect()),
    );

    if let Some(security) = security {
        fields
            .entry("security")
            .or_insert_with(|| security.clone());
    }
    operation
}

/// Points every `$ref` to a renamed schema at its new name.
fn rewrite_schema_refs(value: &mut Value, renames: &BTreeMap<String, String>) {
    match value {
        Value::Object(fields) => {
            for (key, field) in fields.iter_mut() {
                if key == "$ref" {
                    let renamed = field
                        .as_str()
                        .and_then(|reference| reference.strip_prefix(SCHEMA_REF_PREFIX))
                        .and_then(|name| renames.get(name));
                    if let Some(renamed) = renamed {
                        *field = Value::String(format!("{SCHEMA_REF_PREFIX}{renamed}"));
                    }
                } else {
                    rewrite_schema_refs(field, renames);
                }
            }
        }
        Value::Array(items) => items
            .iter_mut()
            .for_each(|item| rewrite_schema_refs(item, renames)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn document(paths: Value) -> Value {
        json!({
            "openapi": "3.1.0",
            "info": {"title": "Service", "version": "1.0.0"},
            "paths": paths
        })
    }

    fn ok_operation(summary: &str, tags: &[&str]) -> Value {
        json!({
            "summary": summary,
            "tags": tags,
            "responses": {"200": {"description": "OK"}}
        })
    }

    fn combiner(config: CombinerConfig, sources: Vec<SourceSpec>) -> Combiner {
        let mut combiner = Combiner::new(config).expect("config should be valid");
        for source in sources {
            combiner.add_source(source);
        }
        combiner
    }

    #[test]
    fn combine_specs_applies_base_url_and_service_prefix() {
        //* Given
        let user = SourceSpec::new(
            "user",
            document(json!({"/users": {"get": ok_operation("List users", &[])}})),
        );
        let order = SourceSpec::new(
            "order",
            document(json!({"/orders": {"post": ok_operation("Create order", &[])}})),
        );
        let config = CombinerConfig {
            base_url: "/api".into(),
            ..Default::default()
        }
        .prefix("user", "/v1")
        .prefix("order", "/v2/");
        let mut combiner = combiner(config, vec![user, order]);

        //* When
        let combined = combiner.combine_specs().expect("combine should succeed");

        //* Then
        let paths = combined["paths"].as_object().expect("paths object");
        assert_eq!(
            paths.keys().collect::<Vec<_>>(),
            vec!["/api/v1/users", "/api/v2/orders"]
        );
        assert_eq!(paths["/api/v1/users"]["get"]["tags"], json!(["service:user"]));
        assert_eq!(
            paths["/api/v2/orders"]["post"]["tags"],
            json!(["service:order"])
        );
    }

    #[test]
    fn combine_specs_with_colliding_operation_keeps_later_source() {
        //* Given
        let first = SourceSpec::new(
            "a",
            document(json!({"/users": {"get": ok_operation("from a", &[])}})),
        );
        let second = SourceSpec::new(
            "b",
            document(json!({"/users": {"get": ok_operation("from b", &[])}})),
        );
        let mut combiner = combiner(
            CombinerConfig {
                verbose: true,
                ..Default::default()
            },
            vec![first, second],
        );

        //* When
        let combined = combiner.combine_specs().expect("combine should succeed");

        //* Then
        assert_eq!(combined["paths"]["/users"]["get"]["summary"], "from b");
        assert_eq!(
            combined["paths"]["/users"]["get"]["tags"],
            json!(["service:b"])
        );
        assert_eq!(
            combiner.warnings(),
            ["Overriding get /users (previously from a)".to_string()]
        );
        assert_eq!(combiner.stats().conflicts, 1);
    }

    #[test]
    fn combine_specs_with_error_strategy_fails_on_collision() {
        //* Given
        let op = json!({"/users": {"get": ok_operation("List", &[])}});
        let mut combiner = combiner(
            CombinerConfig {
                conflict_strategy: ConflictStrategy::Error,
                ..Default::default()
            },
            vec![
                SourceSpec::new("a", document(op.clone())),
                SourceSpec::new("b", document(op)),
            ],
        );

        //* When
        let result = combiner.combine_specs();

        //* Then
        assert!(matches!(
            result,
            Err(CombineError::Conflict { kind: "operation", ref previous, .. }) if previous == "a"
        ));
    }

    #[test]
    fn combine_specs_drops_filtered_operations_and_empty_paths() {
        //* Given
        let source = SourceSpec::new(
            "user",
            document(json!({
                "/users": {
                    "get": ok_operation("public", &["public"]),
                    "delete": ok_operation("internal", &["public", "internal"])
                },
                "/admin": {"get": ok_operation("admin", &["admin"])}
            })),
        );
        let config = CombinerConfig {
            include_tags: vec!["public".into()],
            exclude_tags: vec!["internal".into()],
            ..Default::default()
        };
        let mut combiner = combiner(config, vec![source]);

        //* When
        let combined = combiner.combine_specs().expect("combine should succeed");

        //* Then
        let paths = combined["paths"].as_object().expect("paths object");
        assert_eq!(paths.len(), 1);
        assert!(paths["/users"].get("get").is_some());
        assert!(paths["/users"].get("delete").is_none());
        assert_eq!(combiner.stats().operations, 1);
    }

    #[test]
    fn combine_specs_does_not_duplicate_existing_service_tag() {
        //* Given
        let source = SourceSpec::new(
            "user",
            document(json!({"/users": {"get": ok_operation("List", &["users", "service:user"])}})),
        );
        let mut combiner = combiner(CombinerConfig::default(), vec![source]);

        //* When
        let combined = combiner.combine_specs().expect("combine should succeed");

        //* Then
        assert_eq!(
            combined["paths"]["/users"]["get"]["tags"],
            json!(["users", "service:user"])
        );
    }

    #[test]
    fn combine_specs_shares_identical_schemas() {
        //* Given
        let schema = json!({"type": "object", "properties": {"id": {"type": "string"}}});
        let mut first = document(json!({"/a": {"get": ok_operation("a", &[])}}));
        first["components"] = json!({"schemas": {"Id": schema.clone()}});
        let mut second = document(json!({"/b": {"get": ok_operation("b", &[])}}));
        second["components"] = json!({"schemas": {"Id": schema}});
        let mut combiner = combiner(
            CombinerConfig::default(),
            vec![SourceSpec::new("a", first), SourceSpec::new("b", second)],
        );

        //* When
        let combined = combiner.combine_specs().expect("combine should succeed");

        //* Then
        let schemas = combined["components"]["schemas"]
            .as_object()
            .expect("schemas object");
        assert_eq!(schemas.keys().collect::<Vec<_>>(), vec!["Id"]);
        assert_eq!(combiner.stats().merged_schemas, 1);
        assert_eq!(combiner.stats().conflicts, 0);
    }

    #[test]
    fn combine_specs_renames_divergent_schema_and_rewrites_refs() {
        //* Given
        let mut first = document(json!({"/a": {"get": ok_operation("a", &[])}}));
        first["components"] = json!({"schemas": {"User": {"type": "string"}}});
        let mut second = document(json!({
            "/b": {"get": {
                "responses": {"200": {
                    "description": "OK",
                    "content": {"application/json": {
                        "schema": {"$ref": "#/components/schemas/User"}
                    }}
                }}
            }}
        }));
        second["components"] = json!({"schemas": {"User": {"type": "object"}}});
        let mut combiner = combiner(
            CombinerConfig::default(),
            vec![SourceSpec::new("a", first), SourceSpec::new("b", second)],
        );

        //* When
        let combined = combiner.combine_specs().expect("combine should succeed");

        //* Then
        let schemas = &combined["components"]["schemas"];
        assert_eq!(schemas["User"], json!({"type": "string"}));
        assert_eq!(schemas["b.User"], json!({"type": "object"}));
        assert_eq!(
            combined["paths"]["/b"]["get"]["responses"]["200"]["content"]["application/json"]
                ["schema"]["$ref"],
            "#/components/schemas/b.User"
        );
        assert_eq!(combiner.stats().conflicts, 1);
    }

    #[test]
    fn combine_specs_renames_schema_that_refers_to_renamed_schema() {
        //* Given
        let order = json!({
            "type": "object",
            "properties": {
                "buyer": {"$ref": "#/components/schemas/User"},
                "total": {"$ref": "#/components/schemas/Money"}
            }
        });
        let money = json!({"type": "integer"});
        let mut first = document(json!({"/a": {"get": ok_operation("a", &[])}}));
        first["components"] = json!({"schemas": {
            "User": {"type": "string"},
            "Order": order.clone(),
            "Money": money.clone()
        }});
        let mut second = document(json!({"/b": {"get": ok_operation("b", &[])}}));
        second["components"] = json!({"schemas": {
            "Order": order,
            "Money": money,
            "User": {"type": "object"}
        }});
        let mut combiner = combiner(
            CombinerConfig::default(),
            vec![SourceSpec::new("a", first), SourceSpec::new("b", second)],
        );

        //* When
        let combined = combiner.combine_specs().expect("combine should succeed");

        //* Then
        let schemas = &combined["components"]["schemas"];
        assert_eq!(
            schemas["Order"]["properties"]["buyer"]["$ref"],
            "#/components/schemas/User"
        );
        assert_eq!(
            schemas["b.Order"]["properties"]["buyer"]["$ref"],
            "#/components/schemas/b.User"
        );
        assert_eq!(schemas["b.User"], json!({"type": "object"}));
        assert!(schemas.get("b.Money").is_none());
        assert_eq!(combiner.stats().merged_schemas, 1);
        assert_eq!(combiner.stats().conflicts, 2);
        assert!(
            combiner
                .warnings()
                .iter()
                .all(|warning| !warning.starts_with("Overriding")),
            "unexpected override in {:?}",
            combiner.warnings()
        );
    }

    #[test]
    fn combine_specs_without_schema_merging_namespaces_every_schema() {
        //* Given
        let mut source = document(json!({"/a": {"get": ok_operation("a", &[])}}));
        source["components"] = json!({"schemas": {"Item": {"type": "string"}}});
        let config = CombinerConfig {
            merge_schemas: false,
            ..Default::default()
        };
        let mut combiner = combiner(config, vec![SourceSpec::new("shop", source)]);

        //* When
        let combined = combiner.combine_specs().expect("combine should succeed");

        //* Then
        let schemas = combined["components"]["schemas"]
            .as_object()
            .expect("schemas object");
        assert_eq!(schemas.keys().collect::<Vec<_>>(), vec!["shop.Item"]);
    }

    #[test]
    fn combine_specs_adds_service_metadata_tag() {
        //* Given
        let mut source = SourceSpec::new(
            "user",
            document(json!({"/users": {"get": ok_operation("List", &[])}})),
        );
        source.description = Some("User management".into());
        source.health_check = Some("/health".into());
        source.tags = vec!["accounts".into()];
        let mut combiner = combiner(CombinerConfig::default(), vec![source]);

        //* When
        let combined = combiner.combine_specs().expect("combine should succeed");

        //* Then
        assert_eq!(
            combined["tags"],
            json!([{
                "name": "service:user",
                "description": "User management",
                "x-health-check": "/health"
            }])
        );
        assert_eq!(
            combined["paths"]["/users"]["get"]["tags"],
            json!(["service:user", "accounts"])
        );
    }

    #[test]
    fn combine_specs_without_sources_fails() {
        //* Given
        let mut combiner = combiner(CombinerConfig::default(), Vec::new());

        //* When
        let result = combiner.combine_specs();

        //* Then
        assert!(matches!(result, Err(CombineError::NoInputs)));
    }

    #[test]
    fn run_with_invalid_document_writes_nothing() {
        //* Given
        let dir = tempfile::tempdir().expect("should create temp dir");
        let output = dir.path().join("combined.yaml");
        let source = SourceSpec::new(
            "user",
            document(json!({"/users": {"get": {"summary": "no responses"}}})),
        );
        let config = CombinerConfig {
            output_file: output.clone(),
            ..Default::default()
        };
        let mut combiner = combiner(config, vec![source]);

        //* When
        let result = combiner.run();

        //* Then
        assert!(matches!(
            result,
            Err(CombineError::Validation(ValidationError::NoResponses { .. }))
        ));
        assert!(!output.exists());
    }
}
