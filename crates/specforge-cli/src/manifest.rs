//! Route manifests: declarative operation definitions discovered on disk.
//!
//! A manifest lists operations with their schemas and is replayed through the
//! operation builder, so a manifest operation is checked exactly like one written
//! in code:
//!
//! ```yaml
//! security_schemes:
//!   bearer: { type: http, scheme: bearer }
//! schemas:
//!   User:
//!     type: object
//!     properties:
//!       id: { type: string, format: uuid, required: true }
//! operations:
//!   - method: get
//!     path: /users/{id}
//!     params:
//!       properties:
//!         id: { type: string, required: true }
//!     responses:
//!       "200": { description: The user, schema: { $ref: User } }
//!     errors: [404]
//!     security: [{ bearer: [] }]
//! ```

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use specforge::{
    BuilderError, OperationBuilder, OperationSet, Schema, SecurityRequirements,
    openapi::{HttpMethod, SecurityRequirement, SecurityScheme, Tag},
    schema::{
        all_of, any_of, array, boolean, empty_object, integer, not, null, number, object,
        one_of, reference, string,
    },
    standard_errors::standard_error,
};
use tracing::debug;
use walkdir::WalkDir;

const MANIFEST_SUFFIXES: [&str; 3] = [".routes.yaml", ".routes.yml", ".routes.json"];

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to walk '{path}'")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to read '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{path}'")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_norway::Error,
    },

    #[error("failed to parse '{path}'")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{location}: {reason}")]
    InvalidSchema { location: String, reason: String },

    #[error("{method} {path}: invalid status code '{code}'")]
    InvalidStatusCode {
        method: HttpMethod,
        path: String,
        code: String,
    },

    #[error("invalid operation in '{origin}'")]
    Operation {
        origin: PathBuf,
        #[source]
        source: BuilderError,
    },
}

/// Operations discovered by an [`OperationSource`], plus the components they refer to.
#[derive(Debug)]
pub struct Discovered<H> {
    pub operations: OperationSet<H>,
    pub schemas: Vec<(String, Schema)>,
    pub security_schemes: Vec<(String, SecurityScheme)>,
    pub tags: Vec<Tag>,
}

impl<H> Default for Discovered<H> {
    fn default() -> Self {
        Self {
            operations: OperationSet::new(),
            schemas: Vec::new(),
            security_schemes: Vec::new(),
            tags: Vec::new(),
        }
    }
}

/// Somewhere compiled operations come from.
pub trait OperationSource {
    type Handler;

    fn discover(&self) -> Result<Discovered<Self::Handler>, ManifestError>;
}

/// Finds route manifests under a directory, in path order.
#[derive(Debug, Clone)]
pub struct ManifestSource {
    root: PathBuf,
}

/// Handler attached to manifest operations: the manifest it was declared in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRoute {
    pub origin: PathBuf,
}

impl ManifestSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Manifest files under the root, sorted by path.
    pub fn manifest_files(&self) -> Result<Vec<PathBuf>, ManifestError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|source| ManifestError::Walk {
                path: self.root.clone(),
                source,
            })?;
            if entry.file_type().is_file() && is_manifest(entry.path()) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

impl OperationSource for ManifestSource {
    type Handler = ManifestRoute;

    fn discover(&self) -> Result<Discovered<ManifestRoute>, ManifestError> {
        let mut discovered = Discovered::default();
        for path in self.manifest_files()? {
            debug!(path = %path.display(), "reading route manifest");
            let manifest = RouteManifest::from_file(&path)?;
            manifest.replay(&path, &mut discovered)?;
        }
        Ok(discovered)
    }
}

fn is_manifest(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| {
            let name = name.to_ascii_lowercase();
            MANIFEST_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
        })
}

/// One route manifest file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteManifest {
    #[serde(default)]
    pub operations: Vec<OperationDef>,
    #[serde(default)]
    pub schemas: IndexMap<String, SchemaDef>,
    #[serde(default)]
    pub security_schemes: IndexMap<String, SecurityScheme>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperationDef {
    pub method: HttpMethod,
    pub path: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub success_code: Option<u16>,
    #[serde(default)]
    pub params: Option<SchemaDef>,
    #[serde(default)]
    pub query: Option<SchemaDef>,
    #[serde(default)]
    pub body: Option<SchemaDef>,
    #[serde(default)]
    pub headers: Option<SchemaDef>,
    /// Response schema for the success code.
    #[serde(default)]
    pub response: Option<SchemaDef>,
    /// Responses keyed by status code.
    #[serde(default)]
    pub responses: IndexMap<String, ResponseDef>,
    /// Status codes answered with the standard error body.
    #[serde(default)]
    pub errors: Vec<u16>,
    #[serde(default)]
    pub security: Option<Vec<SecurityRequirement>>,
    /// Overrides document-level security with an empty requirement list.
    #[serde(default)]
    pub public: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseDef {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub schema: Option<SchemaDef>,
    #[serde(default)]
    pub headers: Option<SchemaDef>,
}

/// A schema written as data, with JSON Schema keywords in snake_case. `required` and
/// `optional` mark the property itself.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SchemaDef {
    #[serde(rename = "type")]
    pub schema_type: Option<String>,
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    pub format: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    pub optional: bool,
    pub nullable: bool,
    pub deprecated: bool,
    pub read_only: bool,
    pub write_only: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub exclusive_min: Option<f64>,
    pub exclusive_max: Option<f64>,
    pub multiple_of: Option<f64>,
    pub pattern: Option<String>,
    pub min_items: Option<f64>,
    pub max_items: Option<f64>,
    pub unique_items: bool,
    pub min_properties: Option<f64>,
    pub max_properties: Option<f64>,
    pub additional_properties: Option<bool>,
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(rename = "const")]
    pub constant: Option<Value>,
    pub default: Option<Value>,
    pub example: Option<Value>,
    pub items: Option<Box<SchemaDef>>,
    pub properties: Option<IndexMap<String, SchemaDef>>,
    pub one_of: Option<Vec<SchemaDef>>,
    pub all_of: Option<Vec<SchemaDef>>,
    pub any_of: Option<Vec<SchemaDef>>,
    pub not: Option<Box<SchemaDef>>,
}

impl SchemaDef {
    /// Builds the DSL schema. Structural problems (no type, unknown type, an array
    /// without items) are reported here; constraint problems are recorded on the
    /// schema and reported when the operation is compiled.
    pub fn to_schema(&self, location: &str) -> Result<Schema, ManifestError> {
        let schema = self.base_schema(location)?;
        Ok(self.apply_keywords(schema))
    }

    fn base_schema(&self, location: &str) -> Result<Schema, ManifestError> {
        let invalid = |reason: String| ManifestError::InvalidSchema {
            location: location.to_string(),
            reason,
        };
        let composed = self.one_of.is_some()
            || self.all_of.is_some()
            || self.any_of.is_some()
            || self.not.is_some();

        if let Some(name) = &self.reference {
            if let Some(schema_type) = &self.schema_type {
                return Err(invalid(format!("$ref cannot carry type '{schema_type}'")));
            }
            if composed {
                return Err(invalid("$ref cannot be combined with a composition".to_string()));
            }
            return Ok(reference(name.clone()));
        }
        if composed {
            if let Some(schema_type) = &self.schema_type {
                return Err(invalid(format!(
                    "composition cannot carry type '{schema_type}'"
                )));
            }
            return self.composition(location);
        }

        let schema_type = match (self.schema_type.as_deref(), &self.properties) {
            (Some(schema_type), _) => schema_type,
            (None, Some(_)) => "object",
            (None, None) => {
                return Err(ManifestError::InvalidSchema {
                    location: location.to_string(),
                    reason: "schema has no type".to_string(),
                });
            }
        };
        let schema = match schema_type {
            "string" => string(),
            "number" => number(),
            "integer" => integer(),
            "boolean" => boolean(),
            "null" => null(),
            "array" => {
                let Some(items) = &self.items else {
                    return Err(ManifestError::InvalidSchema {
                        location: location.to_string(),
                        reason: "array schema has no items".to_string(),
                    });
                };
                array(items.to_schema(&format!("{location}.items"))?)
            }
            "object" => match &self.properties {
                Some(properties) => {
                    let mut fields = Vec::with_capacity(properties.len());
                    for (name, property) in properties {
                        let schema = property.to_schema(&format!("{location}.{name}"))?;
                        fields.push((name.clone(), schema));
                    }
                    object(fields)
                }
                None => empty_object(),
            },
            other => {
                return Err(ManifestError::InvalidSchema {
                    location: location.to_string(),
                    reason: format!("unknown type '{other}'"),
                });
            }
        };
        Ok(schema)
    }

    fn composition(&self, location: &str) -> Result<Schema, ManifestError> {
        let mut schema: Option<Schema> = None;
        if let Some(schemas) = &self.one_of {
            schema = Some(one_of(children(schemas, location, "oneOf")?));
        }
        if let Some(schemas) = &self.all_of {
            let items = children(schemas, location, "allOf")?;
            schema = Some(match schema {
                Some(schema) => schema.with_all_of(items),
                None => all_of(items),
            });
        }
        if let Some(schemas) = &self.any_of {
            let items = children(schemas, location, "anyOf")?;
            schema = Some(match schema {
                Some(schema) => schema.with_any_of(items),
                None => any_of(items),
            });
        }
        if let Some(child) = &self.not {
            let child = child.to_schema(&format!("{location}.not"))?;
            schema = Some(match schema {
                Some(schema) => schema.with_not(child),
                None => not(child),
            });
        }
        schema.ok_or_else(|| ManifestError::InvalidSchema {
            location: location.to_string(),
            reason: "composition has no slots".to_string(),
        })
    }

    fn apply_keywords(&self, mut schema: Schema) -> Schema {
        if let Some(title) = &self.title {
            schema = schema.title(title.clone());
        }
        if let Some(description) = &self.description {
            schema = schema.description(description.clone());
        }
        if let Some(format) = &self.format {
            schema = schema.format(format);
        }
        if let Some(min) = self.min {
            schema = schema.min(min);
        }
        if let Some(max) = self.max {
            schema = schema.max(max);
        }
        if let Some(bound) = self.exclusive_min {
            schema = schema.exclusive_min(bound);
        }
        if let Some(bound) = self.exclusive_max {
            schema = schema.exclusive_max(bound);
        }
        if let Some(factor) = self.multiple_of {
            schema = schema.multiple_of(factor);
        }
        if let Some(pattern) = &self.pattern {
            schema = schema.pattern(pattern.clone());
        }
        if let Some(bound) = self.min_items {
            schema = schema.min_items(bound);
        }
        if let Some(bound) = self.max_items {
            schema = schema.max_items(bound);
        }
        if self.unique_items {
            schema = schema.unique_items();
        }
        if let Some(bound) = self.min_properties {
            schema = schema.min_properties(bound);
        }
        if let Some(bound) = self.max_properties {
            schema = schema.max_properties(bound);
        }
        if let Some(allowed) = self.additional_properties {
            schema = schema.additional_properties(allowed);
        }
        if let Some(values) = &self.enum_values {
            schema = schema.enum_values(values.iter().cloned());
        }
        if let Some(value) = &self.constant {
            schema = schema.constant(value.clone());
        }
        if let Some(value) = &self.default {
            schema = schema.default(value.clone());
        }
        if let Some(value) = &self.example {
            schema = schema.example(value.clone());
        }
        if self.nullable {
            schema = schema.nullable();
        }
        if self.deprecated {
            schema = schema.deprecated();
        }
        if self.read_only {
            schema = schema.read_only();
        }
        if self.write_only {
            schema = schema.write_only();
        }
        if self.required {
            schema = schema.required();
        }
        if self.optional {
            schema = schema.optional();
        }
        schema
    }
}

fn children(
    schemas: &[SchemaDef],
    location: &str,
    keyword: &str,
) -> Result<Vec<Schema>, ManifestError> {
    schemas
        .iter()
        .enumerate()
        .map(|(index, schema)| schema.to_schema(&format!("{location}.{keyword}[{index}]")))
        .collect()
}

impl RouteManifest {
    /// Parses a manifest; `.json` files as JSON, everything else as YAML.
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            serde_json::from_str(&content).map_err(|source| ManifestError::Json {
                path: path.to_path_buf(),
                source,
            })
        } else {
            serde_norway::from_str(&content).map_err(|source| ManifestError::Yaml {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    /// Compiles every operation of the manifest into `discovered`.
    pub fn replay(
        &self,
        origin: &Path,
        discovered: &mut Discovered<ManifestRoute>,
    ) -> Result<(), ManifestError> {
        for (name, schema) in &self.schemas {
            let schema = schema.to_schema(&format!("schemas.{name}"))?;
            discovered.schemas.push((name.clone(), schema));
        }
        discovered.security_schemes.extend(
            self.security_schemes
                .iter()
                .map(|(name, scheme)| (name.clone(), scheme.clone())),
        );
        discovered.tags.extend(self.tags.iter().cloned());

        for operation in &self.operations {
            let compiled = operation
                .builder()?
                .handler(ManifestRoute {
                    origin: origin.to_path_buf(),
                })
                .map_err(|source| ManifestError::Operation {
                    origin: origin.to_path_buf(),
                    source,
                })?;
            discovered.operations.push(compiled);
        }
        Ok(())
    }
}

impl OperationDef {
    /// The operation builder this definition describes.
    pub fn builder(&self) -> Result<OperationBuilder, ManifestError> {
        let location = |slot: &str| format!("{} {} {slot}", self.method, self.path);

        let mut builder = OperationBuilder::new().route(self.method, self.path.clone());
        if let Some(summary) = &self.summary {
            builder = builder.summary(summary.clone());
        }
        if let Some(description) = &self.description {
            builder = builder.description(description.clone());
        }
        if let Some(operation_id) = &self.operation_id {
            builder = builder.operation_id(operation_id.clone());
        }
        if !self.tags.is_empty() {
            builder = builder.tags(self.tags.iter().cloned());
        }
        if self.deprecated {
            builder = builder.deprecated();
        }
        if let Some(code) = self.success_code {
            builder = builder.success_code(code);
        }

        if let Some(params) = &self.params {
            builder = builder.with_params(params.to_schema(&location("params"))?);
        }
        if let Some(query) = &self.query {
            builder = builder.with_query(query.to_schema(&location("query"))?);
        }
        if let Some(body) = &self.body {
            builder = builder.with_body(body.to_schema(&location("body"))?);
        }
        if let Some(headers) = &self.headers {
            builder = builder.with_headers(headers.to_schema(&location("headers"))?);
        }
        if let Some(response) = &self.response {
            builder = builder.with_response(response.to_schema(&location("response"))?);
        }

        for (code, response) in &self.responses {
            let status = code
                .parse::<u16>()
                .map_err(|_| ManifestError::InvalidStatusCode {
                    method: self.method,
                    path: self.path.clone(),
                    code: code.clone(),
                })?;
            let schema = response
                .schema
                .as_ref()
                .map(|schema| schema.to_schema(&location(&format!("responses.{code}"))))
                .transpose()?;
            let description = response
                .description
                .clone()
                .unwrap_or_else(|| default_description(status).to_string());
            builder = builder.with_response_code(status, schema, description);
            if let Some(headers) = &response.headers {
                let headers = headers.to_schema(&location(&format!("responses.{code}.headers")))?;
                builder = builder.with_response_headers(status, headers);
            }
        }
        if !self.errors.is_empty() {
            builder = builder.with_standard_errors_by_code(self.errors.iter().copied());
        }

        if self.public {
            builder = builder.no_auth();
        } else if let Some(security) = &self.security {
            builder = builder.with_security(SecurityRequirements::from(security.clone()));
        }
        Ok(builder)
    }
}

fn default_description(code: u16) -> &'static str {
    match standard_error(code) {
        Some(error) => error.description,
        None if (200..300).contains(&code) => "Successful response",
        None => "Response",
    }
}
