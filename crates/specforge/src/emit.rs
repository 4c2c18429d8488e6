//! OpenAPI 3.1 emitter.
//!
//! [`Emitter`] collects document-level metadata and reusable components, then turns an
//! [`OperationSet`] into an [`OpenApi`] document with [`Emitter::emit`]. Invalid
//! metadata is recorded when it is set and reported by `emit`, so no document is
//! produced from invalid input.

use std::collections::HashSet;

use specforge_core::{
    Callback, Components, Contact, Example, ExternalDocs, Header, HttpMethod, Info, License,
    Link, Map, MediaType, OpenApi, Operation, Parameter, ParameterIn, PathItem, RefOr,
    RequestBody, Response, SecurityRequirement, SecurityScheme, Server, Tag,
};
use tracing::warn;

use crate::{
    error::EmitError,
    operation::{CompiledOperation, LEGACY_RESPONSE_DESCRIPTION, OperationSet},
    schema::{Presence, Schema},
    security::SecurityRequirements,
    standard_errors::{error_schema, standard_error},
};

/// Content type of every request and response body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Returns `true` when `key` matches `^[A-Za-z0-9._-]+$`.
pub fn is_valid_component_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Builds OpenAPI documents from compiled operations.
#[derive(Debug, Clone)]
pub struct Emitter {
    info: Info,
    json_schema_dialect: Option<String>,
    servers: Vec<Server>,
    tags: Vec<Tag>,
    external_docs: Option<ExternalDocs>,
    security: Vec<SecurityRequirement>,
    components: Components,
    webhooks: Map<String, PathItem>,
    errors: Vec<EmitError>,
}

impl Emitter {
    /// Creates an emitter for an API with the given title and version.
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: Info::new(title, version),
            json_schema_dialect: None,
            servers: Vec::new(),
            tags: Vec::new(),
            external_docs: None,
            security: Vec::new(),
            components: Components::new(),
            webhooks: Map::new(),
            errors: Vec::new(),
        }
    }

    fn fail(mut self, error: EmitError) -> Self {
        self.errors.push(error);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.info.description = Some(description.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.info.summary = Some(summary.into());
        self
    }

    pub fn terms_of_service(mut self, url: impl Into<String>) -> Self {
        self.info.terms_of_service = Some(url.into());
        self
    }

    pub fn contact(mut self, contact: Contact) -> Self {
        self.info.contact = Some(contact);
        self
    }

    /// Sets the license. A blank name, or both `identifier` and `url`, is an error.
    pub fn license(mut self, license: License) -> Self {
        if let Err(reason) = license.validate() {
            return self.fail(EmitError::InvalidLicense(reason));
        }
        self.info.license = Some(license);
        self
    }

    /// Adds a server. A variable whose `enum` does not contain its default is an error.
    pub fn server(mut self, server: Server) -> Self {
        if let Err(reason) = server.validate() {
            let url = server.url;
            return self.fail(EmitError::InvalidServer { url, reason });
        }
        self.servers.push(server);
        self
    }

    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn external_docs(mut self, external_docs: ExternalDocs) -> Self {
        self.external_docs = Some(external_docs);
        self
    }

    pub fn json_schema_dialect(mut self, dialect: impl Into<String>) -> Self {
        self.json_schema_dialect = Some(dialect.into());
        self
    }

    /// Appends document-level security requirements.
    pub fn security(mut self, requirements: SecurityRequirements) -> Self {
        self.security.extend(requirements.into_vec());
        self
    }

    /// Registers a security scheme under `components.securitySchemes`.
    pub fn security_scheme(self, name: impl Into<String>, scheme: SecurityScheme) -> Self {
        let name = name.into();
        if let Err(reason) = scheme.validate() {
            return self.fail(EmitError::InvalidSecurityScheme { name, reason });
        }
        self.component("securitySchemes", name, RefOr::T(scheme), |c| {
            &mut c.security_schemes
        })
    }

    /// Registers a DSL schema under `components.schemas`.
    pub fn schema_component(self, name: impl Into<String>, schema: Schema) -> Self {
        let name = name.into();
        if let Err(source) = schema.validate() {
            return self.fail(EmitError::InvalidSchemaComponent { name, source });
        }
        if let Some(location) = schema.find_example_conflict() {
            return self.fail(EmitError::ExampleConflict {
                location: join_location(&format!("schema component '{name}'"), &location),
            });
        }
        self.component("schemas", name, schema.to_openapi(), |c| &mut c.schemas)
    }

    pub fn response_component(self, name: impl Into<String>, response: Response) -> Self {
        self.component("responses", name.into(), RefOr::T(response), |c| {
            &mut c.responses
        })
    }

    pub fn parameter_component(self, name: impl Into<String>, parameter: Parameter) -> Self {
        self.component("parameters", name.into(), RefOr::T(parameter), |c| {
            &mut c.parameters
        })
    }

    pub fn example_component(self, name: impl Into<String>, example: Example) -> Self {
        self.component("examples", name.into(), RefOr::T(example), |c| {
            &mut c.examples
        })
    }

    pub fn request_body_component(self, name: impl Into<String>, body: RequestBody) -> Self {
        self.component("requestBodies", name.into(), RefOr::T(body), |c| {
            &mut c.request_bodies
        })
    }

    pub fn header_component(self, name: impl Into<String>, header: Header) -> Self {
        self.component("headers", name.into(), RefOr::T(header), |c| &mut c.headers)
    }

    pub fn link_component(self, name: impl Into<String>, link: Link) -> Self {
        self.component("links", name.into(), RefOr::T(link), |c| &mut c.links)
    }

    pub fn callback_component(self, name: impl Into<String>, callback: Callback) -> Self {
        self.component("callbacks", name.into(), RefOr::T(callback), |c| {
            &mut c.callbacks
        })
    }

    pub fn path_item_component(self, name: impl Into<String>, item: PathItem) -> Self {
        self.component("pathItems", name.into(), RefOr::T(item), |c| {
            &mut c.path_items
        })
    }

    /// Inserts a component after checking its key. Registering the same content twice
    /// is allowed; different content under one key is an error.
    fn component<T: PartialEq>(
        mut self,
        kind: &'static str,
        key: String,
        value: RefOr<T>,
        map: impl FnOnce(&mut Components) -> &mut Map<String, RefOr<T>>,
    ) -> Self {
        if !is_valid_component_key(&key) {
            return self.fail(EmitError::InvalidComponentKey { kind, key });
        }
        let map = map(&mut self.components);
        match map.get(&key).map(|existing| *existing != value) {
            Some(true) => self.fail(EmitError::DivergentComponent { kind, key }),
            Some(false) => self,
            None => {
                map.insert(key, value);
                self
            }
        }
    }

    /// Describes an incoming webhook with the same conversion used for paths.
    ///
    /// The operation's path is ignored; the webhook is keyed by `name`.
    pub fn webhook<H>(mut self, name: impl Into<String>, operation: &CompiledOperation<H>) -> Self {
        let name = name.into();
        match convert_operation(operation) {
            Ok(converted) => {
                self.webhooks
                    .entry(name)
                    .or_default()
                    .set_operation(operation.method(), converted);
                self
            }
            Err(err) => self.fail(err),
        }
    }

    /// Produces the document describing `operations`.
    ///
    /// Paths keep the registration order of `operations`; methods within a path follow
    /// the canonical order `get, put, post, delete, options, head, patch, trace`.
    pub fn emit<H>(&self, operations: &OperationSet<H>) -> Result<OpenApi, EmitError> {
        if let Some(error) = self.errors.first() {
            return Err(error.clone());
        }

        let mut doc = OpenApi::new(self.info.clone());
        doc.json_schema_dialect = self.json_schema_dialect.clone();
        doc.servers = self.servers.clone();
        doc.tags = self.tags.clone();
        doc.external_docs = self.external_docs.clone();
        doc.security = self.security.clone();
        doc.components = self.components.clone();
        doc.webhooks = self.webhooks.clone();

        let mut routes: HashSet<(HttpMethod, &str)> = HashSet::new();
        let mut operation_ids: HashSet<&str> = HashSet::new();
        for op in operations {
            if !routes.insert((op.method(), op.path())) {
                return Err(EmitError::DuplicateOperation {
                    method: op.method(),
                    path: op.path().to_string(),
                });
            }
            if let Some(id) = op.operation_id() {
                if !operation_ids.insert(id) {
                    return Err(EmitError::DuplicateOperationId(id.to_string()));
                }
            }
            self.warn_unknown_schemes(op);

            let converted = convert_operation(op)?;
            doc.paths
                .entry(op.path().to_string())
                .or_default()
                .set_operation(op.method(), converted);
        }

        Ok(doc)
    }

    fn warn_unknown_schemes<H>(&self, op: &CompiledOperation<H>) {
        let Some(security) = op.security() else {
            return;
        };
        for scheme in security.scheme_names() {
            if !self.components.security_schemes.contains_key(scheme) {
                warn!(
                    method = %op.method(),
                    path = op.path(),
                    scheme,
                    "operation requires an unregistered security scheme"
                );
            }
        }
    }
}

fn join_location(prefix: &str, inner: &str) -> String {
    if inner.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix} {inner}")
    }
}

/// Converts a compiled operation into its OpenAPI operation object.
fn convert_operation<H>(op: &CompiledOperation<H>) -> Result<Operation, EmitError> {
    check_examples(op)?;

    let mut operation = Operation {
        tags: op.tags().to_vec(),
        summary: op.summary().map(String::from),
        description: op.description().map(String::from),
        external_docs: op.external_docs().cloned(),
        operation_id: op.operation_id().map(String::from),
        deprecated: op.is_deprecated().then_some(true),
        security: op.security().map(|s| s.as_slice().to_vec()),
        ..Operation::default()
    };

    let placeholders = op.path_parameters();
    match op.params().and_then(Schema::as_object) {
        Some(shape) => {
            for (name, schema) in shape.properties() {
                if placeholders.contains(&name) {
                    operation
                        .parameters
                        .push(RefOr::T(parameter(name, ParameterIn::Path, schema)));
                }
            }
        }
        None => {
            for name in &placeholders {
                let schema = crate::schema::string();
                operation
                    .parameters
                    .push(RefOr::T(parameter(name, ParameterIn::Path, &schema)));
            }
        }
    }
    for (location, source) in [(ParameterIn::Query, op.query()), (ParameterIn::Header, op.headers())] {
        if let Some(shape) = source.and_then(Schema::as_object) {
            for (name, schema) in shape.properties() {
                operation
                    .parameters
                    .push(RefOr::T(parameter(name, location, schema)));
            }
        }
    }

    if let Some(body) = op.body() {
        let required = body.presence() != Presence::Optional;
        operation.request_body = Some(RefOr::T(
            RequestBody::new(required).content(JSON_CONTENT_TYPE, media_type(body)),
        ));
    }

    if op.responses().is_empty() {
        let mut success = Response::new(LEGACY_RESPONSE_DESCRIPTION);
        if let Some(schema) = op.response() {
            success = success.content(JSON_CONTENT_TYPE, media_type(schema));
        }
        operation
            .responses
            .insert(op.success_code().to_string(), RefOr::T(success));
        for code in [400, 500] {
            let description = standard_error(code).map_or("Error", |e| e.description);
            let stub = Response::new(description)
                .content(JSON_CONTENT_TYPE, media_type(&error_schema()));
            operation
                .responses
                .entry(code.to_string())
                .or_insert(RefOr::T(stub));
        }
    } else {
        for (code, definition) in op.responses() {
            let mut response = Response::new(definition.description());
            if let Some(schema) = definition.body() {
                response = response.content(JSON_CONTENT_TYPE, media_type(schema));
            }
            if let Some(shape) = definition.headers().and_then(Schema::as_object) {
                for (name, schema) in shape.properties() {
                    response = response.header(name, RefOr::T(header(schema)));
                }
            }
            operation.responses.insert(code.to_string(), RefOr::T(response));
        }
    }

    Ok(operation)
}

/// Rejects any attached schema that sets both `example` and `examples`.
fn check_examples<H>(op: &CompiledOperation<H>) -> Result<(), EmitError> {
    let route = format!("{} {}", op.method(), op.path());
    let mut attached: Vec<(String, &Schema)> = [
        ("params", op.params()),
        ("query", op.query()),
        ("headers", op.headers()),
        ("body", op.body()),
    ]
    .into_iter()
    .filter_map(|(slot, schema)| schema.map(|s| (slot.to_string(), s)))
    .collect();
    for (code, definition) in op.responses() {
        if let Some(schema) = definition.body() {
            attached.push((format!("response {code}"), schema));
        }
        if let Some(schema) = definition.headers() {
            attached.push((format!("response {code} headers"), schema));
        }
    }

    for (slot, schema) in attached {
        if let Some(location) = schema.find_example_conflict() {
            return Err(EmitError::ExampleConflict {
                location: join_location(&format!("{route} {slot}"), &location),
            });
        }
    }
    Ok(())
}

fn parameter(name: &str, location: ParameterIn, schema: &Schema) -> Parameter {
    let mut parameter = Parameter::new(name, location);
    if location != ParameterIn::Path {
        parameter.required = schema.presence() == Presence::Required;
    }
    if let Some(description) = schema.get_description() {
        parameter.description = Some(description.to_string());
    }
    parameter.schema = Some(schema.to_openapi());
    parameter
}

fn header(schema: &Schema) -> Header {
    let mut header = Header::new(schema.to_openapi());
    header.required = Some(schema.presence() == Presence::Required);
    header.description = schema.get_description().map(String::from);
    header
}

fn media_type(schema: &Schema) -> MediaType {
    let mut media = MediaType::new().schema(schema.to_openapi());
    media.examples = schema
        .get_examples()
        .iter()
        .map(|(name, example)| (name.clone(), RefOr::T(example.clone())))
        .collect();
    media
}
