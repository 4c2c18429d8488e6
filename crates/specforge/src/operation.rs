//! Operation builder and compiled operations.
//!
//! An operation is declared with a verb constructor, refined fluently and frozen with
//! [`OperationBuilder::handler`]:
//!
//! ```
//! use specforge::{operation, schema::{object, string}};
//!
//! let op = operation::get("/users/{id}")
//!     .summary("Fetch a user")
//!     .tags(["users"])
//!     .with_params(object([("id", string().required())]))
//!     .with_ok(object([("id", string()), ("name", string())]))
//!     .with_not_found()
//!     .handler(|| "fetch user")
//!     .expect("valid operation");
//!
//! assert_eq!(op.path_parameters(), ["id"]);
//! ```
//!
//! Tags, responses and security requirements accumulate; the other setters overwrite.
//! Invalid input is recorded and reported by `handler`, which performs every check
//! before producing a [`CompiledOperation`].

use std::collections::BTreeMap;

use specforge_core::{ExternalDocs, HttpMethod};

use crate::{
    error::BuilderError,
    schema::{Schema, SchemaKind},
    security::SecurityRequirements,
    standard_errors::standard_error,
};

/// Description given to the response registered by [`OperationBuilder::with_response`].
pub const LEGACY_RESPONSE_DESCRIPTION: &str = "Successful response";

/// A response declared for one status code.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseDefinition {
    code: u16,
    description: String,
    schema: Option<Schema>,
    headers: Option<Schema>,
}

impl ResponseDefinition {
    pub fn new(code: u16, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            schema: None,
            headers: None,
        }
    }

    /// Sets the response body schema.
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn body(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    /// The response headers as an object schema, one property per header.
    pub fn headers(&self) -> Option<&Schema> {
        self.headers.as_ref()
    }
}

/// Starts a `GET` operation.
pub fn get(path: impl Into<String>) -> OperationBuilder {
    OperationBuilder::new().route(HttpMethod::Get, path)
}

/// Starts a `POST` operation.
pub fn post(path: impl Into<String>) -> OperationBuilder {
    OperationBuilder::new().route(HttpMethod::Post, path)
}

/// Starts a `PUT` operation.
pub fn put(path: impl Into<String>) -> OperationBuilder {
    OperationBuilder::new().route(HttpMethod::Put, path)
}

/// Starts a `PATCH` operation.
pub fn patch(path: impl Into<String>) -> OperationBuilder {
    OperationBuilder::new().route(HttpMethod::Patch, path)
}

/// Starts a `DELETE` operation.
pub fn delete(path: impl Into<String>) -> OperationBuilder {
    OperationBuilder::new().route(HttpMethod::Delete, path)
}

/// Starts a `HEAD` operation.
pub fn head(path: impl Into<String>) -> OperationBuilder {
    OperationBuilder::new().route(HttpMethod::Head, path)
}

/// Starts an `OPTIONS` operation.
pub fn options(path: impl Into<String>) -> OperationBuilder {
    OperationBuilder::new().route(HttpMethod::Options, path)
}

/// Starts a `TRACE` operation.
pub fn trace(path: impl Into<String>) -> OperationBuilder {
    OperationBuilder::new().route(HttpMethod::Trace, path)
}

/// Fluent builder accumulating the definition of one operation.
#[derive(Debug, Clone)]
pub struct OperationBuilder {
    method: Option<HttpMethod>,
    path: String,
    summary: Option<String>,
    description: Option<String>,
    tags: Vec<String>,
    operation_id: Option<String>,
    deprecated: bool,
    external_docs: Option<ExternalDocs>,
    success_code: u16,
    params: Option<Schema>,
    query: Option<Schema>,
    body: Option<Schema>,
    headers: Option<Schema>,
    legacy_response: Option<Schema>,
    responses: BTreeMap<u16, ResponseDefinition>,
    response_headers: BTreeMap<u16, Schema>,
    security: Option<SecurityRequirements>,
    errors: Vec<BuilderError>,
}

impl Default for OperationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationBuilder {
    /// Creates a builder with no method or path.
    pub fn new() -> Self {
        Self {
            method: None,
            path: String::new(),
            summary: None,
            description: None,
            tags: Vec::new(),
            operation_id: None,
            deprecated: false,
            external_docs: None,
            success_code: 200,
            params: None,
            query: None,
            body: None,
            headers: None,
            legacy_response: None,
            responses: BTreeMap::new(),
            response_headers: BTreeMap::new(),
            security: None,
            errors: Vec::new(),
        }
    }

    fn fail(mut self, error: BuilderError) -> Self {
        self.errors.push(error);
        self
    }

    /// Sets the method and the OpenAPI-style path (with `{name}` placeholders).
    pub fn route(mut self, method: HttpMethod, path: impl Into<String>) -> Self {
        self.method = Some(method);
        self.path = path.into();
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends tags.
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn external_docs(mut self, external_docs: ExternalDocs) -> Self {
        self.external_docs = Some(external_docs);
        self
    }

    /// Sets the status code of the primary success response (default 200).
    pub fn success_code(mut self, code: u16) -> Self {
        self.success_code = code;
        self
    }

    /// Sets the path parameters schema. Must be an object whose properties cover
    /// every placeholder in the path.
    pub fn with_params(mut self, schema: Schema) -> Self {
        self.params = Some(schema);
        self
    }

    /// Sets the query parameters schema (an object).
    pub fn with_query(mut self, schema: Schema) -> Self {
        self.query = Some(schema);
        self
    }

    /// Sets the JSON request body schema.
    ///
    /// The body is required unless the schema is marked optional.
    pub fn with_body(mut self, schema: Schema) -> Self {
        self.body = Some(schema);
        self
    }

    /// Sets the request headers schema (an object).
    pub fn with_headers(mut self, schema: Schema) -> Self {
        self.headers = Some(schema);
        self
    }

    /// Sets the response schema for the success code.
    ///
    /// Registers a response described as "Successful response" when the operation is
    /// compiled. Registering another response for the same code is an error.
    pub fn with_response(mut self, schema: Schema) -> Self {
        self.legacy_response = Some(schema);
        self
    }

    /// Registers a response for any valid status code. Each code can be registered once.
    pub fn with_response_code(
        mut self,
        code: u16,
        schema: impl Into<Option<Schema>>,
        description: impl Into<String>,
    ) -> Self {
        if !(100..=599).contains(&code) {
            return self.fail(BuilderError::InvalidStatusCode(code));
        }
        if self.responses.contains_key(&code) {
            return self.fail(BuilderError::DuplicateResponse(code));
        }
        let response = ResponseDefinition {
            code,
            description: description.into(),
            schema: schema.into(),
            headers: None,
        };
        self.responses.insert(code, response);
        self
    }

    /// Registers a success response; `code` must be in `200..300`.
    pub fn with_success_response(
        self,
        code: u16,
        schema: impl Into<Option<Schema>>,
        description: impl Into<String>,
    ) -> Self {
        if !(200..300).contains(&code) {
            return self.fail(BuilderError::SuccessCodeOutOfRange(code));
        }
        self.with_response_code(code, schema, description)
    }

    /// Registers an error response; `code` must be 400 or above.
    pub fn with_error_response(
        self,
        code: u16,
        schema: impl Into<Option<Schema>>,
        description: impl Into<String>,
    ) -> Self {
        if code < 400 {
            return self.fail(BuilderError::ErrorCodeOutOfRange(code));
        }
        self.with_response_code(code, schema, description)
    }

    /// Declares the headers of the response registered for `code`, one object
    /// property per header.
    pub fn with_response_headers(mut self, code: u16, schema: Schema) -> Self {
        self.response_headers.insert(code, schema);
        self
    }

    pub fn with_ok(self, schema: Schema) -> Self {
        self.with_success_response(200, schema, "OK")
    }

    pub fn with_created(self, schema: Schema) -> Self {
        self.with_success_response(201, schema, "Created")
    }

    pub fn with_accepted(self, schema: Schema) -> Self {
        self.with_success_response(202, schema, "Accepted")
    }

    pub fn with_no_content(self) -> Self {
        self.with_success_response(204, None::<Schema>, "No Content")
    }

    pub fn with_bad_request(self) -> Self {
        self.with_standard_error(400)
    }

    pub fn with_unauthorized(self) -> Self {
        self.with_standard_error(401)
    }

    pub fn with_forbidden(self) -> Self {
        self.with_standard_error(403)
    }

    pub fn with_not_found(self) -> Self {
        self.with_standard_error(404)
    }

    pub fn with_conflict(self) -> Self {
        self.with_standard_error(409)
    }

    pub fn with_unprocessable_entity(self) -> Self {
        self.with_standard_error(422)
    }

    pub fn with_too_many_requests(self) -> Self {
        self.with_standard_error(429)
    }

    pub fn with_internal_server_error(self) -> Self {
        self.with_standard_error(500)
    }

    pub fn with_service_unavailable(self) -> Self {
        self.with_standard_error(503)
    }

    /// Registers 400, 401, 403 and 500.
    pub fn with_common_errors(self) -> Self {
        self.with_standard_errors_by_code([400, 401, 403, 500])
    }

    /// Registers 401 and 403.
    pub fn with_auth_errors(self) -> Self {
        self.with_standard_errors_by_code([401, 403])
    }

    /// Registers 400 and 422.
    pub fn with_validation_errors(self) -> Self {
        self.with_standard_errors_by_code([400, 422])
    }

    /// Registers 400, 401, 403, 404 and 500.
    pub fn with_crud_errors(self) -> Self {
        self.with_standard_errors_by_code([400, 401, 403, 404, 500])
    }

    /// Registers 400, 401, 403, 409, 422 and 500.
    pub fn with_create_errors(self) -> Self {
        self.with_standard_errors_by_code([400, 401, 403, 409, 422, 500])
    }

    /// Registers the standard error response of every code in `codes`.
    pub fn with_standard_errors_by_code(self, codes: impl IntoIterator<Item = u16>) -> Self {
        codes.into_iter().fold(self, Self::with_standard_error)
    }

    /// Codes already registered keep their response, so error bundles can overlap.
    fn with_standard_error(self, code: u16) -> Self {
        if self.responses.contains_key(&code) {
            return self;
        }
        match standard_error(code) {
            Some(error) => self.with_error_response(code, error.schema(), error.description),
            None => self.fail(BuilderError::UnknownStandardError(code)),
        }
    }

    /// Appends security requirements.
    pub fn with_security(mut self, requirements: SecurityRequirements) -> Self {
        let current = self.security.take().unwrap_or_default();
        self.security = Some(current.extend(requirements));
        self
    }

    /// Appends one requirement needing `scheme` with all of `scopes`.
    pub fn require_auth<I, S>(self, scheme: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_security(SecurityRequirements::new().require(scheme, scopes))
    }

    /// Appends one alternative requirement per scheme.
    pub fn require_any_of<I, S>(self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_security(SecurityRequirements::new().any_of(schemes))
    }

    /// Marks the operation public, overriding document-level security.
    pub fn no_auth(mut self) -> Self {
        self.security = Some(SecurityRequirements::public());
        self
    }

    /// Freezes the definition into a [`CompiledOperation`] carrying `handler`.
    pub fn handler<H>(self, handler: H) -> Result<CompiledOperation<H>, BuilderError> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }
        let method = self.method.ok_or(BuilderError::MissingMethod)?;
        let placeholders = path_placeholders(&self.path)?;

        for (slot, schema) in [
            ("params", &self.params),
            ("query", &self.query),
            ("headers", &self.headers),
        ] {
            match schema {
                Some(schema) if !matches!(schema.kind(), SchemaKind::Object(_)) => {
                    return Err(BuilderError::NonObjectSchema {
                        slot,
                        kind: schema.kind().name(),
                    });
                }
                _ => {}
            }
        }

        if let Some(shape) = self.params.as_ref().and_then(Schema::as_object) {
            let missing = placeholders
                .iter()
                .find(|name| shape.property(name).is_none());
            if let Some(missing) = missing {
                return Err(BuilderError::UncoveredPlaceholder {
                    path: self.path.clone(),
                    placeholder: missing.clone(),
                });
            }
        }

        if !(100..=599).contains(&self.success_code) {
            return Err(BuilderError::InvalidSuccessCode(self.success_code));
        }

        let mut responses = self.responses;
        if let Some(schema) = &self.legacy_response {
            if responses.contains_key(&self.success_code) {
                return Err(BuilderError::DuplicateSuccessResponse(self.success_code));
            }
            responses.insert(
                self.success_code,
                ResponseDefinition::new(self.success_code, LEGACY_RESPONSE_DESCRIPTION)
                    .schema(schema.clone()),
            );
        }

        for (code, headers) in self.response_headers {
            if !matches!(headers.kind(), SchemaKind::Object(_)) {
                return Err(BuilderError::NonObjectSchema {
                    slot: "response headers",
                    kind: headers.kind().name(),
                });
            }
            let response = responses
                .get_mut(&code)
                .ok_or(BuilderError::HeadersWithoutResponse(code))?;
            response.headers = Some(headers);
        }

        let schema_error = |location: String, source| BuilderError::Schema {
            method,
            path: self.path.clone(),
            location,
            source,
        };
        let request_schemas = [
            ("params", &self.params),
            ("query", &self.query),
            ("body", &self.body),
            ("headers", &self.headers),
        ];
        for (slot, schema) in request_schemas {
            if let Some(schema) = schema {
                schema
                    .validate()
                    .map_err(|source| schema_error(slot.to_string(), source))?;
            }
        }
        for response in responses.values() {
            for (part, schema) in [("response", &response.schema), ("headers", &response.headers)] {
                if let Some(schema) = schema {
                    schema.validate().map_err(|source| {
                        schema_error(format!("{} {part}", response.code), source)
                    })?;
                }
            }
        }

        Ok(CompiledOperation {
            method,
            path: self.path,
            summary: self.summary,
            description: self.description,
            tags: self.tags,
            operation_id: self.operation_id,
            deprecated: self.deprecated,
            external_docs: self.external_docs,
            success_code: self.success_code,
            params: self.params,
            query: self.query,
            body: self.body,
            headers: self.headers,
            response: self.legacy_response,
            responses,
            security: self.security,
            handler,
        })
    }
}

/// Returns the placeholder names of `path` in order, checking that the path starts
/// with `/` and that placeholders are balanced, not nested, non-empty and unique.
pub fn path_placeholders(path: &str) -> Result<Vec<String>, BuilderError> {
    let malformed = |reason: String| BuilderError::MalformedPath {
        path: path.to_string(),
        reason,
    };
    if path.is_empty() {
        return Err(BuilderError::EmptyPath);
    }
    if !path.starts_with('/') {
        return Err(malformed("path must start with '/'".to_string()));
    }

    let mut names: Vec<String> = Vec::new();
    let mut current: Option<String> = None;
    for ch in path.chars() {
        match ch {
            '{' => {
                if current.is_some() {
                    return Err(malformed("nested '{'".to_string()));
                }
                current = Some(String::new());
            }
            '}' => {
                let Some(name) = current.take() else {
                    return Err(malformed("'}' without matching '{'".to_string()));
                };
                if name.is_empty() {
                    return Err(malformed("empty placeholder '{}'".to_string()));
                }
                if names.contains(&name) {
                    return Err(malformed(format!("duplicate placeholder '{name}'")));
                }
                names.push(name);
            }
            '/' if current.is_some() => return Err(malformed("unclosed '{'".to_string())),
            _ => {
                if let Some(name) = current.as_mut() {
                    name.push(ch);
                }
            }
        }
    }
    if current.is_some() {
        return Err(malformed("unclosed '{'".to_string()));
    }
    Ok(names)
}

/// An immutable, validated operation bound to a runtime handler.
#[derive(Debug, Clone)]
pub struct CompiledOperation<H> {
    method: HttpMethod,
    path: String,
    summary: Option<String>,
    description: Option<String>,
    tags: Vec<String>,
    operation_id: Option<String>,
    deprecated: bool,
    external_docs: Option<ExternalDocs>,
    success_code: u16,
    params: Option<Schema>,
    query: Option<Schema>,
    body: Option<Schema>,
    headers: Option<Schema>,
    response: Option<Schema>,
    responses: BTreeMap<u16, ResponseDefinition>,
    security: Option<SecurityRequirements>,
    handler: H,
}

impl<H> CompiledOperation<H> {
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn operation_id(&self) -> Option<&str> {
        self.operation_id.as_deref()
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    pub fn external_docs(&self) -> Option<&ExternalDocs> {
        self.external_docs.as_ref()
    }

    pub fn success_code(&self) -> u16 {
        self.success_code
    }

    pub fn params(&self) -> Option<&Schema> {
        self.params.as_ref()
    }

    pub fn query(&self) -> Option<&Schema> {
        self.query.as_ref()
    }

    pub fn body(&self) -> Option<&Schema> {
        self.body.as_ref()
    }

    pub fn headers(&self) -> Option<&Schema> {
        self.headers.as_ref()
    }

    /// The schema given to [`OperationBuilder::with_response`], if any.
    pub fn response(&self) -> Option<&Schema> {
        self.response.as_ref()
    }

    /// Responses by ascending status code.
    pub fn responses(&self) -> &BTreeMap<u16, ResponseDefinition> {
        &self.responses
    }

    /// `None` inherits document-level security; an empty list marks the operation public.
    pub fn security(&self) -> Option<&SecurityRequirements> {
        self.security.as_ref()
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Placeholder names of the path, in order.
    pub fn path_parameters(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut rest = self.path.as_str();
        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            names.push(&rest[start + 1..start + len]);
            rest = &rest[start + len + 1..];
        }
        names
    }
}

/// The ordered collection of operations handed to the emitter.
#[derive(Debug, Clone)]
pub struct OperationSet<H> {
    operations: Vec<CompiledOperation<H>>,
}

impl<H> Default for OperationSet<H> {
    fn default() -> Self {
        Self {
            operations: Vec::new(),
        }
    }
}

impl<H> OperationSet<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an operation, keeping registration order.
    pub fn push(&mut self, operation: CompiledOperation<H>) {
        self.operations.push(operation);
    }

    /// Appends an operation and returns the set.
    pub fn with(mut self, operation: CompiledOperation<H>) -> Self {
        self.push(operation);
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompiledOperation<H>> {
        self.operations.iter()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl<H> FromIterator<CompiledOperation<H>> for OperationSet<H> {
    fn from_iter<T: IntoIterator<Item = CompiledOperation<H>>>(iter: T) -> Self {
        Self {
            operations: iter.into_iter().collect(),
        }
    }
}

impl<'a, H> IntoIterator for &'a OperationSet<H> {
    type Item = &'a CompiledOperation<H>;
    type IntoIter = std::slice::Iter<'a, CompiledOperation<H>>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

impl<H> IntoIterator for OperationSet<H> {
    type Item = CompiledOperation<H>;
    type IntoIter = std::vec::IntoIter<CompiledOperation<H>>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}
