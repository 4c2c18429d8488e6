//! OpenAPI 3.1 document types.
//!
//! This module provides the typed model of an OpenAPI 3.1 document. Every type
//! serializes to the field names and shapes defined by the OpenAPI 3.1
//! specification and omits absent optional fields.

pub mod components;
pub mod info;
pub mod map;
pub mod parameter;
pub mod path;
pub mod response;
pub mod schema;
pub mod security;
pub mod server;
pub mod tag;

pub use self::{
    components::{Callback, Components},
    info::{Contact, Info, License},
    map::Map,
    parameter::{Parameter, ParameterIn},
    path::{HttpMethod, Operation, PathItem, Paths},
    response::{Example, Header, Link, MediaType, RequestBody, Response},
    schema::{Ref, RefOr, Schema, SchemaFormat, SchemaType, SchemaTypes, json_number},
    security::{ApiKeyLocation, OAuthFlow, OAuthFlows, SecurityRequirement, SecurityScheme},
    server::{Server, ServerVariable},
    tag::{ExternalDocs, Tag},
};

/// The OpenAPI version written into every document.
pub const OPENAPI_VERSION: &str = "3.1.0";

/// The root object of an OpenAPI 3.1 document.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenApi {
    /// The OpenAPI version (always "3.1.0" for documents built here).
    pub openapi: String,

    /// Metadata about the API.
    pub info: Info,

    /// The default JSON Schema dialect for schemas in this document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_schema_dialect: Option<String>,

    /// Servers providing connectivity information.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,

    /// Available paths and operations, in insertion order.
    #[serde(default)]
    pub paths: Paths,

    /// Incoming webhooks keyed by name.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub webhooks: Map<String, PathItem>,

    /// Reusable component definitions.
    #[serde(default, skip_serializing_if = "Components::is_empty")]
    pub components: Components,

    /// Document-level security requirements (OR).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<SecurityRequirement>,

    /// Tags used by the operations, with additional metadata.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,

    /// External documentation reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
}

impl OpenApi {
    /// Creates a new document with the given info and no paths.
    pub fn new(info: Info) -> Self {
        Self {
            openapi: OPENAPI_VERSION.to_string(),
            info,
            json_schema_dialect: None,
            servers: Vec::new(),
            paths: Paths::new(),
            webhooks: Map::new(),
            components: Components::new(),
            security: Vec::new(),
            tags: Vec::new(),
            external_docs: None,
        }
    }

    /// Adds a server.
    pub fn server(mut self, server: Server) -> Self {
        self.servers.push(server);
        self
    }

    /// Adds a tag.
    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Sets the components.
    pub fn components(mut self, components: Components) -> Self {
        self.components = components;
        self
    }

    /// Sets the external documentation.
    pub fn external_docs(mut self, external_docs: ExternalDocs) -> Self {
        self.external_docs = Some(external_docs);
        self
    }

    /// Counts the operations across all paths.
    pub fn operation_count(&self) -> usize {
        self.paths
            .values()
            .map(|item| item.operations().count())
            .sum()
    }

    /// Serializes the document as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
