//! # specforge-core
//!
//! Core types for specforge: a typed, serde-serializable model of an OpenAPI 3.1 document.
//!
//! The model is deliberately plain data. Building documents from operation definitions
//! lives in the `specforge` crate; merging several documents lives in `specforge-combine`.

pub mod openapi;

// Re-export main types at the crate root for convenience
pub use openapi::{
    ApiKeyLocation, Callback, Components, Contact, Example, ExternalDocs, Header, HttpMethod, Info,
    License, Link, Map, MediaType, OAuthFlow, OAuthFlows, OPENAPI_VERSION, OpenApi, Operation,
    Parameter, ParameterIn, PathItem, Paths, Ref, RefOr, RequestBody, Response, Schema,
    SchemaFormat, SchemaType, SchemaTypes, SecurityRequirement, SecurityScheme, Server,
    ServerVariable, Tag,
};
