//! Components container for reusable definitions.

use super::{
    Example, Header, Link, Parameter, PathItem, RequestBody, Response, Schema, SecurityScheme,
    map::Map, schema::RefOr,
};

/// A callback: runtime expressions mapped to the path item describing the request.
pub type Callback = Map<String, PathItem>;

/// Reusable component definitions.
///
/// Every map is always present in memory; empty maps are left out of the
/// serialized document.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    /// Reusable schema definitions.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub schemas: Map<String, RefOr<Schema>>,

    /// Reusable response definitions.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub responses: Map<String, RefOr<Response>>,

    /// Reusable parameter definitions.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub parameters: Map<String, RefOr<Parameter>>,

    /// Reusable example definitions.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub examples: Map<String, RefOr<Example>>,

    /// Reusable request body definitions.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub request_bodies: Map<String, RefOr<RequestBody>>,

    /// Reusable header definitions.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub headers: Map<String, RefOr<Header>>,

    /// Security scheme definitions.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub security_schemes: Map<String, RefOr<SecurityScheme>>,

    /// Reusable link definitions.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub links: Map<String, RefOr<Link>>,

    /// Reusable callback definitions.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub callbacks: Map<String, RefOr<Callback>>,

    /// Reusable path item definitions.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub path_items: Map<String, RefOr<PathItem>>,
}

impl Components {
    /// Creates a new empty components container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when every component map is empty.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
            && self.responses.is_empty()
            && self.parameters.is_empty()
            && self.examples.is_empty()
            && self.request_bodies.is_empty()
            && self.headers.is_empty()
            && self.security_schemes.is_empty()
            && self.links.is_empty()
            && self.callbacks.is_empty()
            && self.path_items.is_empty()
    }

    /// Adds a schema.
    pub fn schema(mut self, name: impl Into<String>, schema: impl Into<RefOr<Schema>>) -> Self {
        self.schemas.insert(name.into(), schema.into());
        self
    }

    /// Adds a security scheme.
    pub fn security_scheme(mut self, name: impl Into<String>, scheme: SecurityScheme) -> Self {
        self.security_schemes
            .insert(name.into(), RefOr::new_inline(scheme));
        self
    }
}
