//! Parameter entity for path, query, header and cookie inputs.

use serde_json::Value;

use super::{Example, Schema, map::Map, schema::RefOr};

/// Describes a single operation parameter.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Parameter {
    /// The name of the parameter.
    pub name: String,

    /// The location of the parameter.
    #[serde(rename = "in")]
    pub in_: ParameterIn,

    /// A description of the parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether the parameter is mandatory. Always `true` for path parameters.
    pub required: bool,

    /// Whether the parameter is deprecated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    /// The schema defining the type used for the parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<RefOr<Schema>>,

    /// Example of the parameter's potential value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    /// Named examples of the parameter's potential value.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub examples: Map<String, RefOr<Example>>,
}

impl Parameter {
    /// Creates a new parameter with the given name and location.
    ///
    /// Path parameters are always required.
    pub fn new(name: impl Into<String>, in_: ParameterIn) -> Self {
        Self {
            name: name.into(),
            required: in_ == ParameterIn::Path,
            in_,
            description: None,
            deprecated: None,
            schema: None,
            example: None,
            examples: Map::new(),
        }
    }

    /// Creates a new path parameter.
    pub fn path(name: impl Into<String>) -> Self {
        Self::new(name, ParameterIn::Path)
    }

    /// Creates a new query parameter.
    pub fn query(name: impl Into<String>) -> Self {
        Self::new(name, ParameterIn::Query)
    }

    /// Creates a new header parameter.
    pub fn header(name: impl Into<String>) -> Self {
        Self::new(name, ParameterIn::Header)
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets whether the parameter is required. Ignored for path parameters.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required || self.in_ == ParameterIn::Path;
        self
    }

    /// Sets the deprecated flag.
    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = Some(deprecated);
        self
    }

    /// Sets the schema.
    pub fn schema(mut self, schema: RefOr<Schema>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Sets the example value.
    pub fn example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }

    /// Sets the named examples.
    pub fn examples(mut self, examples: Map<String, RefOr<Example>>) -> Self {
        self.examples = examples;
        self
    }
}

/// The location of the parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterIn {
    /// Part of the URL path, e.g. `/users/{id}`.
    Path,
    /// Appended to the URL, e.g. `/users?role=admin`.
    Query,
    /// A custom request header.
    Header,
    /// A cookie value.
    Cookie,
}
