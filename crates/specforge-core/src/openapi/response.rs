//! Response, request body and media type entities.

use serde_json::Value;

use super::{Schema, map::Map, schema::RefOr};

/// Describes a single response from an API operation.
///
/// Responses are keyed by HTTP status code strings (e.g., "200", "404").
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Response {
    /// A description of the response.
    pub description: String,

    /// Headers sent with the response.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub headers: Map<String, RefOr<Header>>,

    /// A map of media types to their content description.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub content: Map<String, MediaType>,

    /// Operation links reachable from the response.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub links: Map<String, RefOr<Link>>,
}

impl Response {
    /// Creates a new response with the given description.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            headers: Map::new(),
            content: Map::new(),
            links: Map::new(),
        }
    }

    /// Adds a media type.
    pub fn content(mut self, media_type: impl Into<String>, content: MediaType) -> Self {
        self.content.insert(media_type.into(), content);
        self
    }

    /// Adds a response header.
    pub fn header(mut self, name: impl Into<String>, header: RefOr<Header>) -> Self {
        self.headers.insert(name.into(), header);
        self
    }

    /// Adds a link.
    pub fn link(mut self, name: impl Into<String>, link: RefOr<Link>) -> Self {
        self.links.insert(name.into(), link);
        self
    }
}

/// Describes a single request body.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RequestBody {
    /// A description of the request body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The content of the request body keyed by media type.
    pub content: Map<String, MediaType>,

    /// Whether the request body is required.
    pub required: bool,
}

impl RequestBody {
    /// Creates a new request body.
    pub fn new(required: bool) -> Self {
        Self {
            description: None,
            content: Map::new(),
            required,
        }
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a media type.
    pub fn content(mut self, media_type: impl Into<String>, content: MediaType) -> Self {
        self.content.insert(media_type.into(), content);
        self
    }
}

/// A media type and its schema.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct MediaType {
    /// The schema for this media type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<RefOr<Schema>>,

    /// Example value for this media type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    /// Named examples for this media type.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub examples: Map<String, RefOr<Example>>,
}

impl MediaType {
    /// Creates a new empty media type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the schema for the media type.
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

/// A named example.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Example {
    /// Short description for the example.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Long description for the example.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Embedded literal example.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// A URI that points to the literal example.
    #[serde(rename = "externalValue", skip_serializing_if = "Option::is_none")]
    pub external_value: Option<String>,
}

impl Example {
    /// Creates a new empty example.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the summary.
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the embedded value.
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Sets the external value URI.
    pub fn external_value(mut self, external_value: impl Into<String>) -> Self {
        self.external_value = Some(external_value.into());
        self
    }
}

/// Describes a single response header.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Header {
    /// A description of the header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether the header is mandatory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    /// The schema defining the type used for the header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<RefOr<Schema>>,
}

impl Header {
    /// Creates a new header described by the given schema.
    pub fn new(schema: RefOr<Schema>) -> Self {
        Self {
            description: None,
            required: None,
            schema: Some(schema),
        }
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets whether the header is required.
    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }
}

/// A design-time link from a response to another operation.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Link {
    /// A relative or absolute URI reference to an operation.
    #[serde(rename = "operationRef", skip_serializing_if = "Option::is_none")]
    pub operation_ref: Option<String>,

    /// The name of an existing operation, as defined by its `operationId`.
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,

    /// Values to pass as parameters to the linked operation.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub parameters: Map<String, Value>,

    /// A description of the link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Link {
    /// Creates a link to the operation with the given `operationId`.
    pub fn to_operation(operation_id: impl Into<String>) -> Self {
        Self {
            operation_id: Some(operation_id.into()),
            ..Self::default()
        }
    }

    /// Adds a parameter expression.
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
