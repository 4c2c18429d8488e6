//! Error types for schema construction, operation building, emission and output.

use std::path::PathBuf;

use specforge_core::HttpMethod;

/// An invalid use of the schema DSL.
///
/// Errors are recorded on the schema node where they happen and surface from
/// [`Schema::validate`](crate::schema::Schema::validate).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("schema is marked both required and optional")]
    ConflictingPresence,

    #[error("`{keyword}` lower bound {min} is greater than upper bound {max}")]
    InvertedBounds {
        keyword: &'static str,
        min: f64,
        max: f64,
    },

    #[error("`{exclusive}` cannot be combined with `{inclusive}`")]
    ExclusiveWithInclusive {
        exclusive: &'static str,
        inclusive: &'static str,
    },

    #[error("unknown format '{0}'")]
    UnknownFormat(String),

    #[error("format '{format}' does not apply to {kind} schemas")]
    FormatMismatch { format: String, kind: &'static str },

    #[error("composition schemas cannot carry an explicit type")]
    TypedComposition,

    #[error("cannot change the type of {from} schema to {to}")]
    InvalidTypeOverride { from: &'static str, to: &'static str },

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("`{keyword}` does not apply to {kind} schemas")]
    NotApplicable {
        keyword: &'static str,
        kind: &'static str,
    },

    #[error("`{keyword}` requires at least one schema")]
    EmptyComposition { keyword: &'static str },

    #[error("`{keyword}` is already set on this composition")]
    DuplicateComposition { keyword: &'static str },

    #[error("`enum` requires at least one value")]
    EmptyEnum,

    #[error("`{keyword}` must be a finite non-negative integer, got {value}")]
    InvalidCount { keyword: &'static str, value: f64 },

    #[error("`{keyword}` must be a finite number, got {value}")]
    NonFiniteBound { keyword: &'static str, value: f64 },

    #[error("`multipleOf` must be greater than zero, got {0}")]
    NonPositiveMultipleOf(f64),

    #[error("at {location}: {source}")]
    Nested {
        location: String,
        #[source]
        source: Box<SchemaError>,
    },
}

impl SchemaError {
    /// Wraps the error with the location of the child schema it came from.
    pub(crate) fn at(self, location: impl Into<String>) -> Self {
        let location = location.into();
        match self {
            SchemaError::Nested {
                location: inner,
                source,
            } => SchemaError::Nested {
                location: format!("{location}.{inner}"),
                source,
            },
            other => SchemaError::Nested {
                location,
                source: Box::new(other),
            },
        }
    }
}

/// An invalid operation definition, reported when the operation is compiled.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuilderError {
    #[error("operation has no HTTP method")]
    MissingMethod,

    #[error("operation path is empty")]
    EmptyPath,

    #[error("invalid path '{path}': {reason}")]
    MalformedPath { path: String, reason: String },

    #[error("path placeholder '{{{placeholder}}}' in '{path}' has no matching params property")]
    UncoveredPlaceholder { path: String, placeholder: String },

    #[error("{slot} schema must be an object schema, got {kind}")]
    NonObjectSchema {
        slot: &'static str,
        kind: &'static str,
    },

    #[error("success code {0} is outside 100..=599")]
    InvalidSuccessCode(u16),

    #[error("status code {0} is not a valid HTTP status code")]
    InvalidStatusCode(u16),

    #[error("success response code {0} is outside 200..300")]
    SuccessCodeOutOfRange(u16),

    #[error("error response code {0} is below 400")]
    ErrorCodeOutOfRange(u16),

    #[error("no standard error definition for status code {0}")]
    UnknownStandardError(u16),

    #[error("a response is already registered for status {0}")]
    DuplicateResponse(u16),

    #[error("legacy response and an explicit response are both registered for status {0}")]
    DuplicateSuccessResponse(u16),

    #[error("response headers are declared for status {0}, which has no response")]
    HeadersWithoutResponse(u16),

    #[error("{location} schema of {method} {path} is invalid: {source}")]
    Schema {
        method: HttpMethod,
        path: String,
        location: String,
        #[source]
        source: SchemaError,
    },
}

/// A document that cannot be emitted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EmitError {
    #[error("invalid license: {0}")]
    InvalidLicense(String),

    #[error("invalid server '{url}': {reason}")]
    InvalidServer { url: String, reason: String },

    #[error("invalid {kind} component key '{key}': keys must match [A-Za-z0-9._-]+")]
    InvalidComponentKey { kind: &'static str, key: String },

    #[error("{kind} component '{key}' is registered twice with different content")]
    DivergentComponent { kind: &'static str, key: String },

    #[error("invalid security scheme '{name}': {reason}")]
    InvalidSecurityScheme { name: String, reason: String },

    #[error("{location} declares both `example` and `examples`")]
    ExampleConflict { location: String },

    #[error("schema component '{name}' is invalid: {source}")]
    InvalidSchemaComponent {
        name: String,
        #[source]
        source: SchemaError,
    },

    #[error("{location} is invalid: {source}")]
    InvalidSchema {
        location: String,
        #[source]
        source: SchemaError,
    },

    #[error("operation {method} {path} is registered twice")]
    DuplicateOperation { method: HttpMethod, path: String },

    #[error("operationId '{0}' is used by more than one operation")]
    DuplicateOperationId(String),
}

/// An unsupported output format name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported output format '{0}' (expected yaml or json)")]
pub struct FormatError(pub String);

/// A failure to serialize or write a document.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("failed to serialize document as JSON")]
    Json(#[from] serde_json::Error),

    #[error("failed to serialize document as YAML")]
    Yaml(#[from] serde_norway::Error),

    #[error("failed to write '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
