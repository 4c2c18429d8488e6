//! Schema object types.
//!
//! OpenAPI 3.1 schemas are JSON Schema 2020-12 documents. [`Schema`] is the serialized
//! form: every keyword is optional and absent keywords are omitted from the output.

use std::str::FromStr;

use serde_json::{Number, Value};

use super::map::Map;

/// A definition or a reference to a component.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    /// A reference to a component.
    Ref(Ref),
    /// An inline definition.
    T(T),
}

impl<T> RefOr<T> {
    /// Creates a new reference to a component.
    pub fn new_ref(ref_path: impl Into<String>) -> Self {
        RefOr::Ref(Ref {
            ref_path: ref_path.into(),
        })
    }

    /// Creates a new inline definition.
    pub fn new_inline(value: T) -> Self {
        RefOr::T(value)
    }

    /// Returns the inline definition, if this is not a reference.
    pub fn as_inline(&self) -> Option<&T> {
        match self {
            RefOr::T(value) => Some(value),
            RefOr::Ref(_) => None,
        }
    }
}

impl<T> From<T> for RefOr<T> {
    fn from(value: T) -> Self {
        RefOr::T(value)
    }
}

/// A reference to a component.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Ref {
    /// The reference path to the component (e.g., "#/components/schemas/Pet").
    #[serde(rename = "$ref")]
    pub ref_path: String,
}

impl Ref {
    /// Creates a reference to `#/components/schemas/{name}`.
    pub fn schema(name: impl AsRef<str>) -> Self {
        Self::component("schemas", name)
    }

    /// Creates a reference to `#/components/{kind}/{name}`.
    pub fn component(kind: &str, name: impl AsRef<str>) -> Self {
        Self {
            ref_path: format!("#/components/{kind}/{}", name.as_ref()),
        }
    }
}

/// A JSON Schema 2020-12 schema object.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// The schema type, or types when the value is nullable.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaTypes>,

    /// Title of the schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// A description of the schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The schema format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<SchemaFormat>,

    /// The single value this schema accepts.
    #[serde(rename = "const", skip_serializing_if = "Option::is_none")]
    pub const_value: Option<Value>,

    /// Possible values for an enumeration.
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    /// Default value for this schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Example value for this schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    /// Properties for object types.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, RefOr<Schema>>,

    /// Required properties for object types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    /// Whether properties not listed in `properties` are allowed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<bool>,

    /// Minimum number of properties for object types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,

    /// Maximum number of properties for object types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,

    /// The schema for array items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<RefOr<Schema>>>,

    /// Minimum number of items in the array.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,

    /// Maximum number of items in the array.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,

    /// Whether array items must be unique.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,

    /// Inclusive minimum for numeric types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,

    /// Inclusive maximum for numeric types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,

    /// Exclusive minimum for numeric types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<Number>,

    /// Exclusive maximum for numeric types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<Number>,

    /// Numeric values must be a multiple of this value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<Number>,

    /// Minimum length for string types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    /// Maximum length for string types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    /// Pattern for string types (ECMA-262 regular expression).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// The value must be valid against exactly one of these schemas.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<RefOr<Schema>>,

    /// The value must be valid against all of these schemas.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<RefOr<Schema>>,

    /// The value must be valid against at least one of these schemas.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<RefOr<Schema>>,

    /// The value must not be valid against this schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<RefOr<Schema>>>,

    /// Whether the schema is deprecated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    /// Whether the value is read-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,

    /// Whether the value is write-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_only: Option<bool>,
}

impl Schema {
    /// Creates a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a single schema type.
    pub fn schema_type(mut self, schema_type: SchemaType) -> Self {
        self.schema_type = Some(SchemaTypes::Single(schema_type));
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the schema format.
    pub fn format(mut self, format: SchemaFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Adds a property.
    pub fn property(mut self, name: impl Into<String>, schema: RefOr<Schema>) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    /// Sets the required properties.
    pub fn required(mut self, required: Vec<String>) -> Self {
        self.required = required;
        self
    }

    /// Sets the items schema.
    pub fn items(mut self, items: RefOr<Schema>) -> Self {
        self.items = Some(Box::new(items));
        self
    }

    /// Returns `true` when any of `oneOf`, `allOf`, `anyOf` or `not` is populated.
    pub fn is_composition(&self) -> bool {
        !self.one_of.is_empty()
            || !self.all_of.is_empty()
            || !self.any_of.is_empty()
            || self.not.is_some()
    }
}

/// The `type` keyword: one type, or several (e.g. `["string", "null"]`).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum SchemaTypes {
    /// A single type.
    Single(SchemaType),
    /// A list of allowed types.
    Multiple(Vec<SchemaType>),
}

impl SchemaTypes {
    /// Returns `true` when `schema_type` is one of the allowed types.
    pub fn contains(&self, schema_type: &SchemaType) -> bool {
        match self {
            SchemaTypes::Single(single) => single == schema_type,
            SchemaTypes::Multiple(many) => many.contains(schema_type),
        }
    }
}

/// Schema type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    /// String type.
    String,
    /// Integer type.
    Integer,
    /// Number type (floating point).
    Number,
    /// Boolean type.
    Boolean,
    /// Array type.
    Array,
    /// Object type.
    Object,
    /// Null type.
    Null,
}

impl SchemaType {
    /// Returns the JSON Schema name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Integer => "integer",
            SchemaType::Number => "number",
            SchemaType::Boolean => "boolean",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
            SchemaType::Null => "null",
        }
    }
}

/// Schema format enumeration for additional type information.
///
/// Covers the JSON Schema 2020-12 format vocabulary plus the formats registered by
/// OpenAPI 3.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaFormat {
    // Integer formats
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,

    // Number formats
    /// Single-precision floating point.
    Float,
    /// Double-precision floating point.
    Double,

    // String formats
    /// Base64 encoded bytes.
    Byte,
    /// Arbitrary binary data.
    Binary,
    /// A hint to obscure the value.
    Password,
    /// Date (YYYY-MM-DD).
    Date,
    /// Date and time (RFC 3339).
    DateTime,
    /// Time (HH:MM:SS).
    Time,
    /// ISO 8601 duration.
    Duration,
    /// Email address.
    Email,
    /// Internationalized email address.
    IdnEmail,
    /// Hostname.
    Hostname,
    /// Internationalized hostname.
    IdnHostname,
    /// IPv4 address.
    Ipv4,
    /// IPv6 address.
    Ipv6,
    /// URI (Uniform Resource Identifier).
    Uri,
    /// URI reference.
    UriReference,
    /// Internationalized URI.
    Iri,
    /// Internationalized URI reference.
    IriReference,
    /// RFC 6570 URI template.
    UriTemplate,
    /// UUID (Universally Unique Identifier).
    Uuid,
    /// JSON pointer.
    JsonPointer,
    /// Relative JSON pointer.
    RelativeJsonPointer,
    /// Regular expression.
    Regex,
}

impl SchemaFormat {
    const ALL: [SchemaFormat; 26] = [
        SchemaFormat::Int32,
        SchemaFormat::Int64,
        SchemaFormat::Float,
        SchemaFormat::Double,
        SchemaFormat::Byte,
        SchemaFormat::Binary,
        SchemaFormat::Password,
        SchemaFormat::Date,
        SchemaFormat::DateTime,
        SchemaFormat::Time,
        SchemaFormat::Duration,
        SchemaFormat::Email,
        SchemaFormat::IdnEmail,
        SchemaFormat::Hostname,
        SchemaFormat::IdnHostname,
        SchemaFormat::Ipv4,
        SchemaFormat::Ipv6,
        SchemaFormat::Uri,
        SchemaFormat::UriReference,
        SchemaFormat::Iri,
        SchemaFormat::IriReference,
        SchemaFormat::UriTemplate,
        SchemaFormat::Uuid,
        SchemaFormat::JsonPointer,
        SchemaFormat::RelativeJsonPointer,
        SchemaFormat::Regex,
    ];

    /// Returns the format tag as written in a document.
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaFormat::Int32 => "int32",
            SchemaFormat::Int64 => "int64",
            SchemaFormat::Float => "float",
            SchemaFormat::Double => "double",
            SchemaFormat::Byte => "byte",
            SchemaFormat::Binary => "binary",
            SchemaFormat::Password => "password",
            SchemaFormat::Date => "date",
            SchemaFormat::DateTime => "date-time",
            SchemaFormat::Time => "time",
            SchemaFormat::Duration => "duration",
            SchemaFormat::Email => "email",
            SchemaFormat::IdnEmail => "idn-email",
            SchemaFormat::Hostname => "hostname",
            SchemaFormat::IdnHostname => "idn-hostname",
            SchemaFormat::Ipv4 => "ipv4",
            SchemaFormat::Ipv6 => "ipv6",
            SchemaFormat::Uri => "uri",
            SchemaFormat::UriReference => "uri-reference",
            SchemaFormat::Iri => "iri",
            SchemaFormat::IriReference => "iri-reference",
            SchemaFormat::UriTemplate => "uri-template",
            SchemaFormat::Uuid => "uuid",
            SchemaFormat::JsonPointer => "json-pointer",
            SchemaFormat::RelativeJsonPointer => "relative-json-pointer",
            SchemaFormat::Regex => "regex",
        }
    }

    /// Returns `true` when the format describes a value of the given type.
    pub fn applies_to(&self, schema_type: SchemaType) -> bool {
        match self {
            SchemaFormat::Int32 | SchemaFormat::Int64 => {
                matches!(schema_type, SchemaType::Integer | SchemaType::Number)
            }
            SchemaFormat::Float | SchemaFormat::Double => schema_type == SchemaType::Number,
            _ => schema_type == SchemaType::String,
        }
    }
}

impl FromStr for SchemaFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|format| format.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown format '{s}'"))
    }
}

impl std::fmt::Display for SchemaFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converts a bound to a JSON number, keeping integral values integral.
///
/// Returns `None` for NaN and infinities, which JSON cannot represent.
pub fn json_number(value: f64) -> Option<Number> {
    if value.fract() == 0.0 && value.abs() < 9.007_199_254_740_992e15 {
        Some(Number::from(value as i64))
    } else {
        Number::from_f64(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_schema_format_with_known_tag_returns_variant() {
        //* When
        let format = "date-time".parse::<SchemaFormat>();

        //* Then
        assert_eq!(format, Ok(SchemaFormat::DateTime));
    }

    #[test]
    fn parse_schema_format_with_unknown_tag_fails() {
        //* When
        let format = "colour".parse::<SchemaFormat>();

        //* Then
        assert!(format.is_err(), "unknown format tag should be rejected");
    }

    #[test]
    fn serialize_schema_format_matches_as_str_for_every_variant() {
        for format in SchemaFormat::ALL {
            //* When
            let value = serde_json::to_value(format).expect("should serialize format");

            //* Then
            assert_eq!(value, Value::String(format.as_str().to_string()));
        }
    }

    #[test]
    fn json_number_with_integral_value_serializes_without_fraction() {
        //* When
        let number = json_number(3.0).expect("finite value");

        //* Then
        assert_eq!(number.to_string(), "3");
    }

    #[test]
    fn json_number_with_nan_returns_none() {
        //* When
        let number = json_number(f64::NAN);

        //* Then
        assert!(number.is_none());
    }

    #[test]
    fn serialize_empty_schema_omits_all_keywords() {
        //* When
        let value = serde_json::to_value(Schema::new()).expect("should serialize schema");

        //* Then
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn serialize_nullable_string_emits_type_list() {
        //* Given
        let schema = Schema {
            schema_type: Some(SchemaTypes::Multiple(vec![
                SchemaType::String,
                SchemaType::Null,
            ])),
            ..Schema::default()
        };

        //* When
        let value = serde_json::to_value(schema).expect("should serialize schema");

        //* Then
        assert_eq!(value, serde_json::json!({"type": ["string", "null"]}));
    }
}
