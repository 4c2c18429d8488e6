//! Fluent schema DSL.
//!
//! Schemas are built from the constructor functions of this module and refined with
//! consuming, chainable methods:
//!
//! ```
//! use specforge::schema::{integer, object, string};
//!
//! let user = object([
//!     ("id", string().uuid().required()),
//!     ("name", string().min(1).max(64).required()),
//!     ("age", integer().min(0).optional()),
//! ]);
//! assert!(user.validate().is_ok());
//! ```
//!
//! Refinements never fail at the call site. An invalid refinement (for example a
//! `min` greater than the `max`, or a pattern that does not compile) is recorded on the
//! node and reported by [`Schema::validate`], which the operation builder and the
//! emitter run before using a schema.

use regex::Regex;
use serde_json::Value;
use specforge_core::{
    Example, Map, Ref, RefOr, Schema as SchemaObject, SchemaFormat, SchemaType, SchemaTypes,
    openapi::schema::json_number,
};

use crate::error::SchemaError;

/// Whether a schema must be present in its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presence {
    /// Neither `required` nor `optional` was called.
    #[default]
    Unspecified,
    /// The value must be present.
    Required,
    /// The value may be absent.
    Optional,
}

/// The type of a primitive (non-container) schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    String,
    Number,
    Integer,
    Boolean,
    Null,
}

impl PrimitiveType {
    fn schema_type(self) -> SchemaType {
        match self {
            PrimitiveType::String => SchemaType::String,
            PrimitiveType::Number => SchemaType::Number,
            PrimitiveType::Integer => SchemaType::Integer,
            PrimitiveType::Boolean => SchemaType::Boolean,
            PrimitiveType::Null => SchemaType::Null,
        }
    }

    fn from_schema_type(schema_type: SchemaType) -> Option<Self> {
        match schema_type {
            SchemaType::String => Some(PrimitiveType::String),
            SchemaType::Number => Some(PrimitiveType::Number),
            SchemaType::Integer => Some(PrimitiveType::Integer),
            SchemaType::Boolean => Some(PrimitiveType::Boolean),
            SchemaType::Null => Some(PrimitiveType::Null),
            SchemaType::Array | SchemaType::Object => None,
        }
    }

    fn is_numeric(self) -> bool {
        matches!(self, PrimitiveType::Number | PrimitiveType::Integer)
    }
}

/// The shape of a schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    Primitive(PrimitiveType),
    Array(Box<Schema>),
    Object(ObjectShape),
    Composition(Composition),
    /// A reference to `#/components/schemas/<name>`.
    Ref(String),
}

impl SchemaKind {
    /// A short name for the kind, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            SchemaKind::Primitive(primitive) => primitive.schema_type().as_str(),
            SchemaKind::Array(_) => "array",
            SchemaKind::Object(_) => "object",
            SchemaKind::Composition(_) => "composition",
            SchemaKind::Ref(_) => "reference",
        }
    }
}

/// The ordered properties of an object schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectShape {
    properties: Map<String, Schema>,
}

impl ObjectShape {
    /// Iterates over the properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.properties
            .iter()
            .map(|(name, schema)| (name.as_str(), schema))
    }

    /// Returns the property with the given name.
    pub fn property(&self, name: &str) -> Option<&Schema> {
        self.properties.get(name)
    }

    /// Names of the properties marked [`Presence::Required`], in declaration order.
    pub fn required(&self) -> Vec<&str> {
        self.properties()
            .filter(|(_, schema)| schema.presence == Presence::Required)
            .map(|(name, _)| name)
            .collect()
    }

    /// Returns `true` when the object declares no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// The composition slots of a composition node. At least one slot is populated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Composition {
    one_of: Option<Vec<Schema>>,
    all_of: Option<Vec<Schema>>,
    any_of: Option<Vec<Schema>>,
    not: Option<Box<Schema>>,
}

impl Composition {
    pub fn one_of(&self) -> Option<&[Schema]> {
        self.one_of.as_deref()
    }

    pub fn all_of(&self) -> Option<&[Schema]> {
        self.all_of.as_deref()
    }

    pub fn any_of(&self) -> Option<&[Schema]> {
        self.any_of.as_deref()
    }

    pub fn not(&self) -> Option<&Schema> {
        self.not.as_deref()
    }

    /// The populated slots with their keyword, in `oneOf`, `allOf`, `anyOf`, `not` order.
    fn slots(&self) -> Vec<(&'static str, Vec<&Schema>)> {
        let mut slots = Vec::new();
        if let Some(items) = &self.one_of {
            slots.push(("oneOf", items.iter().collect()));
        }
        if let Some(items) = &self.all_of {
            slots.push(("allOf", items.iter().collect()));
        }
        if let Some(items) = &self.any_of {
            slots.push(("anyOf", items.iter().collect()));
        }
        if let Some(child) = &self.not {
            slots.push(("not", vec![child.as_ref()]));
        }
        slots
    }

    fn is_populated(&self, keyword: &str) -> bool {
        match keyword {
            "oneOf" => self.one_of.is_some(),
            "allOf" => self.all_of.is_some(),
            "anyOf" => self.any_of.is_some(),
            _ => self.not.is_some(),
        }
    }
}

enum Slot {
    List(&'static str, Vec<Schema>),
    Not(Schema),
}

impl Slot {
    fn keyword(&self) -> &'static str {
        match self {
            Slot::List(keyword, _) => keyword,
            Slot::Not(_) => "not",
        }
    }
}

/// Validation keywords that only apply to some kinds of schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Constraints {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub format: Option<SchemaFormat>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub multiple_of: Option<f64>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,
    pub additional_properties: Option<bool>,
}

/// A node of the schema DSL.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    kind: SchemaKind,
    presence: Presence,
    title: Option<String>,
    description: Option<String>,
    constraints: Constraints,
    const_value: Option<Value>,
    enum_values: Option<Vec<Value>>,
    default: Option<Value>,
    example: Option<Value>,
    examples: Map<String, Example>,
    nullable: bool,
    deprecated: bool,
    read_only: bool,
    write_only: bool,
    errors: Vec<SchemaError>,
}

/// A string schema.
pub fn string() -> Schema {
    Schema::new(SchemaKind::Primitive(PrimitiveType::String))
}

/// A number schema.
pub fn number() -> Schema {
    Schema::new(SchemaKind::Primitive(PrimitiveType::Number))
}

/// An integer schema.
pub fn integer() -> Schema {
    Schema::new(SchemaKind::Primitive(PrimitiveType::Integer))
}

/// A boolean schema.
pub fn boolean() -> Schema {
    Schema::new(SchemaKind::Primitive(PrimitiveType::Boolean))
}

/// A schema accepting only `null`.
pub fn null() -> Schema {
    Schema::new(SchemaKind::Primitive(PrimitiveType::Null))
}

/// An array schema whose items match `item`.
pub fn array(item: Schema) -> Schema {
    Schema::new(SchemaKind::Array(Box::new(item)))
}

/// An object schema with the given properties, in order.
///
/// A property's presence decides whether it is listed in the object's `required` set.
pub fn object<I, K>(properties: I) -> Schema
where
    I: IntoIterator<Item = (K, Schema)>,
    K: Into<String>,
{
    let properties = properties
        .into_iter()
        .map(|(name, schema)| (name.into(), schema))
        .collect();
    Schema::new(SchemaKind::Object(ObjectShape { properties }))
}

/// An object schema without properties.
pub fn empty_object() -> Schema {
    Schema::new(SchemaKind::Object(ObjectShape::default()))
}

/// A value valid against exactly one of `schemas`.
pub fn one_of(schemas: impl IntoIterator<Item = Schema>) -> Schema {
    composition(Slot::List("oneOf", schemas.into_iter().collect()))
}

/// A value valid against all of `schemas`.
pub fn all_of(schemas: impl IntoIterator<Item = Schema>) -> Schema {
    composition(Slot::List("allOf", schemas.into_iter().collect()))
}

/// A value valid against at least one of `schemas`.
pub fn any_of(schemas: impl IntoIterator<Item = Schema>) -> Schema {
    composition(Slot::List("anyOf", schemas.into_iter().collect()))
}

/// A value not valid against `schema`.
pub fn not(schema: Schema) -> Schema {
    composition(Slot::Not(schema))
}

/// A reference to the schema component `name`.
pub fn reference(name: impl Into<String>) -> Schema {
    Schema::new(SchemaKind::Ref(name.into()))
}

fn composition(slot: Slot) -> Schema {
    Schema::new(SchemaKind::Composition(Composition::default())).with_slot(slot)
}

impl Schema {
    fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            presence: Presence::Unspecified,
            title: None,
            description: None,
            constraints: Constraints::default(),
            const_value: None,
            enum_values: None,
            default: None,
            example: None,
            examples: Map::new(),
            nullable: false,
            deprecated: false,
            read_only: false,
            write_only: false,
            errors: Vec::new(),
        }
    }

    fn fail(mut self, error: SchemaError) -> Self {
        self.errors.push(error);
        self
    }

    fn not_applicable(self, keyword: &'static str) -> Self {
        let kind = self.kind.name();
        self.fail(SchemaError::NotApplicable { keyword, kind })
    }

    fn primitive(&self) -> Option<PrimitiveType> {
        match self.kind {
            SchemaKind::Primitive(primitive) => Some(primitive),
            _ => None,
        }
    }

    /// The shape of this node.
    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    /// The presence marker set with [`required`](Self::required) or
    /// [`optional`](Self::optional).
    pub fn presence(&self) -> Presence {
        self.presence
    }

    /// The object shape, if this is an object schema.
    pub fn as_object(&self) -> Option<&ObjectShape> {
        match &self.kind {
            SchemaKind::Object(shape) => Some(shape),
            _ => None,
        }
    }

    /// The description, if any.
    pub fn get_description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The single example value, if any.
    pub fn get_example(&self) -> Option<&Value> {
        self.example.as_ref()
    }

    /// The named examples, in insertion order.
    pub fn get_examples(&self) -> &Map<String, Example> {
        &self.examples
    }

    /// The validation keywords set on this node.
    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Marks the value as required.
    pub fn required(mut self) -> Self {
        if self.presence == Presence::Optional {
            return self.fail(SchemaError::ConflictingPresence);
        }
        self.presence = Presence::Required;
        self
    }

    /// Marks the value as optional.
    pub fn optional(mut self) -> Self {
        if self.presence == Presence::Required {
            return self.fail(SchemaError::ConflictingPresence);
        }
        self.presence = Presence::Optional;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets a single example value.
    pub fn example(mut self, value: impl Into<Value>) -> Self {
        self.example = Some(value.into());
        self
    }

    /// Adds named examples, keeping their insertion order.
    ///
    /// `example` and `examples` are mutually exclusive; the emitter rejects a schema
    /// carrying both.
    pub fn examples<I, K>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = (K, Example)>,
        K: Into<String>,
    {
        self.examples
            .extend(examples.into_iter().map(|(name, ex)| (name.into(), ex)));
        self
    }

    /// Restricts the value to exactly `value`.
    pub fn constant(mut self, value: impl Into<Value>) -> Self {
        self.const_value = Some(value.into());
        self
    }

    /// Restricts the value to one of `values`.
    pub fn enum_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return self.fail(SchemaError::EmptyEnum);
        }
        self.enum_values = Some(values);
        self
    }

    /// Allows `null` in addition to the declared type.
    pub fn nullable(mut self) -> Self {
        if matches!(self.kind, SchemaKind::Composition(_) | SchemaKind::Ref(_)) {
            return self.not_applicable("nullable");
        }
        self.nullable = true;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }

    /// Adds a `oneOf` slot to a composition node.
    pub fn with_one_of(self, schemas: impl IntoIterator<Item = Schema>) -> Self {
        self.with_slot(Slot::List("oneOf", schemas.into_iter().collect()))
    }

    /// Adds an `allOf` slot to a composition node.
    pub fn with_all_of(self, schemas: impl IntoIterator<Item = Schema>) -> Self {
        self.with_slot(Slot::List("allOf", schemas.into_iter().collect()))
    }

    /// Adds an `anyOf` slot to a composition node.
    pub fn with_any_of(self, schemas: impl IntoIterator<Item = Schema>) -> Self {
        self.with_slot(Slot::List("anyOf", schemas.into_iter().collect()))
    }

    /// Adds a `not` slot to a composition node.
    pub fn with_not(self, schema: Schema) -> Self {
        self.with_slot(Slot::Not(schema))
    }

    fn with_slot(mut self, slot: Slot) -> Self {
        let keyword = slot.keyword();
        let SchemaKind::Composition(composition) = &mut self.kind else {
            return self.not_applicable(keyword);
        };
        if composition.is_populated(keyword) {
            return self.fail(SchemaError::DuplicateComposition { keyword });
        }
        match slot {
            Slot::List(_, items) if items.is_empty() => {
                return self.fail(SchemaError::EmptyComposition { keyword });
            }
            Slot::List("oneOf", items) => composition.one_of = Some(items),
            Slot::List("allOf", items) => composition.all_of = Some(items),
            Slot::List(_, items) => composition.any_of = Some(items),
            Slot::Not(child) => composition.not = Some(Box::new(child)),
        }
        self
    }

    /// Overrides the primitive type of this node.
    ///
    /// Composition nodes never carry a type, and container or reference nodes cannot
    /// change theirs.
    pub fn with_type(mut self, schema_type: SchemaType) -> Self {
        if matches!(self.kind, SchemaKind::Composition(_)) {
            return self.fail(SchemaError::TypedComposition);
        }
        let keeps_kind = matches!(
            (&self.kind, schema_type),
            (SchemaKind::Array(_), SchemaType::Array) | (SchemaKind::Object(_), SchemaType::Object)
        );
        match PrimitiveType::from_schema_type(schema_type) {
            Some(primitive) if self.primitive().is_some() => {
                self.kind = SchemaKind::Primitive(primitive);
                self
            }
            _ if keeps_kind => self,
            _ => {
                let from = self.kind.name();
                self.fail(SchemaError::InvalidTypeOverride {
                    from,
                    to: schema_type.as_str(),
                })
            }
        }
    }

    /// Sets the lower bound.
    ///
    /// The bound is a length for strings, a value for numbers and integers, an item
    /// count for arrays and a property count for objects.
    pub fn min(self, bound: impl Into<f64>) -> Self {
        let bound = bound.into();
        match self.kind {
            SchemaKind::Primitive(PrimitiveType::String) => self.min_length(bound),
            SchemaKind::Primitive(primitive) if primitive.is_numeric() => self.minimum(bound),
            SchemaKind::Array(_) => self.min_items(bound),
            SchemaKind::Object(_) => self.min_properties(bound),
            _ => self.not_applicable("min"),
        }
    }

    /// Sets the upper bound. See [`min`](Self::min) for what the bound applies to.
    pub fn max(self, bound: impl Into<f64>) -> Self {
        let bound = bound.into();
        match self.kind {
            SchemaKind::Primitive(PrimitiveType::String) => self.max_length(bound),
            SchemaKind::Primitive(primitive) if primitive.is_numeric() => self.maximum(bound),
            SchemaKind::Array(_) => self.max_items(bound),
            SchemaKind::Object(_) => self.max_properties(bound),
            _ => self.not_applicable("max"),
        }
    }

    fn min_length(mut self, bound: f64) -> Self {
        match count("minLength", bound) {
            Ok(n) => {
                self.constraints.min_length = Some(n);
                self.check_counts()
            }
            Err(err) => self.fail(err),
        }
    }

    fn max_length(mut self, bound: f64) -> Self {
        match count("maxLength", bound) {
            Ok(n) => {
                self.constraints.max_length = Some(n);
                self.check_counts()
            }
            Err(err) => self.fail(err),
        }
    }

    fn minimum(mut self, bound: f64) -> Self {
        if !bound.is_finite() {
            return self.fail(SchemaError::NonFiniteBound {
                keyword: "minimum",
                value: bound,
            });
        }
        if self.constraints.exclusive_minimum.is_some() {
            return self.fail(SchemaError::ExclusiveWithInclusive {
                exclusive: "exclusiveMinimum",
                inclusive: "minimum",
            });
        }
        self.constraints.minimum = Some(bound);
        self.check_value_bounds()
    }

    fn maximum(mut self, bound: f64) -> Self {
        if !bound.is_finite() {
            return self.fail(SchemaError::NonFiniteBound {
                keyword: "maximum",
                value: bound,
            });
        }
        if self.constraints.exclusive_maximum.is_some() {
            return self.fail(SchemaError::ExclusiveWithInclusive {
                exclusive: "exclusiveMaximum",
                inclusive: "maximum",
            });
        }
        self.constraints.maximum = Some(bound);
        self.check_value_bounds()
    }

    /// Sets an exclusive lower bound (numbers and integers only).
    pub fn exclusive_min(mut self, bound: impl Into<f64>) -> Self {
        let bound = bound.into();
        if !self.primitive().is_some_and(PrimitiveType::is_numeric) {
            return self.not_applicable("exclusiveMinimum");
        }
        if !bound.is_finite() {
            return self.fail(SchemaError::NonFiniteBound {
                keyword: "exclusiveMinimum",
                value: bound,
            });
        }
        if self.constraints.minimum.is_some() {
            return self.fail(SchemaError::ExclusiveWithInclusive {
                exclusive: "exclusiveMinimum",
                inclusive: "minimum",
            });
        }
        self.constraints.exclusive_minimum = Some(bound);
        self.check_value_bounds()
    }

    /// Sets an exclusive upper bound (numbers and integers only).
    pub fn exclusive_max(mut self, bound: impl Into<f64>) -> Self {
        let bound = bound.into();
        if !self.primitive().is_some_and(PrimitiveType::is_numeric) {
            return self.not_applicable("exclusiveMaximum");
        }
        if !bound.is_finite() {
            return self.fail(SchemaError::NonFiniteBound {
                keyword: "exclusiveMaximum",
                value: bound,
            });
        }
        if self.constraints.maximum.is_some() {
            return self.fail(SchemaError::ExclusiveWithInclusive {
                exclusive: "exclusiveMaximum",
                inclusive: "maximum",
            });
        }
        self.constraints.exclusive_maximum = Some(bound);
        self.check_value_bounds()
    }

    /// Requires the value to be a multiple of `factor` (numbers and integers only).
    pub fn multiple_of(mut self, factor: impl Into<f64>) -> Self {
        let factor = factor.into();
        if !self.primitive().is_some_and(PrimitiveType::is_numeric) {
            return self.not_applicable("multipleOf");
        }
        if !factor.is_finite() || factor <= 0.0 {
            return self.fail(SchemaError::NonPositiveMultipleOf(factor));
        }
        self.constraints.multiple_of = Some(factor);
        self
    }

    /// Requires strings to match the regular expression `pattern`.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        if self.primitive() != Some(PrimitiveType::String) {
            return self.not_applicable("pattern");
        }
        if let Err(err) = Regex::new(&pattern) {
            return self.fail(SchemaError::InvalidPattern {
                pattern,
                reason: err.to_string(),
            });
        }
        self.constraints.pattern = Some(pattern);
        self
    }

    /// Sets the format by its tag (e.g. `"date-time"`).
    pub fn format(self, format: &str) -> Self {
        match format.parse::<SchemaFormat>() {
            Ok(format) => self.with_format(format),
            Err(_) => self.fail(SchemaError::UnknownFormat(format.to_string())),
        }
    }

    /// Sets the format. The format must apply to the node's type.
    pub fn with_format(mut self, format: SchemaFormat) -> Self {
        match self.primitive() {
            Some(primitive) if format.applies_to(primitive.schema_type()) => {
                self.constraints.format = Some(format);
                self
            }
            _ => {
                let kind = self.kind.name();
                self.fail(SchemaError::FormatMismatch {
                    format: format.as_str().to_string(),
                    kind,
                })
            }
        }
    }

    /// Sets the type and the format together, as the format shortcuts do.
    fn typed_format(mut self, primitive: PrimitiveType, format: SchemaFormat) -> Self {
        if self.primitive().is_none() {
            let kind = self.kind.name();
            return self.fail(SchemaError::FormatMismatch {
                format: format.as_str().to_string(),
                kind,
            });
        }
        self.kind = SchemaKind::Primitive(primitive);
        self.constraints.format = Some(format);
        self
    }

    /// A string in `email` format. No pattern is added.
    pub fn email(self) -> Self {
        self.typed_format(PrimitiveType::String, SchemaFormat::Email)
    }

    pub fn uuid(self) -> Self {
        self.typed_format(PrimitiveType::String, SchemaFormat::Uuid)
    }

    pub fn uri(self) -> Self {
        self.typed_format(PrimitiveType::String, SchemaFormat::Uri)
    }

    pub fn date(self) -> Self {
        self.typed_format(PrimitiveType::String, SchemaFormat::Date)
    }

    pub fn date_time(self) -> Self {
        self.typed_format(PrimitiveType::String, SchemaFormat::DateTime)
    }

    pub fn hostname(self) -> Self {
        self.typed_format(PrimitiveType::String, SchemaFormat::Hostname)
    }

    pub fn ipv4(self) -> Self {
        self.typed_format(PrimitiveType::String, SchemaFormat::Ipv4)
    }

    pub fn ipv6(self) -> Self {
        self.typed_format(PrimitiveType::String, SchemaFormat::Ipv6)
    }

    pub fn password(self) -> Self {
        self.typed_format(PrimitiveType::String, SchemaFormat::Password)
    }

    pub fn binary(self) -> Self {
        self.typed_format(PrimitiveType::String, SchemaFormat::Binary)
    }

    pub fn byte(self) -> Self {
        self.typed_format(PrimitiveType::String, SchemaFormat::Byte)
    }

    pub fn int32(self) -> Self {
        self.typed_format(PrimitiveType::Integer, SchemaFormat::Int32)
    }

    pub fn int64(self) -> Self {
        self.typed_format(PrimitiveType::Integer, SchemaFormat::Int64)
    }

    pub fn float(self) -> Self {
        self.typed_format(PrimitiveType::Number, SchemaFormat::Float)
    }

    pub fn double(self) -> Self {
        self.typed_format(PrimitiveType::Number, SchemaFormat::Double)
    }

    pub fn min_items(mut self, bound: impl Into<f64>) -> Self {
        if !matches!(self.kind, SchemaKind::Array(_)) {
            return self.not_applicable("minItems");
        }
        match count("minItems", bound.into()) {
            Ok(n) => {
                self.constraints.min_items = Some(n);
                self.check_counts()
            }
            Err(err) => self.fail(err),
        }
    }

    pub fn max_items(mut self, bound: impl Into<f64>) -> Self {
        if !matches!(self.kind, SchemaKind::Array(_)) {
            return self.not_applicable("maxItems");
        }
        match count("maxItems", bound.into()) {
            Ok(n) => {
                self.constraints.max_items = Some(n);
                self.check_counts()
            }
            Err(err) => self.fail(err),
        }
    }

    /// Requires array items to be unique.
    pub fn unique_items(mut self) -> Self {
        if !matches!(self.kind, SchemaKind::Array(_)) {
            return self.not_applicable("uniqueItems");
        }
        self.constraints.unique_items = true;
        self
    }

    pub fn min_properties(mut self, bound: impl Into<f64>) -> Self {
        if !matches!(self.kind, SchemaKind::Object(_)) {
            return self.not_applicable("minProperties");
        }
        match count("minProperties", bound.into()) {
            Ok(n) => {
                self.constraints.min_properties = Some(n);
                self.check_counts()
            }
            Err(err) => self.fail(err),
        }
    }

    pub fn max_properties(mut self, bound: impl Into<f64>) -> Self {
        if !matches!(self.kind, SchemaKind::Object(_)) {
            return self.not_applicable("maxProperties");
        }
        match count("maxProperties", bound.into()) {
            Ok(n) => {
                self.constraints.max_properties = Some(n);
                self.check_counts()
            }
            Err(err) => self.fail(err),
        }
    }

    /// Appends a property to an object schema, replacing one with the same name.
    pub fn property(mut self, name: impl Into<String>, schema: Schema) -> Self {
        if let SchemaKind::Object(shape) = &mut self.kind {
            shape.properties.insert(name.into(), schema);
            return self;
        }
        self.not_applicable("properties")
    }

    /// Allows or forbids properties not declared on an object schema.
    pub fn additional_properties(mut self, allowed: bool) -> Self {
        if !matches!(self.kind, SchemaKind::Object(_)) {
            return self.not_applicable("additionalProperties");
        }
        self.constraints.additional_properties = Some(allowed);
        self
    }

    fn check_counts(self) -> Self {
        let c = &self.constraints;
        let pairs = [
            ("length", c.min_length, c.max_length),
            ("items", c.min_items, c.max_items),
            ("properties", c.min_properties, c.max_properties),
        ];
        let inverted = pairs.into_iter().find_map(|(keyword, min, max)| match (min, max) {
            (Some(min), Some(max)) if min > max => Some((keyword, min as f64, max as f64)),
            _ => None,
        });
        match inverted {
            Some((keyword, min, max)) => self.fail(SchemaError::InvertedBounds { keyword, min, max }),
            None => self,
        }
    }

    fn check_value_bounds(self) -> Self {
        let c = &self.constraints;
        let lower = c.minimum.or(c.exclusive_minimum);
        let upper = c.maximum.or(c.exclusive_maximum);
        match (lower, upper) {
            (Some(min), Some(max)) if min > max => {
                self.fail(SchemaError::InvertedBounds {
                    keyword: "value",
                    min,
                    max,
                })
            }
            _ => self,
        }
    }

    /// Reports the first construction error recorded on this node or any descendant.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if let Some(err) = self.errors.first() {
            return Err(err.clone());
        }
        match &self.kind {
            SchemaKind::Array(item) => item.validate().map_err(|err| err.at("items")),
            SchemaKind::Object(shape) => shape.properties().try_for_each(|(name, schema)| {
                schema
                    .validate()
                    .map_err(|err| err.at(format!("properties.{name}")))
            }),
            SchemaKind::Composition(composition) => {
                composition
                    .slots()
                    .into_iter()
                    .try_for_each(|(keyword, children)| {
                        children.into_iter().enumerate().try_for_each(|(index, child)| {
                            child
                                .validate()
                                .map_err(|err| err.at(format!("{keyword}[{index}]")))
                        })
                    })
            }
            SchemaKind::Primitive(_) | SchemaKind::Ref(_) => Ok(()),
        }
    }

    /// Finds a node in this tree that sets both `example` and `examples`, returning its
    /// location relative to this node (empty for the node itself).
    pub fn find_example_conflict(&self) -> Option<String> {
        if self.example.is_some() && !self.examples.is_empty() {
            return Some(String::new());
        }
        let nested = |location: String, child: &Schema| {
            child.find_example_conflict().map(|inner| {
                if inner.is_empty() {
                    location
                } else {
                    format!("{location}.{inner}")
                }
            })
        };
        match &self.kind {
            SchemaKind::Array(item) => nested("items".to_string(), item),
            SchemaKind::Object(shape) => shape
                .properties()
                .find_map(|(name, schema)| nested(format!("properties.{name}"), schema)),
            SchemaKind::Composition(composition) => {
                composition
                    .slots()
                    .into_iter()
                    .find_map(|(keyword, children)| {
                        children.into_iter().enumerate().find_map(|(index, child)| {
                            nested(format!("{keyword}[{index}]"), child)
                        })
                    })
            }
            SchemaKind::Primitive(_) | SchemaKind::Ref(_) => None,
        }
    }

    fn type_tag(&self, schema_type: SchemaType) -> SchemaTypes {
        if self.nullable {
            SchemaTypes::Multiple(vec![schema_type, SchemaType::Null])
        } else {
            SchemaTypes::Single(schema_type)
        }
    }

    /// Converts the tree into its OpenAPI schema object.
    ///
    /// Absent keywords are left out; composition nodes carry no `type`. Named examples
    /// are not part of the schema object: the emitter places them on media types.
    pub fn to_openapi(&self) -> RefOr<SchemaObject> {
        let mut out = SchemaObject::new();
        match &self.kind {
            SchemaKind::Ref(name) => return RefOr::Ref(Ref::schema(name)),
            SchemaKind::Primitive(primitive) => {
                out.schema_type = Some(self.type_tag(primitive.schema_type()));
            }
            SchemaKind::Array(item) => {
                out.schema_type = Some(self.type_tag(SchemaType::Array));
                out.items = Some(Box::new(item.to_openapi()));
            }
            SchemaKind::Object(shape) => {
                out.schema_type = Some(self.type_tag(SchemaType::Object));
                out.properties = shape
                    .properties()
                    .map(|(name, schema)| (name.to_string(), schema.to_openapi()))
                    .collect();
                out.required = shape.required().into_iter().map(String::from).collect();
            }
            SchemaKind::Composition(composition) => {
                let children = |items: &[Schema]| -> Vec<RefOr<SchemaObject>> {
                    items.iter().map(Schema::to_openapi).collect()
                };
                out.one_of = composition.one_of().map(children).unwrap_or_default();
                out.all_of = composition.all_of().map(children).unwrap_or_default();
                out.any_of = composition.any_of().map(children).unwrap_or_default();
                out.not = composition.not().map(|child| Box::new(child.to_openapi()));
            }
        }

        let c = &self.constraints;
        out.title = self.title.clone();
        out.description = self.description.clone();
        out.format = c.format;
        out.const_value = self.const_value.clone();
        out.enum_values = self.enum_values.clone();
        out.default = self.default.clone();
        out.example = self.example.clone();
        out.min_length = c.min_length;
        out.max_length = c.max_length;
        out.pattern = c.pattern.clone();
        out.minimum = c.minimum.and_then(json_number);
        out.maximum = c.maximum.and_then(json_number);
        out.exclusive_minimum = c.exclusive_minimum.and_then(json_number);
        out.exclusive_maximum = c.exclusive_maximum.and_then(json_number);
        out.multiple_of = c.multiple_of.and_then(json_number);
        out.min_items = c.min_items;
        out.max_items = c.max_items;
        out.unique_items = c.unique_items.then_some(true);
        out.min_properties = c.min_properties;
        out.max_properties = c.max_properties;
        out.additional_properties = c.additional_properties;
        out.deprecated = self.deprecated.then_some(true);
        out.read_only = self.read_only.then_some(true);
        out.write_only = self.write_only.then_some(true);
        RefOr::T(out)
    }
}

fn count(keyword: &'static str, value: f64) -> Result<u64, SchemaError> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Ok(value as u64)
    } else {
        Err(SchemaError::InvalidCount { keyword, value })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn emitted(schema: &Schema) -> Value {
        serde_json::to_value(schema.to_openapi()).expect("should serialize schema")
    }

    #[test]
    fn object_with_required_and_optional_properties_lists_only_required() {
        //* Given
        let schema = object([
            ("name", string().required()),
            ("nickname", string().optional()),
            ("email", string().email().required()),
        ]);

        //* When
        let value = emitted(&schema);

        //* Then
        assert_eq!(value["required"], json!(["name", "email"]));
        assert_eq!(value["properties"]["email"]["format"], json!("email"));
        assert!(value["properties"]["email"].get("pattern").is_none());
    }

    #[test]
    fn required_after_optional_records_conflict() {
        //* Given
        let schema = string().optional().required();

        //* When
        let result = schema.validate();

        //* Then
        assert_eq!(result, Err(SchemaError::ConflictingPresence));
    }

    #[test]
    fn min_greater_than_max_on_string_is_rejected() {
        //* Given
        let schema = string().min(10).max(2);

        //* When
        let result = schema.validate();

        //* Then
        assert!(
            matches!(
                result,
                Err(SchemaError::InvertedBounds {
                    keyword: "length",
                    ..
                })
            ),
            "inverted length bounds should be rejected, got {result:?}"
        );
    }

    #[test]
    fn min_and_max_on_number_emit_value_bounds() {
        //* Given
        let schema = number().min(0).max(99.5);

        //* When
        let value = emitted(&schema);

        //* Then
        assert_eq!(value["minimum"], json!(0));
        assert_eq!(value["maximum"], json!(99.5));
        assert!(value.get("minLength").is_none());
    }

    #[test]
    fn exclusive_min_with_min_is_rejected() {
        //* Given
        let schema = integer().min(1).exclusive_min(0);

        //* When
        let result = schema.validate();

        //* Then
        assert!(matches!(
            result,
            Err(SchemaError::ExclusiveWithInclusive { .. })
        ));
    }

    #[test]
    fn unknown_format_tag_is_rejected() {
        //* Given
        let schema = string().format("colour");

        //* When
        let result = schema.validate();

        //* Then
        assert_eq!(result, Err(SchemaError::UnknownFormat("colour".to_string())));
    }

    #[test]
    fn composition_with_explicit_type_is_rejected() {
        //* Given
        let schema = one_of([string(), integer()]).with_type(SchemaType::String);

        //* When
        let result = schema.validate();

        //* Then
        assert_eq!(result, Err(SchemaError::TypedComposition));
    }

    #[test]
    fn pattern_that_does_not_compile_is_rejected() {
        //* Given
        let schema = string().pattern("([a-z");

        //* When
        let result = schema.validate();

        //* Then
        assert!(matches!(result, Err(SchemaError::InvalidPattern { .. })));
    }

    #[test]
    fn empty_composition_is_rejected() {
        //* Given
        let schema = any_of(Vec::new());

        //* When
        let result = schema.validate();

        //* Then
        assert_eq!(
            result,
            Err(SchemaError::EmptyComposition { keyword: "anyOf" })
        );
    }

    #[test]
    fn nested_error_reports_location() {
        //* Given
        let schema = object([("tags", array(string().min(-1)))]);

        //* When
        let err = schema.validate().expect_err("negative length should be rejected");

        //* Then
        assert!(
            err.to_string().starts_with("at properties.tags.items:"),
            "unexpected message: {err}"
        );
    }

    #[test]
    fn composition_omits_type_and_emits_children() {
        //* Given
        let schema = one_of([string(), integer().min(1)]).description("id or slug");

        //* When
        let value = emitted(&schema);

        //* Then
        assert!(value.get("type").is_none(), "composition must not carry a type");
        assert_eq!(
            value["oneOf"],
            json!([{"type": "string"}, {"type": "integer", "minimum": 1}])
        );
        assert_eq!(value["description"], json!("id or slug"));
    }

    #[test]
    fn not_composition_emits_singleton() {
        //* Given
        let schema = not(null());

        //* When
        let value = emitted(&schema);

        //* Then
        assert_eq!(value, json!({"not": {"type": "null"}}));
    }

    #[test]
    fn composition_with_several_slots_emits_every_slot() {
        //* Given
        let schema = all_of([reference("Base"), object([("id", string())])])
            .with_not(object([("legacy", boolean().required())]));

        //* When
        let value = emitted(&schema);

        //* Then
        assert!(schema.validate().is_ok());
        assert_eq!(
            value["allOf"],
            json!([
                {"$ref": "#/components/schemas/Base"},
                {"type": "object", "properties": {"id": {"type": "string"}}}
            ])
        );
        assert_eq!(value["not"]["required"], json!(["legacy"]));
        assert!(value.get("oneOf").is_none());
    }

    #[test]
    fn composition_slot_set_twice_is_rejected() {
        //* Given
        let schema = one_of([string()]).with_one_of([integer()]);

        //* When
        let result = schema.validate();

        //* Then
        assert_eq!(
            result,
            Err(SchemaError::DuplicateComposition { keyword: "oneOf" })
        );
    }

    #[test]
    fn composition_slot_on_primitive_is_rejected() {
        //* Given
        let schema = string().with_any_of([integer()]);

        //* When
        let result = schema.validate();

        //* Then
        assert_eq!(
            result,
            Err(SchemaError::NotApplicable {
                keyword: "anyOf",
                kind: "string"
            })
        );
    }

    #[test]
    fn reference_emits_component_pointer() {
        //* Given
        let schema = object([("parent", reference("TreeNode").optional())]);

        //* When
        let value = emitted(&schema);

        //* Then
        assert_eq!(
            value["properties"]["parent"],
            json!({"$ref": "#/components/schemas/TreeNode"})
        );
    }

    #[test]
    fn nullable_primitive_emits_type_list() {
        //* Given
        let schema = string().nullable();

        //* When
        let value = emitted(&schema);

        //* Then
        assert_eq!(value["type"], json!(["string", "null"]));
    }

    #[test]
    fn unset_constraints_are_omitted() {
        //* Given
        let schema = array(boolean());

        //* When
        let value = emitted(&schema);

        //* Then
        assert_eq!(value, json!({"type": "array", "items": {"type": "boolean"}}));
    }

    #[test]
    fn array_constraints_are_emitted() {
        //* Given
        let schema = array(string()).min_items(1).max_items(5).unique_items();

        //* When
        let value = emitted(&schema);

        //* Then
        assert_eq!(value["minItems"], json!(1));
        assert_eq!(value["maxItems"], json!(5));
        assert_eq!(value["uniqueItems"], json!(true));
    }

    #[test]
    fn pattern_on_integer_is_not_applicable() {
        //* Given
        let schema = integer().pattern("^[0-9]+$");

        //* When
        let result = schema.validate();

        //* Then
        assert_eq!(
            result,
            Err(SchemaError::NotApplicable {
                keyword: "pattern",
                kind: "integer"
            })
        );
    }

    #[test]
    fn non_positive_multiple_of_is_rejected() {
        //* Given
        let schema = number().multiple_of(0);

        //* When
        let result = schema.validate();

        //* Then
        assert_eq!(result, Err(SchemaError::NonPositiveMultipleOf(0.0)));
    }

    #[test]
    fn property_appends_to_object_in_order() {
        //* Given
        let schema = empty_object()
            .property("b", string())
            .property("a", integer().required());

        //* When
        let shape = schema.as_object().expect("object schema");

        //* Then
        let names: Vec<&str> = shape.properties().map(|(name, _)| name).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(shape.required(), ["a"]);
    }

    #[test]
    fn examples_keep_insertion_order() {
        //* Given
        let schema = string().examples([
            ("zulu", Example::new().value("z")),
            ("alpha", Example::new().value("a")),
        ]);

        //* When
        let names: Vec<&String> = schema.get_examples().keys().collect();

        //* Then
        assert_eq!(names, ["zulu", "alpha"]);
    }

    #[test]
    fn find_example_conflict_reports_nested_location() {
        //* Given
        let schema = object([(
            "code",
            string()
                .example("A1")
                .examples([("short", Example::new().value("B"))]),
        )]);

        //* When
        let location = schema.find_example_conflict();

        //* Then
        assert_eq!(location.as_deref(), Some("properties.code"));
    }

    #[test]
    fn format_shortcut_sets_numeric_type() {
        //* Given
        let schema = number().int64();

        //* When
        let value = emitted(&schema);

        //* Then
        assert_eq!(value, json!({"type": "integer", "format": "int64"}));
    }
}
