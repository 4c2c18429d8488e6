//! # specforge
//!
//! Declare HTTP operations with a fluent schema DSL, compile them into immutable
//! operations bound to runtime handlers, and emit an OpenAPI 3.1 document describing
//! them.
//!
//! ```
//! use specforge::{Emitter, OperationSet, operation, schema::{object, string}};
//!
//! let create_user = operation::post("/users")
//!     .summary("Create a user")
//!     .with_body(object([
//!         ("name", string().required()),
//!         ("email", string().email().required()),
//!     ]))
//!     .with_created(object([("id", string().uuid())]))
//!     .with_create_errors()
//!     .handler(())
//!     .expect("valid operation");
//!
//! let doc = Emitter::new("Users", "1.0.0")
//!     .emit(&OperationSet::new().with(create_user))
//!     .expect("valid document");
//! assert_eq!(doc.openapi, "3.1.0");
//! ```

pub mod emit;
pub mod error;
pub mod operation;
pub mod output;
pub mod schema;
pub mod security;
pub mod standard_errors;

// Re-export the document model so users only need one dependency
#[doc(hidden)]
pub use specforge_core;
pub use specforge_core::openapi;

pub use self::{
    emit::Emitter,
    error::{BuilderError, EmitError, FormatError, OutputError, SchemaError},
    operation::{CompiledOperation, OperationBuilder, OperationSet, ResponseDefinition},
    output::OutputFormat,
    schema::Schema,
    security::SecurityRequirements,
};
