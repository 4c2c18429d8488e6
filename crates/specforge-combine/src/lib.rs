//! # specforge-combine
//!
//! Merge the OpenAPI documents of several services into one document.
//!
//! Each source document is tagged with the service it belongs to (derived from its
//! file name or taken from a services configuration). Paths are rewritten with a
//! global base URL and a per-service prefix, operations are filtered by tag and
//! tagged `service:<name>`, and everything is unioned into a single document.
//!
//! ```no_run
//! use specforge_combine::{Combiner, CombinerConfig};
//!
//! let config = CombinerConfig {
//!     base_url: "/api".into(),
//!     ..Default::default()
//! }
//! .prefix("user", "/v1");
//!
//! let mut combiner = Combiner::new(config)?;
//! combiner.load_specs(["user-service.yaml", "order-service.yaml"])?;
//! combiner.run()?;
//! # Ok::<(), specforge_combine::CombineError>(())
//! ```

mod combine;
pub mod config;
pub mod error;
pub mod load;
pub mod service;
mod stats;
pub mod validate;

pub use self::{
    combine::Combiner,
    config::{CombinerConfig, ConflictStrategy, ServiceConfig, ServicesConfig, Settings},
    error::{CombineError, ConfigError, LoadError, ValidationError},
    load::SourceSpec,
    stats::CombineStats,
    validate::validate_document,
};

pub type Result<T> = std::result::Result<T, CombineError>;
