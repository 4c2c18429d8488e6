//! Error types for loading, combining and validating documents.

use std::path::PathBuf;

use specforge::{FormatError, OutputError};

/// A source document that could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("input file '{0}' does not exist")]
    Missing(PathBuf),

    #[error("failed to read '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{path}' as YAML")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_norway::Error,
    },

    #[error("failed to parse '{path}' as JSON")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("'{path}' is neither valid YAML ({yaml}) nor valid JSON ({json})")]
    Unrecognized {
        path: PathBuf,
        yaml: serde_norway::Error,
        json: serde_json::Error,
    },

    #[error("'{0}' does not contain an OpenAPI document object")]
    NotADocument(PathBuf),
}

/// A combined document that breaks a structural rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("`openapi` version is missing or empty")]
    MissingVersion,

    #[error("`info.title` is missing or empty")]
    MissingTitle,

    #[error("`info.version` is missing or empty")]
    MissingInfoVersion,

    #[error("document has no paths")]
    NoPaths,

    #[error("path '{0}' has no operations")]
    EmptyPath(String),

    #[error("operation {method} {path} has no responses")]
    NoResponses { method: String, path: String },
}

/// An invalid combiner or services configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read services config '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse services config '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_norway::Error,
    },

    #[error("service #{0} has an empty name")]
    EmptyServiceName(usize),

    #[error("service '{0}' has an empty spec_file")]
    EmptySpecFile(String),

    #[error("service '{0}' is declared more than once")]
    DuplicateService(String),

    #[error("conflict strategy 'merge' is not supported (use 'override' or 'error')")]
    UnsupportedStrategy,

    #[error("invalid service prefix '{0}' (expected service:/prefix)")]
    InvalidPrefix(String),

    #[error("tag '{0}' is both included and excluded")]
    OverlappingTagFilters(String),
}

/// Any failure of a combine run.
#[derive(Debug, thiserror::Error)]
pub enum CombineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("combined document is invalid: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("{kind} '{key}' from service '{service}' conflicts with the one from '{previous}'")]
    Conflict {
        kind: &'static str,
        key: String,
        service: String,
        previous: String,
    },

    #[error("no input documents to combine")]
    NoInputs,
}
