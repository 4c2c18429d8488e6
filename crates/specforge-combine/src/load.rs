//! Reading source documents from disk.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::{
    config::ServiceConfig,
    error::LoadError,
    service::service_name_from_path,
};

/// A loaded source document and the service it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSpec {
    pub service: String,
    pub origin: PathBuf,
    pub document: Value,
    /// Tags appended to every retained operation.
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub health_check: Option<String>,
}

impl SourceSpec {
    /// Wraps an in-memory document.
    pub fn new(service: impl Into<String>, document: Value) -> Self {
        Self {
            service: service.into(),
            origin: PathBuf::new(),
            document,
            tags: Vec::new(),
            description: None,
            version: None,
            health_check: None,
        }
    }

    /// Loads `path`, naming the service after the file stem.
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let document = load_document(path)?;
        Ok(Self {
            service: service_name_from_path(path),
            origin: path.to_path_buf(),
            ..Self::new("", document)
        })
    }

    /// Loads the spec file of a configured service, carrying its metadata.
    pub fn from_service(service: &ServiceConfig) -> Result<Self, LoadError> {
        let document = load_document(&service.spec_file)?;
        Ok(Self {
            service: service.name.clone(),
            origin: service.spec_file.clone(),
            document,
            tags: service.tags.clone(),
            description: service.description.clone(),
            version: service.version.clone(),
            health_check: service.health_check.clone(),
        })
    }

    /// Whether the service carries metadata worth a document-level tag.
    pub fn has_metadata(&self) -> bool {
        self.description.is_some() || self.version.is_some() || self.health_check.is_some()
    }
}

/// Reads an OpenAPI document, choosing the parser from the file extension. Files with
/// any other extension are tried as YAML, then as JSON.
pub fn load_document(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::Missing(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let document = match extension.as_deref() {
        Some("yaml" | "yml") => {
            serde_norway::from_str::<Value>(&content).map_err(|source| LoadError::Yaml {
                path: path.to_path_buf(),
                source,
            })?
        }
        Some("json") => {
            serde_json::from_str::<Value>(&content).map_err(|source| LoadError::Json {
                path: path.to_path_buf(),
                source,
            })?
        }
        _ => parse_unknown(path, &content)?,
    };

    if !document.is_object() {
        return Err(LoadError::NotADocument(path.to_path_buf()));
    }
    debug!(path = %path.display(), "loaded source document");
    Ok(document)
}

fn parse_unknown(path: &Path, content: &str) -> Result<Value, LoadError> {
    let yaml = match serde_norway::from_str::<Value>(content) {
        Ok(document) => return Ok(document),
        Err(err) => err,
    };
    match serde_json::from_str::<Value>(content) {
        Ok(document) => Ok(document),
        Err(json) => Err(LoadError::Unrecognized {
            path: path.to_path_buf(),
            yaml,
            json,
        }),
    }
}
