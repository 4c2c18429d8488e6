//! Combiner options and the services configuration file.

use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use specforge::OutputFormat;

use crate::error::ConfigError;

pub const DEFAULT_OUTPUT_FILE: &str = "combined-api.yaml";
pub const DEFAULT_TITLE: &str = "Combined API";
pub const DEFAULT_VERSION: &str = "1.0.0";

/// What to do when two services define the same operation or component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStrategy {
    /// The later service wins and a warning is recorded.
    #[default]
    Override,
    /// Recognized in configuration files but rejected by [`CombinerConfig::validate`].
    Merge,
    /// The combine run fails.
    Error,
}

/// Options of a combine run.
#[derive(Debug, Clone)]
pub struct CombinerConfig {
    pub output_file: PathBuf,
    pub format: OutputFormat,
    pub title: String,
    pub version: String,
    pub description: Option<String>,
    /// Prepended to every combined path.
    pub base_url: String,
    /// Path prefix per service name.
    pub service_prefix: BTreeMap<String, String>,
    pub include_tags: Vec<String>,
    pub exclude_tags: Vec<String>,
    pub merge_schemas: bool,
    pub validate_output: bool,
    pub conflict_strategy: ConflictStrategy,
    /// Log overrides and renames at `warn` instead of `debug`.
    pub verbose: bool,
}

impl Default for CombinerConfig {
    fn default() -> Self {
        Self {
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            format: OutputFormat::Yaml,
            title: DEFAULT_TITLE.to_string(),
            version: DEFAULT_VERSION.to_string(),
            description: None,
            base_url: String::new(),
            service_prefix: BTreeMap::new(),
            include_tags: Vec::new(),
            exclude_tags: Vec::new(),
            merge_schemas: true,
            validate_output: true,
            conflict_strategy: ConflictStrategy::Override,
            verbose: false,
        }
    }
}

impl CombinerConfig {
    /// Registers `prefix` for `service`, replacing any previous prefix.
    pub fn prefix(mut self, service: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.service_prefix.insert(service.into(), prefix.into());
        self
    }

    /// Adds a prefix given as `service:/prefix`, split on the first `:`.
    pub fn parse_prefix(&mut self, spec: &str) -> Result<(), ConfigError> {
        let Some((service, prefix)) = spec.split_once(':') else {
            return Err(ConfigError::InvalidPrefix(spec.to_string()));
        };
        if service.is_empty() {
            return Err(ConfigError::InvalidPrefix(spec.to_string()));
        }
        self.service_prefix
            .insert(service.to_string(), prefix.to_string());
        Ok(())
    }

    /// Copies the top-level values and settings of a services configuration into
    /// these options. Values absent from the file are left untouched.
    pub fn apply_services_config(&mut self, services: &ServicesConfig) {
        if let Some(title) = &services.title {
            self.title = title.clone();
        }
        if let Some(version) = &services.version {
            self.version = version.clone();
        }
        if services.description.is_some() {
            self.description = services.description.clone();
        }
        if let Some(base_url) = &services.base_url {
            self.base_url = base_url.clone();
        }

        for service in services.enabled_services() {
            if let Some(prefix) = &service.path_prefix {
                self.service_prefix
                    .insert(service.name.clone(), prefix.clone());
            }
        }

        let settings = &services.settings;
        if let Some(merge_schemas) = settings.merge_schemas {
            self.merge_schemas = merge_schemas;
        }
        if let Some(validate_output) = settings.validate_output {
            self.validate_output = validate_output;
        }
        if !settings.include_tags.is_empty() {
            self.include_tags = settings.include_tags.clone();
        }
        if !settings.exclude_tags.is_empty() {
            self.exclude_tags = settings.exclude_tags.clone();
        }
        if let Some(strategy) = settings.conflict_strategy {
            self.conflict_strategy = strategy;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.conflict_strategy == ConflictStrategy::Merge {
            return Err(ConfigError::UnsupportedStrategy);
        }
        if let Some(tag) = self
            .include_tags
            .iter()
            .find(|tag| self.exclude_tags.contains(tag))
        {
            return Err(ConfigError::OverlappingTagFilters(tag.clone()));
        }
        Ok(())
    }
}

/// The services configuration file.
///
/// ```yaml
/// title: Platform API
/// base_url: /api
/// services:
///   - name: user
///     spec_file: specs/user-service.yaml
///     path_prefix: /v1
/// settings:
///   conflict_strategy: error
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServicesConfig {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
    #[serde(default)]
    pub settings: Settings,
}

/// One service entry of a [`ServicesConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub spec_file: PathBuf,
    #[serde(default)]
    pub path_prefix: Option<String>,
    /// Appended to every operation of the service.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub health_check: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub merge_schemas: Option<bool>,
    #[serde(default)]
    pub validate_output: Option<bool>,
    #[serde(default)]
    pub include_tags: Vec<String>,
    #[serde(default)]
    pub exclude_tags: Vec<String>,
    #[serde(default)]
    pub conflict_strategy: Option<ConflictStrategy>,
}

impl ServicesConfig {
    /// Loads and validates a services configuration. Relative `spec_file` paths are
    /// resolved against the directory of the configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: ServicesConfig =
            serde_norway::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        for service in &mut config.services {
            if service.spec_file.is_relative() {
                service.spec_file = base_dir.join(&service.spec_file);
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for (index, service) in self.services.iter().enumerate() {
            if service.name.trim().is_empty() {
                return Err(ConfigError::EmptyServiceName(index));
            }
            if service.spec_file.as_os_str().is_empty() {
                return Err(ConfigError::EmptySpecFile(service.name.clone()));
            }
            if !seen.insert(service.name.as_str()) {
                return Err(ConfigError::DuplicateService(service.name.clone()));
            }
        }
        if self.settings.conflict_strategy == Some(ConflictStrategy::Merge) {
            return Err(ConfigError::UnsupportedStrategy);
        }
        Ok(())
    }

    /// Services with `enabled: true`, in file order.
    pub fn enabled_services(&self) -> impl Iterator<Item = &ServiceConfig> {
        self.services.iter().filter(|service| service.enabled)
    }
}
