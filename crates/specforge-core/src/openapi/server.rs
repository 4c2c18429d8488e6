//! Server and server variable entities.

use super::map::Map;

/// A server hosting the API.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Server {
    /// A URL to the target host. May contain `{variable}` substitutions.
    pub url: String,

    /// A description of the host designated by the URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Variables used for substitution in the server's URL template.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub variables: Map<String, ServerVariable>,
}

impl Server {
    /// Creates a new `Server` for the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: None,
            variables: Map::new(),
        }
    }

    /// Sets the description for the server.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a URL template variable.
    pub fn variable(mut self, name: impl Into<String>, variable: ServerVariable) -> Self {
        self.variables.insert(name.into(), variable);
        self
    }

    /// Checks that every variable with an `enum` lists its own default.
    pub fn validate(&self) -> Result<(), String> {
        for (name, variable) in &self.variables {
            if let Some(values) = &variable.enum_values {
                if values.is_empty() {
                    return Err(format!(
                        "server '{}' variable '{name}' has an empty enum",
                        self.url
                    ));
                }
                if !values.contains(&variable.default) {
                    return Err(format!(
                        "server '{}' variable '{name}' default '{}' is not one of its enum values",
                        self.url, variable.default
                    ));
                }
            }
        }
        Ok(())
    }
}

/// A variable for server URL template substitution.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ServerVariable {
    /// An enumeration of allowed substitution values.
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,

    /// The default value to use for substitution.
    pub default: String,

    /// A description of the server variable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ServerVariable {
    /// Creates a new `ServerVariable` with the given default value.
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            enum_values: None,
            default: default.into(),
            description: None,
        }
    }

    /// Sets the allowed values.
    pub fn enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
