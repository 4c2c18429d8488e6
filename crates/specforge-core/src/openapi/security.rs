//! Security schemes and requirements.

use super::map::Map;

/// Defines a security scheme that can be used by the operations.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum SecurityScheme {
    /// An API key passed in a header, query parameter or cookie.
    #[serde(rename = "apiKey")]
    ApiKey {
        /// The name of the header, query or cookie parameter.
        name: String,
        /// The location of the API key.
        #[serde(rename = "in")]
        location: ApiKeyLocation,
        /// A description of the scheme.
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// An HTTP authentication scheme (RFC 7235), e.g. `basic` or `bearer`.
    #[serde(rename = "http")]
    Http {
        /// The name of the HTTP authorization scheme.
        scheme: String,
        /// A hint to the client about how the bearer token is formatted.
        #[serde(rename = "bearerFormat", skip_serializing_if = "Option::is_none")]
        bearer_format: Option<String>,
        /// A description of the scheme.
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// OAuth 2.0 with one or more flows.
    #[serde(rename = "oauth2")]
    OAuth2 {
        /// The flows supported by this scheme.
        flows: OAuthFlows,
        /// A description of the scheme.
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// OpenID Connect discovery.
    #[serde(rename = "openIdConnect")]
    OpenIdConnect {
        /// The OpenID Connect discovery URL.
        #[serde(rename = "openIdConnectUrl")]
        open_id_connect_url: String,
        /// A description of the scheme.
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// Mutual TLS client certificates.
    #[serde(rename = "mutualTLS")]
    MutualTls {
        /// A description of the scheme.
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl SecurityScheme {
    /// Creates an API key scheme.
    pub fn api_key(name: impl Into<String>, location: ApiKeyLocation) -> Self {
        SecurityScheme::ApiKey {
            name: name.into(),
            location,
            description: None,
        }
    }

    /// Creates an HTTP scheme with the given scheme name.
    pub fn http(scheme: impl Into<String>) -> Self {
        SecurityScheme::Http {
            scheme: scheme.into(),
            bearer_format: None,
            description: None,
        }
    }

    /// Creates an HTTP basic scheme.
    pub fn basic() -> Self {
        Self::http("basic")
    }

    /// Creates an HTTP bearer scheme.
    pub fn bearer() -> Self {
        Self::http("bearer")
    }

    /// Creates an HTTP bearer scheme with a bearer format hint (e.g. `JWT`).
    pub fn bearer_with_format(bearer_format: impl Into<String>) -> Self {
        SecurityScheme::Http {
            scheme: "bearer".to_string(),
            bearer_format: Some(bearer_format.into()),
            description: None,
        }
    }

    /// Creates an OAuth 2.0 scheme.
    pub fn oauth2(flows: OAuthFlows) -> Self {
        SecurityScheme::OAuth2 {
            flows,
            description: None,
        }
    }

    /// Creates an OpenID Connect scheme.
    pub fn open_id_connect(url: impl Into<String>) -> Self {
        SecurityScheme::OpenIdConnect {
            open_id_connect_url: url.into(),
            description: None,
        }
    }

    /// Creates a mutual TLS scheme.
    pub fn mutual_tls() -> Self {
        SecurityScheme::MutualTls { description: None }
    }

    /// Sets the description of the scheme.
    pub fn description(mut self, text: impl Into<String>) -> Self {
        let slot = match &mut self {
            SecurityScheme::ApiKey { description, .. }
            | SecurityScheme::Http { description, .. }
            | SecurityScheme::OAuth2 { description, .. }
            | SecurityScheme::OpenIdConnect { description, .. }
            | SecurityScheme::MutualTls { description } => description,
        };
        *slot = Some(text.into());
        self
    }

    /// Checks the variant-specific invariants of the scheme.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            SecurityScheme::ApiKey { name, .. } => {
                if name.trim().is_empty() {
                    return Err("apiKey scheme requires a parameter name".to_string());
                }
            }
            SecurityScheme::Http {
                scheme,
                bearer_format,
                ..
            } => {
                if scheme.trim().is_empty() {
                    return Err("http scheme requires a scheme name".to_string());
                }
                if bearer_format.is_some() && !scheme.eq_ignore_ascii_case("bearer") {
                    return Err(format!(
                        "bearerFormat is only allowed with the bearer scheme, not '{scheme}'"
                    ));
                }
            }
            SecurityScheme::OAuth2 { flows, .. } => flows.validate()?,
            SecurityScheme::OpenIdConnect {
                open_id_connect_url,
                ..
            } => {
                if open_id_connect_url.trim().is_empty() {
                    return Err("openIdConnect scheme requires a discovery URL".to_string());
                }
            }
            SecurityScheme::MutualTls { .. } => {}
        }
        Ok(())
    }
}

/// The location of an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    /// Sent as a request header.
    Header,
    /// Sent as a query parameter.
    Query,
    /// Sent as a cookie.
    Cookie,
}

/// The OAuth 2.0 flows supported by a scheme.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlows {
    /// Configuration for the implicit flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implicit: Option<OAuthFlow>,

    /// Configuration for the resource owner password flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<OAuthFlow>,

    /// Configuration for the client credentials flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_credentials: Option<OAuthFlow>,

    /// Configuration for the authorization code flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<OAuthFlow>,
}

impl OAuthFlows {
    /// Creates an empty set of flows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the implicit flow.
    pub fn implicit(mut self, flow: OAuthFlow) -> Self {
        self.implicit = Some(flow);
        self
    }

    /// Sets the password flow.
    pub fn password(mut self, flow: OAuthFlow) -> Self {
        self.password = Some(flow);
        self
    }

    /// Sets the client credentials flow.
    pub fn client_credentials(mut self, flow: OAuthFlow) -> Self {
        self.client_credentials = Some(flow);
        self
    }

    /// Sets the authorization code flow.
    pub fn authorization_code(mut self, flow: OAuthFlow) -> Self {
        self.authorization_code = Some(flow);
        self
    }

    fn validate(&self) -> Result<(), String> {
        let flows = [
            ("implicit", &self.implicit, true, false),
            ("password", &self.password, false, true),
            ("clientCredentials", &self.client_credentials, false, true),
            ("authorizationCode", &self.authorization_code, true, true),
        ];
        if flows.iter().all(|(_, flow, _, _)| flow.is_none()) {
            return Err("oauth2 scheme requires at least one flow".to_string());
        }
        for (name, flow, needs_authorization, needs_token) in flows {
            let Some(flow) = flow else { continue };
            if needs_authorization && flow.authorization_url.as_deref().is_none_or(str::is_empty) {
                return Err(format!("oauth2 {name} flow requires an authorizationUrl"));
            }
            if needs_token && flow.token_url.as_deref().is_none_or(str::is_empty) {
                return Err(format!("oauth2 {name} flow requires a tokenUrl"));
            }
        }
        Ok(())
    }
}

/// Configuration details for a single OAuth 2.0 flow.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlow {
    /// The authorization URL (implicit and authorization code flows).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,

    /// The token URL (password, client credentials and authorization code flows).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,

    /// The URL to obtain refresh tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<String>,

    /// The available scopes, mapped to a short description.
    #[serde(default)]
    pub scopes: Map<String, String>,
}

impl OAuthFlow {
    /// Creates a new flow without URLs or scopes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the authorization URL.
    pub fn authorization_url(mut self, url: impl Into<String>) -> Self {
        self.authorization_url = Some(url.into());
        self
    }

    /// Sets the token URL.
    pub fn token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = Some(url.into());
        self
    }

    /// Sets the refresh URL.
    pub fn refresh_url(mut self, url: impl Into<String>) -> Self {
        self.refresh_url = Some(url.into());
        self
    }

    /// Adds a scope.
    pub fn scope(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.scopes.insert(name.into(), description.into());
        self
    }
}

/// A single security requirement: every listed scheme must be satisfied (AND).
///
/// Keys are security scheme names, values the scopes required from that scheme.
pub type SecurityRequirement = Map<String, Vec<String>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_bearer_scheme_with_format_emits_http_type() {
        //* Given
        let scheme = SecurityScheme::bearer_with_format("JWT").description("Access token");

        //* When
        let value = serde_json::to_value(&scheme).expect("should serialize scheme");

        //* Then
        assert_eq!(
            value,
            serde_json::json!({
                "type": "http",
                "scheme": "bearer",
                "bearerFormat": "JWT",
                "description": "Access token"
            })
        );
    }

    #[test]
    fn serialize_api_key_scheme_emits_location() {
        //* Given
        let scheme = SecurityScheme::api_key("X-API-Key", ApiKeyLocation::Header);

        //* When
        let value = serde_json::to_value(&scheme).expect("should serialize scheme");

        //* Then
        assert_eq!(
            value,
            serde_json::json!({"type": "apiKey", "name": "X-API-Key", "in": "header"})
        );
    }

    #[test]
    fn validate_basic_scheme_with_bearer_format_fails() {
        //* Given
        let scheme = SecurityScheme::Http {
            scheme: "basic".to_string(),
            bearer_format: Some("JWT".to_string()),
            description: None,
        };

        //* When
        let result = scheme.validate();

        //* Then
        assert!(result.is_err(), "bearerFormat on basic should be rejected");
    }

    #[test]
    fn validate_oauth2_without_flows_fails() {
        //* Given
        let scheme = SecurityScheme::oauth2(OAuthFlows::new());

        //* When
        let result = scheme.validate();

        //* Then
        assert!(result.is_err(), "oauth2 without flows should be rejected");
    }

    #[test]
    fn validate_oauth2_authorization_code_without_token_url_fails() {
        //* Given
        let scheme = SecurityScheme::oauth2(OAuthFlows::new().authorization_code(
            OAuthFlow::new().authorization_url("https://auth.example.com/authorize"),
        ));

        //* When
        let result = scheme.validate();

        //* Then
        let err = result.expect_err("missing tokenUrl should be rejected");
        assert!(err.contains("tokenUrl"));
    }

    #[test]
    fn validate_oauth2_client_credentials_with_token_url_succeeds() {
        //* Given
        let scheme = SecurityScheme::oauth2(OAuthFlows::new().client_credentials(
            OAuthFlow::new()
                .token_url("https://auth.example.com/token")
                .scope("read", "Read access"),
        ));

        //* When
        let result = scheme.validate();

        //* Then
        assert!(result.is_ok(), "client credentials with tokenUrl should be valid");
    }

    #[test]
    fn validate_api_key_with_blank_name_fails() {
        //* Given
        let scheme = SecurityScheme::api_key(" ", ApiKeyLocation::Query);

        //* When
        let result = scheme.validate();

        //* Then
        assert!(result.is_err(), "blank api key name should be rejected");
    }
}
