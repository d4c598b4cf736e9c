//! Environment records and their public projections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Header used for API-key auth when none is configured.
pub const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";

/// Prefix used for bearer auth when none is configured.
pub const DEFAULT_BEARER_PREFIX: &str = "Bearer";

/// How requests to an environment are authenticated.
///
/// Each variant carries only the fields meaningful to it. On the wire (and
/// in the persisted file) this is the flat object `{type, token, header_name,
/// bearer_prefix, username, password}`; see [`AuthConfigRecord`].
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "AuthConfigRecord", into = "AuthConfigRecord")]
pub enum AuthConfig {
    #[default]
    None,
    Bearer {
        token: Option<String>,
        prefix: String,
    },
    ApiKey {
        token: Option<String>,
        header_name: Option<String>,
    },
    Basic {
        username: Option<String>,
        password: Option<String>,
    },
}

impl AuthConfig {
    /// The auth kind tag.
    pub fn kind(&self) -> AuthKind {
        match self {
            AuthConfig::None => AuthKind::None,
            AuthConfig::Bearer { .. } => AuthKind::Bearer,
            AuthConfig::ApiKey { .. } => AuthKind::ApiKey,
            AuthConfig::Basic { .. } => AuthKind::Basic,
        }
    }

    /// Headers this auth contributes to an outbound request.
    ///
    /// Basic auth contributes none: it is attached as transport credentials.
    pub fn injected_headers(&self) -> Vec<(String, String)> {
        match self {
            AuthConfig::Bearer {
                token: Some(token),
                prefix,
            } => vec![("Authorization".to_string(), format!("{prefix} {token}"))],
            AuthConfig::ApiKey {
                token: Some(token),
                header_name,
            } => vec![(
                header_name
                    .clone()
                    .unwrap_or_else(|| DEFAULT_API_KEY_HEADER.to_string()),
                token.clone(),
            )],
            _ => Vec::new(),
        }
    }

    /// Username/password pair for transport-level basic auth, if configured.
    pub fn basic_credentials(&self) -> Option<(&str, &str)> {
        match self {
            AuthConfig::Basic {
                username: Some(username),
                password,
            } => Some((username.as_str(), password.as_deref().unwrap_or(""))),
            _ => None,
        }
    }

    /// Projection safe to return to clients.
    pub fn to_public(&self) -> AuthConfigPublic {
        let (header_name, bearer_prefix, username, has_token, has_password) = match self {
            AuthConfig::None => (None, DEFAULT_BEARER_PREFIX.to_string(), None, false, false),
            AuthConfig::Bearer { token, prefix } => {
                (None, prefix.clone(), None, token.is_some(), false)
            }
            AuthConfig::ApiKey { token, header_name } => (
                header_name.clone(),
                DEFAULT_BEARER_PREFIX.to_string(),
                None,
                token.is_some(),
                false,
            ),
            AuthConfig::Basic { username, password } => (
                None,
                DEFAULT_BEARER_PREFIX.to_string(),
                username.clone(),
                false,
                password.is_some(),
            ),
        };
        AuthConfigPublic {
            kind: self.kind(),
            header_name,
            bearer_prefix,
            username,
            has_token,
            has_password,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |present: bool| if present { "<redacted>" } else { "<unset>" };
        match self {
            AuthConfig::None => f.write_str("None"),
            AuthConfig::Bearer { token, prefix } => f
                .debug_struct("Bearer")
                .field("token", &redact(token.is_some()))
                .field("prefix", prefix)
                .finish(),
            AuthConfig::ApiKey { token, header_name } => f
                .debug_struct("ApiKey")
                .field("token", &redact(token.is_some()))
                .field("header_name", header_name)
                .finish(),
            AuthConfig::Basic { username, password } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &redact(password.is_some()))
                .finish(),
        }
    }
}

/// Auth kind tag as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthKind {
    #[default]
    None,
    Bearer,
    ApiKey,
    Basic,
}

/// Flat wire form of [`AuthConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfigRecord {
    #[serde(rename = "type", default)]
    pub kind: AuthKind,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub header_name: Option<String>,
    #[serde(default = "default_bearer_prefix")]
    pub bearer_prefix: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn default_bearer_prefix() -> String {
    DEFAULT_BEARER_PREFIX.to_string()
}

/// Blank form fields arrive as `""`; those count as unset.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl From<AuthConfigRecord> for AuthConfig {
    fn from(record: AuthConfigRecord) -> Self {
        match record.kind {
            AuthKind::None => AuthConfig::None,
            AuthKind::Bearer => AuthConfig::Bearer {
                token: non_empty(record.token),
                prefix: record.bearer_prefix,
            },
            AuthKind::ApiKey => AuthConfig::ApiKey {
                token: non_empty(record.token),
                header_name: non_empty(record.header_name),
            },
            AuthKind::Basic => AuthConfig::Basic {
                username: non_empty(record.username),
                password: record.password,
            },
        }
    }
}

impl From<AuthConfig> for AuthConfigRecord {
    fn from(auth: AuthConfig) -> Self {
        let mut record = AuthConfigRecord {
            kind: auth.kind(),
            bearer_prefix: default_bearer_prefix(),
            ..Default::default()
        };
        match auth {
            AuthConfig::None => {}
            AuthConfig::Bearer { token, prefix } => {
                record.token = token;
                record.bearer_prefix = prefix;
            }
            AuthConfig::ApiKey { token, header_name } => {
                record.token = token;
                record.header_name = header_name;
            }
            AuthConfig::Basic { username, password } => {
                record.username = username;
                record.password = password;
            }
        }
        record
    }
}

/// Public view of [`AuthConfig`]: presence flags instead of secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfigPublic {
    #[serde(rename = "type")]
    pub kind: AuthKind,
    pub header_name: Option<String>,
    pub bearer_prefix: String,
    pub username: Option<String>,
    pub has_token: bool,
    pub has_password: bool,
}

/// A named upstream API target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub id: String,
    pub name: String,
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_verify_ssl() -> bool {
    true
}

impl Environment {
    /// Public projection with secrets removed.
    pub fn to_public(&self) -> EnvironmentPublic {
        EnvironmentPublic {
            id: self.id.clone(),
            name: self.name.clone(),
            base_url: self.base_url.clone(),
            verify_ssl: self.verify_ssl,
            created_at: self.created_at,
            updated_at: self.updated_at,
            auth: self.auth.to_public(),
        }
    }
}

/// Body of `POST /api/environments`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnvironmentCreate {
    pub name: String,
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
}

/// Body of `PUT /api/environments/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EnvironmentUpdate {
    pub name: Option<String>,
    pub base_url: Option<String>,
    pub auth: Option<AuthConfig>,
    pub verify_ssl: Option<bool>,
}

/// Wire view of an environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentPublic {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub verify_ssl: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub auth: AuthConfigPublic,
}
