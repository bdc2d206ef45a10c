//! qryti.toml configuration parsing and serialization

use serde::{Deserialize, Serialize};
use qryti_core::error::QrytiError;
use crate::ConfigResult;

/// Complete qryti.toml configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QrytiToml {
    /// Backend connection settings
    #[serde(default)]
    pub api: ApiSection,

    /// Retry policy for transient failures
    #[serde(default)]
    pub retry: RetrySection,

    /// Response cache settings
    #[serde(default)]
    pub cache: CacheSection,

    /// Session storage key names
    #[serde(default)]
    pub storage: StorageSection,
}

/// Backend connection section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    /// Base URL every relative request path is joined onto
    pub base_url: String,

    /// Per-attempt timeout in milliseconds
    pub timeout_ms: u64,

    /// Endpoint paths relative to the base URL
    pub endpoints: EndpointsSection,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api/v1".to_string(),
            timeout_ms: 30_000,
            endpoints: EndpointsSection::default(),
        }
    }
}

/// Endpoint paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsSection {
    pub login: String,
    pub register: String,
    pub verify: String,
    pub profile: String,
    pub clients: String,
    pub models: String,
    pub reports: String,
    pub generate_report: String,
    pub health: String,
}

impl Default for EndpointsSection {
    fn default() -> Self {
        Self {
            login: "/auth/login".to_string(),
            register: "/auth/register".to_string(),
            verify: "/auth/verify".to_string(),
            profile: "/users/profile".to_string(),
            clients: "/clients".to_string(),
            models: "/models".to_string(),
            reports: "/reports".to_string(),
            generate_report: "/reports/generate".to_string(),
            health: "/health".to_string(),
        }
    }
}

impl EndpointsSection {
    fn entries(&self) -> [(&'static str, &str); 9] {
        [
            ("login", &self.login),
            ("register", &self.register),
            ("verify", &self.verify),
            ("profile", &self.profile),
            ("clients", &self.clients),
            ("models", &self.models),
            ("reports", &self.reports),
            ("generate_report", &self.generate_report),
            ("health", &self.health),
        ]
    }
}

/// Retry section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    /// Extra attempts after the first one
    pub max_retries: u32,

    /// Delay unit; the n-th retry waits n times this long
    pub base_delay_ms: u64,

    /// Upper bound for a single backoff delay
    pub max_delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 10_000,
        }
    }
}

/// Cache section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub enabled: bool,

    /// How long a cached GET response stays fresh
    pub ttl_ms: u64,

    /// Maximum number of cached responses
    pub max_size: usize,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_ms: 5 * 60 * 1_000,
            max_size: 100,
        }
    }
}

/// Storage section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub auth_token_key: String,
    pub user_profile_key: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            auth_token_key: "qryti_auth_token".to_string(),
            user_profile_key: "qryti_user_profile".to_string(),
        }
    }
}

/// Parse a TOML string into a raw table, reporting syntax errors with their location
pub fn parse_table(content: &str) -> ConfigResult<::toml::Table> {
    // First try with toml_edit for better error reporting
    if let Err(e) = content.parse::<toml_edit::DocumentMut>() {
        let location = e
            .span()
            .map(|span| {
                let (line, column) = line_column(content, span.start);
                format!(" at line {}, column {}", line, column)
            })
            .unwrap_or_default();
        return Err(QrytiError::ConfigParse {
            message: format!("TOML syntax error{}: {}", location, e.message()),
        });
    }

    content.parse::<::toml::Table>().map_err(|e| QrytiError::ConfigParse {
        message: format!("TOML parsing error: {}", e),
    })
}

/// Parse TOML string to QrytiToml configuration
pub fn parse_qryti_toml(content: &str) -> ConfigResult<QrytiToml> {
    let table = parse_table(content)?;
    let config = from_table(table)?;

    validate_config(&config)?;

    Ok(config)
}

/// Deserialize an already merged table
pub fn from_table(table: ::toml::Table) -> ConfigResult<QrytiToml> {
    ::toml::Value::Table(table)
        .try_into()
        .map_err(|e: ::toml::de::Error| QrytiError::ConfigParse {
            message: format!("TOML parsing error: {}", e),
        })
}

/// Serialize QrytiToml to TOML string
pub fn serialize_qryti_toml(config: &QrytiToml) -> ConfigResult<String> {
    ::toml::to_string_pretty(config).map_err(|e| QrytiError::ConfigParse {
        message: format!("TOML serialization error: {}", e),
    })
}

/// Validate configuration completeness
pub fn validate_config(config: &QrytiToml) -> ConfigResult<()> {
    let base = url::Url::parse(&config.api.base_url).map_err(|e| invalid(
        "api.base_url",
        format!("'{}' is not a valid URL: {}", config.api.base_url, e),
    ))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(invalid(
            "api.base_url",
            format!("scheme must be http or https, got '{}'", base.scheme()),
        ));
    }

    if config.api.timeout_ms == 0 {
        return Err(invalid("api.timeout_ms", "must be greater than zero".to_string()));
    }

    for (name, path) in config.api.endpoints.entries() {
        if path.is_empty() {
            return Err(invalid(
                &format!("api.endpoints.{}", name),
                "must not be empty".to_string(),
            ));
        }
    }

    if config.retry.max_delay_ms < config.retry.base_delay_ms {
        return Err(invalid(
            "retry.max_delay_ms",
            "must not be smaller than retry.base_delay_ms".to_string(),
        ));
    }

    if config.cache.ttl_ms == 0 {
        return Err(invalid("cache.ttl_ms", "must be greater than zero".to_string()));
    }

    if config.cache.max_size == 0 {
        return Err(invalid("cache.max_size", "must be greater than zero".to_string()));
    }

    if config.storage.auth_token_key.is_empty() || config.storage.user_profile_key.is_empty() {
        return Err(invalid("storage", "storage keys must not be empty".to_string()));
    }

    if config.storage.auth_token_key == config.storage.user_profile_key {
        return Err(invalid(
            "storage.user_profile_key",
            "must differ from storage.auth_token_key".to_string(),
        ));
    }

    Ok(())
}

/// Load and parse qryti.toml from file path
pub async fn load_from_file(path: &camino::Utf8Path) -> ConfigResult<QrytiToml> {
    let table = load_table(path).await?;
    let config = from_table(table).map_err(|e| in_file(path, e))?;
    validate_config(&config).map_err(|e| in_file(path, e))?;
    Ok(config)
}

/// Load a qryti.toml file as a raw table for layering
pub async fn load_table(path: &camino::Utf8Path) -> ConfigResult<::toml::Table> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| QrytiError::ConfigParse {
        message: format!("Failed to read {}: {}", path, e),
    })?;

    parse_table(&content).map_err(|e| in_file(path, e))
}

fn in_file(path: &camino::Utf8Path, error: QrytiError) -> QrytiError {
    match error {
        QrytiError::ConfigParse { message } => QrytiError::ConfigParse {
            message: format!("In file {}: {}", path, message),
        },
        QrytiError::ConfigValidation { field, reason } => QrytiError::ConfigValidation {
            field,
            reason: format!("In file {}: {}", path, reason),
        },
        other => other,
    }
}

fn invalid(field: &str, reason: String) -> QrytiError {
    QrytiError::ConfigValidation {
        field: field.to_string(),
        reason,
    }
}

/// 1-based line and column of a byte offset
fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let before = &content[..offset.min(content.len())];
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    (line, column)
}
