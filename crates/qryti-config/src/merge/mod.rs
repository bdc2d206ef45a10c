//! Configuration layering, fallback logic, and environment overrides

use std::collections::HashMap;
use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;
use qryti_core::error::QrytiError;
use crate::{ConfigResult, toml::QrytiToml};

/// File name of the project configuration
pub const CONFIG_FILE: &str = "qryti.toml";

/// Environment variables that override configuration values
pub const ENV_KEYS: &[&str] = &[
    "QRYTI_API_URL",
    "QRYTI_TIMEOUT_MS",
    "QRYTI_MAX_RETRIES",
    "QRYTI_RETRY_DELAY_MS",
    "QRYTI_CACHE_ENABLED",
    "QRYTI_CACHE_TTL_MS",
    "QRYTI_CACHE_MAX_SIZE",
];

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
    /// Global configuration file, if one is expected
    global_path: Option<Utf8PathBuf>,
}

/// Configuration layering and merging
#[derive(Debug, Default)]
pub struct ConfigLayering {
    /// Global configuration
    global_config: Option<::toml::Table>,
    /// Project configuration
    project_config: Option<::toml::Table>,
    /// Environment overrides
    env_overrides: HashMap<String, String>,
    /// CLI flag overrides
    cli_overrides: HashMap<String, String>,
}

/// Configuration source tracking
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Built-in defaults
    Defaults,
    /// Global config file
    Global(Utf8PathBuf),
    /// Project qryti.toml file
    Project(Utf8PathBuf),
    /// Environment variable
    Environment(String),
    /// CLI flag
    CommandLine,
}

impl ConfigLoader {
    /// Create a new configuration loader using `~/.qryti/config.toml` as the global file
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self {
            cwd,
            global_path: default_global_path(),
        }
    }

    /// Use a specific global configuration file (or none)
    pub fn with_global_path(mut self, path: Option<Utf8PathBuf>) -> Self {
        self.global_path = path;
        self
    }

    /// Find configuration file in project (walks up directory tree)
    pub fn resolve_config_path(&self, filename: &str) -> Option<Utf8PathBuf> {
        let mut current: Option<&Utf8Path> = Some(self.cwd.as_path());

        while let Some(dir) = current {
            let config_path = dir.join(filename);
            if config_path.exists() {
                return Some(config_path);
            }
            current = dir.parent();
        }

        None
    }

    /// Load project configuration table, if a qryti.toml exists
    pub async fn load_project_table(&self) -> ConfigResult<Option<(::toml::Table, Utf8PathBuf)>> {
        match self.resolve_config_path(CONFIG_FILE) {
            Some(path) => {
                let table = crate::toml::load_table(&path).await?;
                Ok(Some((table, path)))
            }
            None => Ok(None),
        }
    }

    /// Load global configuration table
    pub async fn load_global_table(&self) -> ConfigResult<Option<(::toml::Table, Utf8PathBuf)>> {
        match &self.global_path {
            Some(path) if path.exists() => {
                let table = crate::toml::load_table(path).await?;
                Ok(Some((table, path.clone())))
            }
            _ => Ok(None),
        }
    }

    /// Load every layer and merge them, returning the sources that contributed
    pub async fn load(
        &self,
        cli_overrides: HashMap<String, String>,
    ) -> ConfigResult<(QrytiToml, Vec<ConfigSource>)> {
        let mut layering = ConfigLayering::new();
        let mut sources = vec![ConfigSource::Defaults];

        if let Some((table, path)) = self.load_global_table().await? {
            debug!("Loaded global config from {}", path);
            layering.global_config = Some(table);
            sources.push(ConfigSource::Global(path));
        }

        if let Some((table, path)) = self.load_project_table().await? {
            debug!("Loaded project config from {}", path);
            layering.project_config = Some(table);
            sources.push(ConfigSource::Project(path));
        }

        layering.env_overrides = ConfigLayering::collect_env_overrides();
        let mut env_keys: Vec<_> = layering.env_overrides.keys().cloned().collect();
        env_keys.sort();
        sources.extend(env_keys.into_iter().map(ConfigSource::Environment));

        if !cli_overrides.is_empty() {
            sources.push(ConfigSource::CommandLine);
        }
        layering.cli_overrides = cli_overrides;

        Ok((layering.build()?, sources))
    }
}

fn default_global_path() -> Option<Utf8PathBuf> {
    let home = dirs::home_dir()?;
    let home = Utf8PathBuf::try_from(home).ok()?;
    Some(home.join(".qryti").join("config.toml"))
}

impl ConfigLayering {
    /// Create a new configuration layering system
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_global(mut self, table: ::toml::Table) -> Self {
        self.global_config = Some(table);
        self
    }

    pub fn with_project(mut self, table: ::toml::Table) -> Self {
        self.project_config = Some(table);
        self
    }

    pub fn with_env(mut self, overrides: HashMap<String, String>) -> Self {
        self.env_overrides = overrides;
        self
    }

    pub fn with_cli(mut self, overrides: HashMap<String, String>) -> Self {
        self.cli_overrides = overrides;
        self
    }

    /// Merge all layers: global, then project, then environment, then CLI flags
    pub fn build(self) -> ConfigResult<QrytiToml> {
        let mut merged = ::toml::Table::new();

        if let Some(global) = self.global_config {
            merge_tables(&mut merged, global);
        }
        if let Some(project) = self.project_config {
            merge_tables(&mut merged, project);
        }

        let mut config = crate::toml::from_table(merged)?;

        Self::apply_env_overrides(&mut config, &self.env_overrides)?;
        Self::apply_cli_overrides(&mut config, &self.cli_overrides)?;

        crate::toml::validate_config(&config)?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(config: &mut QrytiToml, overrides: &HashMap<String, String>) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                "QRYTI_API_URL" => config.api.base_url = value.clone(),
                "QRYTI_TIMEOUT_MS" => config.api.timeout_ms = parse_number(key, value)?,
                "QRYTI_MAX_RETRIES" => config.retry.max_retries = parse_number(key, value)?,
                "QRYTI_RETRY_DELAY_MS" => config.retry.base_delay_ms = parse_number(key, value)?,
                "QRYTI_CACHE_ENABLED" => config.cache.enabled = parse_bool(key, value)?,
                "QRYTI_CACHE_TTL_MS" => config.cache.ttl_ms = parse_number(key, value)?,
                "QRYTI_CACHE_MAX_SIZE" => config.cache.max_size = parse_number(key, value)?,
                _ => {
                    // Unknown environment variable, ignore
                }
            }
        }

        Ok(())
    }

    /// Apply CLI flag overrides
    fn apply_cli_overrides(config: &mut QrytiToml, overrides: &HashMap<String, String>) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                "api-url" => config.api.base_url = value.clone(),
                "timeout-ms" => config.api.timeout_ms = parse_number(key, value)?,
                "no-cache" => config.cache.enabled = !parse_bool(key, value)?,
                _ => {
                    // Unknown CLI override, ignore
                }
            }
        }

        Ok(())
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| ENV_KEYS.contains(&key.as_str()))
            .collect()
    }
}

/// Deep-merge `overlay` into `base`; nested tables merge, other values replace
fn merge_tables(base: &mut ::toml::Table, overlay: ::toml::Table) {
    for (key, value) in overlay {
        match value {
            ::toml::Value::Table(incoming) => match base.get_mut(&key) {
                Some(::toml::Value::Table(existing)) => merge_tables(existing, incoming),
                _ => {
                    base.insert(key, ::toml::Value::Table(incoming));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> ConfigResult<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| QrytiError::ConfigValidation {
        field: field.to_string(),
        reason: format!("'{}' is not a valid number: {}", value, e),
    })
}

fn parse_bool(field: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(QrytiError::ConfigValidation {
            field: field.to_string(),
            reason: format!("'{}' is not a boolean", value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn table(content: &str) -> ::toml::Table {
        crate::toml::parse_table(content).unwrap()
    }

    fn temp_utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_project_overrides_global() {
        let config = ConfigLayering::new()
            .with_global(table("[api]\nbase_url = \"https://global.qryti.com\"\ntimeout_ms = 1000\n"))
            .with_project(table("[api]\nbase_url = \"https://project.qryti.com\"\n"))
            .build()
            .unwrap();

        assert_eq!(config.api.base_url, "https://project.qryti.com");
        // Nested tables merge, so the global timeout survives
        assert_eq!(config.api.timeout_ms, 1000);
    }

    #[test]
    fn test_env_overrides_project() {
        let mut env = HashMap::new();
        env.insert("QRYTI_API_URL".to_string(), "https://env.qryti.com".to_string());
        env.insert("QRYTI_CACHE_ENABLED".to_string(), "false".to_string());
        env.insert("QRYTI_MAX_RETRIES".to_string(), "5".to_string());
        env.insert("QRYTI_UNRELATED".to_string(), "x".to_string());

        let config = ConfigLayering::new()
            .with_project(table("[api]\nbase_url = \"https://project.qryti.com\"\n"))
            .with_env(env)
            .build()
            .unwrap();

        assert_eq!(config.api.base_url, "https://env.qryti.com");
        assert!(!config.cache.enabled);
        assert_eq!(config.retry.max_retries, 5);
    }

    #[test]
    fn test_cli_overrides_env() {
        let mut env = HashMap::new();
        env.insert("QRYTI_API_URL".to_string(), "https://env.qryti.com".to_string());
        let mut cli = HashMap::new();
        cli.insert("api-url".to_string(), "https://cli.qryti.com".to_string());
        cli.insert("no-cache".to_string(), "true".to_string());

        let config = ConfigLayering::new().with_env(env).with_cli(cli).build().unwrap();
        assert_eq!(config.api.base_url, "https://cli.qryti.com");
        assert!(!config.cache.enabled);
    }

    #[test]
    fn test_invalid_env_value() {
        let mut env = HashMap::new();
        env.insert("QRYTI_TIMEOUT_MS".to_string(), "soon".to_string());

        let err = ConfigLayering::new().with_env(env).build().unwrap_err();
        assert!(matches!(err, QrytiError::ConfigValidation { ref field, .. } if field == "QRYTI_TIMEOUT_MS"));
    }

    #[test]
    fn test_merged_result_is_validated() {
        let mut env = HashMap::new();
        env.insert("QRYTI_CACHE_MAX_SIZE".to_string(), "0".to_string());

        assert!(ConfigLayering::new().with_env(env).build().is_err());
    }

    #[test]
    fn test_resolve_config_path_walks_up() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_utf8(&temp_dir);
        std::fs::write(root.join(CONFIG_FILE), "").unwrap();
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let loader = ConfigLoader::new(nested).with_global_path(None);
        assert_eq!(loader.resolve_config_path(CONFIG_FILE), Some(root.join(CONFIG_FILE)));
    }

    #[tokio::test]
    async fn test_load_without_files_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new(temp_utf8(&temp_dir)).with_global_path(None);

        let (config, sources) = loader.load(HashMap::new()).await.unwrap();
        assert_eq!(config.cache.max_size, QrytiToml::default().cache.max_size);
        assert_eq!(sources.first(), Some(&ConfigSource::Defaults));
    }

    #[tokio::test]
    async fn test_load_global_and_project() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_utf8(&temp_dir);
        let global = root.join("global.toml");
        std::fs::write(&global, "[cache]\nmax_size = 7\n").unwrap();
        let project_dir = root.join("project");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::write(project_dir.join(CONFIG_FILE), "[cache]\nttl_ms = 1234\n").unwrap();

        let loader = ConfigLoader::new(project_dir.clone()).with_global_path(Some(global.clone()));
        let (config, sources) = loader.load(HashMap::new()).await.unwrap();

        assert_eq!(config.cache.max_size, 7);
        assert_eq!(config.cache.ttl_ms, 1234);
        assert!(sources.contains(&ConfigSource::Global(global)));
        assert!(sources.contains(&ConfigSource::Project(project_dir.join(CONFIG_FILE))));
    }

    #[tokio::test]
    async fn test_load_reports_file_in_error() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_utf8(&temp_dir);
        std::fs::write(root.join(CONFIG_FILE), "[api\n").unwrap();

        let loader = ConfigLoader::new(root).with_global_path(None);
        match loader.load(HashMap::new()).await.unwrap_err() {
            QrytiError::ConfigParse { message } => assert!(message.contains(CONFIG_FILE)),
            other => panic!("Expected ConfigParse, got {:?}", other),
        }
    }
}
