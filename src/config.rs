//! Layered configuration: built-in defaults, an optional TOML file, then
//! `BLUE_DESTINATION__SECTION__KEY` environment variables, then CLI
//! overrides.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const ENV_PREFIX: &str = "BLUE_DESTINATION";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub collections: CollectionsConfig,
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub graceful_shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            graceful_shutdown_timeout_secs: 10,
        }
    }
}

/// Which document store implementation backs the services
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// REST endpoint of the hosted backend, e.g. `https://cloud.example.io/v1`
    pub endpoint: Option<String>,
    pub project_id: Option<String>,
    pub database_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// JSON fixtures preloaded into the in-memory backend
    pub fixtures: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            endpoint: None,
            project_id: None,
            database_id: None,
            api_key: None,
            timeout_secs: 30,
            fixtures: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionsConfig {
    pub packages: String,
    pub destinations: String,
    pub favorites: String,
    pub notifications: String,
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            packages: "packages".to_string(),
            destinations: "destinations".to_string(),
            favorites: "favorites".to_string(),
            notifications: "notifications".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Upper bound on candidates fetched from the store per search
    pub candidate_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            candidate_limit: 5000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Command-line overrides applied after file and environment sources
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub host: Option<String>,
    pub log_level: Option<String>,
    pub fixtures: Option<PathBuf>,
}

impl Config {
    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("blue-destination").join("config.toml"))
    }

    /// File the configuration is read from: the explicit path, else the
    /// default path when it exists
    pub fn source_path(path: Option<&Path>) -> Option<PathBuf> {
        match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.exists()),
        }
    }

    /// Load configuration from defaults, a file and the environment
    ///
    /// An explicit `path` must exist; the default path is used only if it
    /// does.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();

        if let Some(source) = Self::source_path(path) {
            debug!("Loading configuration from {}", source.display());
            builder = builder.add_source(::config::File::from(source).required(path.is_some()));
        }

        let config: Self = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load, apply overrides and validate in one go
    pub fn load_with_overrides(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(host) = &overrides.host {
            self.server.host.clone_from(host);
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level.clone_from(level);
        }
        if let Some(fixtures) = &overrides.fixtures {
            self.store.fixtures = Some(fixtures.clone());
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("server.port", "Port must be non-zero"));
        }

        if self.store.timeout_secs == 0 {
            return Err(invalid("store.timeout_secs", "Timeout must be positive"));
        }

        if self.search.candidate_limit == 0 {
            return Err(invalid(
                "search.candidate_limit",
                "Candidate limit must be positive",
            ));
        }

        for (field, name) in [
            ("collections.packages", &self.collections.packages),
            ("collections.destinations", &self.collections.destinations),
            ("collections.favorites", &self.collections.favorites),
            ("collections.notifications", &self.collections.notifications),
        ] {
            if name.trim().is_empty() {
                return Err(invalid(field, "Collection name cannot be empty"));
            }
        }

        if self.store.backend == StoreBackend::Remote {
            for (field, value) in [
                ("store.endpoint", &self.store.endpoint),
                ("store.project_id", &self.store.project_id),
                ("store.database_id", &self.store.database_id),
            ] {
                if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
                    return Err(invalid(field, "Required for the remote store backend"));
                }
            }
        }

        Ok(())
    }

    /// Render the effective configuration as TOML (secrets are omitted)
    pub fn to_toml(&self) -> Result<String> {
        let mut redacted = self.clone();
        redacted.store.api_key = None;
        toml::to_string_pretty(&redacted)
            .map_err(|e| Error::Service(format!("Failed to render configuration: {e}")))
    }
}

fn invalid(field: &str, reason: &str) -> Error {
    Error::InvalidInput {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.collections.packages, "packages");
    }

    #[test]
    fn test_source_path_prefers_explicit_file() {
        let explicit = Path::new("/etc/blue-destination/custom.toml");
        assert_eq!(
            Config::source_path(Some(explicit)).as_deref(),
            Some(explicit)
        );

        if let Some(default_path) = Config::default_path() {
            assert_eq!(
                Config::source_path(None).is_some(),
                default_path.exists()
            );
        }
    }

    #[test]
    fn test_remote_backend_requires_endpoint() {
        let mut config = Config::default();
        config.store.backend = StoreBackend::Remote;
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidInput { field, .. }) if field == "store.endpoint"
        ));

        config.store.endpoint = Some("https://backend.test/v1".to_string());
        config.store.project_id = Some("blue".to_string());
        config.store.database_id = Some("main".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.apply_overrides(&ConfigOverrides {
            port: Some(9090),
            host: Some("0.0.0.0".to_string()),
            log_level: Some("debug".to_string()),
            fixtures: None,
        });
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.logging.level, "debug");
        assert!(config.store.fixtures.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[server]\nport = 7070\n\n[collections]\npackages = \"travel_packages\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.server.port, 7070);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.collections.packages, "travel_packages");
        assert_eq!(config.collections.destinations, "destinations");
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let result = Config::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_to_toml_redacts_api_key() {
        let mut config = Config::default();
        config.store.api_key = Some("secret".to_string());
        let rendered = config.to_toml().unwrap();
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("[server]"));
    }
}
