//! Configuration management for the CLI
//!
//! This module handles loading and merging configuration from:
//! - Default values
//! - Configuration files (YAML/JSON/TOML)
//! - Environment variables (credentials always win over file values)
//! - Command-line arguments

use crate::error::{Error, Result};
use mediarelay_core::http::{RetryPolicy, TransportConfig};
use mediarelay_core::registry::credential_vars;
use mediarelay_core::{Credentials, ProviderDescriptor, ProviderRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const REDACTED: &str = "***REDACTED***";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-provider overrides keyed by provider name
    pub providers: BTreeMap<String, ProviderConfig>,

    /// Credential values keyed by environment variable name
    pub credentials: BTreeMap<String, String>,

    /// Retry settings
    pub retry: RetryConfig,

    /// HTTP settings
    pub http: HttpConfig,

    /// Output settings
    pub output: OutputConfig,
}

/// Provider-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL override
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Sends per provider, including the first
    pub max_attempts: u32,

    /// Fixed wait between sends
    pub delay_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where generated images are written
    pub directory: PathBuf,

    /// Show progress indicators
    pub progress: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            delay_secs: policy.delay.as_secs(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        let transport = TransportConfig::default();
        Self {
            timeout_secs: transport.timeout_secs,
            connect_timeout_secs: transport.connect_timeout_secs,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            progress: true,
        }
    }
}

impl Config {
    /// Load configuration from a file, choosing the parser by extension
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let config = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            _ => {
                return Err(Error::InvalidFormat {
                    path: path.to_path_buf(),
                    expected: "yaml, json or toml".to_string(),
                })
            }
        };

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => {
                        tracing::debug!(path = %path.display(), "Loaded configuration");
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to load config");
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            Self::from_file(path)
        } else {
            Self::load()
        }
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        for name in [".mediarelay", "mediarelay"] {
            for ext in ["yaml", "json", "toml"] {
                paths.push(PathBuf::from(format!("{}.{}", name, ext)));
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let dir = config_dir.join("mediarelay");
            for ext in ["yaml", "json", "toml"] {
                paths.push(dir.join(format!("config.{}", ext)));
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            for ext in ["yaml", "json", "toml"] {
                paths.push(home_dir.join(format!(".mediarelay.{}", ext)));
            }
        }

        paths
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry.max_attempts).with_delay(Duration::from_secs(self.retry.delay_secs))
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            timeout_secs: self.http.timeout_secs,
            connect_timeout_secs: self.http.connect_timeout_secs,
            ..TransportConfig::default()
        }
    }

    /// Credentials for a catalog: file values, overridden by the environment
    pub fn credentials(&self, catalog: &[ProviderDescriptor]) -> Credentials {
        let vars = credential_vars(catalog);
        let from_env = Credentials::from_env(vars.iter().copied());

        vars.into_iter().fold(Credentials::new(), |creds, var| {
            match from_env.get(var).or_else(|| self.credentials.get(var).map(String::as_str)) {
                Some(value) => creds.with(var, value),
                None => creds,
            }
        })
    }

    /// Apply configured base URL overrides to a registry
    pub fn apply_overrides(&self, mut registry: ProviderRegistry) -> ProviderRegistry {
        for (name, provider) in &self.providers {
            if let Some(base_url) = &provider.base_url {
                registry = registry.with_base_url(name, base_url.clone());
            }
        }
        registry
    }

    /// Copy of this configuration with every credential value masked
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for value in copy.credentials.values_mut() {
            *value = REDACTED.to_string();
        }
        copy
    }

    /// Names of credential variables visible in the environment
    pub fn env_credentials(&self, catalog: &[ProviderDescriptor]) -> Vec<String> {
        let vars = credential_vars(catalog);
        let from_env = Credentials::from_env(vars.iter().copied());
        vars.into_iter()
            .filter(|var| from_env.contains(var))
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediarelay_core::registry::{image_generation_catalog, NANOBANANA};
    use std::io::Write;

    fn write_config(ext: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(&format!(".{}", ext))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_match_core() {
        let config = Config::default();
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.transport_config().timeout_secs, 120);
        assert_eq!(config.output.directory, PathBuf::from("."));
    }

    #[test]
    fn test_yaml_config() {
        let file = write_config(
            "yaml",
            "retry:\n  max_attempts: 5\n  delay_secs: 1\nproviders:\n  nanobanana:\n    base_url: http://localhost:9000\n",
        );
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.retry_policy().max_attempts, 5);
        assert_eq!(config.retry_policy().delay, Duration::from_secs(1));
        assert_eq!(
            config.providers[NANOBANANA].base_url.as_deref(),
            Some("http://localhost:9000")
        );
    }

    #[test]
    fn test_toml_config() {
        let file = write_config("toml", "[http]\ntimeout_secs = 30\n\n[output]\ndirectory = \"out\"\n");
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.http.connect_timeout_secs, 10);
        assert_eq!(config.output.directory, PathBuf::from("out"));
    }

    #[test]
    fn test_json_config_and_unknown_extension() {
        let file = write_config("json", r#"{"retry": {"max_attempts": 2}}"#);
        assert_eq!(Config::from_file(file.path()).unwrap().retry.max_attempts, 2);

        let file = write_config("ini", "retry=2");
        assert!(matches!(Config::from_file(file.path()), Err(Error::InvalidFormat { .. })));
        assert!(matches!(
            Config::from_file(Path::new("/no/such/config.yaml")),
            Err(Error::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_file_credentials_and_overrides() {
        let mut config = Config::default();
        config
            .credentials
            .insert("MEDIARELAY_TEST_ONLY_KEY".to_string(), "file-value".to_string());
        config.providers.insert(
            NANOBANANA.to_string(),
            ProviderConfig {
                base_url: Some("http://127.0.0.1:1".to_string()),
            },
        );

        let registry = config.apply_overrides(ProviderRegistry::image_generation(
            Credentials::new().with("ALLAPI_KEY", "k"),
        ));
        let resolved = registry.resolve(Some(NANOBANANA)).unwrap();
        assert!(resolved[0].endpoint().starts_with("http://127.0.0.1:1/"));

        // Unknown variables are not part of any catalog and are never picked up
        let creds = config.credentials(&image_generation_catalog());
        assert!(!creds.contains("MEDIARELAY_TEST_ONLY_KEY"));
    }

    #[test]
    fn test_redacted_masks_secrets() {
        let mut config = Config::default();
        config.credentials.insert("ALLAPI_KEY".to_string(), "sk-live".to_string());
        let shown = serde_json::to_string(&config.redacted()).unwrap();
        assert!(!shown.contains("sk-live"));
        assert!(shown.contains(REDACTED));
    }
}
