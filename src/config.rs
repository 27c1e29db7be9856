use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::graph::Format;

const DEFAULT_CONFIG_PATH: &str = "kubegraph.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// File the configuration was read from; `None` for built-in defaults.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Graph construction settings
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    /// Scope assigned to objects that carry no `metadata.clusterName`.
    #[serde(default = "default_cluster")]
    pub cluster: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            cluster: default_cluster(),
        }
    }
}

/// Output settings
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_format")]
    pub format: String,
    /// Output file; stdout when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            path: None,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_cluster() -> String {
    "default".to_string()
}

fn default_format() -> String {
    Format::Cypher.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in KUBEGRAPH_CONFIG environment variable (must exist)
    /// 2. ./kubegraph.toml in current directory (defaults are used if missing)
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let (config_path, explicit) = match std::env::var("KUBEGRAPH_CONFIG") {
            Ok(path) => (PathBuf::from(path), true),
            Err(_) => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if !explicit && !config_path.exists() {
            log::debug!("No {} found, using default configuration", DEFAULT_CONFIG_PATH);
            return Ok(Self::default());
        }

        Self::from_file(&config_path)
    }

    /// Load and validate a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config = Self::from_toml_str(&config_str)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.graph.cluster.trim().is_empty() {
            anyhow::bail!("graph.cluster must not be empty");
        }

        self.output_format()?;

        Ok(())
    }

    /// Parsed output format
    pub fn output_format(&self) -> Result<Format> {
        self.output
            .format
            .parse::<Format>()
            .with_context(|| "output.format must be one of: cypher, graphviz")
    }

    /// Default scope for objects without a cluster name
    pub fn cluster(&self) -> &str {
        &self.graph.cluster
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize config tests that mutate process-wide cwd and env so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    const TEST_CONFIG: &str = r#"
[graph]
cluster = "prod-eu"

[output]
format = "graphviz"
path = "graph.dot"

[logging]
level = "debug"
"#;

    /// Restores cwd when dropped (e.g. on panic).
    struct CwdGuard(std::path::PathBuf);
    impl Drop for CwdGuard {
        fn drop(&mut self) {
            let _ = std::env::set_current_dir(&self.0);
        }
    }

    fn with_config_env(config_path: Option<&Path>, f: impl FnOnce()) {
        let original = std::env::var("KUBEGRAPH_CONFIG").ok();
        match config_path {
            Some(p) => std::env::set_var("KUBEGRAPH_CONFIG", p.to_str().unwrap()),
            None => std::env::remove_var("KUBEGRAPH_CONFIG"),
        }
        f();
        std::env::remove_var("KUBEGRAPH_CONFIG");
        if let Some(val) = original {
            std::env::set_var("KUBEGRAPH_CONFIG", val);
        }
    }

    #[test]
    fn test_config_from_str() {
        let config = Config::from_toml_str(TEST_CONFIG).unwrap();
        assert_eq!(config.cluster(), "prod-eu");
        assert_eq!(config.output_format().unwrap(), Format::Graphviz);
        assert_eq!(config.output.path, Some(PathBuf::from("graph.dot")));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_config_defaults_for_missing_sections() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.cluster(), "default");
        assert_eq!(config.output_format().unwrap(), Format::Cypher);
        assert!(config.output.path.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_rejects_unknown_format() {
        let err = Config::from_toml_str("[output]\nformat = \"svg\"\n").unwrap_err();
        assert!(format!("{:#}", err).contains("output.format"));
    }

    #[test]
    fn test_config_rejects_empty_cluster() {
        let err = Config::from_toml_str("[graph]\ncluster = \"  \"\n").unwrap_err();
        assert!(err.to_string().contains("graph.cluster"));
    }

    #[test]
    fn test_config_load_from_env_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("custom.toml");
        fs::write(&config_path, TEST_CONFIG).unwrap();
        with_config_env(Some(&config_path), || {
            let config = Config::load();
            assert!(config.is_ok(), "Config::load() failed: {:?}", config.err());
            let config = config.unwrap();
            assert_eq!(config.cluster(), "prod-eu");
            assert_eq!(config.source.as_deref(), Some(config_path.as_path()));
        });
    }

    #[test]
    fn test_config_load_missing_default_uses_defaults() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let original_dir = std::env::current_dir().unwrap();
        let _cwd = CwdGuard(original_dir);
        std::env::set_current_dir(temp_dir.path()).unwrap();
        with_config_env(None, || {
            let config = Config::load().unwrap();
            assert_eq!(config.cluster(), "default");
            assert!(config.source.is_none());
        });
    }

    #[test]
    fn test_config_load_missing_explicit_path_fails() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        with_config_env(Some(Path::new("nonexistent-kubegraph.toml")), || {
            assert!(Config::load().is_err());
        });
    }
}
