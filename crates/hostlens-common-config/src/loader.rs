//! Configuration file loading and parsing.

use crate::types::AgentConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config loading errors. All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },
}

/// Configuration loader.
pub struct ConfigLoader {
    path: PathBuf,
}

impl ConfigLoader {
    /// Create a loader for the given config file.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load and validate the configuration.
    ///
    /// A missing file is an error: without it the agent would run with
    /// every monitor disabled, which is never what a deployment wants.
    pub fn load(&self) -> Result<AgentConfig, ConfigError> {
        if !self.path.exists() {
            return Err(ConfigError::NotFound {
                path: self.path.clone(),
            });
        }

        let contents = std::fs::read_to_string(&self.path)?;
        let expanded = self.expand_env_vars(&contents)?;

        let config: AgentConfig =
            serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;

        self.validate(&config)?;
        Ok(config)
    }

    /// Expand environment variables in the form `${VAR}` or `${VAR:-default}`.
    fn expand_env_vars(&self, content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").unwrap();

        for cap in re.captures_iter(content) {
            let full_match = cap.get(0).unwrap().as_str();
            let var_name = &cap[1];
            let default = cap.get(2).map(|m| m.as_str());

            let value = match std::env::var(var_name) {
                Ok(v) => v,
                Err(_) => match default {
                    Some(d) => d.to_string(),
                    None => {
                        return Err(ConfigError::EnvVarNotFound {
                            var: var_name.to_string(),
                        })
                    }
                },
            };

            result = result.replace(full_match, &value);
        }

        Ok(result)
    }

    /// Validate configuration values.
    fn validate(&self, config: &AgentConfig) -> Result<(), ConfigError> {
        if config.process_poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError {
                message: "process_poll_interval_secs must be at least 1".to_string(),
            });
        }

        if config.network_poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError {
                message: "network_poll_interval_secs must be at least 1".to_string(),
            });
        }

        if config.store.path.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "store.path must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("hostlens.yaml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path().join("absent.yaml"));
        assert!(matches!(loader.load(), Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_load_full_config() {
        let dir = tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
monitor_processes: true
monitor_network: true
monitor_files:
  enabled: true
  directories: ["/tmp/watched"]
process_poll_interval_secs: 2
store:
  path: ":memory:"
"#,
        );

        let config = ConfigLoader::new(path).load().unwrap();
        assert!(config.monitor_processes);
        assert!(config.monitor_network);
        assert!(config.monitor_files.enabled);
        assert_eq!(config.monitor_files.directories.len(), 1);
        assert_eq!(config.process_poll_interval_secs, 2);
        // Unspecified key keeps its default.
        assert_eq!(config.network_poll_interval_secs, 5);
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = write_config(&dir, "monitor_processes: [unclosed\n");
        assert!(matches!(
            ConfigLoader::new(path).load(),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let dir = tempdir().unwrap();
        let path = write_config(&dir, "process_poll_interval_secs: 0\n");
        assert!(matches!(
            ConfigLoader::new(path).load(),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_env_expansion_with_default() {
        let dir = tempdir().unwrap();
        let path = write_config(&dir, "store:\n  path: \"${HOSTLENS_TEST_UNSET_VAR:-:memory:}\"\n");
        let config = ConfigLoader::new(path).load().unwrap();
        assert_eq!(config.store.path, ":memory:");
    }

    #[test]
    fn test_env_expansion_missing_var_is_error() {
        let dir = tempdir().unwrap();
        let path = write_config(&dir, "store:\n  path: \"${HOSTLENS_TEST_UNSET_VAR_NO_DEFAULT}\"\n");
        assert!(matches!(
            ConfigLoader::new(path).load(),
            Err(ConfigError::EnvVarNotFound { .. })
        ));
    }
}
