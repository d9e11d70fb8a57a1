use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::utils::{load_text_file_with_guess_encoding, substitute_env_vars};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    NotFound(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("missing required setting `{0}` (pass --{0} or set it in the config file)")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub translator_config: TranslatorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Vec<String>,
}

fn default_endpoint() -> String {
    "https://api.cognitive.microsofttranslator.com".to_string()
}

fn default_api_version() -> String {
    "3.0".to_string()
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_version: default_api_version(),
            api_key: None,
            region: None,
            from: None,
            to: Vec::new(),
        }
    }
}

/// Values given on the command line; each one set here wins over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub region: Option<String>,
    pub from: Option<String>,
    pub to: Vec<String>,
}

/// Fully resolved translator settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatorSettings {
    pub endpoint: String,
    pub api_version: String,
    pub api_key: String,
    pub region: String,
    pub from: String,
    pub to: Vec<String>,
}

impl Config {
    /// Load configuration from a YAML or JSON file, chosen by extension.
    ///
    /// `${VAR}` references are replaced with environment variables before parsing.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let path_str = path.display().to_string();
        if !path.exists() {
            return Err(ConfigError::NotFound(path_str));
        }

        let content = load_text_file_with_guess_encoding(path).map_err(|source| ConfigError::Read {
            path: path_str.clone(),
            source,
        })?;
        let content = substitute_env_vars(&content).map_err(|e| ConfigError::Parse {
            path: path_str.clone(),
            message: e.to_string(),
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let config = if is_json {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path_str.clone(),
                message: e.to_string(),
            })?
        } else {
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path_str.clone(),
                message: e.to_string(),
            })?
        };

        debug!("Loaded configuration from {}", path_str);
        Ok(config)
    }
}

impl TranslatorConfig {
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(endpoint) = overrides.endpoint {
            self.endpoint = endpoint;
        }
        if overrides.api_key.is_some() {
            self.api_key = overrides.api_key;
        }
        if overrides.region.is_some() {
            self.region = overrides.region;
        }
        if overrides.from.is_some() {
            self.from = overrides.from;
        }
        if !overrides.to.is_empty() {
            self.to = overrides.to;
        }
    }

    /// Check that every value a request needs is present.
    pub fn resolve(self) -> Result<TranslatorSettings, ConfigError> {
        let to: Vec<String> = self
            .to
            .into_iter()
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
            .collect();
        if to.is_empty() {
            return Err(ConfigError::Missing("to"));
        }

        Ok(TranslatorSettings {
            endpoint: self.endpoint,
            api_version: self.api_version,
            api_key: required(self.api_key, "apikey")?,
            region: required(self.region, "region")?,
            from: required(self.from, "from")?,
            to,
        })
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn complete_overrides() -> Overrides {
        Overrides {
            endpoint: None,
            api_key: Some("key".to_string()),
            region: Some("westeurope".to_string()),
            from: Some("en".to_string()),
            to: vec!["fr".to_string()],
        }
    }

    #[test]
    fn defaults_point_at_azure() {
        let config = TranslatorConfig::default();
        assert_eq!(config.endpoint, "https://api.cognitive.microsofttranslator.com");
        assert_eq!(config.api_version, "3.0");
    }

    #[test]
    fn loads_yaml_with_env_substitution() {
        std::env::set_var("XLIFF_LOCALIZER_CONFIG_TEST_KEY", "from-env");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("localizer.yaml");
        fs::write(
            &path,
            "translator_config:\n  api_key: ${XLIFF_LOCALIZER_CONFIG_TEST_KEY}\n  region: westeurope\n  from: en\n  to: [fr, de]\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        let settings = config.translator_config.resolve().unwrap();
        assert_eq!(settings.api_key, "from-env");
        assert_eq!(settings.region, "westeurope");
        assert_eq!(settings.to, vec!["fr", "de"]);
        assert_eq!(settings.endpoint, default_endpoint());
    }

    #[test]
    fn loads_json_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("localizer.json");
        fs::write(&path, r#"{"translator_config": {"endpoint": "http://localhost:9000", "from": "en"}}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.translator_config.endpoint, "http://localhost:9000");
        assert_eq!(config.translator_config.from.as_deref(), Some("en"));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = Config::load(Path::new("/nonexistent/localizer.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn invalid_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("localizer.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(Config::load(&path).unwrap_err(), ConfigError::Parse { .. }));
    }

    #[test]
    fn errors_name_the_config_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "translator_config: [").unwrap();

        let message = Config::load(&path).unwrap_err().to_string();
        assert!(message.contains(&path.display().to_string()));
    }

    #[test]
    fn command_line_wins_over_file() {
        let mut config = TranslatorConfig {
            api_key: Some("file-key".to_string()),
            region: Some("eastus".to_string()),
            from: Some("de".to_string()),
            to: vec!["it".to_string()],
            ..TranslatorConfig::default()
        };
        config.apply(complete_overrides());

        let settings = config.resolve().unwrap();
        assert_eq!(settings.api_key, "key");
        assert_eq!(settings.region, "westeurope");
        assert_eq!(settings.from, "en");
        assert_eq!(settings.to, vec!["fr"]);
    }

    #[test]
    fn unset_overrides_keep_file_values() {
        let mut config = TranslatorConfig {
            api_key: Some("file-key".to_string()),
            ..TranslatorConfig::default()
        };
        config.apply(Overrides::default());
        assert_eq!(config.api_key.as_deref(), Some("file-key"));
    }

    #[test]
    fn missing_values_are_named() {
        let mut config = TranslatorConfig::default();
        config.apply(Overrides {
            api_key: None,
            ..complete_overrides()
        });
        assert!(matches!(config.resolve().unwrap_err(), ConfigError::Missing("apikey")));

        let mut config = TranslatorConfig::default();
        config.apply(Overrides {
            to: vec![" ".to_string()],
            ..complete_overrides()
        });
        assert!(matches!(config.resolve().unwrap_err(), ConfigError::Missing("to")));
    }
}
