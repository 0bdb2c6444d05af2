use crate::utils::error::{Result, TriageError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    pub preferred_url: Option<String>,
    pub fallback_urls: Option<Vec<String>>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

impl TomlConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(TriageError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| TriageError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Expand `${VAR}` placeholders; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| TriageError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Preferred URL, ignoring a placeholder whose variable was not set.
    pub fn preferred_url(&self) -> Option<&str> {
        self.backend
            .preferred_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty() && !is_unresolved(url))
    }

    pub fn fallback_urls(&self) -> Option<&[String]> {
        self.backend.fallback_urls.as_deref()
    }

    pub fn timeout_seconds(&self) -> Option<u64> {
        self.backend.timeout_seconds
    }

    pub fn log_json(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    pub fn verbose(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.verbose).unwrap_or(false)
    }

    /// Range and URL checks on whatever the file sets.
    pub fn validate_config(&self) -> Result<()> {
        if let Some(url) = self.preferred_url() {
            validation::validate_url("backend.preferred_url", url)?;
        }

        if let Some(urls) = self.fallback_urls() {
            validation::validate_urls("backend.fallback_urls", urls)?;
        }

        if let Some(timeout) = self.timeout_seconds() {
            validation::validate_range("backend.timeout_seconds", timeout, 1, 60)?;
        }

        Ok(())
    }
}

fn is_unresolved(value: &str) -> bool {
    value.contains("${")
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
