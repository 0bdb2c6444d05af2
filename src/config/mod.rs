pub mod toml_config;

pub use toml_config::TomlConfig;

use crate::core::resolver::{DEFAULT_FALLBACK_BASES, DEFAULT_PREFERRED_BASE};
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::time::Duration;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

/// Environment variable consulted for the preferred backend URL.
pub const API_URL_ENV: &str = "TRIAGE_API_URL";
pub const DEFAULT_TIMEOUT_SECS: u64 = 3;

/// Effective backend settings after merging every configuration source.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub preferred_url: String,
    pub fallback_urls: Vec<String>,
    pub timeout: Duration,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            preferred_url: DEFAULT_PREFERRED_BASE.to_string(),
            fallback_urls: DEFAULT_FALLBACK_BASES.iter().map(|s| s.to_string()).collect(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl BackendSettings {
    pub fn with_preferred(preferred_url: impl Into<String>) -> Self {
        Self {
            preferred_url: preferred_url.into(),
            ..Self::default()
        }
    }

    /// Merge sources; precedence is flag > file > environment > built-in default.
    pub fn merge(
        flag_url: Option<&str>,
        flag_timeout_secs: Option<u64>,
        file: Option<&TomlConfig>,
    ) -> Self {
        let env_url = std::env::var(API_URL_ENV).ok().filter(|v| !v.trim().is_empty());

        let preferred_url = flag_url
            .map(str::to_string)
            .or_else(|| file.and_then(|f| f.preferred_url()).map(str::to_string))
            .or(env_url)
            .unwrap_or_else(|| DEFAULT_PREFERRED_BASE.to_string());

        let fallback_urls = file
            .and_then(|f| f.fallback_urls())
            .map(|urls| urls.to_vec())
            .unwrap_or_else(|| DEFAULT_FALLBACK_BASES.iter().map(|s| s.to_string()).collect());

        let timeout_secs = flag_timeout_secs
            .or_else(|| file.and_then(|f| f.timeout_seconds()))
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            preferred_url,
            fallback_urls,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

impl ConfigProvider for BackendSettings {
    fn preferred_base_url(&self) -> &str {
        &self.preferred_url
    }

    fn fallback_base_urls(&self) -> &[String] {
        &self.fallback_urls
    }

    fn request_timeout(&self) -> Duration {
        self.timeout
    }
}

impl Validate for BackendSettings {
    fn validate(&self) -> Result<()> {
        validation::validate_url("api_url", &self.preferred_url)?;
        validation::validate_urls("fallback_urls", &self.fallback_urls)?;
        validation::validate_range("timeout_seconds", self.timeout.as_secs(), 1, 60)?;
        Ok(())
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "triage")]
#[command(about = "Patient triage risk scoring with remote model failover")]
pub struct CliConfig {
    /// Preferred scoring backend base URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout_seconds: Option<u64>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Score a patient record (JSON file)
    Analyze {
        #[arg(long)]
        patient: PathBuf,
        /// Use the local rules only
        #[arg(long)]
        offline: bool,
    },
    /// Extract patient fields from a document via the parser backend
    Upload {
        file: PathBuf,
        /// Patient record (JSON) to merge the extracted fields into
        #[arg(long)]
        merge: Option<PathBuf>,
    },
    /// Show which backend the resolver picks
    Resolve,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn load_file_config(&self) -> Result<Option<TomlConfig>> {
        match &self.config {
            Some(path) => {
                let file = TomlConfig::from_file(path)?;
                file.validate()?;
                Ok(Some(file))
            }
            None => Ok(None),
        }
    }

    pub fn backend_settings(&self, file: Option<&TomlConfig>) -> BackendSettings {
        BackendSettings::merge(self.api_url.as_deref(), self.timeout_seconds, file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = BackendSettings::default();
        assert_eq!(settings.preferred_base_url(), "http://localhost:8000");
        assert_eq!(settings.fallback_base_urls().len(), 4);
        assert_eq!(settings.request_timeout(), Duration::from_secs(3));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_flag_wins_over_file() {
        let file = TomlConfig::from_toml_str(
            r#"
[backend]
preferred_url = "http://file-host:8000"
fallback_urls = ["http://backup:8000"]
timeout_seconds = 10
"#,
        )
        .unwrap();

        let settings = BackendSettings::merge(Some("http://flag-host:8000"), None, Some(&file));
        assert_eq!(settings.preferred_url, "http://flag-host:8000");
        assert_eq!(settings.fallback_urls, vec!["http://backup:8000".to_string()]);
        assert_eq!(settings.timeout, Duration::from_secs(10));

        let settings = BackendSettings::merge(None, Some(2), Some(&file));
        assert_eq!(settings.preferred_url, "http://file-host:8000");
        assert_eq!(settings.timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_with_preferred_keeps_default_fallbacks() {
        let settings = BackendSettings::with_preferred("http://10.0.0.5:8000");
        assert_eq!(settings.preferred_base_url(), "http://10.0.0.5:8000");
        assert_eq!(settings.fallback_base_urls()[0], "http://127.0.0.1:8000");

        let bad = BackendSettings::with_preferred("ftp://10.0.0.5");
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let settings = BackendSettings {
            timeout: Duration::from_secs(0),
            ..BackendSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_cli_parses_subcommands() {
        let cli = CliConfig::parse_from([
            "triage",
            "analyze",
            "--patient",
            "patient.json",
            "--offline",
            "--api-url",
            "http://localhost:8001",
        ]);

        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:8001"));
        match cli.command {
            Command::Analyze { patient, offline } => {
                assert_eq!(patient, PathBuf::from("patient.json"));
                assert!(offline);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
