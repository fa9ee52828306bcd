//! CLI configuration.
//!
//! Loaded from a TOML file; command-line flags override individual values.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgoraConfig {
    /// Domain separator mixed into attestation digests
    pub domain_separator: String,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Output configuration
    pub output: OutputConfig,
}

impl Default for AgoraConfig {
    fn default() -> Self {
        Self {
            domain_separator: "verify".to_string(),
            logging: LoggingConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl AgoraConfig {
    /// Load configuration from file.
    /// Path is validated to prevent directory traversal.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let path_str = path.to_string_lossy();
        if path_str.contains("..") {
            anyhow::bail!("Invalid path: directory traversal detected");
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: AgoraConfig = toml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        Ok(config)
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.domain_separator.trim().is_empty() {
            anyhow::bail!("Domain separator cannot be empty");
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            anyhow::bail!("Unknown log format '{}', expected pretty or json", self.logging.format);
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive
    pub level: String,
    /// Log format (json|pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}
