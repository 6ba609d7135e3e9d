//! Layered configuration for leadboard.
//!
//! Settings are read from `leadboard.toml`, then overridden by environment
//! variables, then by CLI flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [backend]
//! url = "http://localhost:5000"
//! timeout_secs = 15
//!
//! [board]
//! show_empty_stages = true
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "leadboard.toml";
pub const CONFIG_ENV: &str = "LEADBOARD_CONFIG";
pub const BACKEND_URL_ENV: &str = "LEADBOARD_BACKEND_URL";
pub const TIMEOUT_ENV: &str = "LEADBOARD_TIMEOUT_SECS";

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSection {
    /// Base URL of the lead-tracking API
    #[serde(default = "default_backend_url")]
    pub url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_backend_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Terminal rendering settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSection {
    #[serde(default = "default_show_empty_stages")]
    pub show_empty_stages: bool,
}

fn default_show_empty_stages() -> bool {
    true
}

impl Default for BoardSection {
    fn default() -> Self {
        Self {
            show_empty_stages: default_show_empty_stages(),
        }
    }
}

/// Parsed leadboard.toml.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadboardToml {
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub board: BoardSection,
}

impl LeadboardToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse leadboard.toml")
    }

    /// Load `path` if it exists, otherwise defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating the parent directory.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize leadboard.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !is_valid_backend_url(&self.backend.url) {
            warnings.push(format!(
                "Invalid backend url '{}': should start with http:// or https://",
                self.backend.url
            ));
        }

        if self.backend.timeout_secs == 0 {
            warnings.push("timeout_secs is 0: every request would time out immediately".to_string());
        }

        warnings
    }
}

fn is_valid_backend_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.trim_matches('/').is_empty())
}

/// Default config location: `LEADBOARD_CONFIG`, else `<config dir>/leadboard/leadboard.toml`.
pub fn default_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }
    let dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(dir.join("leadboard").join(CONFIG_FILE))
}

/// Effective configuration after file, environment and CLI layering.
#[derive(Debug, Clone)]
pub struct LeadboardConfig {
    /// Where the file layer was read from (it may not exist)
    pub path: PathBuf,
    /// Parsed leadboard.toml (defaults when missing)
    pub toml: LeadboardToml,
    /// CLI override for the backend URL
    pub cli_backend_url: Option<String>,
}

impl LeadboardConfig {
    /// Load from `path`, or from the default location when `None`.
    pub fn new(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(p) => p,
            None => default_config_path()?,
        };
        let toml = LeadboardToml::load_or_default(&path)?;
        Ok(Self {
            path,
            toml,
            cli_backend_url: None,
        })
    }

    /// Create a config with CLI overrides.
    pub fn with_cli_args(path: Option<PathBuf>, backend_url: Option<String>) -> Result<Self> {
        let mut config = Self::new(path)?;
        config.cli_backend_url = backend_url;
        Ok(config)
    }

    /// Backend URL (CLI → env → file).
    pub fn backend_url(&self) -> String {
        self.cli_backend_url
            .clone()
            .or_else(|| std::env::var(BACKEND_URL_ENV).ok().filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| self.toml.backend.url.clone())
    }

    /// Request timeout (env → file). Unparseable env values are ignored.
    pub fn timeout(&self) -> Duration {
        let secs = std::env::var(TIMEOUT_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(self.toml.backend.timeout_secs);
        Duration::from_secs(secs)
    }

    pub fn show_empty_stages(&self) -> bool {
        self.toml.board.show_empty_stages
    }

    /// Validate the file layer plus the effective backend URL.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = self.toml.validate();
        let effective = self.backend_url();
        if effective != self.toml.backend.url && !is_valid_backend_url(&effective) {
            warnings.push(format!("Invalid backend url override '{}'", effective));
        }
        warnings
    }
}
