//! Configuration for `taskcopy`.
//!
//! Layered with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskcopy/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::prompt::terminal::DEFAULT_MAX_VISIBLE_OPTIONS;
use crate::replication::DEFAULT_CONCURRENCY;
use crate::search::DEFAULT_SETTLE_DELAY;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// No Phabricator base URL anywhere.
    #[error("no Phabricator URL configured (set PHABRICATOR_URL or --url)")]
    MissingUrl,
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    conduit: ConduitFileConfig,
    search: SearchFileConfig,
    replication: ReplicationFileConfig,
    ui: UiFileConfig,
}

/// `[conduit]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConduitFileConfig {
    url: Option<String>,
    token: Option<String>,
    timeout_secs: Option<u64>,
}

/// `[search]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SearchFileConfig {
    settle_delay_ms: Option<u64>,
}

/// `[replication]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ReplicationFileConfig {
    concurrency: Option<usize>,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    max_visible_options: Option<usize>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Phabricator base URL, e.g. `https://phab.example.com/`.
    pub url: Option<String>,
    /// Conduit API token.
    pub token: Option<String>,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Quiet period before a search query is sent.
    pub settle_delay: Duration,
    /// Number of edits in flight at once.
    pub concurrency: usize,
    /// Options listed by the picker.
    pub max_visible_options: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            request_timeout: Duration::from_secs(30),
            settle_delay: DEFAULT_SETTLE_DELAY,
            concurrency: DEFAULT_CONCURRENCY,
            max_visible_options: DEFAULT_MAX_VISIBLE_OPTIONS,
        }
    }
}

/// Where and how to reach Conduit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConduitSettings {
    /// Base URL of the install.
    pub url: String,
    /// API token; empty if none was configured.
    pub token: String,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
}

impl AppConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an
    /// error. Otherwise the default path is tried and silently ignored if
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Priority: CLI/env > file > default.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            url: cli.url.clone().or_else(|| file.conduit.url.clone()),
            token: cli.token.clone().or_else(|| file.conduit.token.clone()),
            request_timeout: file
                .conduit
                .timeout_secs
                .map_or(defaults.request_timeout, Duration::from_secs),
            settle_delay: file
                .search
                .settle_delay_ms
                .map_or(defaults.settle_delay, Duration::from_millis),
            concurrency: cli
                .concurrency
                .or(file.replication.concurrency)
                .unwrap_or(defaults.concurrency)
                .max(1),
            max_visible_options: file
                .ui
                .max_visible_options
                .unwrap_or(defaults.max_visible_options)
                .max(1),
        }
    }

    /// Connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingUrl`] if no non-blank URL is set. A
    /// missing token is not an error; it is sent empty.
    pub fn conduit_settings(&self) -> Result<ConduitSettings, ConfigError> {
        let url = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingUrl)?;
        Ok(ConduitSettings {
            url: url.to_string(),
            token: self.token.clone().unwrap_or_default(),
            timeout: self.request_timeout,
        })
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(
    version,
    about = "Copy resolved Maniphest tasks into another project"
)]
pub struct CliArgs {
    /// Base URL of the Phabricator install.
    #[arg(long, env = "PHABRICATOR_URL")]
    pub url: Option<String>,

    /// Conduit API token.
    #[arg(long, env = "PHABRICATOR_CONDUIT_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Number of tasks copied at once.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Path to config file (default: `~/.config/taskcopy/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKCOPY_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/taskcopy.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist. Otherwise the default
/// path is tried and a missing file is treated as empty config.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("taskcopy").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
