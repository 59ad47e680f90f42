//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value. The
//! CLI layer owns config; the core crate only sees the
//! [`ProvisionSettings`] derived from it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables: `RIGGER__SECTION__KEY`, e.g.
//!    `RIGGER__PROVISIONING__POLL_ATTEMPTS=10`
//! 3. Config file: `--config FILE`, else `.rigger.toml` in the current
//!    directory, else `config.toml` in the user config directory
//! 4. Built-in defaults (always present)

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use rigger_core::application::ProvisionSettings;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".rigger.toml";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Output settings.
    pub output: OutputConfig,
    /// Container engine and readiness settings.
    pub provisioning: ProvisioningConfig,
    /// Environment file settings.
    pub env: EnvConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    /// Engine argv prefix, e.g. `["docker", "compose"]` or `["podman", "compose"]`.
    pub engine: Vec<String>,
    pub manifest_file: String,
    pub start_timeout_secs: u64,
    pub poll_interval_secs: u64,
    pub poll_attempts: u32,
    /// Request containers for every backend unless `--no-docker` is given.
    pub use_containers: bool,
    /// Directory of `<service>.yml` fragment overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stubs_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Environment file, relative to the application directory.
    pub file: String,
    /// Write resolved settings into the environment file.
    pub write: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let settings = ProvisionSettings::default();
        Self {
            output: OutputConfig {
                no_color: false,
                format: "human".into(),
            },
            provisioning: ProvisioningConfig {
                engine: settings.engine,
                manifest_file: settings.manifest_file,
                start_timeout_secs: settings.start_timeout.as_secs(),
                poll_interval_secs: settings.poll_interval.as_secs(),
                poll_attempts: settings.poll_attempts,
                use_containers: true,
                stubs_dir: None,
            },
            env: EnvConfig {
                file: ".env".into(),
                write: true,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then file, then environment.
    ///
    /// An explicit `config_file` must exist; the implicit locations are
    /// optional.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let defaults =
            Config::try_from(&Self::default()).context("Failed to build default configuration")?;

        let mut builder = Config::builder().add_source(defaults);

        builder = match config_file {
            Some(path) => builder.add_source(File::from(path.as_path()).required(true)),
            None => builder
                .add_source(File::from(Self::config_path()).required(false))
                .add_source(File::from(PathBuf::from(LOCAL_CONFIG_FILE)).required(false)),
        };

        let config = builder
            .add_source(
                Environment::with_prefix("RIGGER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(" ")
                    .with_list_parse_key("provisioning.engine"),
            )
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid configuration values")
    }

    /// Parse a TOML document layered over the defaults, without the
    /// environment. Used to validate edits before they are written.
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let defaults =
            Config::try_from(&Self::default()).context("Failed to build default configuration")?;

        Config::builder()
            .add_source(defaults)
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration values")
    }

    /// Path to the user-level configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.rigger.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "rigger", "rigger")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE))
    }

    /// The file `config set` edits: `--config`, else a local
    /// `.rigger.toml` when present, else the user-level file.
    pub fn active_path(config_file: Option<&PathBuf>) -> PathBuf {
        match config_file {
            Some(path) => path.clone(),
            None if Path::new(LOCAL_CONFIG_FILE).is_file() => PathBuf::from(LOCAL_CONFIG_FILE),
            None => Self::config_path(),
        }
    }

    /// Settings handed to the provisioning service.
    pub fn provision_settings(&self) -> ProvisionSettings {
        let p = &self.provisioning;
        let defaults = ProvisionSettings::default();
        ProvisionSettings {
            engine: if p.engine.is_empty() {
                defaults.engine
            } else {
                p.engine.clone()
            },
            manifest_file: p.manifest_file.clone(),
            start_timeout: Duration::from_secs(p.start_timeout_secs),
            poll_interval: Duration::from_secs(p.poll_interval_secs),
            poll_attempts: p.poll_attempts.max(1),
        }
    }
}
