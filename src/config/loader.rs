//! Configuration loading with hierarchy merging.
//!
//! Configuration is loaded from multiple sources and merged in order:
//!
//! 1. Embedded defaults (compiled into binary)
//! 2. System config: `/etc/via-proxy/config.toml`
//! 3. User config: `~/.config/via-proxy/config.toml`
//! 4. Additional config file (via `--config` flag)
//! 5. CLI flags (highest priority)
//!
//! Lists (no_proxy, args) are **merged** (appended).
//! Scalars (port, timeouts) are **overridden**.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::ConfigError;
use super::schema::{Config, LaunchConfig, ProxyConfig, VerifyConfig};
use crate::cli::Cli;

/// System-wide configuration path.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/via-proxy/config.toml";

/// User configuration directory name.
pub const USER_CONFIG_DIR: &str = "via-proxy";

/// User configuration filename.
pub const USER_CONFIG_FILE: &str = "config.toml";

/// Defaults compiled into the binary.
pub const EMBEDDED_DEFAULTS: &str = include_str!("../../defaults/config.toml");

/// Configuration loader with support for hierarchy merging.
pub struct ConfigLoader {
    /// Path to system-wide configuration.
    system_path: PathBuf,
    /// Path to user configuration.
    user_path: PathBuf,
}

impl ConfigLoader {
    /// Create a new ConfigLoader with default paths.
    #[must_use]
    pub fn new() -> Self {
        let user_config_dir = dirs::config_dir()
            .map(|p| p.join(USER_CONFIG_DIR))
            .unwrap_or_else(|| PathBuf::from(".config").join(USER_CONFIG_DIR));

        Self {
            system_path: PathBuf::from(SYSTEM_CONFIG_PATH),
            user_path: user_config_dir.join(USER_CONFIG_FILE),
        }
    }

    /// Create a ConfigLoader with custom paths (for testing).
    #[must_use]
    pub fn with_paths(system_path: PathBuf, user_path: PathBuf) -> Self {
        Self {
            system_path,
            user_path,
        }
    }

    /// Parse the embedded defaults.
    pub fn embedded_defaults() -> Result<Config, ConfigError> {
        toml::from_str(EMBEDDED_DEFAULTS).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<embedded:defaults>"),
            source: e,
        })
    }

    /// Load, merge and validate configuration from all sources.
    ///
    /// Missing system/user files are skipped. A missing `--config` file,
    /// invalid TOML, or an invalid merged value is an error.
    pub fn load(&self, cli: &Cli) -> Result<Config, ConfigError> {
        let mut config = Self::embedded_defaults()?;
        debug!("Loaded embedded default configuration");

        if let Some(system_config) = self.load_file(&self.system_path)? {
            config.merge(system_config);
            debug!("Loaded system config from {:?}", self.system_path);
        } else {
            debug!("No system config found at {:?}", self.system_path);
        }

        if let Some(user_config) = self.load_file(&self.user_path)? {
            config.merge(user_config);
            debug!("Loaded user config from {:?}", self.user_path);
        } else {
            debug!("No user config found at {:?}", self.user_path);
        }

        if let Some(ref cli_config_path) = cli.config {
            match self.load_file(cli_config_path)? {
                Some(cli_config) => {
                    config.merge(cli_config);
                    debug!("Loaded additional config from {:?}", cli_config_path);
                }
                None => {
                    // Unlike system/user config, a missing CLI-specified config is an error
                    return Err(ConfigError::ReadError {
                        path: cli_config_path.clone(),
                        source: std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            "Specified config file not found",
                        ),
                    });
                }
            }
        }

        config.merge(Self::cli_overrides(cli));
        config.validate()?;

        Ok(config)
    }

    /// Build a config layer out of CLI flags.
    fn cli_overrides(cli: &Cli) -> Config {
        Config {
            proxy: ProxyConfig {
                host: cli.host.clone().unwrap_or_default(),
                port: cli.port.unwrap_or_default(),
                ..Default::default()
            },
            verify: VerifyConfig {
                url: cli.echo_url.clone().unwrap_or_default(),
                ..Default::default()
            },
            launch: LaunchConfig {
                interpreter: cli.interpreter.clone().unwrap_or_default(),
                target: cli.target.clone().unwrap_or_default(),
                args: cli.target_args.clone(),
                ..Default::default()
            },
        }
    }

    /// Load a single TOML file. `Ok(None)` when the file does not exist.
    fn load_file(&self, path: &Path) -> Result<Option<Config>, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .map(Some)
                .map_err(|e| ConfigError::ParseError {
                    path: path.to_path_buf(),
                    source: e,
                }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
