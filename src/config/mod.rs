//! Configuration system for via-proxy.
//!
//! This module provides TOML configuration loading with hierarchy merging.
//! The tool only reads configuration; it never writes files back.
//!
//! # Configuration Hierarchy
//!
//! 1. Embedded defaults (`defaults/config.toml`)
//! 2. System config: `/etc/via-proxy/config.toml`
//! 3. User config: `~/.config/via-proxy/config.toml`
//! 4. Additional config file (via `--config` flag)
//! 5. CLI flags (highest priority)
//!
//! # Example
//!
//! ```toml
//! [proxy]
//! port = 7897
//! no_proxy = [".corp.example.com"]
//!
//! [launch]
//! target = "app.py"
//!
//! [launch.env]
//! PYTHONUNBUFFERED = "1"
//! ```

mod error;
mod loader;
mod schema;

pub use error::ConfigError;
pub use loader::{ConfigLoader, EMBEDDED_DEFAULTS, SYSTEM_CONFIG_PATH};
pub use schema::{Config, LaunchConfig, ProxyConfig, VerifyConfig};
