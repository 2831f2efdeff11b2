//! Configuration schema definitions.
//!
//! This module defines the structure of the via-proxy configuration files.
//! Every field is optional in a file; empty strings, zero numbers and empty
//! lists mean "not set here" and leave the lower-priority value in place.

use serde::Deserialize;
use std::collections::HashMap;
use std::net::Ipv6Addr;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ConfigError;

/// Top-level configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Local proxy endpoint and bypass list.
    #[serde(default)]
    pub proxy: ProxyConfig,

    /// Outbound connectivity check.
    #[serde(default)]
    pub verify: VerifyConfig,

    /// Child process settings.
    #[serde(default)]
    pub launch: LaunchConfig,
}

impl Config {
    /// Merge another config into this one.
    ///
    /// Lists are appended, scalars are overridden, maps are merged with later
    /// values winning.
    pub fn merge(&mut self, other: Config) {
        self.proxy.merge(other.proxy);
        self.verify.merge(other.verify);
        self.launch.merge(other.launch);
    }

    /// Check that the merged configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.proxy.host.trim().is_empty() {
            return Err(invalid("proxy.host", "must not be empty"));
        }
        if self.proxy.port == 0 {
            return Err(invalid("proxy.port", "must be between 1 and 65535"));
        }
        match self.proxy.scheme() {
            "http" | "https" => {}
            other => {
                return Err(invalid(
                    "proxy.scheme",
                    &format!("unsupported scheme '{}' (expected http or https)", other),
                ));
            }
        }
        let proxy_url = self.proxy.url();
        if let Err(e) = reqwest::Url::parse(&proxy_url) {
            return Err(invalid(
                "proxy.host",
                &format!("'{}' does not form a valid proxy URL: {}", proxy_url, e),
            ));
        }
        match reqwest::Url::parse(&self.verify.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(invalid(
                    "verify.url",
                    &format!("'{}' is not an http(s) URL", self.verify.url),
                ));
            }
        }
        if self.launch.interpreter.trim().is_empty() {
            return Err(invalid("launch.interpreter", "must not be empty"));
        }
        if self.launch.target.as_os_str().is_empty() {
            return Err(invalid("launch.target", "must not be empty"));
        }
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// Local proxy settings.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProxyConfig {
    /// Host the proxy listens on.
    #[serde(default)]
    pub host: String,

    /// Port the proxy listens on.
    #[serde(default)]
    pub port: u16,

    /// URL scheme used to reach the proxy (`http` when unset).
    #[serde(default)]
    pub scheme: String,

    /// Hosts that bypass the proxy (`NO_PROXY`).
    #[serde(default)]
    pub no_proxy: Vec<String>,

    /// Port probe timeout in milliseconds.
    #[serde(default)]
    pub probe_timeout_ms: u32,
}

impl ProxyConfig {
    fn merge(&mut self, other: ProxyConfig) {
        if !other.host.is_empty() {
            self.host = other.host;
        }
        if other.port != 0 {
            self.port = other.port;
        }
        if !other.scheme.is_empty() {
            self.scheme = other.scheme;
        }
        for entry in other.no_proxy {
            if !self.no_proxy.contains(&entry) {
                self.no_proxy.push(entry);
            }
        }
        if other.probe_timeout_ms != 0 {
            self.probe_timeout_ms = other.probe_timeout_ms;
        }
    }

    /// The scheme, defaulting to `http`.
    pub fn scheme(&self) -> &str {
        if self.scheme.is_empty() {
            "http"
        } else {
            &self.scheme
        }
    }

    /// Proxy URL handed to the verifier and the child environment.
    ///
    /// A bare IPv6 literal host is bracketed.
    pub fn url(&self) -> String {
        if self.host.parse::<Ipv6Addr>().is_ok() {
            format!("{}://[{}]:{}", self.scheme(), self.host, self.port)
        } else {
            format!("{}://{}:{}", self.scheme(), self.host, self.port)
        }
    }

    /// Bypass list joined the way `NO_PROXY` expects it.
    pub fn no_proxy_value(&self) -> String {
        self.no_proxy.join(",")
    }

    /// Port probe timeout.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.probe_timeout_ms))
    }
}

/// Connectivity check settings.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct VerifyConfig {
    /// IP-echo endpoint queried through the proxy.
    #[serde(default)]
    pub url: String,

    /// Request timeout in milliseconds.
    #[serde(default)]
    pub timeout_ms: u32,
}

impl VerifyConfig {
    fn merge(&mut self, other: VerifyConfig) {
        if !other.url.is_empty() {
            self.url = other.url;
        }
        if other.timeout_ms != 0 {
            self.timeout_ms = other.timeout_ms;
        }
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.timeout_ms))
    }
}

/// Child process settings.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LaunchConfig {
    /// Program used to run the target file.
    #[serde(default)]
    pub interpreter: String,

    /// File handed to the interpreter.
    #[serde(default)]
    pub target: PathBuf,

    /// Extra arguments passed after the target.
    ///
    /// Arguments belong to their target: a layer that sets `target` replaces
    /// the inherited arguments instead of appending to them.
    #[serde(default)]
    pub args: Vec<String>,

    /// Port the child is expected to serve on. Only printed.
    #[serde(default)]
    pub service_port: u16,

    /// Additional environment variables for the child.
    ///
    /// The proxy variables are applied after these and always win.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl LaunchConfig {
    fn merge(&mut self, other: LaunchConfig) {
        if !other.interpreter.is_empty() {
            self.interpreter = other.interpreter;
        }
        if !other.target.as_os_str().is_empty() {
            self.target = other.target;
            self.args = other.args;
        } else {
            self.args.extend(other.args);
        }
        if other.service_port != 0 {
            self.service_port = other.service_port;
        }
        self.env.extend(other.env);
    }
}
