//! Proxy environment for the child process.
//!
//! The variables are collected into a [`ProxyEnv`] value and injected into the
//! child's [`Command`]; the parent's own environment is never modified.

use tokio::process::Command;

use crate::config::ProxyConfig;

/// Variables that receive the proxy URL.
pub const PROXY_VARS: [&str; 4] = ["HTTP_PROXY", "HTTPS_PROXY", "http_proxy", "https_proxy"];

/// Variables that receive the bypass list.
pub const NO_PROXY_VARS: [&str; 2] = ["NO_PROXY", "no_proxy"];

/// Default bypass list.
pub const DEFAULT_NO_PROXY: &str = "localhost,127.0.0.1,::1";

/// The six proxy variables and their values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEnv {
    vars: Vec<(&'static str, String)>,
}

impl ProxyEnv {
    /// Build the variable set for a proxy URL and bypass list.
    pub fn new(proxy_url: &str, no_proxy: &str) -> Self {
        let vars = PROXY_VARS
            .iter()
            .map(|name| (*name, proxy_url.to_string()))
            .chain(
                NO_PROXY_VARS
                    .iter()
                    .map(|name| (*name, no_proxy.to_string())),
            )
            .collect();
        Self { vars }
    }

    /// Build the variable set from the proxy section of the config.
    pub fn from_config(proxy: &ProxyConfig) -> Self {
        Self::new(&proxy.url(), &proxy.no_proxy_value())
    }

    /// Value of one variable.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All variables in a fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(key, value)| (*key, value.as_str()))
    }

    /// Set every variable on `cmd`, replacing inherited or earlier values.
    pub fn apply(&self, cmd: &mut Command) {
        cmd.envs(self.iter());
    }
}
