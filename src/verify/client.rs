//! reqwest-backed echo client that routes every request through the proxy.

use std::time::Duration;

use tracing::debug;

use super::error::{VerifyError, error_chain};
use super::{EchoClient, EchoResponse};

/// Default IP-echo endpoint.
pub const DEFAULT_ECHO_URL: &str = "https://httpbin.org/ip";

/// Default bound for the echo request.
pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(8);

/// Echo client whose only route to the network is the configured proxy.
///
/// System proxy variables and `NO_PROXY` are ignored so the check measures
/// the proxy under test and nothing else.
#[derive(Debug, Clone)]
pub struct ProxiedEchoClient {
    client: reqwest::Client,
    url: String,
}

impl ProxiedEchoClient {
    /// Build a client for `echo_url` routed through `proxy_url`.
    pub fn new(proxy_url: &str, echo_url: &str, timeout: Duration) -> Result<Self, VerifyError> {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| VerifyError::ClientBuild(error_chain(&e)))?;

        let client = reqwest::Client::builder()
            .proxy(proxy)
            .timeout(timeout)
            .build()
            .map_err(|e| VerifyError::ClientBuild(error_chain(&e)))?;

        Ok(Self {
            client,
            url: echo_url.to_string(),
        })
    }

    /// The endpoint this client queries.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl EchoClient for ProxiedEchoClient {
    async fn fetch(&self) -> Result<EchoResponse, VerifyError> {
        debug!("GET {} through proxy", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| VerifyError::Transport(error_chain(&e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| VerifyError::Transport(error_chain(&e)))?;

        debug!("Echo endpoint answered HTTP {} ({} bytes)", status, body.len());
        Ok(EchoResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_with_valid_proxy() {
        let client =
            ProxiedEchoClient::new("http://localhost:7890", DEFAULT_ECHO_URL, DEFAULT_VERIFY_TIMEOUT)
                .unwrap();
        assert_eq!(client.url(), "https://httpbin.org/ip");
    }

    #[test]
    fn test_build_with_invalid_proxy_url() {
        let result = ProxiedEchoClient::new("not a url", DEFAULT_ECHO_URL, DEFAULT_VERIFY_TIMEOUT);
        assert!(matches!(result, Err(VerifyError::ClientBuild(_))));
    }

    #[tokio::test]
    async fn test_dead_proxy_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = ProxiedEchoClient::new(
            &format!("http://127.0.0.1:{}", port),
            "http://echo.test/ip",
            Duration::from_secs(2),
        )
        .unwrap();

        let result = client.fetch().await;
        assert!(matches!(result, Err(VerifyError::Transport(_))));
    }
}
