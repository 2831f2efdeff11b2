//! Outbound connectivity check through the proxy.
//!
//! One GET is sent to an IP-echo endpoint (by default `https://httpbin.org/ip`,
//! which answers `{"origin": "<public ip>"}`). The check succeeds only on
//! HTTP 200 with a JSON body carrying an `origin` string. There is no retry.
//!
//! The HTTP transport is behind [`EchoClient`] so the decision logic can be
//! exercised with canned responses.

mod client;
mod error;

pub use client::{DEFAULT_ECHO_URL, DEFAULT_VERIFY_TIMEOUT, ProxiedEchoClient};
pub use error::VerifyError;

use std::future::Future;

use serde::Deserialize;
use tracing::info;

/// Raw answer from the echo endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

/// Transport used by [`verify`].
pub trait EchoClient {
    /// Perform the single echo request.
    fn fetch(&self) -> impl Future<Output = Result<EchoResponse, VerifyError>> + Send;
}

/// Outcome of the connectivity check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityReport {
    /// The endpoint answered through the proxy.
    Verified {
        /// Public IP as seen by the endpoint.
        origin: String,
    },
    /// The check failed; `reason` is the raw error text.
    Failed {
        /// Human-readable failure reason.
        reason: String,
    },
}

impl ConnectivityReport {
    /// Whether the check passed.
    pub fn success(&self) -> bool {
        matches!(self, ConnectivityReport::Verified { .. })
    }

    /// The observed public IP, when the check passed.
    pub fn observed_ip(&self) -> Option<&str> {
        match self {
            ConnectivityReport::Verified { origin } => Some(origin),
            ConnectivityReport::Failed { .. } => None,
        }
    }
}

#[derive(Deserialize)]
struct EchoBody {
    origin: Option<String>,
}

/// Extract the `origin` field from a successful echo response.
pub fn parse_origin(response: &EchoResponse) -> Result<String, VerifyError> {
    if response.status != 200 {
        return Err(VerifyError::Status(response.status));
    }
    let body: EchoBody = serde_json::from_str(&response.body)?;
    body.origin.ok_or(VerifyError::MissingOrigin)
}

/// Run the connectivity check. Never fails; errors become
/// [`ConnectivityReport::Failed`].
pub async fn verify<C: EchoClient>(client: &C) -> ConnectivityReport {
    let result = match client.fetch().await {
        Ok(response) => parse_origin(&response),
        Err(e) => Err(e),
    };

    match result {
        Ok(origin) => {
            info!("Proxy connectivity verified, public IP {}", origin);
            ConnectivityReport::Verified { origin }
        }
        Err(e) => {
            info!("Proxy connectivity check failed: {}", e);
            ConnectivityReport::Failed {
                reason: e.to_string(),
            }
        }
    }
}
