//! Error types for the connectivity check.

use thiserror::Error;

/// Reasons a connectivity check can fail.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The HTTP client could not be configured (bad proxy URL, TLS setup).
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// The request did not produce a response (connect, TLS, timeout).
    #[error("Request failed: {0}")]
    Transport(String),

    /// The endpoint answered with something other than 200.
    #[error("HTTP {0}")]
    Status(u16),

    /// The body was not the expected JSON document.
    #[error("Invalid response body: {0}")]
    Body(#[from] serde_json::Error),

    /// The JSON document has no `origin` string.
    #[error("Response has no \"origin\" field")]
    MissingOrigin,
}

/// Render an error with its whole source chain, `outer: inner: root`.
///
/// reqwest's top-level message hides the interesting part ("connection
/// refused", "operation timed out") in its sources.
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
