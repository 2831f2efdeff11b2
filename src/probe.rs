//! Proxy port probing.
//!
//! A probe resolves the host and tries a TCP connection to each resolved
//! address until one succeeds. Resolution and all connection attempts share a
//! single deadline. The connected socket is dropped immediately.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpStream, lookup_host};
use tracing::{debug, trace};

/// Default bound for a whole probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Result of probing a TCP port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// A connection was established.
    Reachable,
    /// Every resolved address refused the connection.
    Refused,
    /// The deadline expired before any address accepted.
    TimedOut,
    /// The host name could not be resolved.
    ResolveFailed(String),
    /// Any other socket error (unreachable network, permission, ...).
    Failed(String),
}

impl ProbeOutcome {
    /// Collapse the outcome to the reachable/unreachable boolean.
    pub fn is_reachable(&self) -> bool {
        matches!(self, ProbeOutcome::Reachable)
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Reachable => write!(f, "reachable"),
            ProbeOutcome::Refused => write!(f, "connection refused"),
            ProbeOutcome::TimedOut => write!(f, "timed out"),
            ProbeOutcome::ResolveFailed(msg) => write!(f, "name resolution failed: {}", msg),
            ProbeOutcome::Failed(msg) => write!(f, "{}", msg),
        }
    }
}

/// Probe `host:port`, giving up after `timeout`.
pub async fn probe(host: &str, port: u16, timeout: Duration) -> ProbeOutcome {
    let outcome = match tokio::time::timeout(timeout, connect_any(host, port)).await {
        Ok(outcome) => outcome,
        Err(_) => ProbeOutcome::TimedOut,
    };
    debug!("Probe {}:{} -> {:?}", host, port, outcome);
    outcome
}

/// Boolean form of [`probe`].
pub async fn is_port_open(host: &str, port: u16, timeout: Duration) -> bool {
    probe(host, port, timeout).await.is_reachable()
}

async fn connect_any(host: &str, port: u16) -> ProbeOutcome {
    // "[::1]" is the URL form of an IPv6 literal; the resolver wants "::1"
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    let addrs: Vec<SocketAddr> = match lookup_host((host, port)).await {
        Ok(addrs) => addrs.collect(),
        Err(e) => return ProbeOutcome::ResolveFailed(e.to_string()),
    };
    if addrs.is_empty() {
        return ProbeOutcome::ResolveFailed(format!("no addresses for '{}'", host));
    }

    let mut last = ProbeOutcome::Refused;
    for addr in addrs {
        trace!("Connecting to {}", addr);
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                drop(stream);
                return ProbeOutcome::Reachable;
            }
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
                last = ProbeOutcome::Refused;
            }
            Err(e) => {
                last = ProbeOutcome::Failed(format!("{}: {}", addr, e));
            }
        }
    }
    last
}
