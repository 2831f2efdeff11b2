//! Run orchestration.
//!
//! Sequences the steps of one run and prints the user-facing status lines:
//!
//! 1. Probe the proxy port (unreachable: stop)
//! 2. Verify connectivity through the proxy (failed: ask; declined: stop)
//! 3. Build the proxy environment
//! 4. Launch the child and wait for it
//!
//! Every outcome is reported and returned as a [`RunOutcome`]; none of them
//! is an error for the caller. Only a failure to write the status output is.

use std::io::{self, Write};

use tracing::{debug, info};

use crate::config::Config;
use crate::env::ProxyEnv;
use crate::launcher::{Launch, LaunchError, LaunchOutcome, LaunchSpec};
use crate::probe::{self, ProbeOutcome};
use crate::prompt::Confirm;
use crate::verify::{self, ConnectivityReport, EchoClient};

const RULE_WIDTH: usize = 50;

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// The proxy port did not accept a connection.
    ProxyUnreachable(ProbeOutcome),
    /// Connectivity failed and the user chose not to continue.
    Declined,
    /// The child ran.
    Completed(LaunchOutcome),
    /// The child could not be started.
    LaunchFailed(LaunchError),
}

/// Drives one run against a loaded configuration.
pub struct Orchestrator<W> {
    config: Config,
    out: W,
}

impl<W: Write> Orchestrator<W> {
    /// Create an orchestrator that prints status to `out`.
    pub fn new(config: Config, out: W) -> Self {
        Self { config, out }
    }

    /// Consume the orchestrator and return its output sink.
    pub fn into_output(self) -> W {
        self.out
    }

    /// Run all steps.
    ///
    /// `echo` is `None` when the connectivity check is skipped.
    pub async fn run<E, L>(
        &mut self,
        echo: Option<&E>,
        confirm: &mut dyn Confirm,
        launcher: &L,
    ) -> io::Result<RunOutcome>
    where
        E: EchoClient,
        L: Launch,
    {
        let proxy_url = self.config.proxy.url();
        let spec = LaunchSpec::from_config(&self.config.launch);

        writeln!(self.out, "Starting {} via proxy", spec.target.display())?;
        writeln!(self.out, "HTTP proxy: {}", proxy_url)?;
        writeln!(self.out, "{}", "-".repeat(RULE_WIDTH))?;

        // 1. Port probe
        let host = self.config.proxy.host.clone();
        let port = self.config.proxy.port;
        let probe = probe::probe(&host, port, self.config.proxy.probe_timeout()).await;
        if !probe.is_reachable() {
            info!("Proxy port {}:{} unreachable: {}", host, port, probe);
            writeln!(self.out, "Proxy port {}:{} is not reachable ({})", host, port, probe)?;
            writeln!(
                self.out,
                "Hint: make sure the proxy is running and its HTTP listener is enabled"
            )?;
            return Ok(RunOutcome::ProxyUnreachable(probe));
        }
        writeln!(self.out, "Proxy port {}:{} is reachable", host, port)?;

        // 2. Connectivity check
        match echo {
            Some(client) => {
                writeln!(self.out, "Testing proxy connection...")?;
                match verify::verify(client).await {
                    ConnectivityReport::Verified { origin } => {
                        writeln!(self.out, "Proxy connection OK, public IP: {}", origin)?;
                    }
                    ConnectivityReport::Failed { reason } => {
                        writeln!(self.out, "Proxy connection test failed: {}", reason)?;
                        writeln!(self.out, "Possible causes:")?;
                        writeln!(
                            self.out,
                            "  - the selected node only speaks SOCKS5 (switch the proxy to HTTP mode)"
                        )?;
                        writeln!(self.out, "  - the upstream proxy node is down")?;
                        writeln!(self.out, "  - the network connection is unavailable")?;
                        self.out.flush()?;

                        if !confirm.confirm("Continue anyway?") {
                            info!("User declined to launch after failed connectivity check");
                            writeln!(self.out, "Launch cancelled")?;
                            return Ok(RunOutcome::Declined);
                        }
                        debug!("User chose to launch despite failed connectivity check");
                    }
                }
            }
            None => {
                debug!("Connectivity check skipped");
                writeln!(self.out, "Skipping proxy connection test")?;
            }
        }

        // 3. Environment
        let proxy_env = ProxyEnv::from_config(&self.config.proxy);

        // 4. Launch
        writeln!(self.out)?;
        writeln!(self.out, "All HTTP(S) requests of the child go through {}", proxy_url)?;
        if self.config.launch.service_port != 0 {
            writeln!(
                self.out,
                "Service expected at http://localhost:{}",
                self.config.launch.service_port
            )?;
        }
        writeln!(self.out, "Press Ctrl+C to stop")?;
        writeln!(self.out, "{}", "=".repeat(RULE_WIDTH))?;
        self.out.flush()?;

        let outcome = match launcher.launch(&spec, &proxy_env).await {
            Ok(LaunchOutcome::Interrupted) => {
                writeln!(self.out, "\nService stopped")?;
                RunOutcome::Completed(LaunchOutcome::Interrupted)
            }
            Ok(LaunchOutcome::Exited(status)) => {
                if !status.success() {
                    writeln!(self.out, "\n{} exited with {}", spec.target.display(), status)?;
                }
                RunOutcome::Completed(LaunchOutcome::Exited(status))
            }
            Err(e) => {
                info!("Launch failed: {}", e);
                if e.is_missing_file() {
                    writeln!(self.out, "\n{}", e)?;
                } else {
                    writeln!(self.out, "\nLaunch failed: {}", e)?;
                }
                RunOutcome::LaunchFailed(e)
            }
        };
        self.out.flush()?;

        Ok(outcome)
    }
}
