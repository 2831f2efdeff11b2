//! Launcher that runs a [`LaunchSpec`] as a real child process.

use std::future::Future;
use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tracing::{debug, info, warn};

use super::{Launch, LaunchError, LaunchOutcome, LaunchSpec};
use crate::env::ProxyEnv;

/// Time the child gets to exit after an interrupt, and again after SIGTERM.
///
/// A second interrupt during either wait kills the child at once.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Spawns the child and waits on it, stopping on Ctrl+C.
#[derive(Debug, Clone)]
pub struct ChildLauncher {
    grace: Duration,
}

impl ChildLauncher {
    /// Create a launcher with the default grace period.
    pub fn new() -> Self {
        Self {
            grace: DEFAULT_GRACE_PERIOD,
        }
    }

    /// Override the grace period.
    #[must_use]
    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Run the child until it exits or an interrupt arrives.
    ///
    /// `interrupt` is called once for the first interrupt and once more while
    /// the child is being stopped. [`Launch::launch`] passes
    /// `tokio::signal::ctrl_c`. If the interrupt source itself errors, the
    /// child is simply awaited.
    pub async fn launch_until<F, I>(
        &self,
        spec: &LaunchSpec,
        env: &ProxyEnv,
        mut interrupt: F,
    ) -> Result<LaunchOutcome, LaunchError>
    where
        F: FnMut() -> I,
        I: Future<Output = io::Result<()>>,
    {
        let mut cmd = spec.command(env)?;

        info!(
            "Launching {} {}",
            spec.interpreter,
            spec.resolved_target().display()
        );
        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                LaunchError::InterpreterNotFound {
                    program: spec.interpreter.clone(),
                    source: e,
                }
            } else {
                LaunchError::SpawnFailed {
                    program: spec.interpreter.clone(),
                    source: e,
                }
            }
        })?;
        debug!("Child started with PID {:?}", child.id());

        let event = tokio::select! {
            status = child.wait() => Event::Exited(status),
            signal = interrupt() => Event::Interrupt(signal),
        };

        match event {
            Event::Exited(status) => {
                let status = status.map_err(LaunchError::WaitFailed)?;
                info!("Child exited with {}", status);
                Ok(LaunchOutcome::Exited(status))
            }
            Event::Interrupt(Ok(())) => {
                info!("Interrupted, stopping child");
                self.stop(&mut child, interrupt()).await;
                Ok(LaunchOutcome::Interrupted)
            }
            Event::Interrupt(Err(e)) => {
                warn!("Could not listen for Ctrl+C ({}), waiting for child", e);
                let status = child.wait().await.map_err(LaunchError::WaitFailed)?;
                Ok(LaunchOutcome::Exited(status))
            }
        }
    }

    /// Wait out the grace period, then escalate to SIGTERM and SIGKILL.
    ///
    /// `again` resolving skips straight to SIGKILL.
    async fn stop<I>(&self, child: &mut Child, again: I)
    where
        I: Future<Output = io::Result<()>>,
    {
        let again = async move {
            if let Err(e) = again.await {
                debug!("Not listening for a second interrupt: {}", e);
                std::future::pending::<()>().await;
            }
        };
        let mut again = std::pin::pin!(again);

        for terminate in [false, true] {
            if terminate {
                let Some(pid) = child.id() else {
                    return;
                };
                use nix::sys::signal::{Signal, kill};
                use nix::unistd::Pid;

                debug!("Sending SIGTERM to PID {}", pid);
                if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                    warn!("Failed to send SIGTERM to child: {}", e);
                    break;
                }
            }

            let waited = tokio::select! {
                status = tokio::time::timeout(self.grace, child.wait()) => Stop::Waited(status),
                () = &mut again => Stop::Forced,
            };
            match waited {
                Stop::Waited(Ok(Ok(status))) => {
                    debug!("Child exited with {}", status);
                    return;
                }
                Stop::Waited(Ok(Err(e))) => {
                    warn!("Failed to wait for child: {}", e);
                }
                Stop::Waited(Err(_)) => {}
                Stop::Forced => {
                    info!("Interrupted again, killing child");
                    break;
                }
            }
        }

        warn!("Killing child");
        if let Err(e) = child.kill().await {
            warn!("Failed to kill child: {}", e);
        }
    }
}

impl Default for ChildLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl Launch for ChildLauncher {
    async fn launch(&self, spec: &LaunchSpec, env: &ProxyEnv) -> Result<LaunchOutcome, LaunchError> {
        self.launch_until(spec, env, tokio::signal::ctrl_c).await
    }
}

enum Event {
    Exited(io::Result<ExitStatus>),
    Interrupt(io::Result<()>),
}

enum Stop {
    Waited(Result<io::Result<ExitStatus>, tokio::time::error::Elapsed>),
    Forced,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::DEFAULT_NO_PROXY;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::pin::Pin;
    use std::time::Instant;
    use tempfile::tempdir;

    fn sh_spec(dir: &Path, script: &str) -> LaunchSpec {
        std::fs::write(dir.join("run.sh"), script).unwrap();
        LaunchSpec {
            interpreter: "sh".to_string(),
            target: PathBuf::from("run.sh"),
            args: vec![],
            work_dir: Some(dir.to_path_buf()),
            env: HashMap::new(),
        }
    }

    fn proxy_env() -> ProxyEnv {
        ProxyEnv::new("http://localhost:7890", DEFAULT_NO_PROXY)
    }

    fn never() -> impl Future<Output = io::Result<()>> {
        std::future::pending()
    }

    #[tokio::test]
    async fn test_child_exit_status() {
        let dir = tempdir().unwrap();
        let spec = sh_spec(dir.path(), "exit 3\n");

        let outcome = ChildLauncher::new()
            .launch_until(&spec, &proxy_env(), never)
            .await
            .unwrap();

        match outcome {
            LaunchOutcome::Exited(status) => assert_eq!(status.code(), Some(3)),
            other => panic!("Expected Exited, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_child_sees_proxy_env() {
        let dir = tempdir().unwrap();
        let spec = sh_spec(
            dir.path(),
            "printf '%s|%s|%s' \"$HTTPS_PROXY\" \"$http_proxy\" \"$no_proxy\" > env.out\n",
        );

        ChildLauncher::new()
            .launch_until(&spec, &proxy_env(), never)
            .await
            .unwrap();

        let seen = std::fs::read_to_string(dir.path().join("env.out")).unwrap();
        assert_eq!(
            seen,
            "http://localhost:7890|http://localhost:7890|localhost,127.0.0.1,::1"
        );
    }

    #[tokio::test]
    async fn test_missing_interpreter() {
        let dir = tempdir().unwrap();
        let mut spec = sh_spec(dir.path(), "exit 0\n");
        spec.interpreter = "definitely-not-an-interpreter-7890".to_string();

        let result = ChildLauncher::new()
            .launch_until(&spec, &proxy_env(), never)
            .await;

        assert!(matches!(result, Err(LaunchError::InterpreterNotFound { .. })));
    }

    #[tokio::test]
    async fn test_missing_target_does_not_spawn() {
        let dir = tempdir().unwrap();
        let spec = LaunchSpec {
            interpreter: "sh".to_string(),
            target: PathBuf::from("main.py"),
            args: vec![],
            work_dir: Some(dir.path().to_path_buf()),
            env: HashMap::new(),
        };

        let result = ChildLauncher::new()
            .launch_until(&spec, &proxy_env(), never)
            .await;

        assert!(matches!(result, Err(LaunchError::TargetNotFound { .. })));
    }

    type Interrupt = Pin<Box<dyn Future<Output = io::Result<()>>>>;

    /// Fires once after `delay`, then never again.
    fn interrupt_once(delay: Duration) -> impl FnMut() -> Interrupt {
        let mut fired = false;
        move || -> Interrupt {
            if fired {
                Box::pin(std::future::pending::<io::Result<()>>())
            } else {
                fired = true;
                Box::pin(async move {
                    tokio::time::sleep(delay).await;
                    Ok(())
                })
            }
        }
    }

    #[tokio::test]
    async fn test_interrupt_stops_child() {
        let dir = tempdir().unwrap();
        let spec = sh_spec(dir.path(), "exec sleep 30\n");

        let start = Instant::now();
        let outcome = ChildLauncher::new()
            .with_grace_period(Duration::from_millis(200))
            .launch_until(&spec, &proxy_env(), interrupt_once(Duration::from_millis(100)))
            .await
            .unwrap();

        assert_eq!(outcome, LaunchOutcome::Interrupted);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_second_interrupt_kills_without_grace() {
        let dir = tempdir().unwrap();
        let spec = sh_spec(dir.path(), "exec sleep 30\n");

        let start = Instant::now();
        let outcome = ChildLauncher::new()
            .with_grace_period(Duration::from_secs(30))
            .launch_until(&spec, &proxy_env(), || async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(outcome, LaunchOutcome::Interrupted);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_failing_interrupt_source_waits_for_child() {
        let dir = tempdir().unwrap();
        let spec = sh_spec(dir.path(), "exit 0\n");

        let outcome = ChildLauncher::new()
            .launch_until(&spec, &proxy_env(), || async {
                Err(io::Error::other("no signal handler"))
            })
            .await
            .unwrap();

        assert!(matches!(outcome, LaunchOutcome::Exited(status) if status.success()));
    }
}
