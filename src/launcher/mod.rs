//! Child process launch.
//!
//! The target file is run with the configured interpreter
//! (`python3 main.py` by default). The child inherits stdin/stdout/stderr and
//! the parent's environment, plus `launch.env` and the proxy variables (which
//! always win). The launcher blocks until the child exits or Ctrl+C arrives.
//!
//! # Interrupts
//!
//! In a terminal, Ctrl+C delivers SIGINT to the whole foreground process
//! group, so the child sees it as well. The launcher reports
//! [`LaunchOutcome::Interrupted`], gives the child a grace period to exit,
//! then sends SIGTERM and finally SIGKILL. A second Ctrl+C while waiting
//! kills the child immediately.

mod child;
mod error;

pub use child::{ChildLauncher, DEFAULT_GRACE_PERIOD};
pub use error::LaunchError;

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;

use crate::config::LaunchConfig;
use crate::env::ProxyEnv;

/// What to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    /// Program that runs the target.
    pub interpreter: String,
    /// File handed to the interpreter.
    pub target: PathBuf,
    /// Arguments after the target.
    pub args: Vec<String>,
    /// Working directory of the child (current directory when `None`).
    pub work_dir: Option<PathBuf>,
    /// Extra environment, applied before the proxy variables.
    pub env: HashMap<String, String>,
}

impl LaunchSpec {
    /// Build a launch description from the launch section of the config.
    pub fn from_config(launch: &LaunchConfig) -> Self {
        Self {
            interpreter: launch.interpreter.clone(),
            target: launch.target.clone(),
            args: launch.args.clone(),
            work_dir: None,
            env: launch.env.clone(),
        }
    }

    /// Run the child in `dir`.
    #[must_use]
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Target path as seen from the parent.
    pub fn resolved_target(&self) -> PathBuf {
        match self.work_dir {
            Some(ref dir) if self.target.is_relative() => dir.join(&self.target),
            _ => self.target.clone(),
        }
    }

    /// Build the child command.
    ///
    /// Fails with [`LaunchError::TargetNotFound`] when the target is not a
    /// regular file.
    pub fn command(&self, proxy_env: &ProxyEnv) -> Result<Command, LaunchError> {
        let target = self.resolved_target();
        if !target.is_file() {
            return Err(LaunchError::TargetNotFound { path: target });
        }

        let mut cmd = Command::new(&self.interpreter);
        cmd.arg(&self.target).args(&self.args);
        if let Some(ref dir) = self.work_dir {
            cmd.current_dir(dir);
        }
        cmd.envs(&self.env);
        proxy_env.apply(&mut cmd);

        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        Ok(cmd)
    }
}

/// How a launched child finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The child exited on its own.
    Exited(ExitStatus),
    /// The user interrupted the run.
    Interrupted,
}

/// Something that can run a [`LaunchSpec`] to completion.
pub trait Launch {
    /// Spawn the child and wait for it.
    fn launch(
        &self,
        spec: &LaunchSpec,
        env: &ProxyEnv,
    ) -> impl Future<Output = Result<LaunchOutcome, LaunchError>> + Send;
}
