//! via-proxy: run a program behind a local HTTP proxy
//!
//! This is the main entry point for the via-proxy binary. It handles CLI
//! argument parsing, configuration loading and tracing initialization, then
//! hands over to the orchestrator.
//!
//! # I/O
//!
//! - **Status lines** go to stdout
//! - **Debug logging** goes to stderr, silent by default (`-v` to enable)
//! - The child inherits stdin/stdout/stderr unchanged

use anyhow::{Context, Result};
use clap::Parser;
use via_proxy::{
    cli::Cli,
    config::ConfigLoader,
    launcher::ChildLauncher,
    orchestrator::{Orchestrator, RunOutcome},
    prompt::{AssumeYes, Confirm, Headless, LineConfirm},
    verify::ProxiedEchoClient,
};
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose)?;

    debug!("Parsed CLI arguments: {:?}", cli);

    let config = ConfigLoader::new()
        .load(&cli)
        .context("Failed to load configuration")?;

    debug!("Loaded configuration: {:?}", config);

    let echo = if cli.skip_verify {
        None
    } else {
        Some(
            ProxiedEchoClient::new(&config.proxy.url(), &config.verify.url, config.verify.timeout())
                .context("Failed to set up connectivity check")?,
        )
    };

    let mut confirm: Box<dyn Confirm> = if cli.headless {
        Box::new(Headless)
    } else if cli.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(LineConfirm::stdio())
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let launcher = ChildLauncher::new();
    let mut orchestrator = Orchestrator::new(config, std::io::stdout());
    let outcome = rt
        .block_on(orchestrator.run(echo.as_ref(), confirm.as_mut(), &launcher))
        .context("Failed to write status output")?;

    match outcome {
        RunOutcome::Completed(launch) => debug!("Run completed: {:?}", launch),
        other => debug!("Run ended early: {:?}", other),
    }

    Ok(())
}

/// Initialize the tracing subscriber for debug/development logging.
///
/// Logs go to stderr so they never mix with the status lines on stdout.
///
/// # Verbosity Levels
/// - 0 (default): Only warnings and errors (or `RUST_LOG`)
/// - 1 (-v): Info level
/// - 2 (-vv): Debug level
/// - 3+ (-vvv): Trace level
fn init_tracing(verbose: u8) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(())
}
