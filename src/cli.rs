//! Command-line interface definitions for via-proxy.
//!
//! Uses clap's derive API for type-safe argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// Check a local HTTP proxy, then launch a program through it.
///
/// via-proxy probes the proxy port, verifies that an external IP-echo service
/// is reachable through the proxy, and runs the target file with
/// HTTP_PROXY/HTTPS_PROXY/NO_PROXY (and lowercase variants) injected into the
/// child's environment.
#[derive(Parser, Debug)]
#[command(name = "via-proxy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// File to run with the interpreter (default: main.py).
    pub target: Option<PathBuf>,

    /// Arguments to pass to the target.
    ///
    /// All arguments after the target are passed through without
    /// modification. Use `--` before arguments that look like flags.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub target_args: Vec<String>,

    /// Proxy host (default: localhost).
    #[arg(long = "host", value_name = "HOST")]
    pub host: Option<String>,

    /// Proxy port (default: 7890).
    #[arg(short = 'p', long = "port", value_name = "PORT", value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,

    /// IP-echo endpoint used for the connectivity check.
    #[arg(long = "echo-url", value_name = "URL")]
    pub echo_url: Option<String>,

    /// Program used to run the target (default: python3).
    #[arg(short = 'i', long = "interpreter", value_name = "PROGRAM")]
    pub interpreter: Option<String>,

    /// Path to additional config file.
    ///
    /// Merged on top of system and user configs, below CLI flags.
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Skip the connectivity check through the proxy.
    #[arg(long = "skip-verify")]
    pub skip_verify: bool,

    /// Launch even if the connectivity check fails, without asking.
    #[arg(short = 'y', long = "yes", conflicts_with = "headless")]
    pub yes: bool,

    /// Never prompt; a failed connectivity check aborts the launch.
    #[arg(long = "headless")]
    pub headless: bool,

    /// Increase log verbosity.
    ///
    /// Can be specified multiple times:
    /// -v    = info level
    /// -vv   = debug level
    /// -vvv  = trace level
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_basic() {
        let cli = Cli::parse_from(["via-proxy"]);
        assert!(cli.target.is_none());
        assert!(cli.target_args.is_empty());
        assert!(cli.port.is_none());
        assert!(!cli.skip_verify);
        assert!(!cli.yes);
        assert!(!cli.headless);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_cli_parse_with_args() {
        let cli = Cli::parse_from(["via-proxy", "app.py", "--foo", "extra"]);
        assert_eq!(cli.target, Some(PathBuf::from("app.py")));
        assert_eq!(cli.target_args, vec!["--foo", "extra"]);
    }

    #[test]
    fn test_cli_parse_with_options() {
        let cli = Cli::parse_from([
            "via-proxy",
            "--host",
            "127.0.0.1",
            "-p",
            "7897",
            "--echo-url",
            "https://api.ipify.org?format=json",
            "--skip-verify",
            "--headless",
            "-vv",
            "server.py",
            "--",
            "--port",
            "9000",
        ]);

        assert_eq!(cli.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(cli.port, Some(7897));
        assert_eq!(
            cli.echo_url.as_deref(),
            Some("https://api.ipify.org?format=json")
        );
        assert!(cli.skip_verify);
        assert!(cli.headless);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.target, Some(PathBuf::from("server.py")));
        assert_eq!(cli.target_args, vec!["--port", "9000"]);
    }

    #[test]
    fn test_port_zero_rejected() {
        assert!(Cli::try_parse_from(["via-proxy", "--port", "0"]).is_err());
    }

    #[test]
    fn test_yes_conflicts_with_headless() {
        assert!(Cli::try_parse_from(["via-proxy", "--yes", "--headless"]).is_err());
    }
}
