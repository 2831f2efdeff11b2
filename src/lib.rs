//! via-proxy: run a program behind a local HTTP proxy
//!
//! This crate checks that a local HTTP proxy (for example a traffic-management
//! tool listening on `localhost:7890`) is usable and then launches a program
//! with the proxy environment injected.
//!
//! # Flow
//!
//! 1. **Probe**: TCP connect to the proxy port with a short timeout
//! 2. **Verify**: one request through the proxy to an IP-echo endpoint
//! 3. **Confirm**: only if verification failed, ask whether to continue
//! 4. **Environment**: `HTTP_PROXY`, `HTTPS_PROXY`, `NO_PROXY` and lowercase variants
//! 5. **Launch**: run the target with the interpreter and wait for it
//!
//! The parent process environment is never modified; the variables are
//! passed to the child's command directly.

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod env;
pub mod launcher;
pub mod orchestrator;
pub mod probe;
pub mod prompt;
pub mod verify;
