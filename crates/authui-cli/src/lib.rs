//! authui binary crate: CLI entry point and HTTP server.

pub mod cli;
pub mod server;
