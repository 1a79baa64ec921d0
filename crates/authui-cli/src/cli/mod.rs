//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use authui_core::config;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;

const DEFAULT_LOG_FILTER: &str = "authui=info,authui_core=info,tower_http=info";

#[derive(Parser)]
#[command(name = "authui")]
#[command(version)]
#[command(about = "Login and registration UI for Ory Kratos")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (default: $AUTHUI_HOME/config.toml)
    #[arg(long, global = true, env = "AUTHUI_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Serve the login and registration screens
    Serve {
        /// Address to bind (overrides server.addr)
        #[arg(long)]
        addr: Option<String>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(config::paths::config_path);

    match cli.command {
        Commands::Serve { addr } => {
            init_tracing();
            let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
            rt.block_on(commands::serve::run(&config_path, addr.as_deref()))
        }
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path(&config_path);
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(&config_path),
        },
    }
}

/// Logs to stderr; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
