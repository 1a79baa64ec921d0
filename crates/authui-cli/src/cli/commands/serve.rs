//! `authui serve`.

use std::path::Path;

use anyhow::{Context, Result};
use authui_core::config::Config;

use crate::server;

pub async fn run(config_path: &Path, addr_override: Option<&str>) -> Result<()> {
    let config = Config::load_from(config_path).context("load config")?;
    if config_path.exists() {
        tracing::info!(path = %config_path.display(), "loaded config");
    } else {
        tracing::info!(path = %config_path.display(), "no config file, using defaults");
    }

    let addr = addr_override
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(&config.server.addr)
        .to_string();

    server::serve(&config, &addr).await
}
