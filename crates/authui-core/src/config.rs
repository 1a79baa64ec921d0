//! Configuration management for authui.
//!
//! Loads configuration from ${AUTHUI_HOME}/config.toml with sensible defaults.
//! Kratos base URLs may be overridden from the environment.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment override for the browser-facing Kratos URL.
pub const BROWSER_URL_ENV: &str = "AUTHUI_KRATOS_BROWSER_URL";
/// Environment override for the Kratos admin URL.
pub const ADMIN_URL_ENV: &str = "AUTHUI_KRATOS_ADMIN_URL";

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for authui configuration.
    //!
    //! AUTHUI_HOME resolution order:
    //! 1. AUTHUI_HOME environment variable (if set)
    //! 2. ~/.config/authui (default)
    //! 3. ./.authui when no home directory can be determined

    use std::path::PathBuf;

    /// Returns the authui home directory.
    pub fn authui_home() -> PathBuf {
        if let Ok(home) = std::env::var("AUTHUI_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".authui"),
            |h| h.join(".config").join("authui"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        authui_home().join("config.toml")
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the UI binds to
    pub addr: String,
    /// Include the raw upstream error body on the error page
    pub expose_errors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: Config::DEFAULT_ADDR.to_string(),
            expose_errors: false,
        }
    }
}

/// Kratos endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KratosConfig {
    /// Public URL the browser is sent to when a new flow must be started.
    pub browser_url: Option<String>,
    /// Admin API used to look up flows server-side.
    pub admin_url: Option<String>,
    /// Timeout for flow lookups in seconds (0 disables)
    pub timeout_secs: u32,
}

impl Default for KratosConfig {
    fn default() -> Self {
        Self {
            browser_url: None,
            admin_url: None,
            timeout_secs: Config::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl KratosConfig {
    /// Resolves the browser URL with precedence: env > config > default.
    pub fn effective_browser_url(&self) -> Result<String> {
        resolve_base_url(
            self.browser_url.as_deref(),
            BROWSER_URL_ENV,
            Config::DEFAULT_BROWSER_URL,
            "Kratos browser",
        )
    }

    /// Resolves the admin URL with precedence: env > config > default.
    pub fn effective_admin_url(&self) -> Result<String> {
        resolve_base_url(
            self.admin_url.as_deref(),
            ADMIN_URL_ENV,
            Config::DEFAULT_ADMIN_URL,
            "Kratos admin",
        )
    }

    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(u64::from(self.timeout_secs)))
        }
    }
}

/// How flow forms are laid out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    /// Field-name patterns in display priority. A trailing `*` matches a prefix.
    pub field_order: Vec<String>,
    /// Human labels for field names.
    pub labels: BTreeMap<String, String>,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            field_order: ["identifier", "traits.email", "password"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            labels: [
                ("identifier", "E-Mail"),
                ("traits.email", "E-Mail"),
                ("password", "Password"),
                ("traits.name.first", "First Name"),
                ("traits.name.last", "Last Name"),
                ("traits.website", "Website"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        }
    }
}

impl PresentationConfig {
    /// Layers configured labels over the built-in ones.
    fn merge_default_labels(&mut self) {
        let mut labels = PresentationConfig::default().labels;
        labels.append(&mut self.labels);
        self.labels = labels;
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub kratos: KratosConfig,
    pub presentation: PresentationConfig,
}

impl Config {
    pub const DEFAULT_ADDR: &str = "127.0.0.1:4455";
    pub const DEFAULT_BROWSER_URL: &str = "http://127.0.0.1:4433";
    pub const DEFAULT_ADMIN_URL: &str = "http://127.0.0.1:4434";
    const DEFAULT_TIMEOUT_SECS: u32 = 10;

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            let mut config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))?;
            config.presentation.merge_default_labels();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}

/// Resolves a base URL with precedence: env > config > default.
///
/// Empty and whitespace-only values are treated as unset.
pub fn resolve_base_url(
    config_base_url: Option<&str>,
    env_var: &str,
    default_url: &str,
    name: &str,
) -> Result<String> {
    let env_value = std::env::var(env_var).ok();
    resolve_base_url_from(env_value.as_deref(), config_base_url, default_url, name)
}

fn resolve_base_url_from(
    env_value: Option<&str>,
    config_value: Option<&str>,
    default_url: &str,
    name: &str,
) -> Result<String> {
    let chosen = [env_value, config_value]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty());

    match chosen {
        Some(url) => {
            validate_url(url, name)?;
            Ok(url.trim_end_matches('/').to_string())
        }
        None => Ok(default_url.to_string()),
    }
}

/// Validates that a URL is well-formed.
fn validate_url(url: &str, name: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid {name} URL: {url}"))?;
    Ok(())
}
