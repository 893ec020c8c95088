use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_TIMEZONE,
};

// =============================================================================
// File Config (JSON)
// =============================================================================

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Default, Deserialize, Serialize, Clone)]
pub struct ControlPlaneFileConfig {
    pub address: Option<String>,
    pub token: Option<String>,
    pub dashboard_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub accept_invalid_certs: Option<bool>,
}

impl fmt::Debug for ControlPlaneFileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlPlaneFileConfig")
            .field("address", &self.address)
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("dashboard_url", &self.dashboard_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct MetricsFileConfig {
    pub timezone: Option<String>,
}

/// Top-level shape of `api7-mcp.json`
#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub control_plane: Option<ControlPlaneFileConfig>,
    pub metrics: Option<MetricsFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            if server.host.is_some() {
                current.host = server.host;
            }
            if server.port.is_some() {
                current.port = server.port;
            }
        }

        if let Some(cp) = other.control_plane {
            let current = self
                .control_plane
                .get_or_insert_with(ControlPlaneFileConfig::default);
            if cp.address.is_some() {
                tracing::trace!(address = ?cp.address, "Merging control_plane.address");
                current.address = cp.address;
            }
            if cp.token.is_some() {
                current.token = cp.token;
            }
            if cp.dashboard_url.is_some() {
                current.dashboard_url = cp.dashboard_url;
            }
            if cp.timeout_secs.is_some() {
                current.timeout_secs = cp.timeout_secs;
            }
            if cp.accept_invalid_certs.is_some() {
                current.accept_invalid_certs = cp.accept_invalid_certs;
            }
        }

        if let Some(metrics) = other.metrics {
            let current = self.metrics.get_or_insert_with(MetricsFileConfig::default);
            if metrics.timezone.is_some() {
                current.timezone = metrics.timezone;
            }
        }
    }
}

// =============================================================================
// Runtime Config
// =============================================================================

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Immutable connection settings for the control plane
#[derive(Clone)]
pub struct ControlPlaneConfig {
    /// Base address without trailing slash
    pub address: String,
    pub token: Option<String>,
    /// Base for console links; the control plane address unless overridden
    pub dashboard_url: String,
    pub timeout: Duration,
    pub accept_invalid_certs: bool,
}

impl fmt::Debug for ControlPlaneConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlPlaneConfig")
            .field("address", &self.address)
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("dashboard_url", &self.dashboard_url)
            .field("timeout", &self.timeout)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct MetricsConfig {
    pub timezone: Tz,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub control_plane: ControlPlaneConfig,
    pub metrics: MetricsConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.api7-mcp/api7-mcp.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli_config = ?cli.config, "CLI config path");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        Self::resolve(file_config, cli)
    }

    /// Layer defaults, merged file config and CLI/env overrides, then validate
    fn resolve(file_config: FileConfig, cli: &CliConfig) -> Result<Self> {
        let file_server = file_config.server.unwrap_or_default();
        let file_cp = file_config.control_plane.unwrap_or_default();
        let file_metrics = file_config.metrics.unwrap_or_default();

        let host = cli
            .host
            .clone()
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT);

        let address = cli
            .control_plane_address
            .clone()
            .or(file_cp.address)
            .unwrap_or_default();
        let address = address.trim().trim_end_matches('/').to_string();

        let token = cli
            .token
            .clone()
            .or(file_cp.token)
            .filter(|t| !t.is_empty());

        let dashboard_url = cli
            .dashboard_url
            .clone()
            .or(file_cp.dashboard_url)
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| address.clone());

        let timeout_secs = cli
            .timeout_secs
            .or(file_cp.timeout_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if timeout_secs == 0 {
            anyhow::bail!("Configuration error: control_plane.timeout_secs must be greater than 0");
        }

        let tz_name = cli
            .timezone
            .clone()
            .or(file_metrics.timezone)
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone: Tz = tz_name.parse().map_err(|_| {
            anyhow::anyhow!("Configuration error: unknown timezone '{}'", tz_name)
        })?;

        let config = Self {
            server: ServerConfig { host, port },
            control_plane: ControlPlaneConfig {
                address,
                token,
                dashboard_url,
                timeout: Duration::from_secs(timeout_secs),
                accept_invalid_certs: file_cp.accept_invalid_certs.unwrap_or(false),
            },
            metrics: MetricsConfig { timezone },
        };

        config.validate()?;

        tracing::debug!(
            address = %config.control_plane.address,
            token_set = config.control_plane.token.is_some(),
            timezone = %config.metrics.timezone,
            "Configuration resolved"
        );

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.control_plane.address.is_empty() {
            anyhow::bail!(
                "Configuration error: control_plane.address is required (set --control-plane-address or API7_CONTROL_PLANE_ADDRESS)"
            );
        }
        for (key, value) in [
            ("control_plane.address", &self.control_plane.address),
            ("control_plane.dashboard_url", &self.control_plane.dashboard_url),
        ] {
            let url = reqwest::Url::parse(value)
                .with_context(|| format!("Configuration error: {} is not a valid URL", key))?;
            if !matches!(url.scheme(), "http" | "https") {
                anyhow::bail!("Configuration error: {} must use http or https", key);
            }
        }

        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }

        Ok(())
    }
}

/// Get the profile config path (~/.api7-mcp/api7-mcp.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}
