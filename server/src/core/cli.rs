use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_CONFIG, ENV_CONTROL_PLANE_ADDRESS, ENV_DASHBOARD_URL, ENV_HOST, ENV_PORT,
    ENV_REQUEST_TIMEOUT, ENV_TIMEZONE, ENV_TOKEN,
};

#[derive(Parser)]
#[command(name = "api7-mcp")]
#[command(version, about = "API7 gateway tools for MCP assistants", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Control plane base address (e.g. https://api7.example.com:7443)
    #[arg(long, global = true, env = ENV_CONTROL_PLANE_ADDRESS)]
    pub control_plane_address: Option<String>,

    /// Control plane access token (sent as X-API-KEY)
    #[arg(long, global = true, env = ENV_TOKEN, hide_env_values = true)]
    pub token: Option<String>,

    /// Dashboard URL used for console links (defaults to the control plane address)
    #[arg(long, global = true, env = ENV_DASHBOARD_URL)]
    pub dashboard_url: Option<String>,

    /// Control plane request timeout in seconds
    #[arg(long, global = true, env = ENV_REQUEST_TIMEOUT)]
    pub timeout_secs: Option<u64>,

    /// IANA timezone for metric timestamps (default: UTC)
    #[arg(long, global = true, env = ENV_TIMEZONE)]
    pub timezone: Option<String>,

    /// HTTP transport host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// HTTP transport port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,
}

#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Serve MCP over stdin/stdout (default command)
    Stdio,
    /// Serve MCP over streamable HTTP
    Http,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub control_plane_address: Option<String>,
    pub token: Option<String>,
    pub dashboard_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub timezone: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl From<Cli> for CliConfig {
    fn from(cli: Cli) -> Self {
        Self {
            config: cli.config,
            control_plane_address: cli.control_plane_address,
            token: cli.token,
            dashboard_url: cli.dashboard_url,
            timeout_secs: cli.timeout_secs,
            timezone: cli.timezone,
            host: cli.host,
            port: cli.port,
        }
    }
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let mut cli = Cli::parse();
    let command = cli.command.take();
    (cli.into(), command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults_to_no_command() {
        let cli = Cli::try_parse_from(["api7-mcp"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_http_with_global_flags() {
        let cli = Cli::try_parse_from([
            "api7-mcp",
            "http",
            "--port",
            "8080",
            "--control-plane-address",
            "https://cp.local",
        ])
        .unwrap();
        assert_eq!(cli.command, Some(Commands::Http));

        let config = CliConfig::from(cli);
        assert_eq!(config.port, Some(8080));
        assert_eq!(
            config.control_plane_address.as_deref(),
            Some("https://cp.local")
        );
    }

    #[test]
    fn test_parse_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["api7-mcp", "serve-everything"]).is_err());
    }
}
