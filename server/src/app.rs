//! Core application

use std::io::IsTerminal;

use anyhow::{Context, Result};

use crate::api::{ApiServer, mcp};
use crate::core::cli::{self, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{ENV_LOG, LOG_TARGET};
use crate::core::shutdown::ShutdownService;
use crate::data::ControlPlaneClient;

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub client: ControlPlaneClient,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let config = AppConfig::load(&cli_config)?;
        let app = Self::init(config)?;

        match command.unwrap_or(Commands::Stdio) {
            Commands::Stdio => app.start_stdio().await,
            Commands::Http => app.start_http().await,
        }
    }

    pub fn init(config: AppConfig) -> Result<Self> {
        let client = ControlPlaneClient::new(&config.control_plane)
            .context("Failed to initialize control plane client")?;
        if config.control_plane.token.is_none() {
            tracing::warn!("No control plane token configured, requests will be unauthenticated");
        }

        Ok(Self {
            shutdown: ShutdownService::new(),
            config,
            client,
        })
    }

    /// Logs go to stderr; stdout belongs to the stdio transport
    fn init_logging() {
        let default_filter = format!("info,{}=info", LOG_TARGET);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(std::io::stderr().is_terminal())
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_stdio(self) -> Result<()> {
        self.shutdown.install_signal_handlers();
        tracing::info!(
            control_plane = %self.client.base_url(),
            timezone = %self.config.metrics.timezone,
            "Serving MCP over stdio"
        );
        mcp::serve_stdio(
            self.client,
            self.config.metrics.timezone,
            self.shutdown.token(),
        )
        .await?;
        if self.shutdown.is_triggered() {
            tracing::debug!("Stdio session stopped by shutdown signal");
        }
        Ok(())
    }

    async fn start_http(self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        self.shutdown.install_signal_handlers();
        tracing::info!(
            control_plane = %self.client.base_url(),
            timezone = %self.config.metrics.timezone,
            "Serving MCP over streamable HTTP"
        );
        ApiServer::new(self).start().await
    }
}
