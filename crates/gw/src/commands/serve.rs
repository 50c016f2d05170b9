//! `gw serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use gw_config::{CliSettings, Config};
use gw_server::{run_server, server_config_from_config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: goweb.toml when present).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Content directory (overrides config).
    #[arg(long)]
    content: Option<PathBuf>,

    /// Go tree root for /pkg/ and /cmd/ docs (overrides config).
    #[arg(long)]
    goroot: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            content_dir: self.content,
            goroot: self.goroot,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let server_config = server_config_from_config(&config);

        output.info(&format!(
            "Serving on http://{}:{}",
            server_config.host, server_config.port
        ));
        output.info(&format!(
            "Content: {}",
            server_config
                .content_dirs
                .iter()
                .map(|d| d.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
        if let Some(goroot) = &server_config.goroot {
            output.info(&format!("Go root: {}", goroot.display()));
        }

        run_server(server_config)
            .await
            .map_err(|e| CliError::Server(e.to_string()))
    }
}
