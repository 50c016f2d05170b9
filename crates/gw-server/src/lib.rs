//! HTTP server for the goweb site engine.
//!
//! Maps the content engine onto HTTP:
//! - every path dispatches through [`gw_site::Site::respond`]
//! - `/pkg/…` and `/cmd/…` dispatch to the package documentation renderer
//! - canonical-URL and trailing-slash corrections are permanent redirects
//! - not-found and render failures share the error-page template with 404
//!
//! # Quick Start
//!
//! ```ignore
//! use gw_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         host: "127.0.0.1".to_string(),
//!         port: 6060,
//!         content_dirs: vec!["content".into()],
//!         goroot: Some("goroot".into()),
//!         ..ServerConfig::default()
//!     };
//!     run_server(config).await.unwrap();
//! }
//! ```

mod app;
mod handlers;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use gw_pkgdoc::{ApiDb, DocRenderer};
use gw_site::{Site, SiteConfig};
use gw_vfs::{DirFs, UnionFs, Vfs};

use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Content directories; the first wins on file collisions.
    pub content_dirs: Vec<PathBuf>,
    /// Root of the Go tree for `/pkg/` and `/cmd/` (`None` disables them).
    pub goroot: Option<PathBuf>,
    /// Source directory under the Go root.
    pub src_dir: String,
    /// API manifest directory under the Go root.
    pub api_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 6060,
            content_dirs: vec![PathBuf::from("content")],
            goroot: None,
            src_dir: "src".to_owned(),
            api_dir: "api".to_owned(),
        }
    }
}

/// Create server configuration from the application config.
#[must_use]
pub fn server_config_from_config(config: &gw_config::Config) -> ServerConfig {
    let mut content_dirs = vec![config.content.dir.clone()];
    content_dirs.extend(config.content.overlay_dirs.iter().cloned());
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        content_dirs,
        goroot: config.godoc.goroot.clone(),
        src_dir: config.godoc.src_dir.clone(),
        api_dir: config.godoc.api_dir.clone(),
    }
}

/// Build the shared application state.
fn build_state(config: &ServerConfig) -> Arc<AppState> {
    let content: Arc<dyn Vfs> = if config.content_dirs.len() == 1 {
        Arc::new(DirFs::new(config.content_dirs[0].clone()))
    } else {
        let layers: Vec<Arc<dyn Vfs>> = config
            .content_dirs
            .iter()
            .map(|dir| Arc::new(DirFs::new(dir.clone())) as Arc<dyn Vfs>)
            .collect();
        Arc::new(UnionFs::new(layers))
    };
    let site = Site::new(content, SiteConfig::default());

    let docs = config.goroot.as_ref().map(|goroot| {
        let gofs: Arc<dyn Vfs> = Arc::new(DirFs::new(goroot.clone()));
        let apidb = match ApiDb::load(gofs.as_ref(), &config.api_dir) {
            Ok(db) => db,
            Err(e) => {
                tracing::warn!(error = %e, "no API database; version annotations disabled");
                ApiDb::empty()
            }
        };
        DocRenderer::new(gofs, config.src_dir.clone(), Arc::new(apidb))
    });

    Arc::new(AppState { site, docs })
}

/// Run the server.
///
/// # Errors
///
/// Returns an error if the listen address is invalid or binding fails.
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state(&config);
    let app = app::create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, "starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    tracing::info!("shutdown signal received, stopping server");
}
