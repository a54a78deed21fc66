//! HTTP server command
//!
//! Builds the connection pool once and hands it to the server.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use userdb_core::PooledStore;
use userdb_server::{run_server, ServerConfig};

use crate::config::AppConfig;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (overrides config/USERDB_HOST)
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Port to listen on (overrides config/PORT)
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Database URL (overrides config/environment)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Directory of static assets served for unmatched paths
    #[arg(long, conflicts_with = "no_static")]
    pub static_dir: Option<PathBuf>,

    /// Disable static file serving
    #[arg(long)]
    pub no_static: bool,

    /// Only allow localhost origins instead of any origin
    #[arg(long)]
    pub cors_local_only: bool,
}

impl ServeArgs {
    /// Fold flags into the loaded config
    pub fn apply(self, config: &mut AppConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = self.database_url {
            config.database.driver = userdb_core::PoolConfig::from_url(url.as_str()).driver;
            config.database.url = Some(url);
        }
        if let Some(dir) = self.static_dir {
            config.server.static_dir = Some(dir);
        }
        if self.no_static {
            config.server.static_dir = None;
        }
        if self.cors_local_only {
            config.server.cors_permissive = false;
        }
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, mut config: AppConfig) -> Result<()> {
    args.apply(&mut config);

    let store = PooledStore::connect_lazy(&config.database)
        .context("Failed to create database pool")?;

    let server = ServerConfig {
        bind_addr: config.server.bind_addr(),
        cors_permissive: config.server.cors_permissive,
        static_dir: config.server.static_dir.clone(),
    };
    tracing::info!("Starting userdb server on {}", server.bind_addr);

    // Run server (blocks until shutdown)
    run_server(Arc::new(store), server)
        .await
        .context("Server error")?;

    Ok(())
}
