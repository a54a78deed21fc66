use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use userdb_core::PoolConfig;

/// Configuration for the userdb binary
///
/// Sources, lowest precedence first: built-in defaults, the TOML file,
/// environment variables, command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSection,
    pub database: PoolConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: IpAddr,
    pub port: u16,
    pub cors_permissive: bool,
    /// Directory for static assets; unset disables static serving
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            cors_permissive: true,
            static_dir: Some(PathBuf::from("public")),
        }
    }
}

impl ServerSection {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl AppConfig {
    /// Default config file: ~/.userdb/config.toml
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".userdb/config.toml")
    }

    /// Load from `path`, or from the default path when it exists.
    ///
    /// An explicitly named file must exist; a missing default file means
    /// built-in defaults. Environment overrides are applied afterwards.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Self::default_path();
                if default.exists() {
                    Self::from_file(&default)?
                } else {
                    tracing::debug!(path = %default.display(), "no config file, using defaults");
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config
            .database
            .validate()
            .context("Invalid [database] configuration")?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).context(format!("Failed to parse config file (invalid TOML): {:?}", path))
    }

    /// Apply `DATABASE_URL`, `USERDB_HOST` and `PORT` overrides.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            self.database.driver = PoolConfig::from_url(url.as_str()).driver;
            self.database.url = Some(url);
        }
        if let Some(host) = lookup("USERDB_HOST").filter(|v| !v.is_empty()) {
            self.server.host = host
                .parse()
                .context(format!("USERDB_HOST is not an IP address: {}", host))?;
        }
        if let Some(port) = lookup("PORT").filter(|v| !v.is_empty()) {
            self.server.port = port
                .parse()
                .context(format!("PORT is not a valid port: {}", port))?;
        }
        Ok(())
    }

    /// Copy safe to print: password and URL credentials masked
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.database.password.is_empty() {
            copy.database.password = "***".to_string();
        }
        if copy.database.url.is_some() {
            copy.database.url = Some(self.database.redacted_url());
        }
        copy
    }
}
