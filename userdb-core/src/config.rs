use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::db::AdmissionPolicy;
use crate::error::ConfigError;

/// Store driver behind the `Any` pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    #[default]
    Mysql,
    Sqlite,
}

/// Connection pool options.
///
/// Accepts both snake_case keys and the camelCase names used by common
/// Node/MySQL pool configs (`waitForConnections`, `connectionLimit`, `queueLimit`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Full connection string; when set, the individual parts are ignored.
    pub url: Option<String>,
    pub driver: Driver,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    #[serde(alias = "waitForConnections")]
    pub wait_for_connections: bool,
    #[serde(alias = "connectionLimit")]
    pub connection_limit: u32,
    /// 0 means unbounded queueing.
    #[serde(alias = "queueLimit")]
    pub queue_limit: u32,
    #[serde(alias = "acquireTimeoutSecs")]
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            url: None,
            driver: Driver::Mysql,
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: "test".to_string(),
            wait_for_connections: true,
            connection_limit: 10,
            queue_limit: 0,
            acquire_timeout_secs: 30,
        }
    }
}

impl PoolConfig {
    /// Config for a connection string, other options at their defaults.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let driver = if url.starts_with("sqlite:") {
            Driver::Sqlite
        } else {
            Driver::Mysql
        };
        Self {
            url: Some(url),
            driver,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "connection_limit",
                reason: "must be at least 1".into(),
            });
        }
        if self.acquire_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "acquire_timeout_secs",
                reason: "must be at least 1".into(),
            });
        }
        if self.url.is_none() && self.driver == Driver::Mysql && self.host.is_empty() {
            return Err(ConfigError::Invalid {
                field: "host",
                reason: "cannot be empty".into(),
            });
        }
        Ok(())
    }

    /// Connection string for the pool, credentials percent-encoded.
    pub fn database_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }

        match self.driver {
            Driver::Sqlite => format!("sqlite:{}", self.database),
            Driver::Mysql => {
                let credentials = if self.password.is_empty() {
                    urlencoding::encode(&self.user).into_owned()
                } else {
                    format!(
                        "{}:{}",
                        urlencoding::encode(&self.user),
                        urlencoding::encode(&self.password)
                    )
                };
                format!(
                    "mysql://{}@{}:{}/{}",
                    credentials,
                    self.host,
                    self.port,
                    urlencoding::encode(&self.database)
                )
            }
        }
    }

    /// Same as [`database_url`](Self::database_url) with the password masked, for logs.
    pub fn redacted_url(&self) -> String {
        let url = self.database_url();
        let Some((scheme, rest)) = url.split_once("://") else {
            return url;
        };
        // Credentials end at the last '@'; a raw password may contain more.
        match rest.rsplit_once('@') {
            Some((credentials, host)) => match credentials.split_once(':') {
                Some((user, _)) => format!("{}://{}:***@{}", scheme, user, host),
                None => url,
            },
            None => url,
        }
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn admission_policy(&self) -> AdmissionPolicy {
        AdmissionPolicy {
            connection_limit: self.connection_limit as usize,
            wait_for_connections: self.wait_for_connections,
            queue_limit: self.queue_limit as usize,
            acquire_timeout: self.acquire_timeout(),
        }
    }
}
