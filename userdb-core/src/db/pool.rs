//! Database connection pool management
//!
//! Uses sqlx `AnyPool` so the same adapter serves MySQL in production and
//! SQLite for local runs and tests. Placeholders are positional `?`.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::any::{AnyArguments, AnyPoolOptions, AnyRow};
use sqlx::error::ErrorKind;
use sqlx::query::Query;
use sqlx::{Any, AnyPool, Column, Row as _};

use super::gate::AdmissionGate;
use super::value::{ExecOutcome, Row, SqlValue, StatementKind};
use super::StatementExecutor;
use crate::config::PoolConfig;
use crate::error::{ConfigError, StoreError};

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    /// Open connections, idle or in use.
    pub size: u32,
    pub idle: usize,
    /// Callers queued for a connection.
    pub waiting: usize,
}

/// Production [`StatementExecutor`]: a bounded sqlx pool behind an admission gate.
///
/// Connections are opened lazily and kept for the process lifetime.
#[derive(Debug)]
pub struct PooledStore {
    pool: AnyPool,
    gate: AdmissionGate,
}

impl PooledStore {
    /// Build the pool. No connection is opened until the first statement.
    pub fn connect_lazy(config: &PoolConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(config.connection_limit)
            .acquire_timeout(config.acquire_timeout())
            .connect_lazy(&config.database_url())
            .map_err(|e| ConfigError::Invalid {
                field: "url",
                reason: e.to_string(),
            })?;

        tracing::info!(
            url = %config.redacted_url(),
            connection_limit = config.connection_limit,
            wait_for_connections = config.wait_for_connections,
            queue_limit = config.queue_limit,
            "connection pool configured"
        );

        Ok(Self {
            pool,
            gate: AdmissionGate::new(config.admission_policy()),
        })
    }

    /// Build the pool and open one connection to prove the store is reachable.
    pub async fn connect(config: &PoolConfig) -> Result<Self, StoreError> {
        let store = Self::connect_lazy(config).map_err(|e| StoreError::unavailable(e.to_string()))?;
        let conn = store.pool.acquire().await.map_err(classify)?;
        drop(conn);
        Ok(store)
    }

    pub fn pool_status(&self) -> PoolStatus {
        PoolStatus {
            size: self.pool.size(),
            idle: self.pool.num_idle(),
            waiting: self.gate.waiting(),
        }
    }

    /// Stop admitting statements and close every connection.
    pub async fn close(&self) {
        self.gate.close();
        self.pool.close().await;
        tracing::info!("connection pool closed");
    }
}

#[async_trait]
impl StatementExecutor for PooledStore {
    async fn execute(
        &self,
        template: &str,
        params: &[SqlValue],
    ) -> Result<ExecOutcome, StoreError> {
        let _admission = self.gate.admit().await?;
        let mut conn = self.pool.acquire().await.map_err(classify)?;

        let query = bind_all(sqlx::query(template), params);
        match StatementKind::of(template) {
            StatementKind::Query => {
                let rows = query.fetch_all(&mut *conn).await.map_err(classify)?;
                let rows = rows.iter().map(decode_row).collect::<Result<Vec<_>, _>>()?;
                tracing::debug!(statement = template, rows = rows.len(), "query executed");
                Ok(ExecOutcome::Rows(rows))
            }
            StatementKind::Mutation => {
                let result = query.execute(&mut *conn).await.map_err(classify)?;
                tracing::debug!(
                    statement = template,
                    affected_rows = result.rows_affected(),
                    "mutation executed"
                );
                Ok(ExecOutcome::Mutation {
                    affected_rows: result.rows_affected(),
                    last_insert_id: result.last_insert_id(),
                })
            }
        }
    }

    fn status(&self) -> Option<PoolStatus> {
        Some(self.pool_status())
    }
}

fn bind_all<'q>(
    mut query: Query<'q, Any, AnyArguments<'q>>,
    params: &[SqlValue],
) -> Query<'q, Any, AnyArguments<'q>> {
    for param in params {
        query = match param {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Int(n) => query.bind(*n),
            SqlValue::Float(n) => query.bind(*n),
            SqlValue::Text(s) => query.bind(s.clone()),
        };
    }
    query
}

/// Read every column, trying integer, then float, then text.
fn decode_row(row: &AnyRow) -> Result<Row, StoreError> {
    let mut out = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            v.map_or(SqlValue::Null, SqlValue::Int)
        } else if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            v.map_or(SqlValue::Null, SqlValue::Float)
        } else {
            match row.try_get::<Option<String>, _>(idx) {
                Ok(v) => v.map_or(SqlValue::Null, SqlValue::Text),
                Err(e) => {
                    return Err(StoreError::statement(format!(
                        "cannot decode column '{}': {}",
                        column.name(),
                        e
                    )))
                }
            }
        };
        out.push(column.name(), value);
    }
    Ok(out)
}

/// SQLSTATE classes for data exceptions and integrity violations.
///
/// SQLite reports numeric result codes instead, which never have five characters.
fn is_input_sqlstate(code: &str) -> bool {
    code.len() == 5 && (code.starts_with("22") || code.starts_with("23"))
}

/// Map a sqlx failure onto the store taxonomy.
pub(crate) fn classify(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db) => {
            let constraint = matches!(
                db.kind(),
                ErrorKind::UniqueViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::CheckViolation
            );
            let data = db.code().is_some_and(|code| is_input_sqlstate(&code));
            if constraint || data {
                StoreError::rejected(db.message())
            } else {
                StoreError::statement(db.message())
            }
        }
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_) => {
            tracing::warn!(error = %err, "store unavailable");
            StoreError::unavailable(err.to_string())
        }
        other => StoreError::statement(other.to_string()),
    }
}
