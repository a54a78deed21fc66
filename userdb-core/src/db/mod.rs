//! Database layer - statement execution over a bounded pool
//!
//! # Design Principles
//!
//! - One capability: run a parameterized statement, get rows or an effect count
//! - Values are always bound positionally, never spliced into statement text
//! - Callers depend on [`StatementExecutor`], not on a concrete pool

pub mod gate;
pub mod pool;
pub mod value;

use async_trait::async_trait;

use crate::error::StoreError;

pub use gate::{AdmissionGate, AdmissionPolicy};
pub use pool::{PoolStatus, PooledStore};
pub use value::{ExecOutcome, Row, SqlValue, StatementKind};

/// Executes one parameterized statement against the relational store.
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    /// Run `template` with `params` bound to its `?` placeholders in order.
    async fn execute(&self, template: &str, params: &[SqlValue])
        -> Result<ExecOutcome, StoreError>;

    /// Pool occupancy, when the executor is backed by a pool.
    fn status(&self) -> Option<PoolStatus> {
        None
    }
}
