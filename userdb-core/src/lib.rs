//! userdb-core: user records over a pooled relational store
//!
//! - [`db`]: the connection pool adapter and the [`StatementExecutor`] seam
//! - [`users`]: list / get / create / update / delete, one statement each
//! - [`config`]: pool options

pub mod config;
pub mod db;
pub mod error;
pub mod users;

pub use config::{Driver, PoolConfig};
pub use db::{ExecOutcome, PoolStatus, PooledStore, Row, SqlValue, StatementExecutor};
pub use error::{AccessError, ConfigError, Result, StoreError};
pub use users::{CreatedUser, User, UserHandler, UserInput};
