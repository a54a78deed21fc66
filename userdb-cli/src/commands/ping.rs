//! Store connectivity check
//!
//! Opens the pool and runs the same probe as `GET /test-db`.

use anyhow::{anyhow, Context, Result};

use userdb_core::PooledStore;
use userdb_server::http::routes::health::probe;

use crate::config::AppConfig;

pub async fn run_ping(config: AppConfig) -> Result<()> {
    tracing::debug!(url = %config.database.redacted_url(), "pinging store");

    let store = PooledStore::connect(&config.database)
        .await
        .context("Database connection failed")?;

    let outcome = probe(&store).await;
    store.close().await;

    let solution = outcome.map_err(|e| anyhow!("Database probe failed: {}", e))?;
    println!("✅ {} answered SELECT 1 + 1 = {}", config.database.redacted_url(), solution);
    Ok(())
}
