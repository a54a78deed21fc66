//! Command implementations for the userdb CLI

pub mod config;
pub mod ping;
pub mod serve;

pub use config::run_config;
pub use ping::run_ping;
pub use serve::run_serve;
