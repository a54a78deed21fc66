//! userdb-server: HTTP rendering of the user operations
//!
//! Maps `/api/users` requests onto [`userdb_core::UserHandler`] and its
//! outcomes onto status codes.

pub mod http;

pub use http::{build_router, run_server, ApiError, AppState, ServerConfig, ServerError};
