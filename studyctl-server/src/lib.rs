//! studyctl-server: HTTP server for workbooks, problems, recordbooks and audio
//!
//! Layers, outermost first: `http` (routes, auth, error mapping) → `service`
//! (one transaction per call) → `studyctl_core` aggregates → `db` (Postgres).

pub mod db;
pub mod http;
pub mod service;
pub mod tts;

pub use db::{create_pool, create_pool_with_options, AccountError, AccountRepo, PgStore};
pub use http::{build_router, run_server, ApiError, AppState, ServerConfig, ServerError};
pub use service::ServiceContext;
