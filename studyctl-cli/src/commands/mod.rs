//! Command implementations for the studyctl CLI

pub mod config;
pub mod migrate;
pub mod serve;
pub mod token;
pub mod user;

pub use config::run_config;
pub use migrate::run_migrate;
pub use serve::run_serve;
pub use token::run_token;
pub use user::run_user;

use anyhow::{Context, Result};
use clap::Args;
use sqlx::PgPool;
use studyctl_core::StudyConfig;
use studyctl_server::create_pool_with_options;

/// Database connection arguments shared by commands that need Postgres
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

impl DatabaseArgs {
    /// Connect using the flag, then the config file's `[database] url`.
    pub async fn connect(&self, config: &StudyConfig) -> Result<PgPool> {
        let url = self
            .database_url
            .clone()
            .or_else(|| config.database.url.clone())
            .context(
                "DATABASE_URL not set. Set via --database-url, DATABASE_URL env, \
                 or [database] url in ~/.studyctl/config.toml",
            )?;

        create_pool_with_options(&url, config.database.max_connections)
            .await
            .context("Failed to create database pool")
    }
}
