//! HTTP server command

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;

use studyctl_core::StudyConfig;
use studyctl_server::db::migrations;
use studyctl_server::{run_server, tts, AppState, ServerConfig, ServiceContext};

use super::DatabaseArgs;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: [server] bind, then 127.0.0.1:3040)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Skip schema migrations on startup
    #[arg(long)]
    pub no_migrate: bool,

    #[command(flatten)]
    pub db: DatabaseArgs,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, config: &StudyConfig) -> Result<()> {
    let pool = args.db.connect(config).await?;

    if !args.no_migrate {
        migrations::run(&pool)
            .await
            .context("Failed to run migrations")?;
    }

    let limits = config.quota_limits()?;
    let synthesizer =
        tts::from_config(&config.synthesizer).context("Failed to set up speech synthesizer")?;
    let services = ServiceContext::new(pool, limits, synthesizer);

    let server_config = ServerConfig {
        bind_addr: args.bind.unwrap_or(config.server.bind),
        cors_permissive: args.cors_permissive || config.server.cors_permissive,
    };

    tracing::info!(
        bind = %server_config.bind_addr,
        tts = config.synthesizer.enabled,
        "Starting studyctl server"
    );

    run_server(AppState::new(services), server_config)
        .await
        .context("Server error")?;

    Ok(())
}
