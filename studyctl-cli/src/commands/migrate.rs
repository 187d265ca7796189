//! Schema migration command

use anyhow::{Context, Result};
use clap::Parser;

use studyctl_core::StudyConfig;
use studyctl_server::db::migrations;

use super::DatabaseArgs;

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub db: DatabaseArgs,
}

pub async fn run_migrate(args: MigrateArgs, config: &StudyConfig) -> Result<()> {
    let pool = args.db.connect(config).await?;
    migrations::run(&pool)
        .await
        .context("Failed to run migrations")?;
    println!("Migrations complete");
    Ok(())
}
