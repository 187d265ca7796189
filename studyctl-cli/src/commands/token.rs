//! Access token issuing

use anyhow::{Context, Result};
use chrono::Duration;
use clap::{Parser, Subcommand};

use studyctl_core::StudyConfig;
use studyctl_server::AccountRepo;

use super::DatabaseArgs;

#[derive(Parser, Debug)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommand,
}

#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Issue a bearer token for a user and print it (shown only once)
    Issue(IssueTokenArgs),
}

#[derive(Parser, Debug)]
pub struct IssueTokenArgs {
    /// Login id of the user
    pub login_id: String,

    /// Organization name
    #[arg(long, short = 'o')]
    pub org: String,

    /// Days until the token expires (default: never)
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..=3650))]
    pub ttl_days: Option<i64>,

    #[command(flatten)]
    pub db: DatabaseArgs,
}

pub async fn run_token(args: TokenArgs, config: &StudyConfig) -> Result<()> {
    match args.command {
        TokenCommand::Issue(args) => {
            let pool = args.db.connect(config).await?;
            let repo = AccountRepo::new(&pool);
            let user = repo
                .find_user_by_login(&args.org, &args.login_id)
                .await
                .with_context(|| format!("Failed to find user '{}'", args.login_id))?;
            let token = repo
                .issue_token(user.id, args.ttl_days.map(Duration::days))
                .await
                .context("Failed to issue token")?;
            println!("{}", token);
        }
    }
    Ok(())
}
