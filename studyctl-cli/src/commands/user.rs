//! User provisioning

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use studyctl_core::models::UserRole;
use studyctl_core::StudyConfig;
use studyctl_server::AccountRepo;

use super::DatabaseArgs;

#[derive(Parser, Debug)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommand,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Add a user, creating the organization if needed
    Add(AddUserArgs),
}

#[derive(Parser, Debug)]
pub struct AddUserArgs {
    /// Login id, unique within the organization
    pub login_id: String,

    /// Organization name
    #[arg(long, short = 'o')]
    pub org: String,

    /// Role within the organization
    #[arg(long, value_enum, default_value_t = RoleArg::User)]
    pub role: RoleArg,

    #[command(flatten)]
    pub db: DatabaseArgs,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleArg {
    /// Organization owner; can read every workbook in the organization
    Owner,
    User,
}

impl From<RoleArg> for UserRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Owner => UserRole::Owner,
            RoleArg::User => UserRole::User,
        }
    }
}

pub async fn run_user(args: UserArgs, config: &StudyConfig) -> Result<()> {
    match args.command {
        UserCommand::Add(args) => {
            let pool = args.db.connect(config).await?;
            let repo = AccountRepo::new(&pool);
            let org = repo
                .create_organization(&args.org)
                .await
                .context("Failed to create organization")?;
            let user = repo
                .create_user(org, &args.login_id, args.role.into())
                .await
                .with_context(|| format!("Failed to add user '{}'", args.login_id))?;
            println!("{}", user.id);
        }
    }
    Ok(())
}
