//! studyctl CLI
//!
//! - `serve`: run the HTTP API
//! - `migrate`: create or update the database schema
//! - `user add` / `token issue`: provision accounts and bearer tokens
//! - `config`: inspect configuration
//! - `completions`: shell completion scripts

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use studyctl_core::StudyConfig;

mod commands;
mod tracing_setup;

use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "studyctl",
    author,
    version,
    about = "Backend for workbook-based language study: workbooks, problems, progress and audio"
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces over OTLP (requires the `telemetry` feature)
    #[arg(long, global = true)]
    otel: bool,

    /// Config file (default: ~/.studyctl/config.toml)
    #[arg(long, short = 'c', global = true, env = "STUDYCTL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Run database migrations
    Migrate(commands::migrate::MigrateArgs),
    /// Manage users
    User(commands::user::UserArgs),
    /// Manage access tokens
    Token(commands::token::TokenArgs),
    /// Inspect configuration (path, show)
    Config(commands::config::ConfigArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun, not a suffix
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Commands::Completions(args) = &cli.command {
        return run_completions(args);
    }

    let config = StudyConfig::load(cli.config.as_deref())?;
    tracing_setup::init(&TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
        level: config.log_level.clone(),
    })
    .ok();

    let result = match cli.command {
        Commands::Serve(args) => commands::run_serve(args, &config).await,
        Commands::Migrate(args) => commands::run_migrate(args, &config).await,
        Commands::User(args) => commands::run_user(args, &config).await,
        Commands::Token(args) => commands::run_token(args, &config).await,
        Commands::Config(args) => commands::run_config(args, &config),
        Commands::Completions(_) => Ok(()),
    };

    tracing_setup::shutdown_otel();
    result
}

fn run_completions(args: &CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}
