// CLI layer - the administrative surface over the moderation services.

#[path = "commands/command_catalog.rs"]
pub mod commands;
pub mod context;
pub mod output;

use crate::config::AppConfig;
use clap::{Parser, Subcommand};
use commands::content::{CheckArgs, CommentCommand, PostCommand};
use commands::flagged::FlaggedCommand;
use commands::penalties::PenaltyCommand;
use commands::reports::ReportCommand;
use commands::users::UserCommand;
use context::AppContext;

/// community-moderation - content screening, reports and penalties
#[derive(Debug, Parser)]
#[command(name = "community-moderation")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// SQLite database URL or path (overrides DATABASE_URL)
    #[arg(long, global = true, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create or update the database schema
    Migrate,

    /// Load demo users and posts into an empty database
    Seed,

    /// Manage users
    #[command(subcommand)]
    User(UserCommand),

    /// Create posts through the moderation gate
    #[command(subcommand)]
    Post(PostCommand),

    /// Create comments through the moderation gate
    #[command(subcommand)]
    Comment(CommentCommand),

    /// Classify text without storing it
    Check(CheckArgs),

    /// Submit and review reports
    #[command(subcommand)]
    Report(ReportCommand),

    /// Issue and list penalties
    #[command(subcommand)]
    Penalty(PenaltyCommand),

    /// List suppressed content
    #[command(subcommand)]
    Flagged(FlaggedCommand),
}

/// Run a parsed command line.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    setup_logging(cli.verbose);

    let mut config = AppConfig::from_env()?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }

    // Opening the store runs migrations, which is all `migrate` needs.
    let ctx = AppContext::connect(config).await?;
    let json = cli.json;

    match cli.command {
        Commands::Migrate => {
            println!("Database schema is up to date.");
            Ok(())
        }
        Commands::Seed => commands::seed::execute(&ctx).await,
        Commands::User(cmd) => commands::users::execute(&ctx, cmd, json).await,
        Commands::Post(cmd) => commands::content::execute_post(&ctx, cmd, json).await,
        Commands::Comment(cmd) => commands::content::execute_comment(&ctx, cmd, json).await,
        Commands::Check(args) => commands::content::execute_check(&ctx, args, json).await,
        Commands::Report(cmd) => commands::reports::execute(&ctx, cmd, json).await,
        Commands::Penalty(cmd) => commands::penalties::execute(&ctx, cmd, json).await,
        Commands::Flagged(cmd) => commands::flagged::execute(&ctx, cmd, json).await,
    }
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,audit=info")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::{PenaltyType, ReportStatus, TargetType};
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_approve_with_suspension() {
        let cli = Cli::try_parse_from([
            "community-moderation",
            "report",
            "approve",
            "7",
            "--admin",
            "4",
            "--penalty",
            "suspension",
            "--days",
            "3",
            "--json",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Commands::Report(ReportCommand::Approve {
                id,
                admin,
                penalty,
                days,
                ..
            }) => {
                assert_eq!((id, admin), (7, 4));
                assert_eq!(penalty, Some(PenaltyType::Suspension));
                assert_eq!(days, Some(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_days_require_a_penalty() {
        let result = Cli::try_parse_from([
            "community-moderation",
            "report",
            "approve",
            "7",
            "--admin",
            "4",
            "--days",
            "3",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn test_enum_arguments_parse_from_tags() {
        let cli = Cli::try_parse_from([
            "community-moderation",
            "report",
            "submit",
            "--reporter",
            "1",
            "--target-type",
            "comment",
            "--target-id",
            "42",
            "--reason",
            "ABUSE",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Report(ReportCommand::Submit {
                target_type: TargetType::Comment,
                target_id: 42,
                ..
            })
        ));

        let cli = Cli::try_parse_from([
            "community-moderation",
            "report",
            "list",
            "--status",
            "pending",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Report(ReportCommand::List {
                status: Some(ReportStatus::Pending),
                page: 0,
                ..
            })
        ));

        assert!(Cli::try_parse_from([
            "community-moderation",
            "penalty",
            "issue",
            "--user",
            "2",
            "--type",
            "expel",
            "--reason",
            "x",
            "--admin",
            "1",
        ])
        .is_err());
    }
}
