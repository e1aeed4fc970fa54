// Direct penalty issuance and per-user penalty history.

use crate::cli::context::AppContext;
use crate::cli::output::{penalty_line, print_json};
use crate::core::moderation::PenaltyType;
use anyhow::Result;
use chrono::Utc;
use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum PenaltyCommand {
    /// Issue a penalty outside of report review
    Issue {
        /// Penalized user id
        #[arg(long)]
        user: u64,

        /// WARNING, SUSPENSION or BAN
        #[arg(long = "type")]
        penalty_type: PenaltyType,

        /// Suspension length in days; ignored for other penalty types
        #[arg(long)]
        days: Option<u32>,

        #[arg(long)]
        reason: String,

        /// Issuing admin id
        #[arg(long)]
        admin: u64,
    },

    /// List a user's penalties
    List {
        user: u64,

        /// Only penalties currently in force
        #[arg(long)]
        active: bool,
    },
}

pub async fn execute(ctx: &AppContext, cmd: PenaltyCommand, json: bool) -> Result<()> {
    let issuer = ctx.penalties();

    match cmd {
        PenaltyCommand::Issue {
            user,
            penalty_type,
            days,
            reason,
            admin,
        } => {
            let penalty = issuer
                .issue(user, penalty_type, days, &reason, admin)
                .await?;

            if json {
                return print_json(&penalty);
            }
            println!("Issued {}", penalty_line(&penalty));
            Ok(())
        }
        PenaltyCommand::List { user, active } => {
            let penalties = if active {
                issuer.active_penalties(user, Utc::now()).await?
            } else {
                issuer.penalties_for(user).await?
            };

            if json {
                return print_json(&penalties);
            }
            if penalties.is_empty() {
                println!("User {} has no penalties.", user);
            }
            for penalty in &penalties {
                println!("{}", penalty_line(penalty));
            }
            Ok(())
        }
    }
}
