// User registration. Accounts normally come from the host platform; this is
// for local setups and tests.

use crate::cli::context::AppContext;
use crate::cli::output::{print_json, user_line};
use crate::core::moderation::{NewUser, UserRole, UserStore};
use anyhow::Result;
use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Register a user
    Add {
        /// Display name
        username: String,

        /// STUDENT or ADMIN
        #[arg(long, default_value = "STUDENT")]
        role: UserRole,

        /// School grade
        #[arg(long)]
        grade: Option<u8>,

        /// Mark the user as a verified senior
        #[arg(long)]
        senior: bool,
    },
}

pub async fn execute(ctx: &AppContext, cmd: UserCommand, json: bool) -> Result<()> {
    match cmd {
        UserCommand::Add {
            username,
            role,
            grade,
            senior,
        } => {
            let user = ctx
                .store
                .insert_user(NewUser {
                    username,
                    role,
                    grade,
                    is_senior_verified: senior,
                })
                .await?;

            if json {
                return print_json(&user);
            }
            println!("Created user {}", user_line(&user));
            Ok(())
        }
    }
}
