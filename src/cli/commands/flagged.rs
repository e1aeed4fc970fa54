// Lists of suppressed content for moderators.

use crate::cli::context::AppContext;
use crate::cli::output::{comment_line, post_line, print_json};
use anyhow::Result;
use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum FlaggedCommand {
    /// Suppressed posts
    Posts,

    /// Suppressed comments
    Comments,
}

pub async fn execute(ctx: &AppContext, cmd: FlaggedCommand, json: bool) -> Result<()> {
    let queries = ctx.queries();

    match cmd {
        FlaggedCommand::Posts => {
            let posts = queries.flagged_posts().await?;
            if json {
                return print_json(&posts);
            }
            for post in &posts {
                println!("{}", post_line(post));
            }
            println!("{} suppressed post(s)", posts.len());
        }
        FlaggedCommand::Comments => {
            let comments = queries.flagged_comments().await?;
            if json {
                return print_json(&comments);
            }
            for comment in &comments {
                println!("{}", comment_line(comment));
            }
            let total = queries.flagged_comment_count().await?;
            println!("{} suppressed comment(s)", total);
        }
    }
    Ok(())
}
