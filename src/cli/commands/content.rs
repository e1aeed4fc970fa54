// Content creation through the moderation gate, plus dry-run checks.

use crate::cli::context::AppContext;
use crate::cli::output::{comment_line, post_line, print_json, verdict_line};
use crate::core::moderation::{
    BoardType, MeetingInfo, NewComment, NewPost, QuestionInfo, SOURCE_COMMENT, SOURCE_POST,
    SOURCE_REALTIME,
};
use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use serde_json::json;

#[derive(Debug, Subcommand)]
pub enum PostCommand {
    /// Create a post; the classifier decides whether it is suppressed
    Create(PostArgs),
}

#[derive(Debug, Args)]
pub struct PostArgs {
    /// Author user id
    #[arg(long)]
    pub author: u64,

    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub body: String,

    /// TALK, QUESTION or MEETING
    #[arg(long, default_value = "TALK")]
    pub board: BoardType,

    /// Question category (QUESTION board)
    #[arg(long)]
    pub category: Option<String>,

    /// Restrict the question to seniors (QUESTION board)
    #[arg(long)]
    pub seniors_only: bool,

    /// Meeting time, e.g. 2026-11-02T18:30 (MEETING board)
    #[arg(long)]
    pub schedule: Option<String>,

    /// Meeting location (MEETING board)
    #[arg(long)]
    pub location: Option<String>,

    /// Meeting capacity (MEETING board)
    #[arg(long)]
    pub capacity: Option<u32>,
}

impl PostArgs {
    fn into_request(self) -> NewPost {
        let question = (self.board == BoardType::Question).then(|| QuestionInfo {
            category_name: self.category.clone(),
            for_seniors_only: self.seniors_only,
        });
        let meeting = (self.board == BoardType::Meeting).then(|| MeetingInfo {
            schedule: self.schedule.clone(),
            location: self.location.clone(),
            capacity: self.capacity,
        });
        NewPost {
            author_id: self.author,
            title: self.title,
            body: self.body,
            board: self.board,
            meeting,
            question,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CommentCommand {
    /// Comment on a post; QUESTION posts only accept verified seniors
    Create {
        /// Author user id
        #[arg(long)]
        author: u64,

        /// Post id
        #[arg(long)]
        post: u64,

        #[arg(long)]
        body: String,
    },
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Text to classify
    pub text: String,

    /// Source tag sent to the classifier (POST, COMMENT or REALTIME)
    #[arg(long, default_value = SOURCE_REALTIME)]
    pub source: String,

    /// User the text belongs to, if known
    #[arg(long)]
    pub author: Option<u64>,
}

pub async fn execute_post(ctx: &AppContext, cmd: PostCommand, json: bool) -> Result<()> {
    match cmd {
        PostCommand::Create(args) => {
            let gate = ctx.gate()?;
            let (post, verdict) = gate.submit_post(args.into_request()).await?;

            if json {
                return print_json(&json!({ "post": post, "verdict": verdict }));
            }
            println!("Created {}", post_line(&post));
            println!("{}", verdict_line(&verdict));
            Ok(())
        }
    }
}

pub async fn execute_comment(ctx: &AppContext, cmd: CommentCommand, json: bool) -> Result<()> {
    match cmd {
        CommentCommand::Create { author, post, body } => {
            let gate = ctx.gate()?;
            let (comment, verdict) = gate
                .submit_comment(NewComment {
                    author_id: author,
                    post_id: post,
                    body,
                })
                .await?;

            if json {
                return print_json(&json!({ "comment": comment, "verdict": verdict }));
            }
            println!("Created {}", comment_line(&comment));
            println!("{}", verdict_line(&verdict));
            Ok(())
        }
    }
}

pub async fn execute_check(ctx: &AppContext, args: CheckArgs, json: bool) -> Result<()> {
    let source = args.source.trim().to_ascii_uppercase();
    if ![SOURCE_POST, SOURCE_COMMENT, SOURCE_REALTIME].contains(&source.as_str()) {
        bail!(
            "unknown source '{}' (expected {}, {} or {})",
            args.source,
            SOURCE_POST,
            SOURCE_COMMENT,
            SOURCE_REALTIME
        );
    }

    let gate = ctx.gate()?;
    let verdict = gate.preview(&args.text, &source, args.author).await?;

    if json {
        return print_json(&verdict);
    }
    println!("{}", verdict_line(&verdict));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(board: BoardType) -> PostArgs {
        PostArgs {
            author: 1,
            title: "study group".to_string(),
            body: "who is in".to_string(),
            board,
            category: Some("math".to_string()),
            seniors_only: true,
            schedule: Some("2026-11-02T18:30".to_string()),
            location: Some("library".to_string()),
            capacity: Some(8),
        }
    }

    #[test]
    fn test_only_the_chosen_board_payload_is_sent() {
        let talk = args(BoardType::Talk).into_request();
        assert!(talk.question.is_none() && talk.meeting.is_none());

        let question = args(BoardType::Question).into_request();
        assert!(question.meeting.is_none());
        assert_eq!(
            question.question.unwrap().category_name.as_deref(),
            Some("math")
        );

        let meeting = args(BoardType::Meeting).into_request();
        assert!(meeting.question.is_none());
        assert_eq!(meeting.meeting.unwrap().capacity, Some(8));
    }
}
