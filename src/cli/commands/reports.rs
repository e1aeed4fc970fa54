// Report submission and the admin review queue.

use crate::cli::context::AppContext;
use crate::cli::output::{
    page_footer, penalty_line, print_json, report_block, report_line, ReportJson,
};
use crate::core::moderation::{
    ApproveReport, ContentTarget, NewReport, PageRequest, PenaltyRequest, PenaltyType,
    ReportReason, ReportStatus, TargetType,
};
use anyhow::Result;
use clap::Subcommand;
use serde_json::json;

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// Report a post or comment
    Submit {
        /// Reporting user id
        #[arg(long)]
        reporter: u64,

        /// POST or COMMENT
        #[arg(long = "target-type")]
        target_type: TargetType,

        #[arg(long = "target-id")]
        target_id: u64,

        /// SPAM, ABUSE, HARASSMENT, SEXUAL, HATE, MISINFORMATION or OTHER
        #[arg(long)]
        reason: ReportReason,

        /// Free-text explanation
        #[arg(long)]
        detail: Option<String>,
    },

    /// List reports, oldest first
    List {
        /// Only show PENDING, APPROVED or REJECTED reports
        #[arg(long)]
        status: Option<ReportStatus>,

        /// Zero-based page number
        #[arg(long, default_value = "0")]
        page: u32,

        /// Page size (defaults to REPORT_PAGE_SIZE)
        #[arg(long)]
        size: Option<u32>,
    },

    /// Show one report with its target
    Show { id: u64 },

    /// Approve a report, suppress its target and optionally penalize the author
    Approve {
        id: u64,

        /// Reviewing admin id
        #[arg(long)]
        admin: u64,

        /// Review note, also used as the penalty reason
        #[arg(long)]
        note: Option<String>,

        /// WARNING, SUSPENSION or BAN for the target's author
        #[arg(long)]
        penalty: Option<PenaltyType>,

        /// Suspension length in days; ignored for other penalty types
        #[arg(long, requires = "penalty")]
        days: Option<u32>,
    },

    /// Reject a report without touching the content
    Reject {
        id: u64,

        /// Reviewing admin id
        #[arg(long)]
        admin: u64,

        /// Review note
        #[arg(long)]
        note: Option<String>,
    },
}

pub async fn execute(ctx: &AppContext, cmd: ReportCommand, json: bool) -> Result<()> {
    match cmd {
        ReportCommand::Submit {
            reporter,
            target_type,
            target_id,
            reason,
            detail,
        } => {
            let report = ctx
                .lifecycle()
                .submit(NewReport {
                    reporter_id: reporter,
                    target: ContentTarget {
                        kind: target_type,
                        id: target_id,
                    },
                    reason,
                    detail,
                })
                .await?;

            if json {
                return print_json(&ReportJson::from(&report));
            }
            println!(
                "Filed report #{} against {} ({})",
                report.id, report.target, report.reason
            );
            Ok(())
        }
        ReportCommand::List { status, page, size } => {
            let size = size.unwrap_or(ctx.config.report_page_size);
            let listing = ctx
                .queries()
                .list_reports(status, PageRequest::new(page, size))
                .await?;

            if json {
                return print_json(&listing);
            }
            if listing.items.is_empty() {
                println!("No reports found.");
            }
            for detail in &listing.items {
                println!("{}", report_line(detail));
            }
            println!("{}", page_footer(&listing));
            Ok(())
        }
        ReportCommand::Show { id } => {
            let detail = ctx.queries().report_detail(id).await?;

            if json {
                return print_json(&detail);
            }
            println!("{}", report_block(&detail));
            Ok(())
        }
        ReportCommand::Approve {
            id,
            admin,
            note,
            penalty,
            days,
        } => {
            let outcome = ctx
                .lifecycle()
                .approve(ApproveReport {
                    report_id: id,
                    review_note: note,
                    penalty: penalty.map(|penalty_type| PenaltyRequest {
                        penalty_type,
                        duration_days: days,
                    }),
                    admin_id: admin,
                })
                .await?;

            if json {
                return print_json(&json!({
                    "report": ReportJson::from(&outcome.report),
                    "penalty": outcome.penalty,
                }));
            }
            println!(
                "Approved report #{}; {} is now suppressed",
                outcome.report.id, outcome.report.target
            );
            if let Some(penalty) = &outcome.penalty {
                println!("Issued {}", penalty_line(penalty));
            }
            Ok(())
        }
        ReportCommand::Reject { id, admin, note } => {
            let report = ctx.lifecycle().reject(id, note, admin).await?;

            if json {
                return print_json(&ReportJson::from(&report));
            }
            println!("Rejected report #{}", report.id);
            Ok(())
        }
    }
}
