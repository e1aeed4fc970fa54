// Terminal formatting for command results. `--json` bypasses all of this and
// prints the serde representation instead.

use crate::core::moderation::{
    BoardDetail, ClassificationVerdict, Comment, Page, Post, Report, ReportDetail, ReportStatus,
    User, UserPenalty,
};
use anyhow::Result;
use serde::Serialize;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// JSON shape of a bare report. The status is derived from the resolution,
/// so it is added here to match what `report show` prints.
#[derive(Debug, Serialize)]
pub struct ReportJson<'a> {
    #[serde(flatten)]
    pub report: &'a Report,
    pub status: ReportStatus,
}

impl<'a> From<&'a Report> for ReportJson<'a> {
    fn from(report: &'a Report) -> Self {
        Self {
            report,
            status: report.status(),
        }
    }
}

pub fn user_line(user: &User) -> String {
    let grade = user
        .grade
        .map(|g| format!("grade {}", g))
        .unwrap_or_else(|| "no grade".to_string());
    let senior = if user.is_senior_verified {
        ", verified senior"
    } else {
        ""
    };
    format!("#{} {} ({}, {}{})", user.id, user.username, user.role, grade, senior)
}

fn flag(is_bad: bool) -> &'static str {
    if is_bad {
        " [suppressed]"
    } else {
        ""
    }
}

pub fn post_line(post: &Post) -> String {
    let board = match &post.board {
        BoardDetail::Talk => "TALK".to_string(),
        BoardDetail::Question {
            category_name,
            for_seniors_only,
        } => {
            let seniors = if *for_seniors_only { ", seniors only" } else { "" };
            format!("QUESTION: {}{}", category_name, seniors)
        }
        BoardDetail::Meeting {
            schedule,
            location,
            capacity,
        } => {
            let mut text = format!("MEETING: {}", schedule.format("%Y-%m-%d %H:%M"));
            if let Some(location) = location {
                text.push_str(&format!(" @ {}", location));
            }
            if let Some(capacity) = capacity {
                text.push_str(&format!(", {} seats", capacity));
            }
            text
        }
    };
    format!(
        "post #{} by user {} [{}] \"{}\"{}",
        post.id,
        post.author_id,
        board,
        post.title,
        flag(post.is_bad)
    )
}

pub fn comment_line(comment: &Comment) -> String {
    format!(
        "comment #{} on post #{} by {}: {}{}",
        comment.id,
        comment.post_id,
        comment.author_name,
        comment.body,
        flag(comment.is_bad)
    )
}

pub fn verdict_line(verdict: &ClassificationVerdict) -> String {
    if !verdict.is_blocked {
        return "classifier: clean".to_string();
    }
    let mut line = format!(
        "classifier: BLOCKED as {} ({:.0}% confidence)",
        verdict.category,
        verdict.confidence * 100.0
    );
    if !verdict.reason.is_empty() {
        line.push_str(&format!(" - {}", verdict.reason));
    }
    if !verdict.detected_terms.is_empty() {
        line.push_str(&format!(" [{}]", verdict.detected_terms.join(", ")));
    }
    line
}

pub fn penalty_line(penalty: &UserPenalty) -> String {
    let until = penalty
        .end_date
        .map(|end| format!("until {}", end.format("%Y-%m-%d %H:%M UTC")))
        .unwrap_or_else(|| "no end date".to_string());
    format!(
        "penalty #{} {} for user {} ({}, {}) by admin {}: {}",
        penalty.id,
        penalty.penalty_type,
        penalty.user_id,
        penalty.status,
        until,
        penalty.admin_id,
        penalty.reason
    )
}

fn name_or_id(name: &Option<String>, id: u64) -> String {
    name.clone().unwrap_or_else(|| format!("user {}", id))
}

pub fn report_line(detail: &ReportDetail) -> String {
    let report = &detail.report;
    format!(
        "report #{} {} on {} by {} ({})",
        report.id,
        detail.status,
        report.target,
        name_or_id(&detail.reporter_username, report.reporter_id),
        report.reason
    )
}

pub fn report_block(detail: &ReportDetail) -> String {
    let report = &detail.report;
    let mut lines = vec![report_line(detail)];
    lines.push(format!(
        "  filed:    {}",
        report.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    if let Some(text) = &report.detail {
        lines.push(format!("  detail:   {}", text));
    }
    match &detail.target_content {
        Some(target) => {
            let author = detail
                .target_author_username
                .clone()
                .unwrap_or_else(|| format!("user {}", target.author_id));
            lines.push(format!(
                "  target:   {} by {}{}: {}",
                target.target,
                author,
                flag(target.is_bad),
                target.excerpt
            ));
        }
        None => lines.push("  target:   <missing>".to_string()),
    }
    if let Some(resolution) = &report.resolution {
        lines.push(format!(
            "  reviewed: {} by {}",
            resolution.reviewed_at.format("%Y-%m-%d %H:%M UTC"),
            name_or_id(&detail.reviewer_username, resolution.reviewer_id)
        ));
        if let Some(note) = &resolution.note {
            lines.push(format!("  note:     {}", note));
        }
    }
    lines.join("\n")
}

pub fn page_footer<T>(page: &Page<T>) -> String {
    format!(
        "page {} of {} ({} total)",
        page.page + 1,
        page.total_pages().max(1),
        page.total
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::{
        ContentTarget, PenaltyDraft, PenaltyType, ReportReason, Resolution, ReviewDecision,
        UserRole, VerdictCategory,
    };
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_report_json_carries_status() {
        let mut report = Report {
            id: 5,
            reporter_id: 1,
            target: ContentTarget::comment(42),
            reason: ReportReason::Abuse,
            detail: None,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
            resolution: None,
        };

        let pending = serde_json::to_value(ReportJson::from(&report)).unwrap();
        assert_eq!(pending["status"], "PENDING");
        assert_eq!(pending["id"], 5);

        report.resolution = Some(Resolution {
            decision: ReviewDecision::Rejected,
            note: Some("banter".to_string()),
            reviewer_id: 3,
            reviewed_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
        });
        let rejected = serde_json::to_value(ReportJson::from(&report)).unwrap();
        assert_eq!(rejected["status"], "REJECTED");
    }

    #[test]
    fn test_verdict_line_lists_detected_terms() {
        let verdict = ClassificationVerdict::new(
            true,
            VerdictCategory::Profanity,
            "insult",
            0.87,
            vec!["dummy".to_string()],
        );

        assert_eq!(
            verdict_line(&verdict),
            "classifier: BLOCKED as PROFANITY (87% confidence) - insult [dummy]"
        );
        assert_eq!(verdict_line(&ClassificationVerdict::clean()), "classifier: clean");
    }

    #[test]
    fn test_penalty_line_shows_open_ended_penalties() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let penalty = PenaltyDraft {
            user_id: 4,
            penalty_type: PenaltyType::Ban,
            reason: "repeat offender".to_string(),
            start_date: start,
            end_date: None,
            admin_id: 1,
        }
        .into_penalty(2);

        assert_eq!(
            penalty_line(&penalty),
            "penalty #2 BAN for user 4 (ACTIVE, no end date) by admin 1: repeat offender"
        );
    }

    #[test]
    fn test_user_line_marks_seniors() {
        let user = User {
            id: 3,
            username: "senior2".to_string(),
            role: UserRole::Student,
            grade: Some(3),
            is_senior_verified: true,
        };

        assert_eq!(
            user_line(&user),
            "#3 senior2 (STUDENT, grade 3, verified senior)"
        );
    }
}
