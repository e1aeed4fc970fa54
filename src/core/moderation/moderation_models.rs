// Moderation domain models - users, content, reports, penalties.
//
// These are pure domain types with no storage or transport dependencies.
// Stores convert rows into these; the CLI formats them for output.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Source tag handed to the classifier for posts.
pub const SOURCE_POST: &str = "POST";
/// Source tag handed to the classifier for comments.
pub const SOURCE_COMMENT: &str = "COMMENT";
/// Source tag used by dry-run checks while a user is still typing.
pub const SOURCE_REALTIME: &str = "REALTIME";

const EXCERPT_CHARS: usize = 80;

#[derive(Debug, Clone, Error, PartialEq)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

// Every persisted enum round-trips through an upper-case tag. The macro keeps
// `as_str`, `FromStr` and `Display` in sync.
macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $tag:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $tag),+
                }
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($tag => Ok($name::$variant),)+
                    _ => Err(ParseEnumError {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// ============================================================================
// USERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Student,
    Admin,
}

text_enum!(UserRole, "user role", {
    Student => "STUDENT",
    Admin => "ADMIN",
});

/// A community member as far as moderation cares about them.
///
/// Accounts are owned by the host platform. `is_senior_verified` is set by the
/// grade-verification flow and is the credential required to answer questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub role: UserRole,
    pub grade: Option<u8>,
    pub is_senior_verified: bool,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub role: UserRole,
    pub grade: Option<u8>,
    pub is_senior_verified: bool,
}

// ============================================================================
// CONTENT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoardType {
    Talk,
    Question,
    Meeting,
}

text_enum!(BoardType, "board type", {
    Talk => "TALK",
    Question => "QUESTION",
    Meeting => "MEETING",
});

/// Board tag plus the payload that board requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "board", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoardDetail {
    Talk,
    Question {
        category_name: String,
        for_seniors_only: bool,
    },
    Meeting {
        schedule: DateTime<Utc>,
        location: Option<String>,
        capacity: Option<u32>,
    },
}

impl BoardDetail {
    pub fn board_type(&self) -> BoardType {
        match self {
            BoardDetail::Talk => BoardType::Talk,
            BoardDetail::Question { .. } => BoardType::Question,
            BoardDetail::Meeting { .. } => BoardType::Meeting,
        }
    }

    /// Answers on this board are limited to senior-verified members.
    pub fn restricts_answers(&self) -> bool {
        matches!(self, BoardDetail::Question { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub author_id: u64,
    pub title: String,
    pub body: String,
    pub board: BoardDetail,
    pub is_bad: bool,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn snapshot(&self) -> ContentSnapshot {
        ContentSnapshot {
            target: ContentTarget::post(self.id),
            author_id: self.author_id,
            excerpt: excerpt(&format!("{} {}", self.title, self.body)),
            is_bad: self.is_bad,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub post_id: u64,
    pub author_id: u64,
    pub author_name: String,
    pub body: String,
    pub is_bad: bool,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn snapshot(&self) -> ContentSnapshot {
        ContentSnapshot {
            target: ContentTarget::comment(self.id),
            author_id: self.author_id,
            excerpt: excerpt(&self.body),
            is_bad: self.is_bad,
        }
    }
}

/// Meeting fields as submitted; the schedule is an ISO local date-time string.
#[derive(Debug, Clone, Default)]
pub struct MeetingInfo {
    pub schedule: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct QuestionInfo {
    pub category_name: Option<String>,
    pub for_seniors_only: bool,
}

/// A post creation request before board validation.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: u64,
    pub title: String,
    pub body: String,
    pub board: BoardType,
    pub meeting: Option<MeetingInfo>,
    pub question: Option<QuestionInfo>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub author_id: u64,
    pub post_id: u64,
    pub body: String,
}

/// A validated, classified post ready to be stored.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub author_id: u64,
    pub title: String,
    pub body: String,
    pub board: BoardDetail,
    pub is_bad: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CommentDraft {
    pub post_id: u64,
    pub author_id: u64,
    pub author_name: String,
    pub body: String,
    pub is_bad: bool,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictCategory {
    Clean,
    Profanity,
    Hate,
    Sexual,
    Violence,
    Spam,
    PersonalInfo,
    #[serde(other)]
    Other,
}

text_enum!(VerdictCategory, "verdict category", {
    Clean => "CLEAN",
    Profanity => "PROFANITY",
    Hate => "HATE",
    Sexual => "SEXUAL",
    Violence => "VIOLENCE",
    Spam => "SPAM",
    PersonalInfo => "PERSONAL_INFO",
    Other => "OTHER",
});

/// What the content classifier decided about one piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationVerdict {
    pub is_blocked: bool,
    pub category: VerdictCategory,
    pub reason: String,
    /// Always within 0.0..=1.0.
    pub confidence: f64,
    pub detected_terms: Vec<String>,
}

impl ClassificationVerdict {
    pub fn new(
        is_blocked: bool,
        category: VerdictCategory,
        reason: impl Into<String>,
        confidence: f64,
        detected_terms: Vec<String>,
    ) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            is_blocked,
            category,
            reason: reason.into(),
            confidence,
            detected_terms,
        }
    }

    pub fn clean() -> Self {
        Self::new(false, VerdictCategory::Clean, "", 1.0, Vec::new())
    }

    /// Verdict recorded when the classifier could not be reached and the gate
    /// is configured to suppress rather than reject.
    pub fn fallback(error: &str) -> Self {
        Self::new(
            true,
            VerdictCategory::Other,
            format!("classifier unavailable: {}", error),
            0.0,
            Vec::new(),
        )
    }
}

// ============================================================================
// REPORTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetType {
    Post,
    Comment,
}

text_enum!(TargetType, "target type", {
    Post => "POST",
    Comment => "COMMENT",
});

/// A reportable content item, addressed by type and id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentTarget {
    pub kind: TargetType,
    pub id: u64,
}

impl ContentTarget {
    pub fn post(id: u64) -> Self {
        Self {
            kind: TargetType::Post,
            id,
        }
    }

    pub fn comment(id: u64) -> Self {
        Self {
            kind: TargetType::Comment,
            id,
        }
    }
}

impl fmt::Display for ContentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.id)
    }
}

/// Minimal view of a target used for review and detail listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSnapshot {
    pub target: ContentTarget,
    pub author_id: u64,
    pub excerpt: String,
    pub is_bad: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportReason {
    Spam,
    Abuse,
    Harassment,
    Sexual,
    Hate,
    Misinformation,
    Other,
}

text_enum!(ReportReason, "report reason", {
    Spam => "SPAM",
    Abuse => "ABUSE",
    Harassment => "HARASSMENT",
    Sexual => "SEXUAL",
    Hate => "HATE",
    Misinformation => "MISINFORMATION",
    Other => "OTHER",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Pending,
    Approved,
    Rejected,
}

text_enum!(ReportStatus, "report status", {
    Pending => "PENDING",
    Approved => "APPROVED",
    Rejected => "REJECTED",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl ReviewDecision {
    pub fn status(&self) -> ReportStatus {
        match self {
            ReviewDecision::Approved => ReportStatus::Approved,
            ReviewDecision::Rejected => ReportStatus::Rejected,
        }
    }
}

/// The one-time administrative decision on a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub decision: ReviewDecision,
    pub note: Option<String>,
    pub reviewer_id: u64,
    pub reviewed_at: DateTime<Utc>,
}

/// A user's complaint about a post or comment.
///
/// There is no separate status column: a report is `PENDING` exactly while it
/// has no resolution, so reviewer and review time can't drift from the status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: u64,
    pub reporter_id: u64,
    pub target: ContentTarget,
    pub reason: ReportReason,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolution: Option<Resolution>,
}

impl Report {
    pub fn status(&self) -> ReportStatus {
        self.resolution
            .as_ref()
            .map(|r| r.decision.status())
            .unwrap_or(ReportStatus::Pending)
    }

    pub fn is_pending(&self) -> bool {
        self.resolution.is_none()
    }

    pub fn reviewer_id(&self) -> Option<u64> {
        self.resolution.as_ref().map(|r| r.reviewer_id)
    }

    pub fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.resolution.as_ref().map(|r| r.reviewed_at)
    }

    pub fn review_note(&self) -> Option<&str> {
        self.resolution.as_ref().and_then(|r| r.note.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub reporter_id: u64,
    pub target: ContentTarget,
    pub reason: ReportReason,
    pub detail: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReportDraft {
    pub reporter_id: u64,
    pub target: ContentTarget,
    pub reason: ReportReason,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Everything one review writes. Stores apply it as a single unit of work.
#[derive(Debug, Clone)]
pub struct ReviewCommit {
    pub report_id: u64,
    pub resolution: Resolution,
    /// Content to mark as bad (approvals only).
    pub suppress: Option<ContentTarget>,
    pub penalty: Option<PenaltyDraft>,
}

/// Report plus the names and target state an admin needs to judge it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDetail {
    #[serde(flatten)]
    pub report: Report,
    pub status: ReportStatus,
    pub reporter_username: Option<String>,
    pub reviewer_username: Option<String>,
    /// `None` when the target no longer exists.
    pub target_content: Option<ContentSnapshot>,
    pub target_author_username: Option<String>,
}

// ============================================================================
// PENALTIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PenaltyType {
    Warning,
    Suspension,
    Ban,
}

text_enum!(PenaltyType, "penalty type", {
    Warning => "WARNING",
    Suspension => "SUSPENSION",
    Ban => "BAN",
});

impl PenaltyType {
    pub fn is_time_bounded(&self) -> bool {
        matches!(self, PenaltyType::Suspension)
    }

    /// End of a penalty starting at `start`. `Ok(None)` means it never lapses
    /// on its own, either because the type has no duration or none was given.
    pub fn end_date(
        &self,
        start: DateTime<Utc>,
        duration_days: Option<u32>,
    ) -> Result<Option<DateTime<Utc>>, DurationOutOfRange> {
        match duration_days {
            Some(days) if self.is_time_bounded() => {
                if days > MAX_SUSPENSION_DAYS {
                    return Err(DurationOutOfRange { days });
                }
                start
                    .checked_add_signed(Duration::days(i64::from(days)))
                    .map(Some)
                    .ok_or(DurationOutOfRange { days })
            }
            _ => Ok(None),
        }
    }
}

/// Longest suspension that can be issued, roughly a hundred years.
pub const MAX_SUSPENSION_DAYS: u32 = 36_500;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("suspension length of {days} days is out of range (max {max})", max = MAX_SUSPENSION_DAYS)]
pub struct DurationOutOfRange {
    pub days: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PenaltyStatus {
    Active,
    Expired,
    Revoked,
}

text_enum!(PenaltyStatus, "penalty status", {
    Active => "ACTIVE",
    Expired => "EXPIRED",
    Revoked => "REVOKED",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPenalty {
    pub id: u64,
    pub user_id: u64,
    pub penalty_type: PenaltyType,
    pub reason: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: PenaltyStatus,
    pub admin_id: u64,
}

impl UserPenalty {
    /// Active and not past its end date.
    pub fn is_in_force(&self, now: DateTime<Utc>) -> bool {
        self.status == PenaltyStatus::Active && self.end_date.map_or(true, |end| now < end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PenaltyDraft {
    pub user_id: u64,
    pub penalty_type: PenaltyType,
    pub reason: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub admin_id: u64,
}

impl PenaltyDraft {
    pub fn into_penalty(self, id: u64) -> UserPenalty {
        UserPenalty {
            id,
            user_id: self.user_id,
            penalty_type: self.penalty_type,
            reason: self.reason,
            start_date: self.start_date,
            end_date: self.end_date,
            status: PenaltyStatus::Active,
            admin_id: self.admin_id,
        }
    }
}

// ============================================================================
// PAGINATION
// ============================================================================

pub const MAX_PAGE_SIZE: u32 = 100;

/// Zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.size.max(1)))
    }
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= EXCERPT_CHARS {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(EXCERPT_CHARS).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suspension_end_date_adds_days() {
        let start = Utc::now();
        let end = PenaltyType::Suspension.end_date(start, Some(7));
        assert_eq!(end, Ok(Some(start + Duration::days(7))));
    }

    #[test]
    fn test_oversized_suspension_is_out_of_range() {
        let start = Utc::now();
        let max = PenaltyType::Suspension.end_date(start, Some(MAX_SUSPENSION_DAYS));
        assert_eq!(max, Ok(Some(start + Duration::days(i64::from(MAX_SUSPENSION_DAYS)))));

        assert_eq!(
            PenaltyType::Suspension.end_date(start, Some(u32::MAX)),
            Err(DurationOutOfRange { days: u32::MAX })
        );
        assert_eq!(
            PenaltyType::Suspension.end_date(start, Some(MAX_SUSPENSION_DAYS + 1)),
            Err(DurationOutOfRange { days: MAX_SUSPENSION_DAYS + 1 })
        );
        // Untimed penalties ignore the duration entirely.
        assert_eq!(PenaltyType::Ban.end_date(start, Some(u32::MAX)), Ok(None));
    }

    #[test]
    fn test_untimed_penalties_have_no_end_date() {
        let start = Utc::now();
        assert_eq!(PenaltyType::Suspension.end_date(start, None), Ok(None));
        assert_eq!(PenaltyType::Ban.end_date(start, Some(30)), Ok(None));
        assert_eq!(PenaltyType::Warning.end_date(start, Some(3)), Ok(None));
    }

    #[test]
    fn test_report_status_follows_resolution() {
        let mut report = Report {
            id: 1,
            reporter_id: 2,
            target: ContentTarget::comment(42),
            reason: ReportReason::Abuse,
            detail: None,
            created_at: Utc::now(),
            resolution: None,
        };
        assert_eq!(report.status(), ReportStatus::Pending);
        assert!(report.reviewer_id().is_none() && report.reviewed_at().is_none());

        report.resolution = Some(Resolution {
            decision: ReviewDecision::Rejected,
            note: Some("not abuse".to_string()),
            reviewer_id: 9,
            reviewed_at: Utc::now(),
        });
        assert_eq!(report.status(), ReportStatus::Rejected);
        assert_eq!(report.reviewer_id(), Some(9));
        assert!(report.reviewed_at().is_some());
    }

    #[test]
    fn test_enum_tags_parse_case_insensitively() {
        assert_eq!("suspension".parse::<PenaltyType>(), Ok(PenaltyType::Suspension));
        assert_eq!(" Comment ".parse::<TargetType>(), Ok(TargetType::Comment));
        assert_eq!("personal_info".parse::<VerdictCategory>(), Ok(VerdictCategory::PersonalInfo));
        let err = "expelled".parse::<PenaltyType>().unwrap_err();
        assert_eq!(err.kind, "penalty type");
    }

    #[test]
    fn test_verdict_confidence_is_clamped() {
        let high = ClassificationVerdict::new(true, VerdictCategory::Hate, "x", 1.7, vec![]);
        let low = ClassificationVerdict::new(true, VerdictCategory::Hate, "x", -0.2, vec![]);
        let nan = ClassificationVerdict::new(true, VerdictCategory::Hate, "x", f64::NAN, vec![]);
        assert_eq!(high.confidence, 1.0);
        assert_eq!(low.confidence, 0.0);
        assert_eq!(nan.confidence, 0.0);
    }

    #[test]
    fn test_penalty_in_force_until_end_date() {
        let start = Utc::now();
        let penalty = PenaltyDraft {
            user_id: 1,
            penalty_type: PenaltyType::Suspension,
            reason: "spam".to_string(),
            start_date: start,
            end_date: PenaltyType::Suspension.end_date(start, Some(1)).unwrap(),
            admin_id: 2,
        }
        .into_penalty(10);

        assert!(penalty.is_in_force(start + Duration::hours(23)));
        assert!(!penalty.is_in_force(start + Duration::days(2)));
    }

    #[test]
    fn test_page_request_clamps_size() {
        assert_eq!(PageRequest::new(0, 0).size, 1);
        assert_eq!(PageRequest::new(2, 500).size, MAX_PAGE_SIZE);
        assert_eq!(PageRequest::new(3, 20).offset(), 60);
    }

    #[test]
    fn test_excerpt_truncates_long_text() {
        let long = "a".repeat(200);
        let cut = excerpt(&long);
        assert_eq!(cut.chars().count(), EXCERPT_CHARS + 3);
        assert!(cut.ends_with("..."));
        assert_eq!(excerpt("  short  "), "short");
    }
}
