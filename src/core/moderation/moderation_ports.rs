// Ports for the moderation core - errors and the traits infra implements.
//
// Services are generic over these traits so the SQLite store, the in-memory
// store, and test doubles are interchangeable.

use super::moderation_models::{
    ClassificationVerdict, Comment, CommentDraft, ContentSnapshot, ContentTarget, NewUser, Page,
    PageRequest, PenaltyDraft, Post, PostDraft, Report, ReportDraft, ReportStatus, ReviewCommit,
    TargetType, User, UserPenalty,
};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

/// Kind of record a lookup failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Report,
    User,
    Admin,
    Post,
    Comment,
}

impl Entity {
    pub fn of_target(kind: TargetType) -> Self {
        match kind {
            TargetType::Post => Entity::Post,
            TargetType::Comment => Entity::Comment,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Report => write!(f, "report"),
            Entity::User => write!(f, "user"),
            Entity::Admin => write!(f, "admin"),
            Entity::Post => write!(f, "post"),
            Entity::Comment => write!(f, "comment"),
        }
    }
}

/// Failure talking to the external content classifier.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClassifierError {
    #[error("classifier request timed out")]
    Timeout,

    #[error("classifier transport error: {0}")]
    Transport(String),

    #[error("classifier returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode classifier response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("{0} {1} not found")]
    NotFound(Entity, u64),

    #[error("Privilege denied: {0}")]
    PrivilegeDenied(String),

    #[error("Invalid content: {0}")]
    InvalidContent(String),

    #[error("Report {report_id} is already {status} and cannot be reviewed again")]
    InvalidState { report_id: u64, status: ReportStatus },

    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(#[from] ClassifierError),

    #[error("Storage error: {0}")]
    Storage(String),
}

// ============================================================================
// STORAGE TRAITS
// ============================================================================

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, user_id: u64) -> Result<Option<User>, ModerationError>;

    async fn insert_user(&self, user: NewUser) -> Result<User, ModerationError>;

    async fn count_users(&self) -> Result<u64, ModerationError>;
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn insert_post(&self, draft: PostDraft) -> Result<Post, ModerationError>;

    async fn insert_comment(&self, draft: CommentDraft) -> Result<Comment, ModerationError>;

    async fn get_post(&self, post_id: u64) -> Result<Option<Post>, ModerationError>;

    async fn get_comment(&self, comment_id: u64) -> Result<Option<Comment>, ModerationError>;

    /// Posts with the suppression flag set, oldest first.
    async fn flagged_posts(&self) -> Result<Vec<Post>, ModerationError>;

    /// Comments with the suppression flag set, oldest first.
    async fn flagged_comments(&self) -> Result<Vec<Comment>, ModerationError>;

    async fn count_comments_by_flag(&self, is_bad: bool) -> Result<u64, ModerationError>;

    /// Resolve a report target to its current state.
    async fn find_target(
        &self,
        target: ContentTarget,
    ) -> Result<Option<ContentSnapshot>, ModerationError> {
        match target.kind {
            TargetType::Post => Ok(self.get_post(target.id).await?.map(|p| p.snapshot())),
            TargetType::Comment => Ok(self.get_comment(target.id).await?.map(|c| c.snapshot())),
        }
    }
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn insert_report(&self, draft: ReportDraft) -> Result<Report, ModerationError>;

    async fn get_report(&self, report_id: u64) -> Result<Option<Report>, ModerationError>;

    /// Reports ordered by id ascending, optionally filtered by status.
    async fn list_reports(
        &self,
        status: Option<ReportStatus>,
        page: PageRequest,
    ) -> Result<Page<Report>, ModerationError>;

    /// Apply a review as one unit of work.
    ///
    /// The resolution is only written while the report is still `PENDING`;
    /// otherwise nothing is written and `InvalidState` is returned. A missing
    /// suppression target also aborts the whole commit with `NotFound`.
    /// Returns the stored penalty if the commit carried one.
    async fn commit_review(
        &self,
        commit: ReviewCommit,
    ) -> Result<Option<UserPenalty>, ModerationError>;
}

#[async_trait]
pub trait PenaltyStore: Send + Sync {
    async fn insert_penalty(&self, draft: PenaltyDraft) -> Result<UserPenalty, ModerationError>;

    /// All penalties for a user, oldest first.
    async fn penalties_for_user(&self, user_id: u64) -> Result<Vec<UserPenalty>, ModerationError>;
}

// ============================================================================
// CLASSIFIER
// ============================================================================

/// The opaque "is this harmful?" capability.
#[async_trait]
pub trait ContentClassifier: Send + Sync {
    async fn classify(
        &self,
        text: &str,
        source_tag: &str,
        author_id: Option<u64>,
    ) -> Result<ClassificationVerdict, ClassifierError>;
}

// Lets the composition root pick a classifier at runtime.
#[async_trait]
impl ContentClassifier for Box<dyn ContentClassifier> {
    async fn classify(
        &self,
        text: &str,
        source_tag: &str,
        author_id: Option<u64>,
    ) -> Result<ClassificationVerdict, ClassifierError> {
        (**self).classify(text, source_tag, author_id).await
    }
}

/// How the gate treats a classifier that could not be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifierFailurePolicy {
    /// Fail the creation with `ClassifierUnavailable`; nothing is stored.
    #[default]
    Reject,
    /// Store the content already suppressed so a moderator can release it.
    Suppress,
}

impl std::str::FromStr for ClassifierFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(ClassifierFailurePolicy::Reject),
            "suppress" => Ok(ClassifierFailurePolicy::Suppress),
            other => Err(format!(
                "unknown classifier failure policy '{}' (expected 'reject' or 'suppress')",
                other
            )),
        }
    }
}
