// Moderation gate - runs on every post and comment before it is stored.
//
// Order matters: author lookup, board validation and the answer restriction
// are pure preconditions and run before the classifier is called. Once those
// pass, the content is always stored; the verdict only decides `is_bad`.

use super::audit::{AuditEvent, AuditSink};
use super::moderation_models::{
    BoardDetail, BoardType, ClassificationVerdict, Comment, CommentDraft, ContentTarget, NewComment,
    NewPost, Post, PostDraft, User, SOURCE_COMMENT, SOURCE_POST,
};
use super::moderation_ports::{
    ClassifierFailurePolicy, ContentClassifier, ContentStore, Entity, ModerationError, UserStore,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::sync::Arc;

const SCHEDULE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

pub struct ModerationGate<S, C> {
    store: Arc<S>,
    classifier: C,
    audit: Arc<dyn AuditSink>,
    failure_policy: ClassifierFailurePolicy,
}

/// Result of consulting the classifier. `fallback` holds the classifier
/// error when the verdict was synthesised by the failure policy.
struct Screening {
    verdict: ClassificationVerdict,
    fallback: Option<String>,
}

impl<S, C> ModerationGate<S, C>
where
    S: UserStore + ContentStore,
    C: ContentClassifier,
{
    pub fn new(store: Arc<S>, classifier: C, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            store,
            classifier,
            audit,
            failure_policy: ClassifierFailurePolicy::default(),
        }
    }

    pub fn with_failure_policy(mut self, policy: ClassifierFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Validate, classify and store a new post.
    pub async fn submit_post(
        &self,
        request: NewPost,
    ) -> Result<(Post, ClassificationVerdict), ModerationError> {
        let author = self.require_author(request.author_id).await?;
        let board = validate_board(&request)?;

        let text = format!("{} {}", request.title, request.body);
        let screening = self.screen(&text, SOURCE_POST, author.id).await?;

        let post = self
            .store
            .insert_post(PostDraft {
                author_id: author.id,
                title: request.title,
                body: request.body,
                board,
                is_bad: screening.verdict.is_blocked,
                created_at: Utc::now(),
            })
            .await?;

        self.report_screening(ContentTarget::post(post.id), author.id, &screening);
        Ok((post, screening.verdict))
    }

    /// Check the answer restriction, classify and store a new comment.
    pub async fn submit_comment(
        &self,
        request: NewComment,
    ) -> Result<(Comment, ClassificationVerdict), ModerationError> {
        let author = self.require_author(request.author_id).await?;
        let post = self
            .store
            .get_post(request.post_id)
            .await?
            .ok_or(ModerationError::NotFound(Entity::Post, request.post_id))?;

        if post.board.restricts_answers() && !author.is_senior_verified {
            return Err(ModerationError::PrivilegeDenied(format!(
                "only verified seniors may answer on the {} board",
                post.board.board_type()
            )));
        }

        let screening = self.screen(&request.body, SOURCE_COMMENT, author.id).await?;

        let comment = self
            .store
            .insert_comment(CommentDraft {
                post_id: post.id,
                author_id: author.id,
                author_name: author.username.clone(),
                body: request.body,
                is_bad: screening.verdict.is_blocked,
                created_at: Utc::now(),
            })
            .await?;

        self.report_screening(ContentTarget::comment(comment.id), author.id, &screening);
        Ok((comment, screening.verdict))
    }

    /// Dry-run classification for text that is not being stored yet.
    ///
    /// Classifier failures always propagate here; a preview never pretends
    /// the text is clean.
    pub async fn preview(
        &self,
        text: &str,
        source_tag: &str,
        author_id: Option<u64>,
    ) -> Result<ClassificationVerdict, ModerationError> {
        if text.trim().is_empty() {
            return Err(ModerationError::InvalidContent("text is empty".to_string()));
        }
        Ok(self.classifier.classify(text, source_tag, author_id).await?)
    }

    async fn require_author(&self, author_id: u64) -> Result<User, ModerationError> {
        self.store
            .get_user(author_id)
            .await?
            .ok_or(ModerationError::NotFound(Entity::User, author_id))
    }

    async fn screen(
        &self,
        text: &str,
        source_tag: &str,
        author_id: u64,
    ) -> Result<Screening, ModerationError> {
        match self.classifier.classify(text, source_tag, Some(author_id)).await {
            Ok(verdict) => Ok(Screening {
                verdict,
                fallback: None,
            }),
            Err(err) => match self.failure_policy {
                ClassifierFailurePolicy::Reject => Err(err.into()),
                ClassifierFailurePolicy::Suppress => {
                    let error = err.to_string();
                    Ok(Screening {
                        verdict: ClassificationVerdict::fallback(&error),
                        fallback: Some(error),
                    })
                }
            },
        }
    }

    fn report_screening(&self, target: ContentTarget, author_id: u64, screening: &Screening) {
        if let Some(error) = &screening.fallback {
            self.audit.record(AuditEvent::ClassifierFallback {
                target,
                author_id,
                error: error.clone(),
            });
        } else if screening.verdict.is_blocked {
            self.audit.record(AuditEvent::ContentFlagged {
                target,
                author_id,
                category: screening.verdict.category,
                reason: screening.verdict.reason.clone(),
                confidence: screening.verdict.confidence,
            });
        }
    }
}

/// Turn the raw board fields into the payload the board requires.
fn validate_board(request: &NewPost) -> Result<BoardDetail, ModerationError> {
    match request.board {
        BoardType::Talk => Ok(BoardDetail::Talk),
        BoardType::Question => {
            let info = request.question.as_ref().ok_or_else(|| {
                ModerationError::InvalidContent(
                    "question board posts need question info".to_string(),
                )
            })?;
            let category_name = info
                .category_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| {
                    ModerationError::InvalidContent("question category is required".to_string())
                })?;
            Ok(BoardDetail::Question {
                category_name: category_name.to_string(),
                for_seniors_only: info.for_seniors_only,
            })
        }
        BoardType::Meeting => {
            let info = request.meeting.as_ref().ok_or_else(|| {
                ModerationError::InvalidContent(
                    "meeting board posts need meeting info".to_string(),
                )
            })?;
            let raw = info
                .schedule
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    ModerationError::InvalidContent("meeting schedule is required".to_string())
                })?;
            Ok(BoardDetail::Meeting {
                schedule: parse_schedule(raw)?,
                location: info.location.clone(),
                capacity: info.capacity,
            })
        }
    }
}

fn parse_schedule(raw: &str) -> Result<DateTime<Utc>, ModerationError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    SCHEDULE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            ModerationError::InvalidContent(format!(
                "meeting schedule '{}' is not an ISO date-time",
                raw
            ))
        })
}
