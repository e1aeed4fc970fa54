// In-memory implementation of every community store port.
//
// Test-only: the service tests run against it, the binary always uses SQLite.
// DashMap gives us concurrent reads/writes without a global lock; review
// commits take a dedicated mutex so their three writes land together.

use crate::core::moderation::{
    Comment, CommentDraft, ContentStore, ContentTarget, Entity, ModerationError, NewUser, Page,
    PageRequest, PenaltyDraft, PenaltyStore, Post, PostDraft, Report, ReportDraft, ReportStatus,
    ReportStore, ReviewCommit, TargetType, User, UserPenalty, UserStore,
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Hands out ids starting at 1, like an AUTOINCREMENT column.
#[derive(Default)]
struct IdSequence(AtomicU64);

impl IdSequence {
    fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Make sure later ids never collide with an explicitly inserted one.
    fn bump_past(&self, id: u64) {
        self.0.fetch_max(id, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct InMemoryCommunityStore {
    users: DashMap<u64, User>,
    posts: DashMap<u64, Post>,
    comments: DashMap<u64, Comment>,
    reports: DashMap<u64, Report>,
    penalties: DashMap<u64, UserPenalty>,
    user_ids: IdSequence,
    post_ids: IdSequence,
    comment_ids: IdSequence,
    report_ids: IdSequence,
    penalty_ids: IdSequence,
    review_lock: Mutex<()>,
}

impl InMemoryCommunityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user with a fixed id.
    pub fn put_user(&self, user: User) {
        self.user_ids.bump_past(user.id);
        self.users.insert(user.id, user);
    }

    /// Insert a post with a fixed id.
    pub fn put_post(&self, post: Post) {
        self.post_ids.bump_past(post.id);
        self.posts.insert(post.id, post);
    }

    /// Insert a comment with a fixed id.
    pub fn put_comment(&self, comment: Comment) {
        self.comment_ids.bump_past(comment.id);
        self.comments.insert(comment.id, comment);
    }

    pub fn penalty_count(&self) -> usize {
        self.penalties.len()
    }

    fn target_exists(&self, target: ContentTarget) -> bool {
        match target.kind {
            TargetType::Post => self.posts.contains_key(&target.id),
            TargetType::Comment => self.comments.contains_key(&target.id),
        }
    }

    fn set_flag(&self, target: ContentTarget) {
        match target.kind {
            TargetType::Post => {
                if let Some(mut post) = self.posts.get_mut(&target.id) {
                    post.is_bad = true;
                }
            }
            TargetType::Comment => {
                if let Some(mut comment) = self.comments.get_mut(&target.id) {
                    comment.is_bad = true;
                }
            }
        }
    }
}

fn sorted_by_id<T: Clone>(map: &DashMap<u64, T>, keep: impl Fn(&T) -> bool) -> Vec<T> {
    let mut rows: Vec<(u64, T)> = map
        .iter()
        .filter(|entry| keep(entry.value()))
        .map(|entry| (*entry.key(), entry.value().clone()))
        .collect();
    rows.sort_by_key(|(id, _)| *id);
    rows.into_iter().map(|(_, value)| value).collect()
}

#[async_trait]
impl UserStore for InMemoryCommunityStore {
    async fn get_user(&self, user_id: u64) -> Result<Option<User>, ModerationError> {
        Ok(self.users.get(&user_id).map(|u| u.clone()))
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, ModerationError> {
        let stored = User {
            id: self.user_ids.next(),
            username: user.username,
            role: user.role,
            grade: user.grade,
            is_senior_verified: user.is_senior_verified,
        };
        self.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn count_users(&self) -> Result<u64, ModerationError> {
        Ok(self.users.len() as u64)
    }
}

#[async_trait]
impl ContentStore for InMemoryCommunityStore {
    async fn insert_post(&self, draft: PostDraft) -> Result<Post, ModerationError> {
        let post = Post {
            id: self.post_ids.next(),
            author_id: draft.author_id,
            title: draft.title,
            body: draft.body,
            board: draft.board,
            is_bad: draft.is_bad,
            created_at: draft.created_at,
        };
        self.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn insert_comment(&self, draft: CommentDraft) -> Result<Comment, ModerationError> {
        let comment = Comment {
            id: self.comment_ids.next(),
            post_id: draft.post_id,
            author_id: draft.author_id,
            author_name: draft.author_name,
            body: draft.body,
            is_bad: draft.is_bad,
            created_at: draft.created_at,
        };
        self.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn get_post(&self, post_id: u64) -> Result<Option<Post>, ModerationError> {
        Ok(self.posts.get(&post_id).map(|p| p.clone()))
    }

    async fn get_comment(&self, comment_id: u64) -> Result<Option<Comment>, ModerationError> {
        Ok(self.comments.get(&comment_id).map(|c| c.clone()))
    }

    async fn flagged_posts(&self) -> Result<Vec<Post>, ModerationError> {
        Ok(sorted_by_id(&self.posts, |p| p.is_bad))
    }

    async fn flagged_comments(&self) -> Result<Vec<Comment>, ModerationError> {
        Ok(sorted_by_id(&self.comments, |c| c.is_bad))
    }

    async fn count_comments_by_flag(&self, is_bad: bool) -> Result<u64, ModerationError> {
        Ok(self.comments.iter().filter(|c| c.is_bad == is_bad).count() as u64)
    }
}

#[async_trait]
impl ReportStore for InMemoryCommunityStore {
    async fn insert_report(&self, draft: ReportDraft) -> Result<Report, ModerationError> {
        let report = Report {
            id: self.report_ids.next(),
            reporter_id: draft.reporter_id,
            target: draft.target,
            reason: draft.reason,
            detail: draft.detail,
            created_at: draft.created_at,
            resolution: None,
        };
        self.reports.insert(report.id, report.clone());
        Ok(report)
    }

    async fn get_report(&self, report_id: u64) -> Result<Option<Report>, ModerationError> {
        Ok(self.reports.get(&report_id).map(|r| r.clone()))
    }

    async fn list_reports(
        &self,
        status: Option<ReportStatus>,
        page: PageRequest,
    ) -> Result<Page<Report>, ModerationError> {
        let matching = sorted_by_id(&self.reports, |r| status.map_or(true, |s| r.status() == s));
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .collect();

        Ok(Page {
            items,
            page: page.page,
            size: page.size,
            total,
        })
    }

    async fn commit_review(
        &self,
        commit: ReviewCommit,
    ) -> Result<Option<UserPenalty>, ModerationError> {
        let _guard = self
            .review_lock
            .lock()
            .map_err(|_| ModerationError::Storage("review lock poisoned".to_string()))?;

        // Validate everything first; after this point no write can fail.
        let status = self
            .reports
            .get(&commit.report_id)
            .map(|r| r.status())
            .ok_or(ModerationError::NotFound(Entity::Report, commit.report_id))?;
        if status != ReportStatus::Pending {
            return Err(ModerationError::InvalidState {
                report_id: commit.report_id,
                status,
            });
        }
        if let Some(target) = commit.suppress {
            if !self.target_exists(target) {
                return Err(ModerationError::NotFound(
                    Entity::of_target(target.kind),
                    target.id,
                ));
            }
        }

        if let Some(mut report) = self.reports.get_mut(&commit.report_id) {
            report.resolution = Some(commit.resolution);
        }
        if let Some(target) = commit.suppress {
            self.set_flag(target);
        }
        let penalty = commit.penalty.map(|draft| {
            let penalty = draft.into_penalty(self.penalty_ids.next());
            self.penalties.insert(penalty.id, penalty.clone());
            penalty
        });

        Ok(penalty)
    }
}

#[async_trait]
impl PenaltyStore for InMemoryCommunityStore {
    async fn insert_penalty(&self, draft: PenaltyDraft) -> Result<UserPenalty, ModerationError> {
        let penalty = draft.into_penalty(self.penalty_ids.next());
        self.penalties.insert(penalty.id, penalty.clone());
        Ok(penalty)
    }

    async fn penalties_for_user(&self, user_id: u64) -> Result<Vec<UserPenalty>, ModerationError> {
        Ok(sorted_by_id(&self.penalties, |p| p.user_id == user_id))
    }
}
