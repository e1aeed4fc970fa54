// Read paths for the admin surface. No invariants of its own; it only
// projects what the stores currently hold.

use super::moderation_models::{
    Comment, Page, PageRequest, Post, Report, ReportDetail, ReportStatus,
};
use super::moderation_ports::{ContentStore, Entity, ModerationError, ReportStore, UserStore};
use std::sync::Arc;

pub struct ModerationQueries<S> {
    store: Arc<S>,
}

impl<S> ModerationQueries<S>
where
    S: UserStore + ContentStore + ReportStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn list_reports(
        &self,
        status: Option<ReportStatus>,
        page: PageRequest,
    ) -> Result<Page<ReportDetail>, ModerationError> {
        let reports = self.store.list_reports(status, page).await?;

        let mut items = Vec::with_capacity(reports.items.len());
        for report in reports.items {
            items.push(self.detail(report).await?);
        }

        Ok(Page {
            items,
            page: reports.page,
            size: reports.size,
            total: reports.total,
        })
    }

    pub async fn report_detail(&self, report_id: u64) -> Result<ReportDetail, ModerationError> {
        let report = self
            .store
            .get_report(report_id)
            .await?
            .ok_or(ModerationError::NotFound(Entity::Report, report_id))?;
        self.detail(report).await
    }

    pub async fn flagged_posts(&self) -> Result<Vec<Post>, ModerationError> {
        self.store.flagged_posts().await
    }

    pub async fn flagged_comments(&self) -> Result<Vec<Comment>, ModerationError> {
        self.store.flagged_comments().await
    }

    pub async fn flagged_comment_count(&self) -> Result<u64, ModerationError> {
        self.store.count_comments_by_flag(true).await
    }

    async fn detail(&self, report: Report) -> Result<ReportDetail, ModerationError> {
        let reporter_username = self.username(Some(report.reporter_id)).await?;
        let reviewer_username = self.username(report.reviewer_id()).await?;
        let target_content = self.store.find_target(report.target).await?;
        let target_author_username = self
            .username(target_content.as_ref().map(|t| t.author_id))
            .await?;

        Ok(ReportDetail {
            status: report.status(),
            report,
            reporter_username,
            reviewer_username,
            target_content,
            target_author_username,
        })
    }

    async fn username(&self, user_id: Option<u64>) -> Result<Option<String>, ModerationError> {
        match user_id {
            Some(id) => Ok(self.store.get_user(id).await?.map(|u| u.username)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::{
        ApproveReport, BoardDetail, ContentTarget, NewReport, ReportLifecycle, ReportReason, User,
        UserRole,
    };
    use crate::infra::audit::RecordingAuditSink;
    use crate::infra::community::InMemoryCommunityStore;
    use chrono::Utc;

    fn seeded() -> (
        ModerationQueries<InMemoryCommunityStore>,
        ReportLifecycle<InMemoryCommunityStore>,
    ) {
        let store = Arc::new(InMemoryCommunityStore::new());
        for (id, name, role) in [
            (1, "reporter", UserRole::Student),
            (2, "author", UserRole::Student),
            (3, "admin", UserRole::Admin),
        ] {
            store.put_user(User {
                id,
                username: name.to_string(),
                role,
                grade: None,
                is_senior_verified: false,
            });
        }
        for id in 1..=3 {
            store.put_post(Post {
                id,
                author_id: 2,
                title: format!("post {}", id),
                body: "body".to_string(),
                board: BoardDetail::Talk,
                is_bad: false,
                created_at: Utc::now(),
            });
        }

        let audit = Arc::new(RecordingAuditSink::new());
        (
            ModerationQueries::new(Arc::clone(&store)),
            ReportLifecycle::new(store, audit),
        )
    }

    async fn report_post(lifecycle: &ReportLifecycle<InMemoryCommunityStore>, id: u64) -> u64 {
        lifecycle
            .submit(NewReport {
                reporter_id: 1,
                target: ContentTarget::post(id),
                reason: ReportReason::Spam,
                detail: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let (queries, lifecycle) = seeded();
        let first = report_post(&lifecycle, 1).await;
        report_post(&lifecycle, 2).await;
        report_post(&lifecycle, 3).await;
        lifecycle.reject(first, None, 3).await.unwrap();

        let pending = queries
            .list_reports(Some(ReportStatus::Pending), PageRequest::new(0, 10))
            .await
            .unwrap();
        let all = queries
            .list_reports(None, PageRequest::new(0, 10))
            .await
            .unwrap();

        assert_eq!(pending.total, 2);
        assert!(pending.items.iter().all(|d| d.status == ReportStatus::Pending));
        assert_eq!(all.total, 3);
        assert_eq!(all.items[0].report.id, first);
        assert_eq!(all.items[0].status, ReportStatus::Rejected);
    }

    #[tokio::test]
    async fn test_detail_includes_names_and_target() {
        let (queries, lifecycle) = seeded();
        let id = report_post(&lifecycle, 2).await;
        lifecycle
            .approve(ApproveReport {
                report_id: id,
                review_note: None,
                penalty: None,
                admin_id: 3,
            })
            .await
            .unwrap();

        let detail = queries.report_detail(id).await.unwrap();

        assert_eq!(detail.status, ReportStatus::Approved);
        assert_eq!(detail.reporter_username.as_deref(), Some("reporter"));
        assert_eq!(detail.reviewer_username.as_deref(), Some("admin"));
        assert_eq!(detail.target_author_username.as_deref(), Some("author"));
        let target = detail.target_content.unwrap();
        assert!(target.is_bad);
        assert_eq!(target.excerpt, "post 2 body");
    }

    #[tokio::test]
    async fn test_unknown_report_detail_is_not_found() {
        let (queries, _) = seeded();

        let result = queries.report_detail(12).await;

        assert!(matches!(
            result,
            Err(ModerationError::NotFound(Entity::Report, 12))
        ));
    }

    #[tokio::test]
    async fn test_flagged_posts_reflect_approvals() {
        let (queries, lifecycle) = seeded();
        let id = report_post(&lifecycle, 3).await;
        assert!(queries.flagged_posts().await.unwrap().is_empty());

        lifecycle
            .approve(ApproveReport {
                report_id: id,
                review_note: Some("spam".to_string()),
                penalty: None,
                admin_id: 3,
            })
            .await
            .unwrap();

        let flagged = queries.flagged_posts().await.unwrap();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].id, 3);
        assert_eq!(queries.flagged_comment_count().await.unwrap(), 0);
    }
}
