// ReportStore for SQLite, including the review transaction.

use super::sqlite_penalties::insert_penalty_row;
use super::sqlite_store::{parse_optional_time, parse_tag, parse_time, storage, SqliteCommunityStore};
use crate::core::moderation::{
    ContentTarget, Entity, ModerationError, Page, PageRequest, Report, ReportDraft, ReportStatus,
    ReportStore, Resolution, ReviewCommit, ReviewDecision, TargetType, UserPenalty,
};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn report_from_row(row: &SqliteRow) -> Result<Report, ModerationError> {
    let id = row.get::<i64, _>("id") as u64;
    let status: ReportStatus = parse_tag(&row.get::<String, _>("status"))?;
    let reviewer_id = row.get::<Option<i64>, _>("reviewer_id").map(|r| r as u64);
    let reviewed_at = parse_optional_time(row.get("reviewed_at"))?;

    let decision = match status {
        ReportStatus::Pending => None,
        ReportStatus::Approved => Some(ReviewDecision::Approved),
        ReportStatus::Rejected => Some(ReviewDecision::Rejected),
    };
    let resolution = match (decision, reviewer_id, reviewed_at) {
        (None, _, _) => None,
        (Some(decision), Some(reviewer_id), Some(reviewed_at)) => Some(Resolution {
            decision,
            note: row.get("review_note"),
            reviewer_id,
            reviewed_at,
        }),
        (Some(_), _, _) => {
            return Err(ModerationError::Storage(format!(
                "report {} is {} without reviewer metadata",
                id, status
            )))
        }
    };

    Ok(Report {
        id,
        reporter_id: row.get::<i64, _>("reporter_id") as u64,
        target: ContentTarget {
            kind: parse_tag(&row.get::<String, _>("target_type"))?,
            id: row.get::<i64, _>("target_id") as u64,
        },
        reason: parse_tag(&row.get::<String, _>("reason"))?,
        detail: row.get("detail"),
        created_at: parse_time(&row.get::<String, _>("created_at"))?,
        resolution,
    })
}

#[async_trait]
impl ReportStore for SqliteCommunityStore {
    async fn insert_report(&self, draft: ReportDraft) -> Result<Report, ModerationError> {
        let result = sqlx::query(
            r#"
            INSERT INTO reports (reporter_id, target_type, target_id, reason, detail, status, created_at)
            VALUES (?, ?, ?, ?, ?, 'PENDING', ?)
            "#,
        )
        .bind(draft.reporter_id as i64)
        .bind(draft.target.kind.as_str())
        .bind(draft.target.id as i64)
        .bind(draft.reason.as_str())
        .bind(&draft.detail)
        .bind(draft.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(Report {
            id: result.last_insert_rowid() as u64,
            reporter_id: draft.reporter_id,
            target: draft.target,
            reason: draft.reason,
            detail: draft.detail,
            created_at: draft.created_at,
            resolution: None,
        })
    }

    async fn get_report(&self, report_id: u64) -> Result<Option<Report>, ModerationError> {
        let row = sqlx::query("SELECT * FROM reports WHERE id = ?")
            .bind(report_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        row.as_ref().map(report_from_row).transpose()
    }

    async fn list_reports(
        &self,
        status: Option<ReportStatus>,
        page: PageRequest,
    ) -> Result<Page<Report>, ModerationError> {
        let status_tag = status.map(|s| s.as_str());

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM reports WHERE (? IS NULL OR status = ?)")
                .bind(status_tag)
                .bind(status_tag)
                .fetch_one(&self.pool)
                .await
                .map_err(storage)?;

        let rows = sqlx::query(
            r#"
            SELECT * FROM reports
            WHERE (? IS NULL OR status = ?)
            ORDER BY id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(status_tag)
        .bind(status_tag)
        .bind(i64::from(page.size))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        Ok(Page {
            items: rows
                .iter()
                .map(report_from_row)
                .collect::<Result<Vec<_>, _>>()?,
            page: page.page,
            size: page.size,
            total: total as u64,
        })
    }

    async fn commit_review(
        &self,
        commit: ReviewCommit,
    ) -> Result<Option<UserPenalty>, ModerationError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        // Compare-and-set: only a PENDING row accepts a resolution.
        let updated = sqlx::query(
            r#"
            UPDATE reports
            SET status = ?, review_note = ?, reviewer_id = ?, reviewed_at = ?
            WHERE id = ? AND status = 'PENDING'
            "#,
        )
        .bind(commit.resolution.decision.status().as_str())
        .bind(&commit.resolution.note)
        .bind(commit.resolution.reviewer_id as i64)
        .bind(commit.resolution.reviewed_at.to_rfc3339())
        .bind(commit.report_id as i64)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        if updated.rows_affected() == 0 {
            let current: Option<String> =
                sqlx::query_scalar("SELECT status FROM reports WHERE id = ?")
                    .bind(commit.report_id as i64)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(storage)?;
            // Dropping the transaction rolls it back.
            return Err(match current {
                Some(raw) => ModerationError::InvalidState {
                    report_id: commit.report_id,
                    status: parse_tag(&raw)?,
                },
                None => ModerationError::NotFound(Entity::Report, commit.report_id),
            });
        }

        if let Some(target) = commit.suppress {
            let sql = match target.kind {
                TargetType::Post => "UPDATE posts SET is_bad = 1 WHERE id = ?",
                TargetType::Comment => "UPDATE comments SET is_bad = 1 WHERE id = ?",
            };
            let flagged = sqlx::query(sql)
                .bind(target.id as i64)
                .execute(&mut *tx)
                .await
                .map_err(storage)?;
            if flagged.rows_affected() == 0 {
                return Err(ModerationError::NotFound(
                    Entity::of_target(target.kind),
                    target.id,
                ));
            }
        }

        let penalty = match commit.penalty {
            Some(draft) => {
                let id = insert_penalty_row(&mut *tx, &draft)
                    .await
                    .map_err(storage)?;
                Some(draft.into_penalty(id))
            }
            None => None,
        };

        tx.commit().await.map_err(storage)?;
        Ok(penalty)
    }
}

#[cfg(test)]
mod tests {
    use super::super::sqlite_store::test_support::temp_store;
    use super::*;
    use crate::core::moderation::{
        BoardDetail, ContentStore, PenaltyDraft, PenaltyStore, PenaltyType, PostDraft,
        ReportReason,
    };
    use chrono::Utc;

    async fn post(store: &SqliteCommunityStore) -> u64 {
        store
            .insert_post(PostDraft {
                author_id: 2,
                title: "free coins".to_string(),
                body: "click here".to_string(),
                board: BoardDetail::Talk,
                is_bad: false,
                created_at: Utc::now(),
            })
            .await
            .unwrap()
            .id
    }

    async fn report(store: &SqliteCommunityStore, target: ContentTarget) -> Report {
        store
            .insert_report(ReportDraft {
                reporter_id: 1,
                target,
                reason: ReportReason::Spam,
                detail: Some("obvious spam".to_string()),
                created_at: Utc::now(),
            })
            .await
            .unwrap()
    }

    fn approval(report_id: u64, target: ContentTarget, penalty: bool) -> ReviewCommit {
        let now = Utc::now();
        ReviewCommit {
            report_id,
            resolution: Resolution {
                decision: ReviewDecision::Approved,
                note: Some("confirmed".to_string()),
                reviewer_id: 3,
                reviewed_at: now,
            },
            suppress: Some(target),
            penalty: penalty.then(|| PenaltyDraft {
                user_id: 2,
                penalty_type: PenaltyType::Suspension,
                reason: "confirmed".to_string(),
                start_date: now,
                end_date: PenaltyType::Suspension.end_date(now, Some(3)).unwrap(),
                admin_id: 3,
            }),
        }
    }

    #[tokio::test]
    async fn test_approval_commits_every_effect() {
        let (store, _dir) = temp_store().await;
        let target = ContentTarget::post(post(&store).await);
        let pending = report(&store, target).await;

        let penalty = store
            .commit_review(approval(pending.id, target, true))
            .await
            .unwrap()
            .unwrap();

        let stored = store.get_report(pending.id).await.unwrap().unwrap();
        assert_eq!(stored.status(), ReportStatus::Approved);
        assert_eq!(stored.reviewer_id(), Some(3));
        assert_eq!(stored.review_note(), Some("confirmed"));
        assert!(store.get_post(target.id).await.unwrap().unwrap().is_bad);
        assert_eq!(store.penalties_for_user(2).await.unwrap(), vec![penalty]);
    }

    #[tokio::test]
    async fn test_second_review_is_rejected_without_side_effects() {
        let (store, _dir) = temp_store().await;
        let target = ContentTarget::post(post(&store).await);
        let pending = report(&store, target).await;
        store
            .commit_review(approval(pending.id, target, true))
            .await
            .unwrap();

        let again = store.commit_review(approval(pending.id, target, true)).await;

        assert!(matches!(
            again,
            Err(ModerationError::InvalidState {
                status: ReportStatus::Approved,
                ..
            })
        ));
        assert_eq!(store.penalties_for_user(2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_target_rolls_back_resolution() {
        let (store, _dir) = temp_store().await;
        let missing = ContentTarget::comment(404);
        let pending = report(&store, missing).await;

        let result = store
            .commit_review(approval(pending.id, missing, true))
            .await;

        assert!(matches!(
            result,
            Err(ModerationError::NotFound(Entity::Comment, 404))
        ));
        let stored = store.get_report(pending.id).await.unwrap().unwrap();
        assert!(stored.is_pending());
        assert!(store.penalties_for_user(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_report_is_not_found() {
        let (store, _dir) = temp_store().await;
        let target = ContentTarget::post(post(&store).await);

        let result = store.commit_review(approval(77, target, false)).await;

        assert!(matches!(
            result,
            Err(ModerationError::NotFound(Entity::Report, 77))
        ));
        assert!(!store.get_post(target.id).await.unwrap().unwrap().is_bad);
    }

    #[tokio::test]
    async fn test_list_reports_pages_and_filters() {
        let (store, _dir) = temp_store().await;
        let target = ContentTarget::post(post(&store).await);
        let mut ids = Vec::new();
        for _ in 0..5 {
            ids.push(report(&store, target).await.id);
        }
        store
            .commit_review(approval(ids[0], target, false))
            .await
            .unwrap();

        let pending = store
            .list_reports(Some(ReportStatus::Pending), PageRequest::new(1, 2))
            .await
            .unwrap();
        let all = store
            .list_reports(None, PageRequest::new(0, 10))
            .await
            .unwrap();

        assert_eq!(pending.total, 4);
        assert_eq!(pending.total_pages(), 2);
        let page_ids: Vec<u64> = pending.items.iter().map(|r| r.id).collect();
        assert_eq!(page_ids, vec![ids[3], ids[4]]);
        assert_eq!(all.total, 5);
        assert_eq!(all.items[0].status(), ReportStatus::Approved);
    }
}
