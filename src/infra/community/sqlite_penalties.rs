// PenaltyStore for SQLite.

use super::sqlite_store::{parse_optional_time, parse_tag, parse_time, storage, SqliteCommunityStore};
use crate::core::moderation::{ModerationError, PenaltyDraft, PenaltyStore, UserPenalty};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite};

/// Insert one penalty row and return its id. Shared by the plain insert and
/// the review transaction.
pub(super) async fn insert_penalty_row<'e, E>(
    executor: E,
    draft: &PenaltyDraft,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO user_penalties (user_id, penalty_type, reason, start_date, end_date, status, admin_id)
        VALUES (?, ?, ?, ?, ?, 'ACTIVE', ?)
        "#,
    )
    .bind(draft.user_id as i64)
    .bind(draft.penalty_type.as_str())
    .bind(draft.reason.clone())
    .bind(draft.start_date.to_rfc3339())
    .bind(draft.end_date.map(|end| end.to_rfc3339()))
    .bind(draft.admin_id as i64)
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid() as u64)
}

fn penalty_from_row(row: &SqliteRow) -> Result<UserPenalty, ModerationError> {
    Ok(UserPenalty {
        id: row.get::<i64, _>("id") as u64,
        user_id: row.get::<i64, _>("user_id") as u64,
        penalty_type: parse_tag(&row.get::<String, _>("penalty_type"))?,
        reason: row.get("reason"),
        start_date: parse_time(&row.get::<String, _>("start_date"))?,
        end_date: parse_optional_time(row.get("end_date"))?,
        status: parse_tag(&row.get::<String, _>("status"))?,
        admin_id: row.get::<i64, _>("admin_id") as u64,
    })
}

#[async_trait]
impl PenaltyStore for SqliteCommunityStore {
    async fn insert_penalty(&self, draft: PenaltyDraft) -> Result<UserPenalty, ModerationError> {
        let id = insert_penalty_row(&self.pool, &draft)
            .await
            .map_err(storage)?;
        Ok(draft.into_penalty(id))
    }

    async fn penalties_for_user(&self, user_id: u64) -> Result<Vec<UserPenalty>, ModerationError> {
        let rows = sqlx::query("SELECT * FROM user_penalties WHERE user_id = ? ORDER BY id")
            .bind(user_id as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;

        rows.iter().map(penalty_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::sqlite_store::test_support::temp_store;
    use super::*;
    use crate::core::moderation::{PenaltyStatus, PenaltyType};
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_penalties_listed_per_user_in_order() {
        let (store, _dir) = temp_store().await;
        let start = Utc::now();

        for (user_id, penalty_type, days) in [
            (5, PenaltyType::Warning, None),
            (6, PenaltyType::Ban, None),
            (5, PenaltyType::Suspension, Some(7)),
        ] {
            store
                .insert_penalty(PenaltyDraft {
                    user_id,
                    penalty_type,
                    reason: "spam".to_string(),
                    start_date: start,
                    end_date: penalty_type.end_date(start, days).unwrap(),
                    admin_id: 1,
                })
                .await
                .unwrap();
        }

        let penalties = store.penalties_for_user(5).await.unwrap();

        assert_eq!(penalties.len(), 2);
        assert_eq!(penalties[0].penalty_type, PenaltyType::Warning);
        assert_eq!(penalties[0].end_date, None);
        assert_eq!(penalties[1].penalty_type, PenaltyType::Suspension);
        assert_eq!(penalties[1].end_date, Some(start + Duration::days(7)));
        assert!(penalties.iter().all(|p| p.status == PenaltyStatus::Active));
        assert!(store.penalties_for_user(99).await.unwrap().is_empty());
    }
}
