// ContentStore for SQLite: posts and comments with their suppression flag.

use super::sqlite_store::{parse_tag, parse_time, storage, SqliteCommunityStore};
use crate::core::moderation::{
    BoardDetail, BoardType, Comment, CommentDraft, ContentStore, ModerationError, Post, PostDraft,
};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn post_from_row(row: &SqliteRow) -> Result<Post, ModerationError> {
    let id = row.get::<i64, _>("id") as u64;
    let board_type: BoardType = parse_tag(&row.get::<String, _>("board_type"))?;

    let board = match board_type {
        BoardType::Talk => BoardDetail::Talk,
        BoardType::Question => BoardDetail::Question {
            category_name: row
                .get::<Option<String>, _>("category_name")
                .ok_or_else(|| {
                    ModerationError::Storage(format!("question post {} has no category", id))
                })?,
            for_seniors_only: row.get("for_seniors_only"),
        },
        BoardType::Meeting => {
            let schedule: Option<String> = row.get("schedule");
            let schedule = schedule.ok_or_else(|| {
                ModerationError::Storage(format!("meeting post {} has no schedule", id))
            })?;
            BoardDetail::Meeting {
                schedule: parse_time(&schedule)?,
                location: row.get("location"),
                capacity: row.get::<Option<i64>, _>("capacity").map(|c| c as u32),
            }
        }
    };

    Ok(Post {
        id,
        author_id: row.get::<i64, _>("author_id") as u64,
        title: row.get("title"),
        body: row.get("body"),
        board,
        is_bad: row.get("is_bad"),
        created_at: parse_time(&row.get::<String, _>("created_at"))?,
    })
}

fn comment_from_row(row: &SqliteRow) -> Result<Comment, ModerationError> {
    Ok(Comment {
        id: row.get::<i64, _>("id") as u64,
        post_id: row.get::<i64, _>("post_id") as u64,
        author_id: row.get::<i64, _>("author_id") as u64,
        author_name: row.get("author_name"),
        body: row.get("body"),
        is_bad: row.get("is_bad"),
        created_at: parse_time(&row.get::<String, _>("created_at"))?,
    })
}

#[async_trait]
impl ContentStore for SqliteCommunityStore {
    async fn insert_post(&self, draft: PostDraft) -> Result<Post, ModerationError> {
        let (category_name, for_seniors_only, schedule, location, capacity) = match &draft.board {
            BoardDetail::Talk => (None, false, None, None, None),
            BoardDetail::Question {
                category_name,
                for_seniors_only,
            } => (Some(category_name.clone()), *for_seniors_only, None, None, None),
            BoardDetail::Meeting {
                schedule,
                location,
                capacity,
            } => (
                None,
                false,
                Some(schedule.to_rfc3339()),
                location.clone(),
                capacity.map(i64::from),
            ),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO posts (
                author_id, title, body, board_type, category_name, for_seniors_only,
                schedule, location, capacity, is_bad, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(draft.author_id as i64)
        .bind(&draft.title)
        .bind(&draft.body)
        .bind(draft.board.board_type().as_str())
        .bind(category_name)
        .bind(for_seniors_only)
        .bind(schedule)
        .bind(location)
        .bind(capacity)
        .bind(draft.is_bad)
        .bind(draft.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(Post {
            id: result.last_insert_rowid() as u64,
            author_id: draft.author_id,
            title: draft.title,
            body: draft.body,
            board: draft.board,
            is_bad: draft.is_bad,
            created_at: draft.created_at,
        })
    }

    async fn insert_comment(&self, draft: CommentDraft) -> Result<Comment, ModerationError> {
        let result = sqlx::query(
            r#"
            INSERT INTO comments (post_id, author_id, author_name, body, is_bad, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(draft.post_id as i64)
        .bind(draft.author_id as i64)
        .bind(&draft.author_name)
        .bind(&draft.body)
        .bind(draft.is_bad)
        .bind(draft.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(Comment {
            id: result.last_insert_rowid() as u64,
            post_id: draft.post_id,
            author_id: draft.author_id,
            author_name: draft.author_name,
            body: draft.body,
            is_bad: draft.is_bad,
            created_at: draft.created_at,
        })
    }

    async fn get_post(&self, post_id: u64) -> Result<Option<Post>, ModerationError> {
        let row = sqlx::query("SELECT * FROM posts WHERE id = ?")
            .bind(post_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        row.as_ref().map(post_from_row).transpose()
    }

    async fn get_comment(&self, comment_id: u64) -> Result<Option<Comment>, ModerationError> {
        let row = sqlx::query("SELECT * FROM comments WHERE id = ?")
            .bind(comment_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        row.as_ref().map(comment_from_row).transpose()
    }

    async fn flagged_posts(&self) -> Result<Vec<Post>, ModerationError> {
        let rows = sqlx::query("SELECT * FROM posts WHERE is_bad = 1 ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;

        rows.iter().map(post_from_row).collect()
    }

    async fn flagged_comments(&self) -> Result<Vec<Comment>, ModerationError> {
        let rows = sqlx::query("SELECT * FROM comments WHERE is_bad = 1 ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;

        rows.iter().map(comment_from_row).collect()
    }

    async fn count_comments_by_flag(&self, is_bad: bool) -> Result<u64, ModerationError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE is_bad = ?")
            .bind(is_bad)
            .fetch_one(&self.pool)
            .await
            .map_err(storage)?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::super::sqlite_store::test_support::temp_store;
    use super::*;
    use crate::core::moderation::ContentTarget;
    use chrono::{TimeZone, Utc};

    fn draft(board: BoardDetail, is_bad: bool) -> PostDraft {
        PostDraft {
            author_id: 4,
            title: "title".to_string(),
            body: "body".to_string(),
            board,
            is_bad,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_board_payloads_survive_storage() {
        let (store, _dir) = temp_store().await;
        let schedule = Utc.with_ymd_and_hms(2026, 11, 2, 18, 30, 0).unwrap();

        let question = store
            .insert_post(draft(
                BoardDetail::Question {
                    category_name: "math".to_string(),
                    for_seniors_only: true,
                },
                false,
            ))
            .await
            .unwrap();
        let meeting = store
            .insert_post(draft(
                BoardDetail::Meeting {
                    schedule,
                    location: Some("gym".to_string()),
                    capacity: Some(12),
                },
                false,
            ))
            .await
            .unwrap();

        assert_eq!(store.get_post(question.id).await.unwrap(), Some(question));
        assert_eq!(store.get_post(meeting.id).await.unwrap(), Some(meeting));
    }

    #[tokio::test]
    async fn test_flagged_listing_and_counts() {
        let (store, _dir) = temp_store().await;
        let clean = store.insert_post(draft(BoardDetail::Talk, false)).await.unwrap();
        let bad = store.insert_post(draft(BoardDetail::Talk, true)).await.unwrap();
        for is_bad in [true, false, true] {
            store
                .insert_comment(CommentDraft {
                    post_id: clean.id,
                    author_id: 4,
                    author_name: "author".to_string(),
                    body: "hmm".to_string(),
                    is_bad,
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        let flagged: Vec<u64> = store
            .flagged_posts()
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(flagged, vec![bad.id]);
        assert_eq!(store.flagged_comments().await.unwrap().len(), 2);
        assert_eq!(store.count_comments_by_flag(true).await.unwrap(), 2);
        assert_eq!(store.count_comments_by_flag(false).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_target_resolves_both_kinds() {
        let (store, _dir) = temp_store().await;
        let post = store.insert_post(draft(BoardDetail::Talk, false)).await.unwrap();
        let comment = store
            .insert_comment(CommentDraft {
                post_id: post.id,
                author_id: 9,
                author_name: "nine".to_string(),
                body: "reply".to_string(),
                is_bad: false,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let post_target = store
            .find_target(ContentTarget::post(post.id))
            .await
            .unwrap()
            .unwrap();
        let comment_target = store
            .find_target(ContentTarget::comment(comment.id))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(post_target.author_id, 4);
        assert_eq!(comment_target.author_id, 9);
        assert!(store
            .find_target(ContentTarget::comment(77))
            .await
            .unwrap()
            .is_none());
    }
}
