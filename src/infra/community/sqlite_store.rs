// SQLite-backed community store. One pool serves every moderation port so a
// review can update reports, content and penalties in one transaction.
//
// Tables:
// - users: accounts as seen by moderation
// - posts / comments: content with the is_bad suppression flag
// - reports: user complaints and their one-time resolution
// - user_penalties: sanctions issued by admins

use crate::core::moderation::{ModerationError, NewUser, ParseEnumError, User, UserStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;
use std::str::FromStr;

pub struct SqliteCommunityStore {
    pub(super) pool: Pool<Sqlite>,
}

impl SqliteCommunityStore {
    /// Open (creating if needed) the database and run migrations.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let path_str = database_url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");
        let path_str = path_str.split('?').next().unwrap_or(path_str);
        if !database_url.contains(":memory:") {
            if let Some(parent) = Path::new(path_str).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };
        let conn_str = if conn_str.contains('?') || conn_str.contains(":memory:") {
            conn_str
        } else {
            format!("{}?mode=rwc", conn_str)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&conn_str)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Create tables if they don't exist yet.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                role TEXT NOT NULL,
                grade INTEGER,
                is_senior_verified BOOLEAN NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                author_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                board_type TEXT NOT NULL,
                category_name TEXT,
                for_seniors_only BOOLEAN NOT NULL DEFAULT 0,
                schedule TEXT,
                location TEXT,
                capacity INTEGER,
                is_bad BOOLEAN NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL,
                author_id INTEGER NOT NULL,
                author_name TEXT NOT NULL,
                body TEXT NOT NULL,
                is_bad BOOLEAN NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Reviewer and review time are present exactly when the report is no
        // longer pending.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                reporter_id INTEGER NOT NULL,
                target_type TEXT NOT NULL,
                target_id INTEGER NOT NULL,
                reason TEXT NOT NULL,
                detail TEXT,
                status TEXT NOT NULL DEFAULT 'PENDING',
                review_note TEXT,
                reviewer_id INTEGER,
                reviewed_at TEXT,
                created_at TEXT NOT NULL,
                CHECK (
                    (status = 'PENDING' AND reviewer_id IS NULL AND reviewed_at IS NULL)
                    OR (status <> 'PENDING' AND reviewer_id IS NOT NULL AND reviewed_at IS NOT NULL)
                )
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_reports_status ON reports(status, id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_penalties (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                penalty_type TEXT NOT NULL,
                reason TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT,
                status TEXT NOT NULL DEFAULT 'ACTIVE',
                admin_id INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_user_penalties_user ON user_penalties(user_id, id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

pub(super) fn storage(err: sqlx::Error) -> ModerationError {
    ModerationError::Storage(err.to_string())
}

pub(super) fn parse_time(raw: &str) -> Result<DateTime<Utc>, ModerationError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ModerationError::Storage(format!("bad timestamp '{}': {}", raw, e)))
}

pub(super) fn parse_optional_time(
    raw: Option<String>,
) -> Result<Option<DateTime<Utc>>, ModerationError> {
    raw.as_deref().map(parse_time).transpose()
}

pub(super) fn parse_tag<T>(raw: &str) -> Result<T, ModerationError>
where
    T: FromStr<Err = ParseEnumError>,
{
    raw.parse::<T>()
        .map_err(|e| ModerationError::Storage(e.to_string()))
}

fn user_from_row(row: &SqliteRow) -> Result<User, ModerationError> {
    let grade = row
        .get::<Option<i64>, _>("grade")
        .map(u8::try_from)
        .transpose()
        .map_err(|e| ModerationError::Storage(format!("bad grade: {}", e)))?;

    Ok(User {
        id: row.get::<i64, _>("id") as u64,
        username: row.get("username"),
        role: parse_tag(&row.get::<String, _>("role"))?,
        grade,
        is_senior_verified: row.get("is_senior_verified"),
    })
}

#[async_trait]
impl UserStore for SqliteCommunityStore {
    async fn get_user(&self, user_id: u64) -> Result<Option<User>, ModerationError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, ModerationError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, role, grade, is_senior_verified)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&user.username)
        .bind(user.role.as_str())
        .bind(user.grade.map(i64::from))
        .bind(user.is_senior_verified)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(User {
            id: result.last_insert_rowid() as u64,
            username: user.username,
            role: user.role,
            grade: user.grade,
            is_senior_verified: user.is_senior_verified,
        })
    }

    async fn count_users(&self) -> Result<u64, ModerationError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(storage)?;
        Ok(count as u64)
    }
}
