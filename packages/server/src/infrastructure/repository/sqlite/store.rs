//! SQLite Store 実装（永続バックエンド）
//!
//! - 候補者の割り当ては `candidate_id IS NULL` を条件とする 1 回の UPDATE で行う
//! - 部分更新はトランザクション内で 読み取り → 検証 → 書き込み を行う
//! - 接続プールは 1 接続に制限し、SQLite の書き込みロック競合を避ける

use std::{str::FromStr, sync::Arc, time::Duration};

use async_trait::async_trait;
use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::domain::{
    ChatMessage, ChatRepository, DurableConnector, Email, Interview, InterviewRepository,
    InterviewUpdate, NewInterview, RepositoryError, RoomId, Store, Timestamp, User, UserId,
    UserRepository,
};

use super::rows::{ChatRow, InterviewRow, UserRow};

const SCHEMA: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        role TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS interviews (
        room_id TEXT PRIMARY KEY NOT NULL,
        interviewer_id TEXT NOT NULL,
        candidate_id TEXT,
        code TEXT NOT NULL,
        language TEXT NOT NULL,
        status TEXT NOT NULL,
        rating INTEGER,
        feedback TEXT,
        start_time INTEGER NOT NULL,
        end_time INTEGER,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS chat_messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        room_id TEXT NOT NULL,
        sender_id TEXT,
        sender_name TEXT NOT NULL,
        message TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_chat_messages_room_id ON chat_messages (room_id, id)",
];

const INTERVIEW_COLUMNS: &str = "room_id, interviewer_id, candidate_id, code, language, status, \
    rating, feedback, start_time, end_time, created_at, updated_at";

/// sqlx のエラーをドメインのエラーに変換
fn map_sqlx_error(err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict(db.message().to_string())
        }
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            RepositoryError::Unavailable(err.to_string())
        }
        other => RepositoryError::Backend(other.to_string()),
    }
}

/// SQLite Store 実装
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// データベースに接続し、スキーマを作成する
    ///
    /// # Arguments
    ///
    /// * `url` - 接続先 (e.g., "sqlite://pairroom.db", "sqlite::memory:")
    pub async fn connect(url: &str) -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| RepositoryError::Unavailable(e.to_string()))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await
            .map_err(|e| RepositoryError::Unavailable(e.to_string()))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), RepositoryError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        }
        Ok(())
    }

    async fn fetch_interview(&self, room_id: &RoomId) -> Result<Option<Interview>, RepositoryError> {
        let row = sqlx::query_as::<_, InterviewRow>(&format!(
            "SELECT {INTERVIEW_COLUMNS} FROM interviews WHERE room_id = ?"
        ))
        .bind(room_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        row.map(Interview::try_from).transpose()
    }
}

#[async_trait]
impl UserRepository for SqliteStore {
    async fn create_user(&self, user: User) -> Result<User, RepositoryError> {
        sqlx::query("INSERT INTO users (id, name, email, role, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(user.id.as_str())
            .bind(user.name.as_str())
            .bind(user.email.as_str())
            .bind(user.role.as_str())
            .bind(user.created_at.value())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, role, created_at FROM users WHERE email = ?",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        row.map(User::try_from).transpose()
    }

    async fn find_user_by_id(&self, user_id: &UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, role, created_at FROM users WHERE id = ?",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl InterviewRepository for SqliteStore {
    async fn create_interview(
        &self,
        new: NewInterview,
        at: Timestamp,
    ) -> Result<Interview, RepositoryError> {
        let interview = Interview::new(new, at);
        sqlx::query(&format!(
            "INSERT INTO interviews ({INTERVIEW_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(interview.room_id.as_str())
        .bind(interview.interviewer_id.as_str())
        .bind(interview.candidate_id.as_ref().map(|c| c.as_str().to_string()))
        .bind(interview.code.as_str())
        .bind(interview.language.as_str())
        .bind(interview.status.as_str())
        .bind(interview.rating.map(|r| i64::from(r.value())))
        .bind(interview.feedback.clone())
        .bind(interview.start_time.value())
        .bind(interview.end_time.map(|t| t.value()))
        .bind(interview.created_at.value())
        .bind(interview.updated_at.value())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(interview)
    }

    async fn find_interview_by_room_id(
        &self,
        room_id: &RoomId,
    ) -> Result<Option<Interview>, RepositoryError> {
        self.fetch_interview(room_id).await
    }

    async fn find_interviews_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Interview>, RepositoryError> {
        let rows = sqlx::query_as::<_, InterviewRow>(&format!(
            "SELECT {INTERVIEW_COLUMNS} FROM interviews \
             WHERE interviewer_id = ? OR candidate_id = ? \
             ORDER BY created_at DESC"
        ))
        .bind(user_id.as_str())
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        rows.into_iter().map(Interview::try_from).collect()
    }

    async fn update_interview(
        &self,
        room_id: &RoomId,
        update: InterviewUpdate,
    ) -> Result<Interview, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, InterviewRow>(&format!(
            "SELECT {INTERVIEW_COLUMNS} FROM interviews WHERE room_id = ?"
        ))
        .bind(room_id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .ok_or_else(|| RepositoryError::NotFound(format!("interview '{}'", room_id)))?;

        let updated = Interview::try_from(row)?.apply(&update)?;

        sqlx::query(
            "UPDATE interviews SET code = ?, language = ?, status = ?, rating = ?, \
             feedback = ?, end_time = ?, updated_at = ? WHERE room_id = ?",
        )
        .bind(updated.code.as_str())
        .bind(updated.language.as_str())
        .bind(updated.status.as_str())
        .bind(updated.rating.map(|r| i64::from(r.value())))
        .bind(updated.feedback.clone())
        .bind(updated.end_time.map(|t| t.value()))
        .bind(updated.updated_at.value())
        .bind(room_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(updated)
    }

    async fn assign_candidate(
        &self,
        room_id: &RoomId,
        candidate_id: &UserId,
        at: Timestamp,
    ) -> Result<Interview, RepositoryError> {
        let result = sqlx::query(
            "UPDATE interviews SET candidate_id = ?, updated_at = ? \
             WHERE room_id = ? AND candidate_id IS NULL",
        )
        .bind(candidate_id.as_str())
        .bind(at.value())
        .bind(room_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let interview = self
            .fetch_interview(room_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("interview '{}'", room_id)))?;

        if result.rows_affected() == 1 || interview.candidate_id.as_ref() == Some(candidate_id) {
            return Ok(interview);
        }
        Err(RepositoryError::Conflict(format!(
            "candidate already assigned to '{}'",
            interview
                .candidate_id
                .as_ref()
                .map(|c| c.as_str())
                .unwrap_or_default()
        )))
    }
}

#[async_trait]
impl ChatRepository for SqliteStore {
    async fn append_chat(&self, message: ChatMessage) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO chat_messages (room_id, sender_id, sender_name, message, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(message.room_id.as_str())
        .bind(message.sender_id.as_ref().map(|s| s.as_str().to_string()))
        .bind(message.sender_name.as_str())
        .bind(message.message.as_str())
        .bind(message.created_at.value())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn list_chat_by_room(
        &self,
        room_id: &RoomId,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query_as::<_, ChatRow>(
            "SELECT room_id, sender_id, sender_name, message, created_at \
             FROM chat_messages WHERE room_id = ? ORDER BY id ASC",
        )
        .bind(room_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        rows.into_iter().map(ChatMessage::try_from).collect()
    }
}

/// SQLite への接続を 1 回試行する `DurableConnector`
pub struct SqliteConnector {
    url: String,
}

impl SqliteConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl DurableConnector for SqliteConnector {
    async fn connect(&self) -> Result<Arc<dyn Store>, RepositoryError> {
        let store = SqliteStore::connect(&self.url).await?;
        Ok(Arc::new(store))
    }

    fn describe(&self) -> String {
        format!("sqlite store at '{}'", self.url)
    }
}
