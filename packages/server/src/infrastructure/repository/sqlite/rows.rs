//! Row types and their conversion to domain entities.

use sqlx::FromRow;

use crate::domain::{
    ChatMessage, Email, Interview, InterviewStatus, MessageText, Rating, RepositoryError, Role,
    RoomId, Timestamp, User, UserId, UserName, ValueObjectError,
};

#[derive(Debug, FromRow)]
pub(super) struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: i64,
}

#[derive(Debug, FromRow)]
pub(super) struct InterviewRow {
    pub room_id: String,
    pub interviewer_id: String,
    pub candidate_id: Option<String>,
    pub code: String,
    pub language: String,
    pub status: String,
    pub rating: Option<i64>,
    pub feedback: Option<String>,
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, FromRow)]
pub(super) struct ChatRow {
    pub room_id: String,
    pub sender_id: Option<String>,
    pub sender_name: String,
    pub message: String,
    pub created_at: i64,
}

fn corrupt(err: ValueObjectError) -> RepositoryError {
    RepositoryError::Backend(format!("stored row is invalid: {err}"))
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::new(row.id).map_err(corrupt)?,
            name: UserName::new(row.name).map_err(corrupt)?,
            email: Email::new(row.email).map_err(corrupt)?,
            role: row.role.parse::<Role>().map_err(corrupt)?,
            created_at: Timestamp::new(row.created_at),
        })
    }
}

impl TryFrom<InterviewRow> for Interview {
    type Error = RepositoryError;

    fn try_from(row: InterviewRow) -> Result<Self, Self::Error> {
        let status = InterviewStatus::parse(&row.status).ok_or_else(|| {
            RepositoryError::Backend(format!("stored row has unknown status '{}'", row.status))
        })?;
        Ok(Self {
            room_id: RoomId::new(row.room_id).map_err(corrupt)?,
            interviewer_id: UserId::new(row.interviewer_id).map_err(corrupt)?,
            candidate_id: row
                .candidate_id
                .map(UserId::new)
                .transpose()
                .map_err(corrupt)?,
            code: row.code,
            language: row.language,
            status,
            rating: row.rating.map(Rating::new).transpose().map_err(corrupt)?,
            feedback: row.feedback,
            start_time: Timestamp::new(row.start_time),
            end_time: row.end_time.map(Timestamp::new),
            created_at: Timestamp::new(row.created_at),
            updated_at: Timestamp::new(row.updated_at),
        })
    }
}

impl TryFrom<ChatRow> for ChatMessage {
    type Error = RepositoryError;

    fn try_from(row: ChatRow) -> Result<Self, Self::Error> {
        Ok(Self {
            room_id: RoomId::new(row.room_id).map_err(corrupt)?,
            sender_id: row.sender_id.map(UserId::new).transpose().map_err(corrupt)?,
            sender_name: UserName::new(row.sender_name).map_err(corrupt)?,
            message: MessageText::new(row.message).map_err(corrupt)?,
            created_at: Timestamp::new(row.created_at),
        })
    }
}
