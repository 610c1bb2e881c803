//! UseCase layer error types.

use thiserror::Error;

use crate::domain::{MessagePushError, RepositoryError, RoomId, ValueObjectError};

/// チャット送信のエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SendChatError {
    #[error("invalid chat message: {0}")]
    InvalidMessage(#[from] ValueObjectError),

    #[error(transparent)]
    Push(#[from] MessagePushError),
}

/// 面接終了のエラー
///
/// いずれの場合もルームへの通知は行われず、リクエスト元にだけ返されます。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EndInterviewError {
    #[error("connection has not joined room '{0}'")]
    NotInRoom(String),

    #[error("only the interviewer can end the interview")]
    Forbidden,

    #[error("interview for room '{0}' not found")]
    InterviewNotFound(String),

    #[error("interview cannot be ended: {0}")]
    InvalidTransition(String),

    #[error("failed to end interview: {0}")]
    Persistence(RepositoryError),
}

impl EndInterviewError {
    /// Repository のエラーを対象ルームの文脈で変換する
    pub(crate) fn from_repository(room_id: &RoomId, e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound(_) => {
                EndInterviewError::InterviewNotFound(room_id.as_str().to_string())
            }
            RepositoryError::InvalidTransition(e) => {
                EndInterviewError::InvalidTransition(e.to_string())
            }
            other => EndInterviewError::Persistence(other),
        }
    }
}

/// ルーム作成のエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CreateRoomError {
    #[error("failed to generate room id: {0}")]
    IdGeneration(#[from] ValueObjectError),

    #[error("failed to create interview: {0}")]
    Persistence(#[from] RepositoryError),
}

/// ルーム詳細取得のエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GetRoomDetailError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),

    #[error("failed to load interview: {0}")]
    Persistence(#[from] RepositoryError),
}
