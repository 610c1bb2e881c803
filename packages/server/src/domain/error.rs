//! Domain error types.

use thiserror::Error;

/// 値オブジェクトの生成エラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} is too long ({len} > {max})")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{field} contains invalid characters: '{value}'")]
    InvalidCharacters { field: &'static str, value: String },

    #[error("unknown role '{0}'")]
    UnknownRole(String),

    #[error("rating must be between 1 and 10, got {0}")]
    RatingOutOfRange(i64),

    #[error("invalid email address '{0}'")]
    InvalidEmail(String),
}

/// Interview エンティティの状態遷移エラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InterviewError {
    #[error("interview is already {0}")]
    AlreadyTerminal(String),

    #[error("cannot move interview back to active")]
    ReopenNotAllowed,

    #[error("candidate already assigned to '{0}'")]
    CandidateAlreadyAssigned(String),

    #[error("end time can only be set together with a terminal status")]
    EndTimeWithoutTermination,
}

/// Repository エラー
///
/// - `Unavailable`: 永続化バックエンドに到達できない（一時的障害）
/// - `Conflict`: 条件付き書き込みが拒否された・一意制約違反
/// - `NotFound`: 対象レコードが存在しない
/// - `InvalidTransition`: Interview の状態遷移ルール違反
/// - `Backend`: その他のバックエンド固有エラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("persistence backend unavailable: {0}")]
    Unavailable(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid transition: {0}")]
    InvalidTransition(#[from] InterviewError),

    #[error("backend error: {0}")]
    Backend(String),
}

/// MessagePusher のエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MessagePushError {
    #[error("connection '{0}' is not registered")]
    ClientNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}
