//! Entities
//!
//! - `Member`: ルームに参加中の接続（永続化されない）
//! - `Interview`: 面接セッションの永続レコード
//! - `ChatMessage`: 追記専用のチャットメッセージ
//! - `User`: 認証レイヤーが所有するユーザー（読み取り中心）

use super::{
    error::InterviewError,
    value_object::{
        ConnectionId, Email, MessageText, Rating, Role, RoomId, Timestamp, UserId, UserName,
    },
};

pub const DEFAULT_CODE: &str = "// Start coding here...\n";
pub const DEFAULT_LANGUAGE: &str = "javascript";

/// ルームに参加中の接続
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    pub user_name: UserName,
    /// 接続時に申告されたロール（検証済みではない）
    pub role: Role,
}

impl Member {
    pub fn new(
        connection_id: ConnectionId,
        user_id: UserId,
        user_name: UserName,
        role: Role,
    ) -> Self {
        Self {
            connection_id,
            user_id,
            user_name,
            role,
        }
    }
}

/// 面接のステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterviewStatus {
    Active,
    Completed,
    Cancelled,
}

impl InterviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStatus::Active => "active",
            InterviewStatus::Completed => "completed",
            InterviewStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(InterviewStatus::Active),
            "completed" => Some(InterviewStatus::Completed),
            "cancelled" => Some(InterviewStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, InterviewStatus::Active)
    }
}

/// 新規 Interview の作成パラメータ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInterview {
    pub room_id: RoomId,
    pub interviewer_id: UserId,
}

/// 面接セッションの永続レコード
///
/// ## 不変条件
///
/// - `room_id` は不変かつ一意
/// - `candidate_id` は null から一度だけ設定される
/// - `status` は active → completed / active → cancelled のみ
/// - `end_time` は status が active でない場合に限り設定される
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interview {
    pub room_id: RoomId,
    pub interviewer_id: UserId,
    pub candidate_id: Option<UserId>,
    pub code: String,
    pub language: String,
    pub status: InterviewStatus,
    pub rating: Option<Rating>,
    pub feedback: Option<String>,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Interview {
    /// 新しい active な Interview を作成
    pub fn new(new: NewInterview, at: Timestamp) -> Self {
        Self {
            room_id: new.room_id,
            interviewer_id: new.interviewer_id,
            candidate_id: None,
            code: DEFAULT_CODE.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            status: InterviewStatus::Active,
            rating: None,
            feedback: None,
            start_time: at,
            end_time: None,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn is_interviewer(&self, user_id: &UserId) -> bool {
        &self.interviewer_id == user_id
    }

    /// 参加者がこの面接に関係しているか（面接官または候補者）
    pub fn involves(&self, user_id: &UserId) -> bool {
        self.is_interviewer(user_id) || self.candidate_id.as_ref() == Some(user_id)
    }

    /// 候補者を割り当てる（first-claim-wins）
    ///
    /// 同じユーザーによる再割り当ては冪等に成功します。
    pub fn assign_candidate(&self, user_id: &UserId, at: Timestamp) -> Result<Self, InterviewError> {
        match &self.candidate_id {
            Some(existing) if existing == user_id => Ok(self.clone()),
            Some(existing) => Err(InterviewError::CandidateAlreadyAssigned(
                existing.as_str().to_string(),
            )),
            None => Ok(Self {
                candidate_id: Some(user_id.clone()),
                updated_at: at,
                ..self.clone()
            }),
        }
    }

    /// 部分更新を適用した新しい Interview を返す
    ///
    /// 状態遷移ルールに違反する更新は全体が拒否され、一部だけが適用されることはありません。
    pub fn apply(&self, update: &InterviewUpdate) -> Result<Self, InterviewError> {
        let mut next = self.clone();

        match update.status {
            Some(_) if self.status.is_terminal() => {
                return Err(InterviewError::AlreadyTerminal(
                    self.status.as_str().to_string(),
                ));
            }
            Some(InterviewStatus::Active) => {
                if update.end_time.is_some() {
                    return Err(InterviewError::EndTimeWithoutTermination);
                }
            }
            Some(terminal) => {
                next.status = terminal;
                next.end_time = Some(update.end_time.unwrap_or(update.at));
            }
            None => {
                if update.end_time.is_some() {
                    return Err(InterviewError::EndTimeWithoutTermination);
                }
            }
        }

        if let Some(code) = &update.code {
            next.code = code.clone();
        }
        if let Some(language) = &update.language {
            next.language = language.clone();
        }
        if let Some(rating) = update.rating {
            next.rating = Some(rating);
        }
        if let Some(feedback) = &update.feedback {
            next.feedback = Some(feedback.clone());
        }
        next.updated_at = update.at;

        Ok(next)
    }
}

/// Interview の部分更新
///
/// `at` は更新時刻で、終了時刻の既定値にも使われます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewUpdate {
    pub at: Timestamp,
    pub code: Option<String>,
    pub language: Option<String>,
    pub status: Option<InterviewStatus>,
    pub rating: Option<Rating>,
    pub feedback: Option<String>,
    pub end_time: Option<Timestamp>,
}

impl InterviewUpdate {
    pub fn at(at: Timestamp) -> Self {
        Self {
            at,
            code: None,
            language: None,
            status: None,
            rating: None,
            feedback: None,
            end_time: None,
        }
    }

    /// status: completed, endTime: at
    pub fn complete(at: Timestamp) -> Self {
        Self::at(at).status(InterviewStatus::Completed).end_time(at)
    }

    /// status: cancelled, endTime: at
    pub fn cancel(at: Timestamp) -> Self {
        Self::at(at).status(InterviewStatus::Cancelled).end_time(at)
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn status(mut self, status: InterviewStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn rating(mut self, rating: Rating) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }

    pub fn end_time(mut self, end_time: Timestamp) -> Self {
        self.end_time = Some(end_time);
        self
    }
}

/// 追記専用のチャットメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub room_id: RoomId,
    /// オフライン・匿名の送信者は None
    pub sender_id: Option<UserId>,
    pub sender_name: UserName,
    pub message: MessageText,
    pub created_at: Timestamp,
}

/// ユーザー
///
/// 認証情報（パスワードハッシュなど）は扱いません。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: UserName,
    pub email: Email,
    pub role: Role,
    pub created_at: Timestamp,
}

impl User {
    /// 新しい ID を採番してユーザーを作成
    pub fn new(name: UserName, email: Email, role: Role, at: Timestamp) -> Self {
        Self {
            id: UserId::generate(),
            name,
            email,
            role,
            created_at: at,
        }
    }
}
