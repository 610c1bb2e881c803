//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## 構成
//!
//! - `PresenceRepository`: 接続とルームの対応（プロセス内のみ、永続化しない）
//! - `UserRepository` / `InterviewRepository` / `ChatRepository`: 永続化の契約
//! - `Store`: 上記 3 つをまとめた永続化バックエンドの契約
//! - `DurableConnector`: 永続バックエンドへの接続試行

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    ChatMessage, ConnectionId, Email, Interview, InterviewUpdate, Member, NewInterview,
    RepositoryError, RoomId, Timestamp, User, UserId,
};

/// Presence Repository trait
///
/// 「今このルームに誰がいるか」の唯一の情報源。永続化の状態とは独立しており、
/// 全ての操作はローカルで必ず成功します。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PresenceRepository: Send + Sync {
    /// 接続をルームに登録し、参加順のメンバー一覧を返す
    ///
    /// 同じ接続 ID での再参加は既存のエントリを置き換えます。
    async fn join(&self, room_id: RoomId, member: Member) -> Vec<Member>;

    /// 接続をルームから削除し、退出したルームと削除後のメンバー一覧を返す
    async fn leave(&self, connection_id: &ConnectionId) -> Option<(RoomId, Vec<Member>)>;

    /// ルームのメンバー一覧を取得
    async fn members_of(&self, room_id: &RoomId) -> Vec<Member>;

    /// 接続が参加しているルームとメンバー情報を取得
    async fn find_member(&self, connection_id: &ConnectionId) -> Option<(RoomId, Member)>;
}

/// User Repository trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// ユーザーを作成（メールアドレスは一意）
    async fn create_user(&self, user: User) -> Result<User, RepositoryError>;

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    async fn find_user_by_id(&self, user_id: &UserId) -> Result<Option<User>, RepositoryError>;
}

/// Interview Repository trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InterviewRepository: Send + Sync {
    /// Interview を作成（ルーム ID は一意）
    async fn create_interview(
        &self,
        new: NewInterview,
        at: Timestamp,
    ) -> Result<Interview, RepositoryError>;

    async fn find_interview_by_room_id(
        &self,
        room_id: &RoomId,
    ) -> Result<Option<Interview>, RepositoryError>;

    /// 面接官または候補者として関わっている Interview を新しい順に取得
    async fn find_interviews_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Interview>, RepositoryError>;

    /// 部分更新を適用し、更新後の Interview を返す
    ///
    /// 更新は全体が適用されるか、全体が失敗するかのどちらかです。
    async fn update_interview(
        &self,
        room_id: &RoomId,
        update: InterviewUpdate,
    ) -> Result<Interview, RepositoryError>;

    /// 候補者が未設定の場合に限り候補者を設定する（compare-and-set）
    ///
    /// 既に別のユーザーが設定されている場合は `RepositoryError::Conflict` を返します。
    async fn assign_candidate(
        &self,
        room_id: &RoomId,
        candidate_id: &UserId,
        at: Timestamp,
    ) -> Result<Interview, RepositoryError>;
}

/// Chat Repository trait（追記専用）
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn append_chat(&self, message: ChatMessage) -> Result<(), RepositoryError>;

    /// ルームのメッセージを作成順に取得
    async fn list_chat_by_room(&self, room_id: &RoomId)
    -> Result<Vec<ChatMessage>, RepositoryError>;
}

/// 永続化バックエンドの契約
///
/// 永続バックエンドとフォールバックバックエンドの両方がこの契約を実装します。
pub trait Store: UserRepository + InterviewRepository + ChatRepository {}

impl<T> Store for T where T: UserRepository + InterviewRepository + ChatRepository {}

/// 永続バックエンドへの接続
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DurableConnector: Send + Sync {
    /// 接続を 1 回試行する
    async fn connect(&self) -> Result<Arc<dyn Store>, RepositoryError>;

    /// ログ出力用の接続先の説明
    fn describe(&self) -> String;
}
