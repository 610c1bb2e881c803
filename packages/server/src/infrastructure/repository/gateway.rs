//! Persistence Gateway
//!
//! 永続バックエンドとフォールバックバックエンドの上に 1 つのリポジトリ契約を提供します。
//!
//! ## バックエンドの選択
//!
//! 起動時に一度だけ選択され、プロセスの終了まで変わりません（ラッチ）。
//!
//! ```text
//! Unset ──(接続成功)──────────→ Durable
//!   └───(リトライ上限に到達)──→ Fallback
//! ```
//!
//! Fallback にラッチした後に永続バックエンドが復旧しても自動では切り替えず、
//! オフライン期間中に書き込まれたデータの移行も行いません。

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::domain::{
    ChatMessage, ChatRepository, DurableConnector, Email, Interview, InterviewRepository,
    InterviewUpdate, NewInterview, RepositoryError, RoomId, Store, Timestamp, User, UserId,
    UserRepository,
};

use super::inmemory::InMemoryStore;

/// 選択されたバックエンドの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Durable,
    Fallback,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Durable => "durable",
            BackendKind::Fallback => "fallback",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 起動時の接続リトライ方針
///
/// n 回目（1 始まり）の失敗後、`min(max_delay, base_delay × 2^n)` 待ってから次を試行します。
/// 最後の試行の後は待ちません。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(5000),
        }
    }
}

impl RetryPolicy {
    /// `failed_attempts` 回失敗した後の待ち時間
    pub fn delay_after(&self, failed_attempts: u32) -> Duration {
        let factor = 2u32.checked_pow(failed_attempts).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

struct ActiveBackend {
    kind: BackendKind,
    store: Arc<dyn Store>,
}

/// Persistence Gateway
///
/// 全てのリポジトリ呼び出しを、ラッチされたバックエンドに委譲します。
/// バックエンドが未選択の間の呼び出しは `RepositoryError::Unavailable` になります。
#[derive(Default)]
pub struct PersistenceGateway {
    active: OnceCell<ActiveBackend>,
}

impl PersistenceGateway {
    /// バックエンド未選択（Unset）の Gateway を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定したバックエンドにラッチ済みの Gateway を作成
    pub fn with_backend(kind: BackendKind, store: Arc<dyn Store>) -> Self {
        Self {
            active: OnceCell::new_with(Some(ActiveBackend { kind, store })),
        }
    }

    /// フォールバックにラッチ済みの Gateway を作成
    pub fn fallback() -> Self {
        Self::with_backend(BackendKind::Fallback, Arc::new(InMemoryStore::new()))
    }

    /// 永続バックエンドへの接続を試行し、バックエンドをラッチする
    ///
    /// 試行は逐次的に行われ、並行して複数の試行が走ることはありません。
    /// 既にラッチ済みの場合は何もせず、現在のバックエンドを返します。
    /// この関数が失敗することはありません。
    pub async fn establish(
        &self,
        connector: &dyn DurableConnector,
        policy: &RetryPolicy,
    ) -> BackendKind {
        self.active
            .get_or_init(|| connect_with_retry(connector, policy))
            .await
            .kind
    }

    /// 現在ラッチされているバックエンド（未選択なら None）
    pub fn backend_kind(&self) -> Option<BackendKind> {
        self.active.get().map(|active| active.kind)
    }

    fn store(&self) -> Result<&Arc<dyn Store>, RepositoryError> {
        self.active
            .get()
            .map(|active| &active.store)
            .ok_or_else(|| {
                RepositoryError::Unavailable("persistence backend not selected yet".to_string())
            })
    }
}

async fn connect_with_retry(connector: &dyn DurableConnector, policy: &RetryPolicy) -> ActiveBackend {
    let target = connector.describe();
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        match connector.connect().await {
            Ok(store) => {
                tracing::info!("Connected to {} (attempt {}/{})", target, attempt, max_attempts);
                return ActiveBackend {
                    kind: BackendKind::Durable,
                    store,
                };
            }
            Err(e) => {
                tracing::warn!(
                    "Connection attempt {}/{} to {} failed: {}",
                    attempt,
                    max_attempts,
                    target,
                    e
                );
                if attempt < max_attempts {
                    let delay = policy.delay_after(attempt);
                    tracing::info!("Retrying in {}ms", delay.as_millis());
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    tracing::error!(
        "Could not connect to {} after {} attempts",
        target,
        max_attempts
    );
    tracing::warn!(
        "Running in offline mode: data is kept in memory only and will not survive a restart"
    );
    ActiveBackend {
        kind: BackendKind::Fallback,
        store: Arc::new(InMemoryStore::new()),
    }
}

#[async_trait]
impl UserRepository for PersistenceGateway {
    async fn create_user(&self, user: User) -> Result<User, RepositoryError> {
        self.store()?.create_user(user).await
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        self.store()?.find_user_by_email(email).await
    }

    async fn find_user_by_id(&self, user_id: &UserId) -> Result<Option<User>, RepositoryError> {
        self.store()?.find_user_by_id(user_id).await
    }
}

#[async_trait]
impl InterviewRepository for PersistenceGateway {
    async fn create_interview(
        &self,
        new: NewInterview,
        at: Timestamp,
    ) -> Result<Interview, RepositoryError> {
        self.store()?.create_interview(new, at).await
    }

    async fn find_interview_by_room_id(
        &self,
        room_id: &RoomId,
    ) -> Result<Option<Interview>, RepositoryError> {
        self.store()?.find_interview_by_room_id(room_id).await
    }

    async fn find_interviews_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Interview>, RepositoryError> {
        self.store()?.find_interviews_for_user(user_id).await
    }

    async fn update_interview(
        &self,
        room_id: &RoomId,
        update: InterviewUpdate,
    ) -> Result<Interview, RepositoryError> {
        self.store()?.update_interview(room_id, update).await
    }

    async fn assign_candidate(
        &self,
        room_id: &RoomId,
        candidate_id: &UserId,
        at: Timestamp,
    ) -> Result<Interview, RepositoryError> {
        self.store()?.assign_candidate(room_id, candidate_id, at).await
    }
}

#[async_trait]
impl ChatRepository for PersistenceGateway {
    async fn append_chat(&self, message: ChatMessage) -> Result<(), RepositoryError> {
        self.store()?.append_chat(message).await
    }

    async fn list_chat_by_room(
        &self,
        room_id: &RoomId,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        self.store()?.list_chat_by_room(room_id).await
    }
}
