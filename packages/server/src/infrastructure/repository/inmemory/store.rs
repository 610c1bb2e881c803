//! InMemory Store 実装（フォールバックバックエンド）
//!
//! 永続バックエンドに接続できない場合に使われるプロセス内ストア。
//! プロセス再起動で内容は失われ、永続バックエンドへの書き戻しも行いません。
//!
//! 条件付き書き込み（候補者の割り当て）と部分更新は、1 つのロック区間内で
//! 読み取り → 検証 → 書き込みを行うことで原子的に実行されます。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, ChatRepository, Email, Interview, InterviewRepository, InterviewUpdate,
    NewInterview, RepositoryError, RoomId, Timestamp, User, UserId, UserRepository,
};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    interviews: HashMap<RoomId, Interview>,
    chats: Vec<ChatMessage>,
}

/// インメモリ Store 実装
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_user(&self, user: User) -> Result<User, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict(format!(
                "email '{}' is already registered",
                user.email.as_str()
            )));
        }
        if tables.users.contains_key(&user.id) {
            return Err(RepositoryError::Conflict(format!(
                "user '{}' already exists",
                user.id
            )));
        }
        tables.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|u| &u.email == email).cloned())
    }

    async fn find_user_by_id(&self, user_id: &UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.get(user_id).cloned())
    }
}

#[async_trait]
impl InterviewRepository for InMemoryStore {
    async fn create_interview(
        &self,
        new: NewInterview,
        at: Timestamp,
    ) -> Result<Interview, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables.interviews.contains_key(&new.room_id) {
            return Err(RepositoryError::Conflict(format!(
                "room '{}' already exists",
                new.room_id
            )));
        }
        let interview = Interview::new(new, at);
        tables
            .interviews
            .insert(interview.room_id.clone(), interview.clone());
        Ok(interview)
    }

    async fn find_interview_by_room_id(
        &self,
        room_id: &RoomId,
    ) -> Result<Option<Interview>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.interviews.get(room_id).cloned())
    }

    async fn find_interviews_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Interview>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut interviews: Vec<Interview> = tables
            .interviews
            .values()
            .filter(|i| i.involves(user_id))
            .cloned()
            .collect();
        interviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(interviews)
    }

    async fn update_interview(
        &self,
        room_id: &RoomId,
        update: InterviewUpdate,
    ) -> Result<Interview, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let current = tables
            .interviews
            .get(room_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("interview '{}'", room_id)))?;
        let updated = current.apply(&update)?;
        tables.interviews.insert(room_id.clone(), updated.clone());
        Ok(updated)
    }

    async fn assign_candidate(
        &self,
        room_id: &RoomId,
        candidate_id: &UserId,
        at: Timestamp,
    ) -> Result<Interview, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let current = tables
            .interviews
            .get(room_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("interview '{}'", room_id)))?;
        let updated = current
            .assign_candidate(candidate_id, at)
            .map_err(|e| RepositoryError::Conflict(e.to_string()))?;
        tables.interviews.insert(room_id.clone(), updated.clone());
        Ok(updated)
    }
}

#[async_trait]
impl ChatRepository for InMemoryStore {
    async fn append_chat(&self, message: ChatMessage) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        tables.chats.push(message);
        Ok(())
    }

    async fn list_chat_by_room(
        &self,
        room_id: &RoomId,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .chats
            .iter()
            .filter(|m| &m.room_id == room_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::{InterviewStatus, MessageText, Role, UserName};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - フォールバックストアの作成・検索・更新が内部で一貫していること
    // - 候補者の compare-and-set が同時実行でも 1 人だけ成功すること
    // - 状態遷移違反の更新が一部も適用されないこと
    // ========================================

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    fn user_id(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn new_interview(room_id: &str, interviewer: &str) -> NewInterview {
        NewInterview {
            room_id: room(room_id),
            interviewer_id: user_id(interviewer),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_interview() {
        // テスト項目: 作成した Interview をルーム ID で取得できる
        // given (前提条件):
        let store = InMemoryStore::new();

        // when (操作):
        let created = store
            .create_interview(new_interview("r1", "I"), Timestamp::new(1_000))
            .await
            .unwrap();
        let found = store.find_interview_by_room_id(&room("r1")).await.unwrap();

        // then (期待する結果):
        assert_eq!(found, Some(created));
        assert_eq!(
            store.find_interview_by_room_id(&room("missing")).await,
            Ok(None)
        );
    }

    #[tokio::test]
    async fn test_create_interview_duplicate_room_conflicts() {
        // テスト項目: 同じルーム ID の Interview は作成できない
        // given (前提条件):
        let store = InMemoryStore::new();
        store
            .create_interview(new_interview("r1", "I"), Timestamp::new(1_000))
            .await
            .unwrap();

        // when (操作):
        let result = store
            .create_interview(new_interview("r1", "J"), Timestamp::new(2_000))
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_concurrent_candidate_assignment_has_single_winner() {
        // テスト項目: 同時に候補者割り当てを要求しても成功するのは 1 人だけ
        // given (前提条件):
        let store = Arc::new(InMemoryStore::new());
        store
            .create_interview(new_interview("abc123xyz9", "I"), Timestamp::new(1_000))
            .await
            .unwrap();

        // when (操作):
        let mut handles = Vec::new();
        for candidate in ["C", "D", "E", "F"] {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .assign_candidate(&room("abc123xyz9"), &user_id(candidate), Timestamp::new(2_000))
                    .await
            }));
        }
        let mut winners = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(RepositoryError::Conflict(_)) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        // then (期待する結果):
        assert_eq!(winners, 1);
        assert_eq!(conflicts, 3);
        let interview = store
            .find_interview_by_room_id(&room("abc123xyz9"))
            .await
            .unwrap()
            .unwrap();
        assert!(interview.candidate_id.is_some());
    }

    #[tokio::test]
    async fn test_assign_candidate_missing_interview() {
        // テスト項目: 存在しないルームへの候補者割り当ては NotFound
        // given (前提条件):
        let store = InMemoryStore::new();

        // when (操作):
        let result = store
            .assign_candidate(&room("nope"), &user_id("C"), Timestamp::new(1_000))
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_update_is_not_partially_applied() {
        // テスト項目: 状態遷移違反の更新は他のフィールドも含めて適用されない
        // given (前提条件):
        let store = InMemoryStore::new();
        store
            .create_interview(new_interview("r1", "I"), Timestamp::new(1_000))
            .await
            .unwrap();
        store
            .update_interview(&room("r1"), InterviewUpdate::complete(Timestamp::new(2_000)))
            .await
            .unwrap();

        // when (操作):
        let result = store
            .update_interview(
                &room("r1"),
                InterviewUpdate::cancel(Timestamp::new(3_000)).code("fn main() {}"),
            )
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(RepositoryError::InvalidTransition(_))));
        let interview = store
            .find_interview_by_room_id(&room("r1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(interview.status, InterviewStatus::Completed);
        assert_ne!(interview.code, "fn main() {}");
        assert_eq!(interview.end_time, Some(Timestamp::new(2_000)));
    }

    #[tokio::test]
    async fn test_find_interviews_for_user() {
        // テスト項目: 面接官・候補者のどちらとして関わった Interview も新しい順に取得できる
        // given (前提条件):
        let store = InMemoryStore::new();
        store
            .create_interview(new_interview("r1", "I"), Timestamp::new(1_000))
            .await
            .unwrap();
        store
            .create_interview(new_interview("r2", "J"), Timestamp::new(2_000))
            .await
            .unwrap();
        store
            .assign_candidate(&room("r2"), &user_id("I"), Timestamp::new(3_000))
            .await
            .unwrap();
        store
            .create_interview(new_interview("r3", "K"), Timestamp::new(4_000))
            .await
            .unwrap();

        // when (操作):
        let interviews = store.find_interviews_for_user(&user_id("I")).await.unwrap();

        // then (期待する結果):
        let rooms: Vec<&str> = interviews.iter().map(|i| i.room_id.as_str()).collect();
        assert_eq!(rooms, vec!["r2", "r1"]);
    }

    #[tokio::test]
    async fn test_users_are_unique_by_email() {
        // テスト項目: ユーザーは ID とメールアドレスで検索でき、メールアドレスは一意
        // given (前提条件):
        let store = InMemoryStore::new();
        let alice = User::new(
            UserName::new("Alice".to_string()).unwrap(),
            Email::new("alice@example.com".to_string()).unwrap(),
            Role::Interviewer,
            Timestamp::new(1_000),
        );
        let duplicate = User::new(
            UserName::new("Alice 2".to_string()).unwrap(),
            Email::new("ALICE@example.com".to_string()).unwrap(),
            Role::Candidate,
            Timestamp::new(2_000),
        );

        // when (操作):
        store.create_user(alice.clone()).await.unwrap();
        let result = store.create_user(duplicate).await;

        // then (期待する結果):
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
        assert_eq!(
            store.find_user_by_id(&alice.id).await.unwrap(),
            Some(alice.clone())
        );
        assert_eq!(
            store.find_user_by_email(&alice.email).await.unwrap(),
            Some(alice)
        );
    }

    #[tokio::test]
    async fn test_chat_is_listed_per_room_in_append_order() {
        // テスト項目: チャットはルームごとに追記順で取得できる
        // given (前提条件):
        let store = InMemoryStore::new();
        let message = |room_id: &str, text: &str, at: i64| ChatMessage {
            room_id: room(room_id),
            sender_id: None,
            sender_name: UserName::anonymous(),
            message: MessageText::new(text.to_string()).unwrap(),
            created_at: Timestamp::new(at),
        };

        // when (操作):
        store.append_chat(message("r1", "first", 1)).await.unwrap();
        store.append_chat(message("r2", "other", 2)).await.unwrap();
        store.append_chat(message("r1", "second", 3)).await.unwrap();
        let listed = store.list_chat_by_room(&room("r1")).await.unwrap();

        // then (期待する結果):
        let texts: Vec<&str> = listed.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }
}
