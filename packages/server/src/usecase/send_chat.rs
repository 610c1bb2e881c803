//! UseCase: チャット送信
//!
//! メッセージは送信者を含むルーム全体に即座に配信し、その後で永続化を
//! 別タスクとして実行します。永続化の失敗はログに残すだけで、配信結果や
//! 送信者への応答には影響しません。

use std::sync::Arc;

use pairroom_shared::time::Clock;

use crate::domain::{
    ChatMessage, ChatRepository, ConnectionId, MessagePusher, MessageText, PresenceRepository,
    RoomEvent, RoomId, Timestamp, UserName,
};

use super::error::SendChatError;

/// チャット送信のユースケース
pub struct SendChatUseCase {
    presence: Arc<dyn PresenceRepository>,
    chats: Arc<dyn ChatRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl SendChatUseCase {
    pub fn new(
        presence: Arc<dyn PresenceRepository>,
        chats: Arc<dyn ChatRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            presence,
            chats,
            message_pusher,
            clock,
        }
    }

    /// チャットメッセージを配信し、配信したメッセージを返す
    pub async fn execute(
        &self,
        room_id: RoomId,
        sender: &ConnectionId,
        message: String,
    ) -> Result<ChatMessage, SendChatError> {
        let message = MessageText::new(message)?;

        let (sender_id, sender_name) = match self.presence.find_member(sender).await {
            Some((_, member)) => (Some(member.user_id), member.user_name),
            None => (None, UserName::anonymous()),
        };

        let chat = ChatMessage {
            room_id,
            sender_id,
            sender_name,
            message,
            created_at: Timestamp::new(self.clock.now_millis()),
        };

        let targets = self
            .presence
            .members_of(&chat.room_id)
            .await
            .into_iter()
            .map(|m| m.connection_id)
            .collect();
        self.message_pusher
            .broadcast(targets, &RoomEvent::Chat(chat.clone()))
            .await?;

        let chats = self.chats.clone();
        let record = chat.clone();
        tokio::spawn(async move {
            let room_id = record.room_id.clone();
            if let Err(e) = chats.append_chat(record).await {
                tracing::warn!(
                    "Chat message in room '{}' was delivered but not persisted: {}",
                    room_id.as_str(),
                    e
                );
            }
        });

        Ok(chat)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        domain::{MockChatRepository, RepositoryError, Role, ValueObjectError},
        infrastructure::repository::InMemoryStore,
        usecase::test_support::{Harness, connection, member, room},
    };
    use pairroom_shared::time::FixedClock;
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - 送信者を含むルーム全体への配信
    // - 永続化が失敗しても配信され、送信者にエラーが返らないこと
    // - 配信後に永続化が行われること
    // ========================================

    async fn pair_in_room(harness: &Harness, room_id: &str) {
        harness
            .presence
            .join(room(room_id), member("c-i", "I", Role::Interviewer))
            .await;
        harness
            .presence
            .join(room(room_id), member("c-c", "C", Role::Candidate))
            .await;
    }

    #[tokio::test]
    async fn test_chat_delivered_while_store_down() {
        // テスト項目: 永続ストアが落ちていても "hello" は全メンバーに届き、送信者にエラーは返らない
        // given (前提条件):
        let harness = Harness::new();
        let mut inbox_i = harness.connect("c-i").await;
        let mut inbox_c = harness.connect("c-c").await;
        pair_in_room(&harness, "r1").await;

        let (attempted_tx, mut attempted_rx) = mpsc::unbounded_channel();
        let mut chats = MockChatRepository::new();
        chats.expect_append_chat().times(1).returning(move |message| {
            let _ = attempted_tx.send(message);
            Err(RepositoryError::Unavailable("store is down".to_string()))
        });
        let usecase = SendChatUseCase::new(
            harness.presence.clone(),
            Arc::new(chats),
            harness.pusher.clone(),
            Arc::new(FixedClock::new(1_672_531_200_000)),
        );

        // when (操作):
        let result = usecase
            .execute(room("r1"), &connection("c-c"), "hello".to_string())
            .await;

        // then (期待する結果):
        assert!(result.is_ok());
        for inbox in [&mut inbox_i, &mut inbox_c] {
            let frames = inbox.drain();
            assert_eq!(frames.len(), 1);
            assert_eq!(frames[0]["event"], "chat-message");
            assert_eq!(frames[0]["data"]["message"], "hello");
            assert_eq!(frames[0]["data"]["senderName"], "C");
            assert_eq!(frames[0]["data"]["senderId"], "C");
            assert_eq!(frames[0]["data"]["timestamp"], "2023-01-01T00:00:00.000Z");
        }
        let attempted = tokio::time::timeout(Duration::from_secs(1), attempted_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(attempted.message.as_str(), "hello");
    }

    #[tokio::test]
    async fn test_chat_is_persisted_after_broadcast() {
        // テスト項目: 配信したメッセージが永続化される
        // given (前提条件):
        let harness = Harness::new();
        let _inbox = harness.connect("c-i").await;
        pair_in_room(&harness, "r1").await;
        let store = Arc::new(InMemoryStore::new());
        let usecase = SendChatUseCase::new(
            harness.presence.clone(),
            store.clone(),
            harness.pusher.clone(),
            Arc::new(FixedClock::new(5_000)),
        );

        // when (操作):
        let sent = usecase
            .execute(room("r1"), &connection("c-i"), "first".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        let mut stored = Vec::new();
        for _ in 0..50 {
            stored = store.list_chat_by_room(&room("r1")).await.unwrap();
            if !stored.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(stored, vec![sent]);
    }

    #[tokio::test]
    async fn test_blank_chat_is_rejected() {
        // テスト項目: 空白だけのメッセージは送信者にエラーとして返され、配信されない
        // given (前提条件):
        let harness = Harness::new();
        let mut inbox_i = harness.connect("c-i").await;
        pair_in_room(&harness, "r1").await;
        let mut chats = MockChatRepository::new();
        chats.expect_append_chat().never();
        let usecase = SendChatUseCase::new(
            harness.presence.clone(),
            Arc::new(chats),
            harness.pusher.clone(),
            Arc::new(FixedClock::new(0)),
        );

        // when (操作):
        let result = usecase
            .execute(room("r1"), &connection("c-c"), "   ".to_string())
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(SendChatError::InvalidMessage(ValueObjectError::Empty(
                "message"
            )))
        );
        assert!(inbox_i.drain().is_empty());
    }
}
