//! UseCase: 接続の登録
//!
//! WebSocket 接続が確立した時点で送信チャンネルを MessagePusher に登録します。
//! ルームへの参加は `join-room` イベントで別途行われます。

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, PusherChannel};

/// 接続登録のユースケース
pub struct ConnectParticipantUseCase {
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectParticipantUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// 新しい接続 ID を採番し、送信チャンネルを登録する
    pub async fn execute(&self, sender: PusherChannel) -> ConnectionId {
        let connection_id = ConnectionId::generate();
        self.message_pusher
            .register_client(connection_id.clone(), sender)
            .await;
        connection_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::RoomEvent, infrastructure::message_pusher::WebSocketMessagePusher};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_connect_registers_unique_connections() {
        // テスト項目: 接続ごとに異なる ID が採番され、どちらにも送信できる
        // given (前提条件):
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let usecase = ConnectParticipantUseCase::new(pusher.clone());
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        // when (操作):
        let first = usecase.execute(tx1).await;
        let second = usecase.execute(tx2).await;

        // then (期待する結果):
        assert_ne!(first, second);
        assert_eq!(pusher.count_clients().await, 2);
        pusher
            .broadcast(vec![first, second], &RoomEvent::InterviewEnded)
            .await
            .unwrap();
        assert!(rx1.recv().await.is_some());
        assert!(rx2.recv().await.is_some());
    }
}
