//! UseCase: 切断処理
//!
//! 切断はルームからの唯一の退出経路です。接続を Presence から削除し、
//! 残りのメンバーに `user-left` を通知します。

use std::sync::Arc;

use crate::domain::{ConnectionId, Member, MessagePusher, PresenceRepository, RoomEvent, RoomId};

/// 切断のユースケース
pub struct DisconnectParticipantUseCase {
    presence: Arc<dyn PresenceRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectParticipantUseCase {
    pub fn new(
        presence: Arc<dyn PresenceRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            presence,
            message_pusher,
        }
    }

    /// 切断を実行
    ///
    /// # Returns
    ///
    /// * `Some((room_id, members))` - 退出したルームと退出後のメンバー一覧
    /// * `None` - ルームに参加していなかった
    pub async fn execute(&self, connection_id: &ConnectionId) -> Option<(RoomId, Vec<Member>)> {
        self.message_pusher.unregister_client(connection_id).await;

        let (room_id, members) = self.presence.leave(connection_id).await?;
        tracing::info!(
            "Connection '{}' left room '{}' ({} remaining)",
            connection_id.as_str(),
            room_id.as_str(),
            members.len()
        );

        if !members.is_empty() {
            let targets = members.iter().map(|m| m.connection_id.clone()).collect();
            let event = RoomEvent::UserLeft {
                members: members.clone(),
            };
            if let Err(e) = self.message_pusher.broadcast(targets, &event).await {
                tracing::warn!("Failed to broadcast user-left: {}", e);
            }
        }

        Some((room_id, members))
    }
}
