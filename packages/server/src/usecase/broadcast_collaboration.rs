//! UseCase: 共同編集イベントの配信
//!
//! code-change / cursor-update / typing / language-change を送信者以外のメンバーに、
//! 送信者のユーザー ID を付けて転送します。
//! サーバーは編集内容の正本を持ちません（last-write-wins）。

use std::sync::Arc;

use crate::domain::{
    CollaborationEvent, ConnectionId, MessagePushError, MessagePusher, PresenceRepository,
    RoomEvent, RoomId,
};

/// 共同編集イベント配信のユースケース
pub struct BroadcastCollaborationUseCase {
    presence: Arc<dyn PresenceRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl BroadcastCollaborationUseCase {
    pub fn new(
        presence: Arc<dyn PresenceRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            presence,
            message_pusher,
        }
    }

    /// イベントを配信し、配信先の数を返す
    pub async fn execute(
        &self,
        room_id: &RoomId,
        sender: &ConnectionId,
        event: CollaborationEvent,
    ) -> Result<usize, MessagePushError> {
        let sender_user_id = self
            .presence
            .find_member(sender)
            .await
            .map(|(_, member)| member.user_id);

        let targets: Vec<ConnectionId> = self
            .presence
            .members_of(room_id)
            .await
            .into_iter()
            .map(|m| m.connection_id)
            .filter(|id| id != sender)
            .collect();

        if targets.is_empty() {
            return Ok(0);
        }

        let count = targets.len();
        let event = RoomEvent::Collaboration {
            event,
            sender: sender_user_id,
        };
        self.message_pusher.broadcast(targets, &event).await?;
        Ok(count)
    }
}
