//! UseCase: WebRTC シグナリングの中継
//!
//! offer / answer / ice-candidate を送信者以外のルームメンバーに転送します。
//! ペイロードは解釈せず、検証・永続化・応答も行いません。

use std::sync::Arc;

use serde_json::Value;

use crate::domain::{
    ConnectionId, MessagePushError, MessagePusher, PresenceRepository, RoomEvent, RoomId,
    SignalKind,
};

/// シグナリング中継のユースケース
pub struct RelaySignalUseCase {
    presence: Arc<dyn PresenceRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl RelaySignalUseCase {
    pub fn new(
        presence: Arc<dyn PresenceRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            presence,
            message_pusher,
        }
    }

    /// シグナリングメッセージを転送し、転送先の数を返す
    pub async fn execute(
        &self,
        room_id: &RoomId,
        sender: &ConnectionId,
        kind: SignalKind,
        payload: Value,
    ) -> Result<usize, MessagePushError> {
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
        tracing::debug!(
            "Relaying {:?} in room '{}' to {} peer(s)",
            kind,
            room_id.as_str(),
            count
        );
        self.message_pusher
            .broadcast(targets, &RoomEvent::Signal { kind, payload })
            .await?;
        Ok(count)
    }
}
