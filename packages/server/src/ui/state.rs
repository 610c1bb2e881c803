//! Shared application state.

use std::sync::Arc;

use pairroom_shared::time::Clock;

use crate::{
    domain::MessagePusher,
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryPresenceRepository, PersistenceGateway},
    },
    usecase::{
        BroadcastCollaborationUseCase, ConnectParticipantUseCase, CreateRoomUseCase,
        DisconnectParticipantUseCase, EndInterviewUseCase, GetRoomDetailUseCase,
        JoinRoomUseCase, LifecyclePolicy, RelaySignalUseCase, SendChatUseCase,
    },
};

/// Shared application state
pub struct AppState {
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    pub relay_signal_usecase: Arc<RelaySignalUseCase>,
    pub broadcast_collaboration_usecase: Arc<BroadcastCollaborationUseCase>,
    pub send_chat_usecase: Arc<SendChatUseCase>,
    pub end_interview_usecase: Arc<EndInterviewUseCase>,
    pub create_room_usecase: Arc<CreateRoomUseCase>,
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    /// リクエスト元だけに返す error / warning の送信に使う
    pub message_pusher: Arc<dyn MessagePusher>,
    /// ヘルスチェックでバックエンドの種類を返すために保持
    pub gateway: Arc<PersistenceGateway>,
}

impl AppState {
    /// 依存関係を組み立てる
    ///
    /// 1. Presence（プロセス内のみ）
    /// 2. MessagePusher（WebSocket 実装）
    /// 3. UseCases（永続化は全て Gateway 経由）
    pub fn new(
        gateway: Arc<PersistenceGateway>,
        clock: Arc<dyn Clock>,
        policy: LifecyclePolicy,
    ) -> Self {
        let presence = Arc::new(InMemoryPresenceRepository::new());
        let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());

        Self {
            connect_participant_usecase: Arc::new(ConnectParticipantUseCase::new(
                message_pusher.clone(),
            )),
            disconnect_participant_usecase: Arc::new(DisconnectParticipantUseCase::new(
                presence.clone(),
                message_pusher.clone(),
            )),
            join_room_usecase: Arc::new(JoinRoomUseCase::new(
                presence.clone(),
                gateway.clone(),
                gateway.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            relay_signal_usecase: Arc::new(RelaySignalUseCase::new(
                presence.clone(),
                message_pusher.clone(),
            )),
            broadcast_collaboration_usecase: Arc::new(BroadcastCollaborationUseCase::new(
                presence.clone(),
                message_pusher.clone(),
            )),
            send_chat_usecase: Arc::new(SendChatUseCase::new(
                presence.clone(),
                gateway.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            end_interview_usecase: Arc::new(EndInterviewUseCase::new(
                presence.clone(),
                gateway.clone(),
                message_pusher.clone(),
                clock.clone(),
                policy,
            )),
            create_room_usecase: Arc::new(CreateRoomUseCase::new(gateway.clone(), clock)),
            get_room_detail_usecase: Arc::new(GetRoomDetailUseCase::new(
                presence,
                gateway.clone(),
            )),
            message_pusher,
            gateway,
        }
    }
}
