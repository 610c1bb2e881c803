//! UseCase layer
//!
//! 受信したイベント・リクエストごとに 1 つのユースケースを定義します。
//! 各ユースケースは Domain 層の trait（Repository, MessagePusher）にだけ依存します。

mod broadcast_collaboration;
mod connect_participant;
mod create_room;
mod disconnect_participant;
mod end_interview;
mod error;
mod get_room_detail;
mod join_room;
mod relay_signal;
mod send_chat;
#[cfg(test)]
mod test_support;

pub use broadcast_collaboration::BroadcastCollaborationUseCase;
pub use connect_participant::ConnectParticipantUseCase;
pub use create_room::CreateRoomUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use end_interview::{EndInterviewUseCase, LifecyclePolicy};
pub use error::{CreateRoomError, EndInterviewError, GetRoomDetailError, SendChatError};
pub use get_room_detail::{GetRoomDetailUseCase, RoomDetail};
pub use join_room::{JoinRoomInput, JoinRoomOutcome, JoinRoomUseCase};
pub use relay_signal::RelaySignalUseCase;
pub use send_chat::SendChatUseCase;
