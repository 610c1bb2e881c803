//! Domain layer
//!
//! 値オブジェクト・エンティティ・ルームイベントと、ドメイン層が必要とする
//! インターフェース（Repository / MessagePusher）を定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

pub mod entity;
pub mod error;
pub mod event;
pub mod message_pusher;
pub mod repository;
pub mod value_object;

pub use entity::{
    ChatMessage, Interview, InterviewStatus, InterviewUpdate, Member, NewInterview, User,
};
pub use error::{InterviewError, MessagePushError, RepositoryError, ValueObjectError};
pub use event::{CollaborationEvent, RoomEvent, SignalKind};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use repository::{
    ChatRepository, DurableConnector, InterviewRepository, PresenceRepository, Store,
    UserRepository,
};
pub use value_object::{
    ConnectionId, Email, MessageText, Rating, Role, RoomId, RoomIdFactory, Timestamp, UserId,
    UserName,
};

#[cfg(test)]
pub use message_pusher::MockMessagePusher;
#[cfg(test)]
pub use repository::{
    MockChatRepository, MockDurableConnector, MockInterviewRepository, MockPresenceRepository,
    MockUserRepository,
};
