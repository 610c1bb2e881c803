//! UseCase テスト用のヘルパー

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, Member, MessagePusher, Role, RoomId, UserId, UserName},
    infrastructure::{
        message_pusher::WebSocketMessagePusher, repository::InMemoryPresenceRepository,
    },
};

pub(crate) fn room(id: &str) -> RoomId {
    RoomId::new(id.to_string()).unwrap()
}

pub(crate) fn connection(id: &str) -> ConnectionId {
    ConnectionId::new(id.to_string()).unwrap()
}

pub(crate) fn user_id(id: &str) -> UserId {
    UserId::new(id.to_string()).unwrap()
}

pub(crate) fn user_name(name: &str) -> UserName {
    UserName::new(name.to_string()).unwrap()
}

pub(crate) fn member(conn: &str, user: &str, role: Role) -> Member {
    Member::new(connection(conn), user_id(user), user_name(user), role)
}

/// 実際の Presence テーブルと MessagePusher を使ったテスト環境
pub(crate) struct Harness {
    pub presence: Arc<InMemoryPresenceRepository>,
    pub pusher: Arc<WebSocketMessagePusher>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            presence: Arc::new(InMemoryPresenceRepository::new()),
            pusher: Arc::new(WebSocketMessagePusher::new()),
        }
    }

    /// 接続を MessagePusher に登録し、受信側を返す
    pub async fn connect(&self, conn: &str) -> Inbox {
        let (tx, rx) = mpsc::unbounded_channel();
        self.pusher.register_client(connection(conn), tx).await;
        Inbox { rx }
    }
}

/// 1 接続分の受信フレーム
pub(crate) struct Inbox {
    rx: mpsc::UnboundedReceiver<String>,
}

impl Inbox {
    /// 現在までに届いたフレームを全て取り出す
    pub fn drain(&mut self) -> Vec<Value> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.rx.try_recv() {
            frames.push(serde_json::from_str(&frame).unwrap());
        }
        frames
    }

    /// 届いたイベント名を順に取り出す
    pub fn events(&mut self) -> Vec<String> {
        self.drain()
            .into_iter()
            .map(|frame| frame["event"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}
