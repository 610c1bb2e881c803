//! MessagePusher trait 定義
//!
//! 接続中のクライアントへのイベント送信を抽象化します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError, RoomEvent};

/// 接続ごとの送信チャンネル（シリアライズ済みのテキストフレーム）
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// イベント送信の抽象化
///
/// `broadcast` は 1 回の呼び出しで全ターゲットへの送信を完了させ、
/// 並行する他の `broadcast` と交互に混ざることはありません。
/// これにより、全ての受信者が同じ順序でイベントを観測します。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続を登録
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続の登録を解除
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 特定の接続にイベントを送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &RoomEvent,
    ) -> Result<(), MessagePushError>;

    /// 複数の接続にイベントを送信（一部の送信失敗は許容）
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        event: &RoomEvent,
    ) -> Result<(), MessagePushError>;
}
