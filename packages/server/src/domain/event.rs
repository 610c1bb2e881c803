//! Room events
//!
//! ルームの参加者に通知されるイベント。ワイヤーフォーマットへの変換は
//! Infrastructure 層（DTO）が担当します。

use serde_json::Value;

use super::{
    entity::{ChatMessage, Member},
    value_object::{UserId, UserName},
};

/// WebRTC シグナリングメッセージの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

/// 共同編集イベント
///
/// ペイロードは解釈せずにそのまま転送します（last-write-wins）。
#[derive(Debug, Clone, PartialEq)]
pub enum CollaborationEvent {
    CodeChange { code: String },
    CursorUpdate { cursor: Value },
    Typing { typing: bool },
    LanguageChange { language: String },
}

/// 参加者に通知されるイベント
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    /// 参加後のメンバー一覧（ルーム全体に通知）
    RoomJoined {
        members: Vec<Member>,
        joined: UserName,
    },
    /// シグナリングメッセージ（送信者以外に転送）
    Signal { kind: SignalKind, payload: Value },
    /// 共同編集イベント（送信者以外に転送）
    Collaboration {
        event: CollaborationEvent,
        sender: Option<UserId>,
    },
    /// チャットメッセージ（送信者を含むルーム全体に通知）
    Chat(ChatMessage),
    /// 面接終了（ルーム全体に通知）
    InterviewEnded,
    /// 退出後のメンバー一覧（残りのメンバーに通知）
    UserLeft { members: Vec<Member> },
    /// リクエスト元だけに返すエラー
    Error { message: String },
    /// リクエスト元だけに返す非致命的な警告
    Warning { message: String },
}
