//! WebSocket event frames.
//!
//! 全てのフレームは `{"event": "<kebab-case 名>", "data": {...}}` 形式の JSON テキストです。
//! ペイロードのフィールド名は camelCase です。

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ========================================
// Client → Server
// ========================================

/// クライアントから受信するイベント
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    JoinRoom(JoinRoomPayload),
    CodeChange(CodeChangePayload),
    CursorUpdate(CursorUpdatePayload),
    Typing(TypingPayload),
    LanguageChange(LanguageChangePayload),
    ChatMessage(ChatMessagePayload),
    Offer(OfferPayload),
    Answer(AnswerPayload),
    IceCandidate(IceCandidatePayload),
    EndInterview(EndInterviewPayload),
}

impl ClientMessage {
    /// イベントの対象ルーム ID（未検証の文字列）
    pub fn room_id(&self) -> &str {
        match self {
            ClientMessage::JoinRoom(p) => &p.room_id,
            ClientMessage::CodeChange(p) => &p.room_id,
            ClientMessage::CursorUpdate(p) => &p.room_id,
            ClientMessage::Typing(p) => &p.room_id,
            ClientMessage::LanguageChange(p) => &p.room_id,
            ClientMessage::ChatMessage(p) => &p.room_id,
            ClientMessage::Offer(p) => &p.room_id,
            ClientMessage::Answer(p) => &p.room_id,
            ClientMessage::IceCandidate(p) => &p.room_id,
            ClientMessage::EndInterview(p) => &p.room_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomPayload {
    pub room_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeChangePayload {
    pub room_id: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorUpdatePayload {
    pub room_id: String,
    #[serde(default)]
    pub cursor: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub room_id: String,
    pub typing: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageChangePayload {
    pub room_id: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessagePayload {
    pub room_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferPayload {
    pub room_id: String,
    #[serde(default)]
    pub offer: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerPayload {
    pub room_id: String,
    #[serde(default)]
    pub answer: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidatePayload {
    pub room_id: String,
    #[serde(default)]
    pub candidate: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndInterviewPayload {
    pub room_id: String,
}

// ========================================
// Server → Client
// ========================================

/// クライアントに送信するイベント
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    RoomJoined(RoomJoinedData),
    ReceiveCode(ReceiveCodeData),
    CursorUpdate(CursorUpdateData),
    Typing(TypingData),
    LanguageChange(LanguageChangeData),
    ChatMessage(ChatMessageData),
    Offer(OfferData),
    Answer(AnswerData),
    IceCandidate(IceCandidateData),
    InterviewEnded(NoticeData),
    UserLeft(UserLeftData),
    Error(NoticeData),
    Warning(NoticeData),
}

/// ルームのメンバー情報
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInfo {
    pub connection_id: String,
    pub user_id: String,
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomJoinedData {
    pub users: Vec<MemberInfo>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveCodeData {
    pub code: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorUpdateData {
    pub cursor: Value,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingData {
    pub typing: bool,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageChangeData {
    pub language: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageData {
    pub room_id: String,
    pub message: String,
    pub sender_id: Option<String>,
    pub sender_name: String,
    /// RFC 3339 (UTC)
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferData {
    pub offer: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerData {
    pub answer: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IceCandidateData {
    pub candidate: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserLeftData {
    pub users: Vec<MemberInfo>,
}

/// `message` だけを持つ通知（interview-ended / error / warning）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoticeData {
    pub message: String,
}
