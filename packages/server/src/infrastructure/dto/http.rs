//! HTTP API request / response bodies.

use serde::{Deserialize, Serialize};

/// `POST /api/rooms` のリクエスト
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub interviewer_id: String,
}

/// `POST /api/rooms` のレスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    pub room_id: String,
}

/// `GET /api/rooms/{room_id}` のレスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    pub room_id: String,
    pub members: Vec<MemberDetailDto>,
    pub interview: Option<InterviewSummaryDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDetailDto {
    pub connection_id: String,
    pub user_id: String,
    pub user_name: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewSummaryDto {
    pub status: String,
    pub interviewer_id: String,
    pub candidate_id: Option<String>,
    pub language: String,
    /// RFC 3339 (UTC)
    pub start_time: String,
    /// RFC 3339 (UTC)
    pub end_time: Option<String>,
}

/// `GET /api/health` のレスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
    /// `durable` / `fallback` / `unset`
    pub backend: String,
}

/// エラーレスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
