//! Conversion logic between domain models and DTOs.

use pairroom_shared::time::timestamp_to_rfc3339;

use crate::domain::{
    CollaborationEvent, Interview, Member, RoomEvent, SignalKind, UserId,
};
use crate::infrastructure::dto::{http, websocket as ws};

/// interview-ended で送信するメッセージ
pub const INTERVIEW_ENDED_MESSAGE: &str = "Interview has ended";

// ========================================
// Domain Model → WebSocket DTO
// ========================================

impl From<&Member> for ws::MemberInfo {
    fn from(member: &Member) -> Self {
        Self {
            connection_id: member.connection_id.as_str().to_string(),
            user_id: member.user_id.as_str().to_string(),
            user_name: member.user_name.as_str().to_string(),
        }
    }
}

fn member_infos(members: &[Member]) -> Vec<ws::MemberInfo> {
    members.iter().map(ws::MemberInfo::from).collect()
}

fn user_id_string(user_id: &Option<UserId>) -> Option<String> {
    user_id.as_ref().map(|id| id.as_str().to_string())
}

impl From<&RoomEvent> for ws::ServerMessage {
    fn from(event: &RoomEvent) -> Self {
        match event {
            RoomEvent::RoomJoined { members, joined } => {
                ws::ServerMessage::RoomJoined(ws::RoomJoinedData {
                    users: member_infos(members),
                    message: format!("{} joined", joined.as_str()),
                })
            }
            RoomEvent::Signal { kind, payload } => match kind {
                SignalKind::Offer => ws::ServerMessage::Offer(ws::OfferData {
                    offer: payload.clone(),
                }),
                SignalKind::Answer => ws::ServerMessage::Answer(ws::AnswerData {
                    answer: payload.clone(),
                }),
                SignalKind::IceCandidate => ws::ServerMessage::IceCandidate(ws::IceCandidateData {
                    candidate: payload.clone(),
                }),
            },
            RoomEvent::Collaboration { event, sender } => {
                let user_id = user_id_string(sender);
                match event {
                    CollaborationEvent::CodeChange { code } => {
                        ws::ServerMessage::ReceiveCode(ws::ReceiveCodeData {
                            code: code.clone(),
                            user_id,
                        })
                    }
                    CollaborationEvent::CursorUpdate { cursor } => {
                        ws::ServerMessage::CursorUpdate(ws::CursorUpdateData {
                            cursor: cursor.clone(),
                            user_id,
                        })
                    }
                    CollaborationEvent::Typing { typing } => {
                        ws::ServerMessage::Typing(ws::TypingData {
                            typing: *typing,
                            user_id,
                        })
                    }
                    CollaborationEvent::LanguageChange { language } => {
                        ws::ServerMessage::LanguageChange(ws::LanguageChangeData {
                            language: language.clone(),
                            user_id,
                        })
                    }
                }
            }
            RoomEvent::Chat(chat) => ws::ServerMessage::ChatMessage(ws::ChatMessageData {
                room_id: chat.room_id.as_str().to_string(),
                message: chat.message.as_str().to_string(),
                sender_id: user_id_string(&chat.sender_id),
                sender_name: chat.sender_name.as_str().to_string(),
                timestamp: timestamp_to_rfc3339(chat.created_at.value()),
            }),
            RoomEvent::InterviewEnded => ws::ServerMessage::InterviewEnded(ws::NoticeData {
                message: INTERVIEW_ENDED_MESSAGE.to_string(),
            }),
            RoomEvent::UserLeft { members } => ws::ServerMessage::UserLeft(ws::UserLeftData {
                users: member_infos(members),
            }),
            RoomEvent::Error { message } => ws::ServerMessage::Error(ws::NoticeData {
                message: message.clone(),
            }),
            RoomEvent::Warning { message } => ws::ServerMessage::Warning(ws::NoticeData {
                message: message.clone(),
            }),
        }
    }
}

// ========================================
// Domain Model → HTTP DTO
// ========================================

impl From<&Member> for http::MemberDetailDto {
    fn from(member: &Member) -> Self {
        Self {
            connection_id: member.connection_id.as_str().to_string(),
            user_id: member.user_id.as_str().to_string(),
            user_name: member.user_name.as_str().to_string(),
            role: member.role.as_str().to_string(),
        }
    }
}

impl From<&Interview> for http::InterviewSummaryDto {
    fn from(interview: &Interview) -> Self {
        Self {
            status: interview.status.as_str().to_string(),
            interviewer_id: interview.interviewer_id.as_str().to_string(),
            candidate_id: user_id_string(&interview.candidate_id),
            language: interview.language.clone(),
            start_time: timestamp_to_rfc3339(interview.start_time.value()),
            end_time: interview
                .end_time
                .map(|end_time| timestamp_to_rfc3339(end_time.value())),
        }
    }
}
