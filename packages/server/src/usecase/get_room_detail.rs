//! UseCase: ルーム詳細の取得
//!
//! ルームは Presence 上の接続の集合として導出されます。
//! 接続がなく Interview レコードもない場合、そのルームは存在しません。

use std::sync::Arc;

use crate::domain::{Interview, InterviewRepository, Member, PresenceRepository, RoomId};

use super::error::GetRoomDetailError;

/// ルーム詳細
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomDetail {
    pub room_id: RoomId,
    pub members: Vec<Member>,
    pub interview: Option<Interview>,
}

/// ルーム詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    presence: Arc<dyn PresenceRepository>,
    interviews: Arc<dyn InterviewRepository>,
}

impl GetRoomDetailUseCase {
    pub fn new(
        presence: Arc<dyn PresenceRepository>,
        interviews: Arc<dyn InterviewRepository>,
    ) -> Self {
        Self {
            presence,
            interviews,
        }
    }

    pub async fn execute(&self, room_id: RoomId) -> Result<RoomDetail, GetRoomDetailError> {
        let members = self.presence.members_of(&room_id).await;
        let interview = self.interviews.find_interview_by_room_id(&room_id).await?;

        if members.is_empty() && interview.is_none() {
            return Err(GetRoomDetailError::RoomNotFound(room_id.into_string()));
        }

        Ok(RoomDetail {
            room_id,
            members,
            interview,
        })
    }
}
