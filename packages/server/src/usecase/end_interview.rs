//! UseCase: 面接の終了
//!
//! `active → completed` の遷移を実行し、成功した場合に限りルーム全体へ
//! `interview-ended` を通知します。
//!
//! ## 権限チェック
//!
//! 1. リクエスト元の接続がそのルームに参加していること
//! 2. 接続時に申告されたロールが面接官であること
//! 3. `LifecyclePolicy::verify_interviewer_identity` が有効な場合、
//!    リクエスト元のユーザー ID が Interview の面接官 ID と一致すること
//!
//! いずれかを満たさない場合、状態は変わらず通知も行われません。

use std::sync::Arc;

use pairroom_shared::time::Clock;

use crate::domain::{
    ConnectionId, Interview, InterviewRepository, InterviewUpdate, MessagePusher,
    PresenceRepository, Role, RoomEvent, RoomId, Timestamp,
};

use super::error::EndInterviewError;

/// 面接ライフサイクルの権限ポリシー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    /// 申告されたロールに加えて、保存された面接官 ID と照合する
    pub verify_interviewer_identity: bool,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            verify_interviewer_identity: true,
        }
    }
}

/// 面接終了のユースケース
pub struct EndInterviewUseCase {
    presence: Arc<dyn PresenceRepository>,
    interviews: Arc<dyn InterviewRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    policy: LifecyclePolicy,
}

impl EndInterviewUseCase {
    pub fn new(
        presence: Arc<dyn PresenceRepository>,
        interviews: Arc<dyn InterviewRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        policy: LifecyclePolicy,
    ) -> Self {
        Self {
            presence,
            interviews,
            message_pusher,
            clock,
            policy,
        }
    }

    /// 面接を終了し、更新後の Interview を返す
    pub async fn execute(
        &self,
        room_id: &RoomId,
        requester: &ConnectionId,
    ) -> Result<Interview, EndInterviewError> {
        let member = match self.presence.find_member(requester).await {
            Some((joined_room, member)) if &joined_room == room_id => member,
            _ => return Err(EndInterviewError::NotInRoom(room_id.as_str().to_string())),
        };

        if member.role != Role::Interviewer {
            tracing::warn!(
                "'{}' tried to end interview '{}' without the interviewer role",
                member.user_id.as_str(),
                room_id.as_str()
            );
            return Err(EndInterviewError::Forbidden);
        }

        if self.policy.verify_interviewer_identity {
            let interview = self
                .interviews
                .find_interview_by_room_id(room_id)
                .await
                .map_err(|e| EndInterviewError::from_repository(room_id, e))?
                .ok_or_else(|| EndInterviewError::InterviewNotFound(room_id.as_str().to_string()))?;
            if !interview.is_interviewer(&member.user_id) {
                tracing::warn!(
                    "'{}' claimed the interviewer role in '{}' but is not its interviewer",
                    member.user_id.as_str(),
                    room_id.as_str()
                );
                return Err(EndInterviewError::Forbidden);
            }
        }

        let at = Timestamp::new(self.clock.now_millis());
        let interview = self
            .interviews
            .update_interview(room_id, InterviewUpdate::complete(at))
            .await
            .map_err(|e| EndInterviewError::from_repository(room_id, e))?;
        tracing::info!("Interview '{}' completed", room_id.as_str());

        let targets = self
            .presence
            .members_of(room_id)
            .await
            .into_iter()
            .map(|m| m.connection_id)
            .collect();
        if let Err(e) = self
            .message_pusher
            .broadcast(targets, &RoomEvent::InterviewEnded)
            .await
        {
            tracing::warn!("Failed to broadcast interview-ended: {}", e);
        }

        Ok(interview)
    }
}
