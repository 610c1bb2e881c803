//! UseCase: ルーム参加
//!
//! 1. 表示名を解決する（申告された名前 → ユーザーレコード → "Anonymous"）
//! 2. Presence に登録する（ローカルで必ず成功）
//!    別のルームに参加中の接続は先に退出させ、そのルームに `user-left` を通知する
//! 3. Interview に候補者がいなければ、面接官以外の参加者を候補者として登録する
//!    （compare-and-set、同時に参加しても候補者になるのは 1 人だけ）
//! 4. 参加後のメンバー一覧をルーム全体に通知する
//!
//! 候補者登録の失敗は参加者本人にだけ `warning` として返し、参加自体は成功させます。

use std::sync::Arc;

use pairroom_shared::time::Clock;

use crate::domain::{
    ConnectionId, InterviewRepository, Member, MessagePusher, PresenceRepository,
    RepositoryError, Role, RoomEvent, RoomId, Timestamp, UserId, UserName, UserRepository,
};

/// ルーム参加の入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRoomInput {
    pub room_id: RoomId,
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    /// クライアントが申告した表示名（未申告なら None）
    pub user_name: Option<UserName>,
    pub role: Role,
}

/// ルーム参加の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRoomOutcome {
    /// 参加後のメンバー一覧（参加順）
    pub members: Vec<Member>,
    /// 参加者本人にだけ通知した警告
    pub warning: Option<String>,
}

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    presence: Arc<dyn PresenceRepository>,
    users: Arc<dyn UserRepository>,
    interviews: Arc<dyn InterviewRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl JoinRoomUseCase {
    pub fn new(
        presence: Arc<dyn PresenceRepository>,
        users: Arc<dyn UserRepository>,
        interviews: Arc<dyn InterviewRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            presence,
            users,
            interviews,
            message_pusher,
            clock,
        }
    }

    pub async fn execute(&self, input: JoinRoomInput) -> JoinRoomOutcome {
        let user_name = self.resolve_user_name(&input.user_id, input.user_name).await;
        let member = Member::new(
            input.connection_id.clone(),
            input.user_id,
            user_name.clone(),
            input.role,
        );

        self.leave_previous_room(&input.room_id, &input.connection_id).await;
        let members = self.presence.join(input.room_id.clone(), member.clone()).await;
        tracing::info!(
            "'{}' joined room '{}' as {} ({} members)",
            user_name.as_str(),
            input.room_id.as_str(),
            member.role,
            members.len()
        );

        let warning = self.claim_candidate(&input.room_id, &member).await.err();
        if let Some(message) = &warning {
            tracing::warn!(
                "Candidate assignment for room '{}' failed: {}",
                input.room_id.as_str(),
                message
            );
            let event = RoomEvent::Warning {
                message: message.clone(),
            };
            if let Err(e) = self.message_pusher.push_to(&input.connection_id, &event).await {
                tracing::warn!("Failed to push warning: {}", e);
            }
        }

        let targets = members.iter().map(|m| m.connection_id.clone()).collect();
        let event = RoomEvent::RoomJoined {
            members: members.clone(),
            joined: user_name,
        };
        if let Err(e) = self.message_pusher.broadcast(targets, &event).await {
            tracing::warn!("Failed to broadcast room-joined: {}", e);
        }

        JoinRoomOutcome { members, warning }
    }

    async fn leave_previous_room(&self, room_id: &RoomId, connection_id: &ConnectionId) {
        match self.presence.find_member(connection_id).await {
            Some((previous, _)) if &previous != room_id => {}
            _ => return,
        }
        let Some((previous, remaining)) = self.presence.leave(connection_id).await else {
            return;
        };
        tracing::info!(
            "Connection '{}' moved from room '{}' to '{}' ({} remaining)",
            connection_id.as_str(),
            previous.as_str(),
            room_id.as_str(),
            remaining.len()
        );
        if remaining.is_empty() {
            return;
        }
        let targets = remaining.iter().map(|m| m.connection_id.clone()).collect();
        let event = RoomEvent::UserLeft { members: remaining };
        if let Err(e) = self.message_pusher.broadcast(targets, &event).await {
            tracing::warn!("Failed to broadcast user-left: {}", e);
        }
    }

    async fn resolve_user_name(&self, user_id: &UserId, claimed: Option<UserName>) -> UserName {
        if let Some(name) = claimed {
            return name;
        }
        match self.users.find_user_by_id(user_id).await {
            Ok(Some(user)) => user.name,
            Ok(None) => UserName::anonymous(),
            Err(e) => {
                tracing::debug!("Could not resolve name of '{}': {}", user_id.as_str(), e);
                UserName::anonymous()
            }
        }
    }

    /// 候補者が未設定なら参加者を候補者として登録する
    ///
    /// 失敗した場合は参加者に返す警告メッセージを返します。
    async fn claim_candidate(&self, room_id: &RoomId, member: &Member) -> Result<(), String> {
        let interview = match self.interviews.find_interview_by_room_id(room_id).await {
            Ok(Some(interview)) => interview,
            Ok(None) => return Ok(()),
            Err(e) => {
                return Err(format!(
                    "Joined without candidate registration: {}",
                    e
                ));
            }
        };

        if interview.candidate_id.is_some() || interview.is_interviewer(&member.user_id) {
            return Ok(());
        }

        let at = Timestamp::new(self.clock.now_millis());
        match self
            .interviews
            .assign_candidate(room_id, &member.user_id, at)
            .await
        {
            Ok(_) => {
                tracing::info!(
                    "'{}' registered as candidate of room '{}'",
                    member.user_id.as_str(),
                    room_id.as_str()
                );
                Ok(())
            }
            Err(RepositoryError::Conflict(_)) => {
                Err("Another candidate has already joined this interview".to_string())
            }
            Err(e) => Err(format!("Joined without candidate registration: {}", e)),
        }
    }
}
