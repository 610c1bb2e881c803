//! UseCase: ルーム（面接）の作成
//!
//! 新しいルーム ID を採番し、面接官を登録した active な Interview を作成します。

use std::sync::Arc;

use pairroom_shared::time::Clock;

use crate::domain::{
    Interview, InterviewRepository, NewInterview, RepositoryError, RoomIdFactory, Timestamp,
    UserId,
};

use super::error::CreateRoomError;

/// ルーム ID が衝突した場合の再採番回数
const MAX_ID_ATTEMPTS: usize = 3;

/// ルーム作成のユースケース
pub struct CreateRoomUseCase {
    interviews: Arc<dyn InterviewRepository>,
    clock: Arc<dyn Clock>,
}

impl CreateRoomUseCase {
    pub fn new(interviews: Arc<dyn InterviewRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { interviews, clock }
    }

    pub async fn execute(&self, interviewer_id: UserId) -> Result<Interview, CreateRoomError> {
        let mut last_error = None;

        for _ in 0..MAX_ID_ATTEMPTS {
            let new = NewInterview {
                room_id: RoomIdFactory::generate()?,
                interviewer_id: interviewer_id.clone(),
            };
            let at = Timestamp::new(self.clock.now_millis());
            match self.interviews.create_interview(new, at).await {
                Ok(interview) => {
                    tracing::info!(
                        "Room '{}' created by '{}'",
                        interview.room_id.as_str(),
                        interviewer_id.as_str()
                    );
                    return Ok(interview);
                }
                Err(RepositoryError::Conflict(e)) => {
                    tracing::debug!("Room id collision, regenerating: {}", e);
                    last_error = Some(RepositoryError::Conflict(e));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(last_error
            .unwrap_or_else(|| RepositoryError::Backend("room id generation failed".to_string()))
            .into())
    }
}
