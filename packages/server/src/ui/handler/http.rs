//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::{RepositoryError, RoomId, UserId},
    infrastructure::dto::http::{
        CreateRoomRequest, CreateRoomResponse, ErrorResponse, HealthDto, InterviewSummaryDto,
        MemberDetailDto, RoomDetailDto,
    },
    ui::state::AppState,
    usecase::{CreateRoomError, GetRoomDetailError},
};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

fn repository_status(e: &RepositoryError) -> StatusCode {
    match e {
        RepositoryError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::NotFound(_) => StatusCode::NOT_FOUND,
        RepositoryError::InvalidTransition(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RepositoryError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthDto> {
    let backend = state
        .gateway
        .backend_kind()
        .map(|kind| kind.as_str())
        .unwrap_or("unset");
    Json(HealthDto {
        status: "ok".to_string(),
        backend: backend.to_string(),
    })
}

/// Create a room (interview) for the given interviewer
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), ApiError> {
    let interviewer_id = UserId::try_from(request.interviewer_id)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;

    match state.create_room_usecase.execute(interviewer_id).await {
        Ok(interview) => Ok((
            StatusCode::CREATED,
            Json(CreateRoomResponse {
                room_id: interview.room_id.into_string(),
            }),
        )),
        Err(CreateRoomError::Persistence(e)) => {
            tracing::warn!("Failed to create room: {}", e);
            Err(api_error(repository_status(&e), e))
        }
        Err(e @ CreateRoomError::IdGeneration(_)) => {
            tracing::error!("Failed to create room: {}", e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e))
        }
    }
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailDto>, ApiError> {
    let room_id =
        RoomId::try_from(room_id).map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;

    match state.get_room_detail_usecase.execute(room_id).await {
        Ok(detail) => Ok(Json(RoomDetailDto {
            room_id: detail.room_id.into_string(),
            members: detail.members.iter().map(MemberDetailDto::from).collect(),
            interview: detail.interview.as_ref().map(InterviewSummaryDto::from),
        })),
        Err(e @ GetRoomDetailError::RoomNotFound(_)) => Err(api_error(StatusCode::NOT_FOUND, e)),
        Err(GetRoomDetailError::Persistence(e)) => {
            tracing::warn!("Failed to load room detail: {}", e);
            Err(api_error(repository_status(&e), e))
        }
    }
}
