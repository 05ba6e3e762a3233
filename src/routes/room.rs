use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::room::{
        CreateRoomRequest, RoomSummary, RoomView, StartQuizResponse, SubmitAnswersRequest,
        SubmitAnswersResponse,
    },
    error::AppError,
    extractors::RequesterIdentity,
    services::room_service,
    state::SharedState,
};

/// Routes covering the quiz-room lifecycle.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/quiz-room", post(create_room))
        .route("/quiz-room/{code}", get(get_room))
        .route("/quiz-room/{code}/join", post(join_room))
        .route("/quiz-room/{code}/start", post(start_quiz))
        .route("/quiz-room/{code}/submit", post(submit_answers))
}

/// Create a new quiz room owned by the requester.
#[utoipa::path(
    post,
    path = "/quiz-room",
    tag = "quiz-room",
    request_body = CreateRoomRequest,
    responses(
        (status = 201, description = "Room created", body = RoomSummary),
        (status = 400, description = "Invalid settings"),
        (status = 401, description = "Missing identity headers")
    )
)]
pub async fn create_room(
    State(state): State<SharedState>,
    identity: RequesterIdentity,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomSummary>), AppError> {
    let summary =
        room_service::create_room(&state, identity.user_id, identity.username, payload).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// Fetch the full room view, including the computed leaderboard.
#[utoipa::path(
    get,
    path = "/quiz-room/{code}",
    tag = "quiz-room",
    params(("code" = String, Path, description = "Unique room code")),
    responses(
        (status = 200, description = "Room details", body = RoomView),
        (status = 404, description = "Unknown room code")
    )
)]
pub async fn get_room(
    State(state): State<SharedState>,
    _identity: RequesterIdentity,
    Path(code): Path<String>,
) -> Result<Json<RoomView>, AppError> {
    let view = room_service::room_view(&state, &code).await?;
    Ok(Json(view))
}

/// Join an open room as the requester.
#[utoipa::path(
    post,
    path = "/quiz-room/{code}/join",
    tag = "quiz-room",
    params(("code" = String, Path, description = "Unique room code")),
    responses(
        (status = 200, description = "Joined the room", body = RoomSummary),
        (status = 400, description = "Admission rejected (full, closed, or already joined)"),
        (status = 404, description = "Unknown room code")
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    identity: RequesterIdentity,
    Path(code): Path<String>,
) -> Result<Json<RoomSummary>, AppError> {
    let summary =
        room_service::join_room(&state, &code, identity.user_id, identity.username).await?;
    Ok(Json(summary))
}

/// Start the quiz; creator only.
#[utoipa::path(
    post,
    path = "/quiz-room/{code}/start",
    tag = "quiz-room",
    params(("code" = String, Path, description = "Unique room code")),
    responses(
        (status = 200, description = "Quiz started", body = StartQuizResponse),
        (status = 400, description = "Room is not in the waiting state"),
        (status = 403, description = "Requester is not the room creator"),
        (status = 404, description = "Unknown room code")
    )
)]
pub async fn start_quiz(
    State(state): State<SharedState>,
    identity: RequesterIdentity,
    Path(code): Path<String>,
) -> Result<Json<StartQuizResponse>, AppError> {
    let response = room_service::start_quiz(&state, &code, identity.user_id).await?;
    Ok(Json(response))
}

/// Submit the requester's answer sheet for a running quiz.
#[utoipa::path(
    post,
    path = "/quiz-room/{code}/submit",
    tag = "quiz-room",
    params(("code" = String, Path, description = "Unique room code")),
    request_body = SubmitAnswersRequest,
    responses(
        (status = 200, description = "Answers accepted", body = SubmitAnswersResponse),
        (status = 400, description = "Rejected (wrong count, not ready, not a participant, already submitted)"),
        (status = 404, description = "Unknown room code")
    )
)]
pub async fn submit_answers(
    State(state): State<SharedState>,
    identity: RequesterIdentity,
    Path(code): Path<String>,
    Json(payload): Json<SubmitAnswersRequest>,
) -> Result<Json<SubmitAnswersResponse>, AppError> {
    let response = room_service::submit_answers(&state, &code, identity.user_id, payload).await?;
    Ok(Json(response))
}
