use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for BrainBuzz Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::room::create_room,
        crate::routes::room::get_room,
        crate::routes::room::join_room,
        crate::routes::room::start_quiz,
        crate::routes::room::submit_answers,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::DifficultyDto,
            crate::dto::room::RoomStatusDto,
            crate::dto::room::RoomSummary,
            crate::dto::room::RoomView,
            crate::dto::room::ParticipantSummary,
            crate::dto::room::QuestionView,
            crate::dto::room::StartQuizResponse,
            crate::dto::room::SubmitAnswersRequest,
            crate::dto::room::SubmitAnswersResponse,
            crate::dto::room::LeaderboardEntry,
            crate::dto::ws::RoomInboundMessage,
            crate::dto::ws::RoomOutboundEvent,
            crate::dto::ws::RoomSnapshot,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "quiz-room", description = "Multiplayer quiz room lifecycle"),
        (name = "stream", description = "WebSocket room event stream"),
    )
)]
pub struct ApiDoc;
