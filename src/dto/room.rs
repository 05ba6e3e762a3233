use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{format_system_time, validation::validate_categories},
    state::room::{Difficulty, Participant, Question, Room, RoomStatus},
};

/// Difficulty level accepted from and echoed to clients.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyDto {
    Easy,
    Medium,
    Hard,
}

/// Room lifecycle status exposed to clients.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatusDto {
    Waiting,
    Active,
    Finished,
}

impl From<DifficultyDto> for Difficulty {
    fn from(value: DifficultyDto) -> Self {
        match value {
            DifficultyDto::Easy => Difficulty::Easy,
            DifficultyDto::Medium => Difficulty::Medium,
            DifficultyDto::Hard => Difficulty::Hard,
        }
    }
}

impl From<Difficulty> for DifficultyDto {
    fn from(value: Difficulty) -> Self {
        match value {
            Difficulty::Easy => DifficultyDto::Easy,
            Difficulty::Medium => DifficultyDto::Medium,
            Difficulty::Hard => DifficultyDto::Hard,
        }
    }
}

impl From<RoomStatus> for RoomStatusDto {
    fn from(value: RoomStatus) -> Self {
        match value {
            RoomStatus::Waiting => RoomStatusDto::Waiting,
            RoomStatus::Active => RoomStatusDto::Active,
            RoomStatus::Finished => RoomStatusDto::Finished,
        }
    }
}

/// Payload used to create a new quiz room.
///
/// Numeric fields default to the values the web client historically sent, but
/// every supplied value is validated against the documented bounds.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateRoomRequest {
    #[validate(length(min = 1, message = "room name must not be empty"))]
    pub name: String,
    #[validate(custom(function = validate_categories))]
    pub categories: Vec<String>,
    #[serde(default = "default_difficulty")]
    pub difficulty: DifficultyDto,
    #[serde(default = "default_question_count")]
    #[validate(range(min = 5, max = 50, message = "question count must be within 5..=50"))]
    pub question_count: u8,
    #[serde(default = "default_options_per_question")]
    #[validate(range(min = 2, max = 6, message = "options per question must be within 2..=6"))]
    pub options_per_question: u8,
    #[serde(default = "default_seconds_per_question")]
    #[validate(range(min = 10, max = 120, message = "seconds per question must be within 10..=120"))]
    pub seconds_per_question: u16,
    #[serde(default = "default_max_participants")]
    #[validate(range(min = 2, max = 100, message = "max participants must be within 2..=100"))]
    pub max_participants: u8,
}

fn default_difficulty() -> DifficultyDto {
    DifficultyDto::Medium
}

fn default_question_count() -> u8 {
    10
}

fn default_options_per_question() -> u8 {
    4
}

fn default_seconds_per_question() -> u16 {
    30
}

fn default_max_participants() -> u8 {
    100
}

/// Compact room projection returned after creation and join.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomSummary {
    pub room_code: String,
    pub room_name: String,
    pub creator_name: String,
    pub categories: Vec<String>,
    pub difficulty: DifficultyDto,
    pub question_count: u8,
    pub options_per_question: u8,
    pub seconds_per_question: u16,
    pub max_participants: u8,
    pub status: RoomStatusDto,
    pub participants: Vec<ParticipantSummary>,
    pub total_participants: usize,
}

/// Public projection of a participant shared over REST and the room stream.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParticipantSummary {
    pub user_id: Uuid,
    pub username: String,
    pub finished: bool,
    pub score: Option<u8>,
}

/// A question as shared with every room member once the quiz starts.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestionView {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

/// Full room view served by `GET /quiz-room/{code}`, including the computed
/// leaderboard (never persisted, always derived).
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomView {
    pub room_code: String,
    pub room_name: String,
    pub creator_id: Uuid,
    pub creator_name: String,
    pub categories: Vec<String>,
    pub difficulty: DifficultyDto,
    pub question_count: u8,
    pub options_per_question: u8,
    pub seconds_per_question: u16,
    pub max_participants: u8,
    pub status: RoomStatusDto,
    pub participants: Vec<ParticipantSummary>,
    pub quiz_generated: bool,
    pub questions: Vec<QuestionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Answer sheet submitted by a participant; `null` marks a skipped question.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitAnswersRequest {
    pub answers: Vec<Option<String>>,
}

/// Result returned to the submitter, sparing a re-fetch of the room.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitAnswersResponse {
    pub score: u8,
    pub correct_count: u32,
    pub total_questions: u32,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Authoritative quiz-start payload returned to the creator.
#[derive(Debug, Serialize, ToSchema)]
pub struct StartQuizResponse {
    pub questions: Vec<QuestionView>,
    pub seconds_per_question: u16,
}

/// One ranked row of a room's leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    /// Strict positional rank starting at 1.
    pub rank: usize,
    pub user_id: Uuid,
    pub username: String,
    pub score: u8,
    pub correct_count: u32,
    pub total_questions: u32,
    pub completed_at: String,
    /// Whole seconds between quiz start and submission, when the start
    /// timestamp is known.
    pub time_taken_seconds: Option<u64>,
}

impl From<&Participant> for ParticipantSummary {
    fn from(participant: &Participant) -> Self {
        Self {
            user_id: participant.user_id,
            username: participant.username.clone(),
            finished: participant.finished,
            score: participant.score,
        }
    }
}

impl From<&Question> for QuestionView {
    fn from(question: &Question) -> Self {
        Self {
            question: question.text.clone(),
            options: question.options.clone(),
            correct_answer: question.correct_option.clone(),
        }
    }
}

impl From<&Room> for RoomSummary {
    fn from(room: &Room) -> Self {
        Self {
            room_code: room.code.clone(),
            room_name: room.name.clone(),
            creator_name: room.creator_name.clone(),
            categories: room.settings.categories.clone(),
            difficulty: room.settings.difficulty.into(),
            question_count: room.settings.question_count,
            options_per_question: room.settings.options_per_question,
            seconds_per_question: room.settings.seconds_per_question,
            max_participants: room.settings.max_participants,
            status: room.status.into(),
            participants: participant_summaries(room),
            total_participants: room.participants.len(),
        }
    }
}

/// Project a room's participants in join order.
pub fn participant_summaries(room: &Room) -> Vec<ParticipantSummary> {
    room.participants.values().map(Into::into).collect()
}

/// Project a room's questions in quiz order.
pub fn question_views(room: &Room) -> Vec<QuestionView> {
    room.quiz.questions.iter().map(Into::into).collect()
}

impl RoomView {
    /// Assemble the full view from a room and its derived leaderboard.
    pub fn assemble(room: &Room, leaderboard: Vec<LeaderboardEntry>) -> Self {
        Self {
            room_code: room.code.clone(),
            room_name: room.name.clone(),
            creator_id: room.creator_id,
            creator_name: room.creator_name.clone(),
            categories: room.settings.categories.clone(),
            difficulty: room.settings.difficulty.into(),
            question_count: room.settings.question_count,
            options_per_question: room.settings.options_per_question,
            seconds_per_question: room.settings.seconds_per_question,
            max_participants: room.settings.max_participants,
            status: room.status.into(),
            participants: participant_summaries(room),
            quiz_generated: room.quiz.generated,
            questions: question_views(room),
            started_at: room.started_at.map(format_system_time),
            finished_at: room.finished_at.map(format_system_time),
            leaderboard,
        }
    }
}
