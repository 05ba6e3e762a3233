use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::room::{
    Difficulty, Participant, ParticipantAnswer, Question, Quiz, Room, RoomSettings, RoomStatus,
};

/// Persisted lifecycle status of a room.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatusEntity {
    Waiting,
    Active,
    Finished,
}

/// Persisted difficulty level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyEntity {
    Easy,
    Medium,
    Hard,
}

/// Persisted per-room quiz configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingsEntity {
    pub categories: Vec<String>,
    pub difficulty: DifficultyEntity,
    pub question_count: u8,
    pub options_per_question: u8,
    pub seconds_per_question: u16,
    pub max_participants: u8,
}

/// Persisted multiple-choice question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    pub text: String,
    pub options: Vec<String>,
    pub correct_option: String,
}

/// Persisted shared quiz state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizEntity {
    pub questions: Vec<QuestionEntity>,
    pub generated: bool,
}

/// Persisted graded answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerEntity {
    pub question_index: usize,
    pub selected_option: String,
    pub is_correct: bool,
}

/// Persisted participant record, embedded in the room document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantEntity {
    pub user_id: Uuid,
    pub username: String,
    pub score: Option<u8>,
    pub correct_count: u32,
    pub total_questions: u32,
    pub answers: Vec<AnswerEntity>,
    pub finished: bool,
    pub joined_at: SystemTime,
    pub completed_at: Option<SystemTime>,
}

/// Aggregate room entity persisted by the storage layer, one document per
/// room keyed by its unique code. Participants are stored as a list so their
/// join order survives the round trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomEntity {
    pub code: String,
    pub name: String,
    pub creator_id: Uuid,
    pub creator_name: String,
    pub settings: SettingsEntity,
    pub participants: Vec<ParticipantEntity>,
    pub quiz: QuizEntity,
    pub status: RoomStatusEntity,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
    pub started_at: Option<SystemTime>,
    pub finished_at: Option<SystemTime>,
}

impl From<RoomStatus> for RoomStatusEntity {
    fn from(value: RoomStatus) -> Self {
        match value {
            RoomStatus::Waiting => RoomStatusEntity::Waiting,
            RoomStatus::Active => RoomStatusEntity::Active,
            RoomStatus::Finished => RoomStatusEntity::Finished,
        }
    }
}

impl From<RoomStatusEntity> for RoomStatus {
    fn from(value: RoomStatusEntity) -> Self {
        match value {
            RoomStatusEntity::Waiting => RoomStatus::Waiting,
            RoomStatusEntity::Active => RoomStatus::Active,
            RoomStatusEntity::Finished => RoomStatus::Finished,
        }
    }
}

impl From<Difficulty> for DifficultyEntity {
    fn from(value: Difficulty) -> Self {
        match value {
            Difficulty::Easy => DifficultyEntity::Easy,
            Difficulty::Medium => DifficultyEntity::Medium,
            Difficulty::Hard => DifficultyEntity::Hard,
        }
    }
}

impl From<DifficultyEntity> for Difficulty {
    fn from(value: DifficultyEntity) -> Self {
        match value {
            DifficultyEntity::Easy => Difficulty::Easy,
            DifficultyEntity::Medium => Difficulty::Medium,
            DifficultyEntity::Hard => Difficulty::Hard,
        }
    }
}

impl From<RoomSettings> for SettingsEntity {
    fn from(value: RoomSettings) -> Self {
        Self {
            categories: value.categories,
            difficulty: value.difficulty.into(),
            question_count: value.question_count,
            options_per_question: value.options_per_question,
            seconds_per_question: value.seconds_per_question,
            max_participants: value.max_participants,
        }
    }
}

impl From<SettingsEntity> for RoomSettings {
    fn from(value: SettingsEntity) -> Self {
        Self {
            categories: value.categories,
            difficulty: value.difficulty.into(),
            question_count: value.question_count,
            options_per_question: value.options_per_question,
            seconds_per_question: value.seconds_per_question,
            max_participants: value.max_participants,
        }
    }
}

impl From<Question> for QuestionEntity {
    fn from(value: Question) -> Self {
        Self {
            text: value.text,
            options: value.options,
            correct_option: value.correct_option,
        }
    }
}

impl From<QuestionEntity> for Question {
    fn from(value: QuestionEntity) -> Self {
        Self {
            text: value.text,
            options: value.options,
            correct_option: value.correct_option,
        }
    }
}

impl From<Quiz> for QuizEntity {
    fn from(value: Quiz) -> Self {
        Self {
            questions: value.questions.into_iter().map(Into::into).collect(),
            generated: value.generated,
        }
    }
}

impl From<QuizEntity> for Quiz {
    fn from(value: QuizEntity) -> Self {
        Self {
            questions: value.questions.into_iter().map(Into::into).collect(),
            generated: value.generated,
        }
    }
}

impl From<ParticipantAnswer> for AnswerEntity {
    fn from(value: ParticipantAnswer) -> Self {
        Self {
            question_index: value.question_index,
            selected_option: value.selected_option,
            is_correct: value.is_correct,
        }
    }
}

impl From<AnswerEntity> for ParticipantAnswer {
    fn from(value: AnswerEntity) -> Self {
        Self {
            question_index: value.question_index,
            selected_option: value.selected_option,
            is_correct: value.is_correct,
        }
    }
}

impl From<Participant> for ParticipantEntity {
    fn from(value: Participant) -> Self {
        Self {
            user_id: value.user_id,
            username: value.username,
            score: value.score,
            correct_count: value.correct_count,
            total_questions: value.total_questions,
            answers: value.answers.into_iter().map(Into::into).collect(),
            finished: value.finished,
            joined_at: value.joined_at,
            completed_at: value.completed_at,
        }
    }
}

impl From<ParticipantEntity> for Participant {
    fn from(value: ParticipantEntity) -> Self {
        Self {
            user_id: value.user_id,
            username: value.username,
            score: value.score,
            correct_count: value.correct_count,
            total_questions: value.total_questions,
            answers: value.answers.into_iter().map(Into::into).collect(),
            finished: value.finished,
            joined_at: value.joined_at,
            completed_at: value.completed_at,
        }
    }
}

impl From<Room> for RoomEntity {
    fn from(value: Room) -> Self {
        Self {
            code: value.code,
            name: value.name,
            creator_id: value.creator_id,
            creator_name: value.creator_name,
            settings: value.settings.into(),
            participants: value
                .participants
                .into_values()
                .map(Into::into)
                .collect(),
            quiz: value.quiz.into(),
            status: value.status.into(),
            created_at: value.created_at,
            updated_at: value.updated_at,
            started_at: value.started_at,
            finished_at: value.finished_at,
        }
    }
}

impl From<RoomEntity> for Room {
    fn from(value: RoomEntity) -> Self {
        let participants: IndexMap<Uuid, Participant> = value
            .participants
            .into_iter()
            .map(|entity| (entity.user_id, entity.into()))
            .collect();

        Self {
            code: value.code,
            name: value.name,
            creator_id: value.creator_id,
            creator_name: value.creator_name,
            settings: value.settings.into(),
            participants,
            quiz: value.quiz.into(),
            status: value.status.into(),
            created_at: value.created_at,
            updated_at: value.updated_at,
            started_at: value.started_at,
            finished_at: value.finished_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::room::Difficulty;

    #[test]
    fn room_round_trips_through_its_entity() {
        let mut room = Room::new(
            "XY34ZT".into(),
            "quick one".into(),
            Uuid::new_v4(),
            "alice".into(),
            RoomSettings {
                categories: vec!["geography".into(), "history".into()],
                difficulty: Difficulty::Hard,
                question_count: 5,
                options_per_question: 4,
                seconds_per_question: 20,
                max_participants: 4,
            },
            SystemTime::UNIX_EPOCH,
        );
        room.join(Uuid::new_v4(), "bob".into(), SystemTime::UNIX_EPOCH)
            .unwrap();

        let entity: RoomEntity = room.clone().into();
        let restored: Room = entity.into();

        assert_eq!(restored, room);
        // Join order must survive the Vec round trip.
        let order: Vec<_> = restored
            .participants
            .values()
            .map(|p| p.username.clone())
            .collect();
        assert_eq!(order, vec!["alice".to_owned(), "bob".to_owned()]);
    }
}
