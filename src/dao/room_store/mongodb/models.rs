use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{
    ParticipantEntity, QuizEntity, RoomEntity, RoomStatusEntity, SettingsEntity,
};

/// Room document as stored in MongoDB. The room code is the natural unique
/// key, so it doubles as `_id`; top-level timestamps use BSON dates while the
/// embedded participant records keep their entity encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRoomDocument {
    #[serde(rename = "_id")]
    code: String,
    name: String,
    creator_id: Uuid,
    creator_name: String,
    settings: SettingsEntity,
    participants: Vec<ParticipantEntity>,
    quiz: QuizEntity,
    status: RoomStatusEntity,
    created_at: DateTime,
    updated_at: DateTime,
    started_at: Option<DateTime>,
    finished_at: Option<DateTime>,
}

impl From<RoomEntity> for MongoRoomDocument {
    fn from(value: RoomEntity) -> Self {
        Self {
            code: value.code,
            name: value.name,
            creator_id: value.creator_id,
            creator_name: value.creator_name,
            settings: value.settings,
            participants: value.participants,
            quiz: value.quiz,
            status: value.status,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
            started_at: value.started_at.map(DateTime::from_system_time),
            finished_at: value.finished_at.map(DateTime::from_system_time),
        }
    }
}

impl From<MongoRoomDocument> for RoomEntity {
    fn from(value: MongoRoomDocument) -> Self {
        Self {
            code: value.code,
            name: value.name,
            creator_id: value.creator_id,
            creator_name: value.creator_name,
            settings: value.settings,
            participants: value.participants,
            quiz: value.quiz,
            status: value.status,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
            started_at: value.started_at.map(DateTime::to_system_time),
            finished_at: value.finished_at.map(DateTime::to_system_time),
        }
    }
}

pub fn doc_id(code: &str) -> Document {
    doc! {"_id": code}
}
